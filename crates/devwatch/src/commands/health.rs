//! `devwatch health`: probe the server's health route.

use devwatch_core::CoreError;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::error::CliError;
use crate::output;

pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = cfg.snapshot_client()?;
    let health = client.health().await.map_err(CoreError::from)?;
    tracing::debug!(status = %health.status, endpoint = %client.endpoint(), "health probed");

    if !health.is_ok() {
        return Err(CliError::Unhealthy {
            status: health.status,
        });
    }

    let out = output::render_single(
        &global.output,
        &health,
        |h| format!("Server is healthy ({})", h.status),
        |h| h.status.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
