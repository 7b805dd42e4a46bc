//! Command dispatch: bridges CLI args -> core drivers -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod health;
pub mod watch;

use devwatch_core::{SortKey, ViewState};

use crate::cli::{Command, GlobalOpts, SortArg, ViewArgs};
use crate::config::Config;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(&args, cfg, global).await,
        Command::Watch(args) => watch::handle(&args, cfg, global).await,
        Command::Health => health::handle(cfg, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions do not reach dispatch".into(),
        )),
    }
}

// ── View translation ────────────────────────────────────────────────

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Id => SortKey::Id,
            SortArg::Name => SortKey::Name,
            SortArg::Ip => SortKey::IpAddress,
            SortArg::Status => SortKey::Status,
        }
    }
}

impl ViewArgs {
    pub fn view_state(&self) -> ViewState {
        ViewState {
            query: self.query.clone().unwrap_or_default(),
            status_filter: self.status.clone().unwrap_or_default(),
            sort_key: self.sort.into(),
            ascending: !self.desc,
        }
    }
}
