//! CLI configuration: thin wrapper around `devwatch_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides on
//! top of the file + environment settings.

use devwatch_core::{DeviceCount, ResponseOrdering, SyncMode};

use crate::cli::{GlobalOpts, ModeArg, OrderingArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use devwatch_config::{Config, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

impl From<ModeArg> for SyncMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Pull => SyncMode::Pull,
            ModeArg::Push => SyncMode::Push,
        }
    }
}

impl From<OrderingArg> for ResponseOrdering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Arrival => ResponseOrdering::Arrival,
            OrderingArg::Issue => ResponseOrdering::Issue,
        }
    }
}

/// Load the config and apply flag overrides (flag > env > file > default).
pub fn resolve(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref endpoint) = global.endpoint {
        cfg.endpoint.clone_from(endpoint);
    }
    if let Some(ref push_url) = global.push_url {
        cfg.push_url.clone_from(push_url);
    }
    if let Some(ref event) = global.event_name {
        cfg.event_name.clone_from(event);
    }
    if let Some(ref raw) = global.count {
        cfg.count = i64::from(DeviceCount::parse(raw).get());
    }
    if global.seed.is_some() {
        cfg.seed = global.seed;
    }
    if let Some(mode) = global.mode {
        cfg.mode = mode.into();
    }
    if let Some(ordering) = global.ordering {
        cfg.ordering = ordering.into();
    }
    if global.insecure {
        cfg.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn overridden(args: &[&str]) -> Config {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, &cli.global);
        cfg
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = overridden(&[
            "devwatch",
            "--endpoint",
            "http://10.0.0.5:9000/devices",
            "--mode",
            "push",
            "--ordering",
            "issue",
            "health",
        ]);
        assert_eq!(cfg.endpoint, "http://10.0.0.5:9000/devices");
        assert_eq!(cfg.mode, SyncMode::Push);
        assert_eq!(cfg.ordering, ResponseOrdering::Issue);
    }

    #[test]
    fn count_flag_is_parsed_leniently() {
        assert_eq!(overridden(&["devwatch", "-n", "9999", "health"]).count, 500);
        assert_eq!(overridden(&["devwatch", "-n", "abc", "health"]).count, 10);
        assert_eq!(overridden(&["devwatch", "-n", "-4", "health"]).count, 1);
        assert_eq!(overridden(&["devwatch", "-n", "12abc", "health"]).count, 12);
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cfg = overridden(&["devwatch", "health"]);
        assert_eq!(cfg, Config::default());
    }
}
