//! Config subcommand handlers.

use dialoguer::{Input, Select};

use devwatch_core::{DeviceCount, SyncMode};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}

fn render_config(cfg: &Config, global: &GlobalOpts) -> Result<String, CliError> {
    let toml = toml::to_string_pretty(cfg).map_err(|e| CliError::Internal(e.to_string()))?;
    Ok(output::render_single(
        &global.output,
        cfg,
        |_| toml.trim_end().to_owned(),
        |c| c.endpoint.clone(),
    ))
}

/// Interactive wizard. Every prompt defaults to the current value.
fn prompt_config(current: &Config) -> Result<Config, CliError> {
    let mut cfg = current.clone();

    cfg.endpoint = Input::new()
        .with_prompt("Snapshot endpoint")
        .default(current.endpoint.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let count: String = Input::new()
        .with_prompt("Devices to request (1-500)")
        .default(current.count().to_string())
        .interact_text()
        .map_err(prompt_err)?;
    cfg.count = i64::from(DeviceCount::parse(&count).get());

    let modes = &["Pull (fetch on demand)", "Push (subscribe to updates)"];
    let selection = Select::new()
        .with_prompt("Sync mode")
        .items(modes)
        .default(usize::from(current.mode == SyncMode::Push))
        .interact()
        .map_err(prompt_err)?;
    cfg.mode = if selection == 1 {
        SyncMode::Push
    } else {
        SyncMode::Pull
    };

    cfg.push_url = Input::new()
        .with_prompt("Push channel URL")
        .default(current.push_url.clone())
        .interact_text()
        .map_err(prompt_err)?;

    // Reject bad URLs before anything is written.
    cfg.endpoint_url()?;
    cfg.push_url()?;
    Ok(cfg)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let path = config::config_path();
            eprintln!("devwatch configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let current = config::load_config()?;
            let cfg = prompt_config(&current)?;
            let written = config::save_config(&cfg)?;
            eprintln!("\n   ✓ Saved {}", written.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::resolve(global)?;
            let out = render_config(&cfg, global)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        Cli::try_parse_from(args).unwrap().global
    }

    #[test]
    fn show_renders_toml_for_tables() {
        let out = render_config(&Config::default(), &global(&["devwatch", "config", "show"])).unwrap();
        assert!(out.contains("endpoint = \"http://127.0.0.1:8000/devices\""));
        assert!(out.contains("[reconnect]"));
    }

    #[test]
    fn show_renders_json_when_asked() {
        let out = render_config(
            &Config::default(),
            &global(&["devwatch", "-o", "json", "config", "show"]),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["count"], 10);
        assert_eq!(parsed["mode"], "pull");
    }
}
