//! # portrait
//!
//! Portrait - Component metadata extraction for Vue-style sources.
//!
//! ## Name Origin
//!
//! A **portrait** shows who someone is without them being in the room. This
//! binary draws one for every component it finds: props, events, state, slots
//! and template, written as a plain object literal (or JSON) next to nothing
//! but the source it was read from.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portrait")]
#[command(about = "Extract component metadata from Vue-style sources", long_about = None)]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),

    /// Log level or filter directive (overrides PORTRAIT_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract component metadata (default command)
    Extract(commands::extract::ExtractArgs),

    /// Write the JSON Schema for portrait.config.json
    Schema(commands::schema::SchemaArgs),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Some(Commands::Extract(args)) => commands::extract::run(args),
        Some(Commands::Schema(args)) => commands::schema::run(args),
        None => commands::extract::run(commands::extract::ExtractArgs::default()),
    }
}

/// Log to stderr. `--log-level` wins over `PORTRAIT_LOG`, default `warn`.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).ok(),
        None => EnvFilter::try_from_env("PORTRAIT_LOG").ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_extract() {
        let cli = Cli::try_parse_from([
            "portrait",
            "--log-level",
            "debug",
            "extract",
            "src/**/*.vue",
            "--format",
            "json",
            "--verify",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Some(Commands::Extract(args)) = cli.command else {
            panic!("expected the extract command");
        };
        assert_eq!(args.patterns, ["src/**/*.vue"]);
        assert!(matches!(args.format, Some(commands::extract::OutputFormat::Json)));
        assert!(args.verify);
        assert!(args.out_dir.is_none());
    }

    #[test]
    fn test_parse_without_command() {
        let cli = Cli::try_parse_from(["portrait"]).unwrap();
        assert!(cli.command.is_none());
    }
}
