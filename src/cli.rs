use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::executor::ToolExecutor;
use crate::inspect::{InspectError, Inspector, InspectorConfig};
use crate::package::PACKAGE;
use crate::render::{render, OutputFormat};

/// External tools `inf` can make use of.
pub const OPTIONAL_TOOLS: [&str; 5] = ["file", "identify", "ffprobe", "pdfinfo", "7z"];

#[derive(Parser, Debug)]
#[command(
    name = PACKAGE.entry_point.command,
    version = PACKAGE.version,
    about = PACKAGE.description,
    long_about = None
)]
pub struct Args {
    /// File to inspect
    #[arg(value_name = "PATH", value_hint = clap::ValueHint::AnyPath)]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Timeout for each external tool, in seconds
    #[arg(
        short,
        long,
        value_name = "SECONDS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// More log output on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn config(&self) -> InspectorConfig {
        InspectorConfig::default().with_tool_timeout(Duration::from_secs(self.timeout))
    }
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Inspect(#[from] InspectError),
    #[error("Failed to render output: {0}")]
    Render(#[from] serde_json::Error),
}

pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
pub fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,inf={}", log_level(verbose))));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}

/// Inspects `args.path` and returns the rendered report.
pub async fn run(args: &Args) -> Result<String, CliError> {
    for tool in OPTIONAL_TOOLS {
        debug!(tool, available = ToolExecutor::is_available(tool), "Tool lookup");
    }

    let config = args.config();
    let inspector = Inspector::new(config.executor()).with_config(config);
    let result = inspector.inspect(&args.path).await?;
    debug!(stats = ?result.stats, "Inspection finished");

    Ok(render(&result.report, args.format)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["inf", "notes.txt"]).unwrap();
        assert_eq!(args.path, PathBuf::from("notes.txt"));
        assert_eq!(args.format, OutputFormat::Table);
        assert_eq!(args.timeout, 30);
        assert_eq!(args.verbose, 0);
        assert_eq!(args.config().tool_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_flags() {
        let args =
            Args::try_parse_from(["inf", "-f", "json", "--timeout", "5", "-vv", "a.pdf"]).unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.config().tool_timeout, Duration::from_secs(5));
        assert_eq!(log_level(args.verbose), "debug");
    }

    #[test]
    fn test_exactly_one_path() {
        assert!(Args::try_parse_from(["inf"]).is_err());
        assert!(Args::try_parse_from(["inf", "a", "b"]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(Args::try_parse_from(["inf", "-t", "0", "a"]).is_err());
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(3), "trace");
        assert_eq!(log_level(9), "trace");
    }

    #[tokio::test]
    async fn test_run_missing_path() {
        let args = Args::try_parse_from(["inf", "/nonexistent/inf/none.txt"]).unwrap();
        let err = run(&args).await.unwrap_err();
        assert!(err.to_string().starts_with("Cannot access /nonexistent/inf/none.txt"));
    }
}
