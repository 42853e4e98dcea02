use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{0} is not installed")]
    ToolMissing(String),
    #[error("{program} timed out after {}s", .timeout.as_secs_f32())]
    Timeout { program: String, timeout: Duration },
    #[error("{program} {}: {stderr}", exit_description(.code))]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ProbeError {
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Self::ToolMissing(_))
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was killed by a signal".to_string(),
    }
}

/// Which part of an oversized output is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputWindow {
    /// First bytes; the rest is drained and discarded
    #[default]
    Head,
    /// Last bytes, for tools that print their summary at the end
    Tail,
}

/// A single external tool invocation.
///
/// Arguments are handed to the process as-is; nothing goes through a shell,
/// so paths never need quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub window: OutputWindow,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            window: OutputWindow::Head,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Keep the end of the output when it exceeds the cap.
    pub fn keep_tail(mut self) -> Self {
        self.window = OutputWindow::Tail;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion and returns its standard output.
    async fn run(&self, command: &CommandSpec) -> Result<String, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("file").arg("-b").arg("/tmp/my file.txt");
        assert_eq!(spec.to_string(), "file -b /tmp/my file.txt");
        assert_eq!(spec.args.len(), 2);
        assert_eq!(spec.window, OutputWindow::Head);
        assert_eq!(spec.keep_tail().window, OutputWindow::Tail);
    }

    #[test]
    fn test_probe_error_messages() {
        let missing = ProbeError::ToolMissing("pdfinfo".to_string());
        assert_eq!(missing.to_string(), "pdfinfo is not installed");
        assert!(missing.is_tool_missing());

        let failed = ProbeError::Failed {
            program: "7z".to_string(),
            code: Some(2),
            stderr: "Can not open the file as archive".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "7z exited with status 2: Can not open the file as archive"
        );
        assert!(!failed.is_tool_missing());

        let killed = ProbeError::Failed {
            program: "ffprobe".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "ffprobe was killed by a signal: ");
    }
}
