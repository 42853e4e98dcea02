use crate::traits::{CommandRunner, CommandSpec, OutputWindow, ProbeError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_OUTPUT: usize = 1024 * 1024;
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Runs external inspection tools (`file`, `identify`, `pdfinfo`, ...).
///
/// At most `concurrency_limit` children run at once. A child that outlives
/// the timeout is killed when its future is dropped.
pub struct ToolExecutor {
    semaphore: Arc<Semaphore>,
    timeout: Duration,
    max_output: usize,
}

impl ToolExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            timeout: DEFAULT_TOOL_TIMEOUT,
            max_output: DEFAULT_MAX_OUTPUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Caps the captured standard output, in bytes. Output past the cap is
    /// read and discarded.
    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    /// Whether `program` can be found on `PATH`.
    pub fn is_available(program: &str) -> bool {
        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&paths).any(|dir| dir.join(program).is_file())
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

#[async_trait]
impl CommandRunner for ToolExecutor {
    #[instrument(skip(self, command), fields(command = %command))]
    async fn run(&self, command: &CommandSpec) -> Result<String, ProbeError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| ProbeError::Unknown(format!("Semaphore error: {}", e)))?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProbeError::ToolMissing(command.program.clone()),
                _ => ProbeError::Io(e),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProbeError::Unknown("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProbeError::Unknown("stderr not captured".to_string()))?;

        let run = async {
            tokio::try_join!(
                capture(stdout, self.max_output, command.window),
                capture(stderr, MAX_STDERR, OutputWindow::Head),
                child.wait()
            )
        };
        let (stdout, stderr, status) = timeout(self.timeout, run)
            .await
            .map_err(|_| ProbeError::Timeout {
                program: command.program.clone(),
                timeout: self.timeout,
            })??;

        if !status.success() {
            return Err(ProbeError::Failed {
                program: command.program.clone(),
                code: status.code(),
                stderr: decode_output(stderr.bytes, OutputWindow::Head)
                    .trim()
                    .to_string(),
            });
        }

        if stdout.truncated {
            warn!(limit = self.max_output, window = ?command.window, "Tool output truncated");
        }
        let stdout = decode_output(stdout.bytes, command.window);

        debug!(bytes = stdout.len(), "Tool finished");
        Ok(stdout)
    }
}

const MAX_STDERR: usize = 64 * 1024;
const READ_CHUNK: usize = 8 * 1024;

struct Captured {
    bytes: Vec<u8>,
    truncated: bool,
}

/// Drains `reader` to the end, keeping at most `max` bytes of it.
///
/// Reading never stops early so the child cannot block on a full pipe.
async fn capture<R>(mut reader: R, max: usize, window: OutputWindow) -> std::io::Result<Captured>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let read = &chunk[..n];
        match window {
            OutputWindow::Head => {
                let room = max.saturating_sub(bytes.len());
                if read.len() > room {
                    truncated = true;
                }
                bytes.extend_from_slice(&read[..read.len().min(room)]);
            }
            OutputWindow::Tail => {
                bytes.extend_from_slice(read);
                // compact lazily so each byte is moved a bounded number of times
                if bytes.len() > max.saturating_mul(2).max(READ_CHUNK) {
                    truncated = true;
                    bytes.drain(..bytes.len() - max);
                }
            }
        }
    }

    if window == OutputWindow::Tail && bytes.len() > max {
        truncated = true;
        bytes.drain(..bytes.len() - max);
    }

    Ok(Captured { bytes, truncated })
}

/// Lossy UTF-8 decoding that drops a character split by the window edge.
pub(crate) fn decode_output(mut bytes: Vec<u8>, window: OutputWindow) -> String {
    match window {
        OutputWindow::Head => {
            if let Err(e) = std::str::from_utf8(&bytes) {
                if e.error_len().is_none() {
                    bytes.truncate(e.valid_up_to());
                }
            }
        }
        OutputWindow::Tail => {
            let skip = bytes
                .iter()
                .take(3)
                .take_while(|b| (**b & 0xC0) == 0x80)
                .count();
            bytes.drain(..skip);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_output() {
        assert_eq!(decode_output(b"hello".to_vec(), OutputWindow::Head), "hello");

        // 'é' is two bytes; a half character at either edge is dropped
        let e = "é".as_bytes();
        assert_eq!(decode_output(vec![b'a', e[0]], OutputWindow::Head), "a");
        assert_eq!(decode_output(vec![e[1], b'z'], OutputWindow::Tail), "z");
        assert_eq!(decode_output(e.to_vec(), OutputWindow::Tail), "é");
    }

    #[tokio::test]
    async fn test_capture_windows() {
        let input: &[u8] = b"0123456789";

        let head = capture(input, 4, OutputWindow::Head).await.unwrap();
        assert_eq!(head.bytes, b"0123");
        assert!(head.truncated);

        let tail = capture(input, 4, OutputWindow::Tail).await.unwrap();
        assert_eq!(tail.bytes, b"6789");
        assert!(tail.truncated);

        let whole = capture(input, 64, OutputWindow::Tail).await.unwrap();
        assert_eq!(whole.bytes, input);
        assert!(!whole.truncated);
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let executor = ToolExecutor::default();
        let result = executor
            .run(&CommandSpec::new("inf-no-such-tool-installed"))
            .await;

        assert!(matches!(result, Err(ProbeError::ToolMissing(name)) if name == "inf-no-such-tool-installed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout() {
        let executor = ToolExecutor::default();
        let output = executor
            .run(&CommandSpec::new("sh").arg("-c").arg("printf 'a b'"))
            .await
            .unwrap();

        assert_eq!(output, "a b");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let executor = ToolExecutor::default();
        let result = executor
            .run(&CommandSpec::new("sh").arg("-c").arg("echo oops >&2; exit 3"))
            .await;

        match result {
            Err(ProbeError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child() {
        let executor = ToolExecutor::default().with_timeout(Duration::from_millis(100));
        let result = executor
            .run(&CommandSpec::new("sh").arg("-c").arg("sleep 5"))
            .await;

        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_cap() {
        let executor = ToolExecutor::default().with_max_output(4);
        let output = executor
            .run(&CommandSpec::new("sh").arg("-c").arg("printf 'abcdefgh'"))
            .await
            .unwrap();

        assert_eq!(output, "abcd");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_tail_window_keeps_summary_of_long_output() {
        let executor = ToolExecutor::default().with_max_output(4096);
        let script = "i=0; while [ $i -lt 20000 ]; do echo \"entry $i\"; i=$((i+1)); done; echo '20000 files'";
        let output = executor
            .run(&CommandSpec::new("sh").arg("-c").arg(script).keep_tail())
            .await
            .unwrap();

        assert!(output.len() <= 4096);
        assert!(output.ends_with("20000 files\n"));
        assert!(!output.contains("entry 0\n"));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_available() {
        assert!(ToolExecutor::is_available("sh"));
        assert!(!ToolExecutor::is_available("inf-no-such-tool-installed"));
    }
}
