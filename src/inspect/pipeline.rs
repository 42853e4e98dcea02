//! File inspection pipeline.
//!
//! [`Inspector`] runs three sequential stages (Basic → Detection → Handler):
//! - `stat` based entries, the only stage whose failure is fatal
//! - MIME type and `file -b` description, probed concurrently, with the
//!   built-in sniffer as fallback
//! - at most one type-specific [`FileHandler`]
//!
//! Each stage is bounded by `stage_timeout`. Every stage after the first is
//! best-effort: failures are logged via `tracing`, counted in
//! [`InspectStats`] and the entry is left out.

use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::executor::{
    ToolExecutor, DEFAULT_CONCURRENCY, DEFAULT_MAX_OUTPUT, DEFAULT_TOOL_TIMEOUT,
};
use crate::inspect::basic::basic_entries;
use crate::inspect::handlers::default_handlers;
use crate::inspect::sniff::sniff_file;
use crate::inspect::traits::{select_handler, FileHandler, InspectError, ProbeContext};
use crate::model::InfoReport;
use crate::traits::{CommandRunner, CommandSpec, ProbeError};

// ============================================================================
// Configuration
// ============================================================================

/// Tunables for an [`Inspector`] and the [`ToolExecutor`] it drives.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Limit for a single external tool run (default: 30s)
    pub tool_timeout: Duration,

    /// Limit for the detection and handler stages (default: 60s)
    pub stage_timeout: Duration,

    /// Cap on captured tool output in bytes (default: 1 MiB)
    pub max_output_bytes: usize,

    /// Concurrent child processes (default: 4)
    pub concurrency_limit: usize,

    /// Use the magic-byte sniffer when `file` gives no answer (default: on)
    pub sniff_fallback: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            stage_timeout: Duration::from_secs(60),
            max_output_bytes: DEFAULT_MAX_OUTPUT,
            concurrency_limit: DEFAULT_CONCURRENCY,
            sniff_fallback: true,
        }
    }
}

impl InspectorConfig {
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_max_output(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_sniff_fallback(mut self, enabled: bool) -> Self {
        self.sniff_fallback = enabled;
        self
    }

    /// Executor configured with these limits.
    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(self.concurrency_limit)
            .with_timeout(self.tool_timeout)
            .with_max_output(self.max_output_bytes)
    }
}

// ============================================================================
// Results
// ============================================================================

#[derive(Debug)]
pub struct InspectResult {
    pub report: InfoReport,
    pub stats: InspectStats,
}

/// Statistics about one inspection.
#[derive(Debug, Default, Clone)]
pub struct InspectStats {
    pub total_duration_ms: u64,
    pub basic_duration_ms: u64,
    pub detection_duration_ms: u64,
    pub handler_duration_ms: u64,

    /// Handler that ran, if any
    pub handler: Option<&'static str>,

    /// Probes that failed, timed out or had no tool to run
    pub failed_probes: usize,
}

pub(crate) fn mime_command(path: &Path) -> CommandSpec {
    CommandSpec::new("file")
        .arg("-L")
        .arg("-b")
        .arg("--mime-type")
        .arg(path)
}

pub(crate) fn description_command(path: &Path) -> CommandSpec {
    CommandSpec::new("file").arg("-L").arg("-b").arg(path)
}

// ============================================================================
// Inspector
// ============================================================================

/// Collects an [`InfoReport`] for a path.
///
/// # Example
///
/// ```no_run
/// use inf::inspect::{Inspector, InspectorConfig};
/// use std::path::Path;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let config = InspectorConfig::default();
/// let inspector = Inspector::new(config.executor()).with_config(config);
/// let result = inspector.inspect(Path::new("Cargo.toml")).await?;
/// for entry in result.report.entries() {
///     println!("{}: {}", entry.key, entry.value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Inspector<R>
where
    R: CommandRunner,
{
    runner: R,
    handlers: Vec<Box<dyn FileHandler>>,
    config: InspectorConfig,
}

impl<R> Inspector<R>
where
    R: CommandRunner,
{
    /// Creates an inspector with the default handlers and configuration.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            handlers: default_handlers(),
            config: InspectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InspectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the handler list; order is dispatch precedence.
    pub fn with_handlers(mut self, handlers: Vec<Box<dyn FileHandler>>) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn config(&self) -> &InspectorConfig {
        &self.config
    }

    /// Inspects `path`.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError::Inaccessible`] if `path` cannot be `stat`ed,
    /// or [`InspectError::Timeout`] if `stat` outlives the stage timeout.
    /// Nothing else is fatal.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn inspect(&self, path: &Path) -> Result<InspectResult, InspectError> {
        let start = Instant::now();
        let mut stats = InspectStats::default();
        let mut report = InfoReport::new(path);

        // ====================================================================
        // Stage 1: Basic
        // ====================================================================

        let basic_start = Instant::now();
        let metadata = timeout(self.config.stage_timeout, tokio::fs::metadata(path))
            .await
            .map_err(|_| InspectError::Timeout {
                path: path.to_path_buf(),
                timeout: self.config.stage_timeout,
            })?
            .map_err(|source| InspectError::Inaccessible {
                path: path.to_path_buf(),
                source,
            })?;
        report.extend(basic_entries(&metadata));
        stats.basic_duration_ms = basic_start.elapsed().as_millis() as u64;

        // ====================================================================
        // Stage 2: Detection
        // ====================================================================

        info!("Starting detection stage");
        let detection_start = Instant::now();

        let mut context = ProbeContext {
            path: path.to_path_buf(),
            is_dir: metadata.is_dir(),
            ..Default::default()
        };

        // Only regular files are read; opening a FIFO or device could block.
        let sniff_allowed = self.config.sniff_fallback && metadata.is_file();
        let mime_probe = mime_command(path);
        let description_probe = description_command(path);
        let detection = async {
            let (mime, description) = tokio::join!(
                self.runner.run(&mime_probe),
                self.runner.run(&description_probe)
            );
            let mut failed = 0;
            let mut mime = probe_value("MIME type", mime, &mut failed);
            let mut description = probe_value("File type", description, &mut failed);
            let mut sniffed = false;

            if (mime.is_none() || description.is_none()) && sniff_allowed {
                match sniff_file(path).await {
                    Ok(kind) => {
                        debug!(mime = kind.mime, "Using built-in detection");
                        mime.get_or_insert_with(|| kind.mime.to_string());
                        description.get_or_insert_with(|| kind.description.to_string());
                        sniffed = true;
                    }
                    Err(e) => warn!(error = %e, "Built-in detection failed"),
                }
            }
            Detected {
                mime,
                description,
                sniffed,
                failed,
            }
        };
        match timeout(self.config.stage_timeout, detection).await {
            Ok(detected) => {
                context.mime = detected.mime;
                context.description = detected.description;
                context.sniffed = detected.sniffed;
                stats.failed_probes += detected.failed;
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.config.stage_timeout.as_secs_f32(),
                    "Detection stage timed out"
                );
                stats.failed_probes += 2;
            }
        }

        if let Some(mime) = &context.mime {
            report.add("MIME type", mime.as_str());
        }
        if let Some(description) = &context.description {
            report.add("File type", description.as_str());
        }

        stats.detection_duration_ms = detection_start.elapsed().as_millis() as u64;
        info!(
            duration_ms = stats.detection_duration_ms,
            mime = context.mime.as_deref().unwrap_or("-"),
            sniffed = context.sniffed,
            "Detection completed"
        );

        // ====================================================================
        // Stage 3: Handler
        // ====================================================================

        if let Some(handler) = select_handler(&self.handlers, &context) {
            info!(handler = handler.name(), "Starting handler stage");
            let handler_start = Instant::now();
            stats.handler = Some(handler.name());

            match timeout(self.config.stage_timeout, handler.inspect(path, &self.runner)).await {
                Ok(Ok(entries)) => report.extend(entries),
                Ok(Err(e)) => {
                    if e.is_tool_missing() {
                        info!(handler = handler.name(), error = %e, "Handler skipped");
                    } else {
                        warn!(handler = handler.name(), error = %e, "Handler failed");
                    }
                    stats.failed_probes += 1;
                }
                Err(_) => {
                    warn!(
                        handler = handler.name(),
                        timeout_secs = self.config.stage_timeout.as_secs_f32(),
                        "Handler timed out"
                    );
                    stats.failed_probes += 1;
                }
            }

            stats.handler_duration_ms = handler_start.elapsed().as_millis() as u64;
            info!(
                duration_ms = stats.handler_duration_ms,
                entries = report.len(),
                "Handler completed"
            );
        } else {
            debug!("No handler for this file type");
        }

        stats.total_duration_ms = start.elapsed().as_millis() as u64;

        Ok(InspectResult { report, stats })
    }
}

struct Detected {
    mime: Option<String>,
    description: Option<String>,
    sniffed: bool,
    failed: usize,
}

/// Trimmed tool output, or `None` (logged and counted) on failure.
fn probe_value(
    probe: &'static str,
    result: Result<String, ProbeError>,
    failed: &mut usize,
) -> Option<String> {
    match result {
        Ok(output) => {
            let value = output.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        Err(e) => {
            if e.is_tool_missing() {
                info!(probe, error = %e, "Probe skipped");
            } else {
                warn!(probe, error = %e, "Probe failed");
            }
            *failed += 1;
            None
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
