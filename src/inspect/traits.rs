//! Core traits and types for file inspection.
//!
//! - Type-specific inspection via [`FileHandler`]
//! - Detection results handed to handlers via [`ProbeContext`]
//! - Standardized error handling per layer

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::model::InfoEntry;
use crate::traits::{CommandRunner, ProbeError};

// ============================================================================
// Handler Trait
// ============================================================================

/// Inspector for one family of file types (text, image, PDF, ...).
///
/// The pipeline asks every registered handler, in order, whether it can
/// handle the detected file type and runs the first one that accepts.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; handlers are shared by reference
/// across the pipeline's tasks.
#[async_trait]
pub trait FileHandler: Send + Sync {
    /// Short identifier used in logs and statistics.
    ///
    /// Examples: `"text"`, `"pdf"`
    fn name(&self) -> &'static str;

    /// Matches the textual description produced by `file -b`.
    ///
    /// Should be a cheap substring test; it runs for every handler until one
    /// accepts.
    fn can_handle(&self, description: &str) -> bool;

    /// Matches a MIME type.
    ///
    /// Only consulted when no handler accepted the description, e.g. for
    /// `"Matroska data"` which names no family. Default: never.
    fn handles_mime(&self, _mime: &str) -> bool {
        false
    }

    /// Collects type-specific entries for the file at `path`.
    ///
    /// External tools are run through `runner` so tests can script them.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] if nothing could be collected. Handlers that
    /// run several probes keep whatever succeeded.
    async fn inspect(
        &self,
        path: &Path,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError>;
}

// ============================================================================
// Detection
// ============================================================================

/// What is known about a file once detection has run.
#[derive(Debug, Clone, Default)]
pub struct ProbeContext {
    pub path: PathBuf,

    /// `file -b` output, trimmed
    pub description: Option<String>,

    /// `file -b --mime-type` output, trimmed
    pub mime: Option<String>,

    pub is_dir: bool,

    /// Whether description/MIME came from the built-in sniffer
    pub sniffed: bool,
}

/// Picks the handler for a file: description first, MIME type second.
pub fn select_handler<'a>(
    handlers: &'a [Box<dyn FileHandler>],
    context: &ProbeContext,
) -> Option<&'a dyn FileHandler> {
    if context.is_dir {
        return None;
    }

    if let Some(description) = context.description.as_deref() {
        if let Some(handler) = handlers.iter().find(|h| h.can_handle(description)) {
            return Some(handler.as_ref());
        }
    }

    let mime = context.mime.as_deref()?;
    handlers
        .iter()
        .find(|h| h.handles_mime(mime))
        .map(|h| h.as_ref())
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by a [`FileHandler`].
#[derive(Error, Debug)]
pub enum HandlerError {
    /// External tool failed, timed out or is missing
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// Reading the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tool ran but its output could not be understood
    #[error("Unexpected {tool} output: {detail}")]
    Parse { tool: &'static str, detail: String },
}

impl HandlerError {
    /// The handler's tool is not installed; nothing actually went wrong.
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, Self::Probe(e) if e.is_tool_missing())
    }
}

/// Errors that abort an inspection.
///
/// Only the basic stage can fail an inspection; everything after it is
/// best-effort and only logged.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Cannot access {}: {source}", .path.display())]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out reading {} after {}s", .path.display(), .timeout.as_secs_f32())]
    Timeout { path: PathBuf, timeout: Duration },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::handlers::default_handlers;

    fn context(description: Option<&str>, mime: Option<&str>) -> ProbeContext {
        ProbeContext {
            path: PathBuf::from("/tmp/sample"),
            description: description.map(str::to_string),
            mime: mime.map(str::to_string),
            ..Default::default()
        }
    }

    fn selected(description: Option<&str>, mime: Option<&str>) -> Option<&'static str> {
        let handlers = default_handlers();
        select_handler(&handlers, &context(description, mime)).map(|h| h.name())
    }

    #[test]
    fn test_dispatch_by_description() {
        assert_eq!(selected(Some("ASCII text"), None), Some("text"));
        assert_eq!(selected(Some("UTF-8 Unicode text, with CRLF line terminators"), None), Some("text"));
        assert_eq!(selected(Some("PNG image data, 640 x 480, 8-bit/color RGBA"), None), Some("image"));
        assert_eq!(selected(Some("ISO Media, MP4 v2 [ISO 14496-14]"), None), Some("video"));
        assert_eq!(selected(Some("PDF document, version 1.4, 3 pages"), None), Some("pdf"));
        assert_eq!(selected(Some("Zip archive data, at least v2.0 to extract"), None), Some("archive"));
        assert_eq!(selected(Some("gzip compressed data, from Unix"), None), Some("archive"));
        assert_eq!(selected(Some("ELF 64-bit LSB executable, x86-64"), None), None);
    }

    #[test]
    fn test_dispatch_precedence_follows_handler_order() {
        // "text" wins over "image" because the text handler is asked first
        assert_eq!(selected(Some("SVG Scalable Vector Graphics image, ASCII text"), None), Some("text"));
    }

    #[test]
    fn test_dispatch_falls_back_to_mime() {
        assert_eq!(selected(Some("Matroska data"), Some("video/x-matroska")), Some("video"));
        assert_eq!(selected(None, Some("application/pdf")), Some("pdf"));
        assert_eq!(selected(None, Some("application/x-7z-compressed")), Some("archive"));
        assert_eq!(selected(Some("data"), Some("application/octet-stream")), None);
        assert_eq!(selected(None, None), None);
    }

    #[test]
    fn test_handler_error_tool_missing() {
        let missing = HandlerError::from(ProbeError::ToolMissing("ffprobe".to_string()));
        assert!(missing.is_tool_missing());
        assert_eq!(missing.to_string(), "ffprobe is not installed");

        let parse = HandlerError::Parse {
            tool: "ffprobe",
            detail: "duration \"N/A\"".to_string(),
        };
        assert!(!parse.is_tool_missing());
    }

    #[test]
    fn test_inspect_error_messages() {
        let timeout = InspectError::Timeout {
            path: PathBuf::from("/mnt/slow/file"),
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(timeout.to_string(), "Timed out reading /mnt/slow/file after 1.5s");
    }

    #[test]
    fn test_directories_never_dispatch() {
        let handlers = default_handlers();
        let mut ctx = context(Some("directory"), Some("inode/directory"));
        ctx.is_dir = true;
        assert!(select_handler(&handlers, &ctx).is_none());
    }
}
