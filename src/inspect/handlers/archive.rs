use async_trait::async_trait;
use std::path::Path;

use crate::inspect::traits::{FileHandler, HandlerError};
use crate::model::InfoEntry;
use crate::traits::{CommandRunner, CommandSpec};

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-gzip",
    "application/x-bzip2",
    "application/x-xz",
    "application/x-rar",
    "application/vnd.rar",
];

/// Entry count and uncompressed size through `7z l`.
pub struct ArchiveHandler;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: u64,
    pub total_size: u64,
}

/// The totals close the listing, so the tail of the output is kept.
pub(crate) fn list_command(path: &Path) -> CommandSpec {
    CommandSpec::new("7z").arg("l").arg(path).keep_tail()
}

/// Reads the totals line that closes a `7z l` listing:
///
/// ```text
/// 2024-01-01 10:00:00               2060           30  2 files, 1 folders
/// ```
///
/// The file count is the number in front of `file`/`files`; the size is the
/// first plain integer before it (date and time contain separators). A
/// listing without totals yields zeros.
pub fn parse_listing(output: &str) -> ArchiveSummary {
    output
        .lines()
        .rev()
        .find_map(parse_totals_line)
        .unwrap_or_default()
}

fn parse_totals_line(line: &str) -> Option<ArchiveSummary> {
    // "1 file, 2298 bytes (3 KiB)" from the scan header is not a totals line
    if line.contains("bytes") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let count_at = tokens.windows(2).position(|pair| {
        let label = pair[1].trim_end_matches(',');
        (label == "file" || label == "files") && pair[0].parse::<u64>().is_ok()
    })?;
    let files = tokens[count_at].parse::<u64>().ok()?;

    let total_size = tokens[..count_at]
        .iter()
        .find(|token| token.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|token| token.parse::<u64>().ok())
        .unwrap_or(0);

    Some(ArchiveSummary { files, total_size })
}

#[async_trait]
impl FileHandler for ArchiveHandler {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn can_handle(&self, description: &str) -> bool {
        description.contains("archive") || description.contains("compressed")
    }

    fn handles_mime(&self, mime: &str) -> bool {
        ARCHIVE_MIME_TYPES.contains(&mime)
    }

    async fn inspect(
        &self,
        path: &Path,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError> {
        let output = runner.run(&list_command(path)).await?;
        let summary = parse_listing(&output);
        Ok(vec![
            InfoEntry::new("Files in archive", summary.files.to_string()),
            InfoEntry::new(
                "Total uncompressed size",
                format!("{} bytes", summary.total_size),
            ),
        ])
    }
}
