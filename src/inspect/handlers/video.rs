use async_trait::async_trait;
use std::path::Path;

use crate::inspect::traits::{FileHandler, HandlerError};
use crate::model::InfoEntry;
use crate::traits::{CommandRunner, CommandSpec};

/// Container duration through `ffprobe`.
pub struct VideoHandler;

pub(crate) fn duration_command(path: &Path) -> CommandSpec {
    CommandSpec::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(path)
}

/// `HH:MM:SS.mmm`; hours keep counting past 24 and milliseconds truncate.
pub fn format_duration(seconds: f64) -> String {
    let whole = seconds.trunc() as u64;
    let millis = ((seconds - seconds.trunc()) * 1000.0) as u64;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        whole / 3600,
        (whole % 3600) / 60,
        whole % 60,
        millis
    )
}

fn parse_seconds(output: &str) -> Result<f64, HandlerError> {
    let trimmed = output.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
        .ok_or_else(|| HandlerError::Parse {
            tool: "ffprobe",
            detail: format!("duration {:?}", trimmed),
        })
}

#[async_trait]
impl FileHandler for VideoHandler {
    fn name(&self) -> &'static str {
        "video"
    }

    fn can_handle(&self, description: &str) -> bool {
        description.contains("video") || description.contains("MP4")
    }

    fn handles_mime(&self, mime: &str) -> bool {
        mime.starts_with("video/")
    }

    async fn inspect(
        &self,
        path: &Path,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError> {
        let output = runner.run(&duration_command(path)).await?;
        let seconds = parse_seconds(&output)?;
        Ok(vec![InfoEntry::new("Duration", format_duration(seconds))])
    }
}
