use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::warn;

use crate::inspect::traits::{FileHandler, HandlerError};
use crate::model::InfoEntry;
use crate::traits::{CommandRunner, CommandSpec};

/// Dimensions and colour space through ImageMagick's `identify`.
pub struct ImageHandler;

/// `path[0]`: only the first frame of animated or multi-page images.
fn first_frame(path: &Path) -> OsString {
    let mut frame = path.as_os_str().to_os_string();
    frame.push("[0]");
    frame
}

pub(crate) fn identify_command(path: &Path, format: &str) -> CommandSpec {
    CommandSpec::new("identify")
        .arg("-format")
        .arg(format)
        .arg(first_frame(path))
}

#[async_trait]
impl FileHandler for ImageHandler {
    fn name(&self) -> &'static str {
        "image"
    }

    fn can_handle(&self, description: &str) -> bool {
        description.contains("image")
    }

    fn handles_mime(&self, mime: &str) -> bool {
        mime.starts_with("image/")
    }

    async fn inspect(
        &self,
        path: &Path,
        runner: &dyn CommandRunner,
    ) -> Result<Vec<InfoEntry>, HandlerError> {
        let dimensions = identify_command(path, "%wx%h");
        let color_space = identify_command(path, "%r");
        let (dimensions, color_space) =
            tokio::join!(runner.run(&dimensions), runner.run(&color_space));

        let mut entries = Vec::new();
        let mut first_error = None;
        for (key, result) in [("Dimensions", dimensions), ("Color space", color_space)] {
            match result {
                Ok(output) if !output.trim().is_empty() => {
                    entries.push(InfoEntry::new(key, output.trim()));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(field = key, error = %e, "identify probe failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if entries.is_empty() => Err(e.into()),
            _ => Ok(entries),
        }
    }
}
