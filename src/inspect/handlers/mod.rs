//! Type-specific handlers.
//!
//! Order matters: [`default_handlers`] lists them in dispatch precedence.
//! - `text` - line, word and character counts (built in)
//! - `image` - dimensions and colour space via ImageMagick `identify`
//! - `video` - duration via `ffprobe`
//! - `pdf` - document fields via `pdfinfo`
//! - `archive` - entry count and uncompressed size via `7z l`

pub mod archive;
pub mod image;
pub mod pdf;
pub mod text;
pub mod video;

pub use archive::ArchiveHandler;
pub use image::ImageHandler;
pub use pdf::PdfHandler;
pub use text::TextHandler;
pub use video::VideoHandler;

use super::traits::FileHandler;

pub fn default_handlers() -> Vec<Box<dyn FileHandler>> {
    vec![
        Box::new(TextHandler),
        Box::new(ImageHandler),
        Box::new(VideoHandler),
        Box::new(PdfHandler),
        Box::new(ArchiveHandler),
    ]
}
