//! Built-in file type detection from magic bytes.
//!
//! Used when `file(1)` is unavailable or fails. Descriptions are worded like
//! `file -b` output so the same handlers accept them.

use std::path::Path;
use tokio::io::AsyncReadExt;

/// Bytes examined at the start of a file.
pub const SNIFF_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sniffed {
    pub description: &'static str,
    pub mime: &'static str,
}

impl Sniffed {
    const fn new(description: &'static str, mime: &'static str) -> Self {
        Self { description, mime }
    }
}

struct Signature {
    offset: usize,
    magic: &'static [u8],
    kind: Sniffed,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        offset: 0,
        magic: b"\x89PNG\r\n\x1a\n",
        kind: Sniffed::new("PNG image data", "image/png"),
    },
    Signature {
        offset: 0,
        magic: b"\xff\xd8\xff",
        kind: Sniffed::new("JPEG image data", "image/jpeg"),
    },
    Signature {
        offset: 0,
        magic: b"GIF87a",
        kind: Sniffed::new("GIF image data, version 87a", "image/gif"),
    },
    Signature {
        offset: 0,
        magic: b"GIF89a",
        kind: Sniffed::new("GIF image data, version 89a", "image/gif"),
    },
    Signature {
        offset: 0,
        magic: b"%PDF-",
        kind: Sniffed::new("PDF document", "application/pdf"),
    },
    Signature {
        offset: 0,
        magic: b"\x1a\x45\xdf\xa3",
        kind: Sniffed::new("Matroska data", "video/x-matroska"),
    },
    Signature {
        offset: 0,
        magic: b"PK\x03\x04",
        kind: Sniffed::new("Zip archive data", "application/zip"),
    },
    Signature {
        offset: 0,
        magic: b"PK\x05\x06",
        kind: Sniffed::new("Zip archive data (empty)", "application/zip"),
    },
    Signature {
        offset: 0,
        magic: b"\x1f\x8b",
        kind: Sniffed::new("gzip compressed data", "application/gzip"),
    },
    Signature {
        offset: 0,
        magic: b"BZh",
        kind: Sniffed::new("bzip2 compressed data", "application/x-bzip2"),
    },
    Signature {
        offset: 0,
        magic: b"\xfd7zXZ\x00",
        kind: Sniffed::new("XZ compressed data", "application/x-xz"),
    },
    Signature {
        offset: 0,
        magic: b"7z\xbc\xaf\x27\x1c",
        kind: Sniffed::new("7-zip archive data", "application/x-7z-compressed"),
    },
    Signature {
        offset: 0,
        magic: b"Rar!\x1a\x07",
        kind: Sniffed::new("RAR archive data", "application/x-rar"),
    },
    Signature {
        offset: 257,
        magic: b"ustar",
        kind: Sniffed::new("POSIX tar archive", "application/x-tar"),
    },
];

const EMPTY: Sniffed = Sniffed::new("empty", "inode/x-empty");
const DATA: Sniffed = Sniffed::new("data", "application/octet-stream");

/// Classifies the first bytes of a file.
pub fn sniff_bytes(head: &[u8]) -> Sniffed {
    if head.is_empty() {
        return EMPTY;
    }

    if let Some(signature) = SIGNATURES
        .iter()
        .find(|s| head.get(s.offset..s.offset + s.magic.len()) == Some(s.magic))
    {
        return signature.kind;
    }

    let container = sniff_riff(head)
        .or_else(|| sniff_iso_media(head))
        .or_else(|| sniff_bmp(head));
    if let Some(kind) = container {
        return kind;
    }

    if is_text(head) {
        return if head.is_ascii() {
            Sniffed::new("ASCII text", "text/plain")
        } else {
            Sniffed::new("UTF-8 Unicode text", "text/plain")
        };
    }

    DATA
}

/// RIFF containers: WebP images and AVI video.
fn sniff_riff(head: &[u8]) -> Option<Sniffed> {
    if head.get(0..4)? != b"RIFF" {
        return None;
    }
    match head.get(8..12)? {
        b"WEBP" => Some(Sniffed::new(
            "RIFF (little-endian) data, Web/P image",
            "image/webp",
        )),
        b"AVI " => Some(Sniffed::new(
            "RIFF (little-endian) data, AVI, video",
            "video/x-msvideo",
        )),
        _ => None,
    }
}

/// ISO base media (`ftyp` box): MP4/QuickTime video or HEIF/AVIF images.
fn sniff_iso_media(head: &[u8]) -> Option<Sniffed> {
    if head.get(4..8)? != b"ftyp" {
        return None;
    }
    let kind = match head.get(8..12)? {
        b"qt  " => Sniffed::new("ISO Media, Apple QuickTime movie", "video/quicktime"),
        b"heic" | b"heix" | b"mif1" => Sniffed::new("ISO Media, HEIF image", "image/heif"),
        b"avif" => Sniffed::new("ISO Media, AVIF image", "image/avif"),
        _ => Sniffed::new("ISO Media, MP4 video", "video/mp4"),
    };
    Some(kind)
}

/// `BM` alone is too weak; also require a known DIB header size.
fn sniff_bmp(head: &[u8]) -> Option<Sniffed> {
    if head.get(0..2)? != b"BM" {
        return None;
    }
    let header: [u8; 4] = head.get(14..18)?.try_into().ok()?;
    match u32::from_le_bytes(header) {
        12 | 40 | 56 | 108 | 124 => Some(Sniffed::new("PC bitmap", "image/bmp")),
        _ => None,
    }
}

/// Valid UTF-8 without NUL bytes. A sequence cut off at the end counts as
/// valid only when the sample filled [`SNIFF_LEN`]; a shorter head is the
/// whole file.
fn is_text(head: &[u8]) -> bool {
    if head.contains(&0) {
        return false;
    }
    match std::str::from_utf8(head) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && head.len() == SNIFF_LEN,
    }
}

/// Reads up to [`SNIFF_LEN`] bytes of `path` and classifies them.
pub async fn sniff_file(path: &Path) -> std::io::Result<Sniffed> {
    let file = tokio::fs::File::open(path).await?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut head).await?;
    Ok(sniff_bytes(&head))
}
