use chrono::{DateTime, Local};
use std::fs::Metadata;
use std::time::SystemTime;

use crate::model::InfoEntry;

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human-readable size with two decimals, e.g. `1.50 KB`.
///
/// Units stop at TB; larger sizes stay expressed in TB.
pub fn format_size(size: u64) -> String {
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Local time in `ctime(3)` layout without the trailing newline.
pub fn format_mtime(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%a %b %e %H:%M:%S %Y")
        .to_string()
}

/// `ls -l` style type flag plus `rwx` triplets.
pub fn mode_string(is_dir: bool, mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    let mut out = String::with_capacity(10);
    out.push(if is_dir { 'd' } else { '-' });
    for (bit, flag) in BITS {
        out.push(if mode & bit != 0 { flag } else { '-' });
    }
    out
}

#[cfg(unix)]
pub fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    mode_string(metadata.is_dir(), metadata.permissions().mode())
}

#[cfg(not(unix))]
pub fn permission_string(metadata: &Metadata) -> String {
    let mode = if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    };
    mode_string(metadata.is_dir(), mode)
}

/// `Size`, `Last modified` and `Permissions`, in that order.
///
/// `Last modified` is skipped on platforms that do not record it.
pub fn basic_entries(metadata: &Metadata) -> Vec<InfoEntry> {
    let mut entries = vec![InfoEntry::new("Size", format_size(metadata.len()))];
    if let Ok(modified) = metadata.modified() {
        entries.push(InfoEntry::new("Last modified", format_mtime(modified)));
    }
    entries.push(InfoEntry::new("Permissions", permission_string(metadata)));
    entries
}
