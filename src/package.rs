//! Distribution metadata for `inf`.
//!
//! `Cargo.toml` is what cargo reads when building and installing the tool.
//! [`PACKAGE`] mirrors the same fields at compile time so the binary (and
//! its tests) can rely on them: the version shown by `--version`, the README
//! used as long description and the command/entry-point mapping.

/// Maps the installed command to the function it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    /// Name typed at the shell.
    pub command: &'static str,
    /// Crate that provides the callable.
    pub module: &'static str,
    /// Function invoked on start.
    pub function: &'static str,
}

/// Static package descriptor, read once and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct PackageDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub authors: &'static str,
    pub description: &'static str,
    pub long_description: &'static str,
    pub long_description_content_type: &'static str,
    pub homepage: &'static str,
    pub license: &'static str,
    pub platforms: &'static [&'static str],
    /// Oldest toolchain the crate builds with.
    pub rust_version: &'static str,
    /// User-facing runtime libraries, unpinned.
    pub runtime_dependencies: &'static [&'static str],
    pub entry_point: EntryPoint,
}

pub const PACKAGE: PackageDescriptor = PackageDescriptor {
    name: env!("CARGO_PKG_NAME"),
    version: env!("CARGO_PKG_VERSION"),
    authors: env!("CARGO_PKG_AUTHORS"),
    description: env!("CARGO_PKG_DESCRIPTION"),
    long_description: include_str!("../README.md"),
    long_description_content_type: "text/markdown",
    homepage: env!("CARGO_PKG_HOMEPAGE"),
    license: env!("CARGO_PKG_LICENSE"),
    platforms: &["POSIX"],
    rust_version: env!("CARGO_PKG_RUST_VERSION"),
    runtime_dependencies: &["comfy-table"],
    entry_point: EntryPoint {
        command: "inf",
        module: "inf",
        function: "main",
    },
};

impl PackageDescriptor {
    /// `major.minor.patch` of the package version.
    pub fn version_triple(&self) -> Option<(u64, u64, u64)> {
        parse_version(self.version)
    }

    /// Whether a toolchain of `version` meets the declared floor.
    pub fn supports_toolchain(&self, version: &str) -> bool {
        match (parse_version(version), parse_version(self.rust_version)) {
            (Some(actual), Some(floor)) => actual >= floor,
            _ => false,
        }
    }

    /// `module:function`, the form used by console-script declarations.
    pub fn entry_point_target(&self) -> String {
        format!("{}:{}", self.entry_point.module, self.entry_point.function)
    }
}

/// Parses `X.Y` or `X.Y.Z`, ignoring any pre-release suffix on the last part.
fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let core = version.split(['-', '+']).next()?;
    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = match parts.next() {
        Some(patch) => patch.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}
