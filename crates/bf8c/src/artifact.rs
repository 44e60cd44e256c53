use std::fmt;

use serde::Serialize;

use crate::optimize::OptimizeStats;
use crate::profile::Profile;

pub const DEFAULT_FAMILY: &str = "bf8";
pub const DEFAULT_EXT: &str = bf8_contracts::MODULE_FILE_EXT;

/// Kilobyte size class: the size in KB (three decimals) taken up to the next integer.
pub fn size_class(size_bytes: usize) -> usize {
    size_bytes / 1024 + 1
}

pub fn size_kb(size_bytes: usize) -> f64 {
    (size_bytes as f64 / 1024.0 * 1000.0).round() / 1000.0
}

/// `{family}_v{version}+{size_class}.{depth}.{cell_footprint}.{ext}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactName<'a> {
    pub family: &'a str,
    pub version: &'a str,
    pub size_class: usize,
    pub depth: u64,
    pub cell_footprint: usize,
    pub ext: &'a str,
}

impl fmt::Display for ArtifactName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_v{}+{}.{}.{}.{}",
            self.family, self.version, self.size_class, self.depth, self.cell_footprint, self.ext
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    pub schema_version: &'static str,
    pub name: String,
    pub size_bytes: usize,
    pub size_kb: f64,
    pub size_class: usize,
    pub depth: u64,
    pub cell_footprint: usize,
    pub profile_truncated: bool,
    pub sha256: String,
    pub modules: Vec<String>,
    pub optimize: OptimizeStats,
}

impl BuildReport {
    pub(crate) fn new(
        name: String,
        size_bytes: usize,
        profile: &Profile,
        sha256: String,
        modules: Vec<String>,
        optimize: OptimizeStats,
    ) -> Self {
        Self {
            schema_version: bf8_contracts::BF8C_REPORT_SCHEMA_VERSION,
            name,
            size_bytes,
            size_kb: size_kb(size_bytes),
            size_class: size_class(size_bytes),
            depth: profile.depth,
            cell_footprint: profile.cell_footprint,
            profile_truncated: profile.truncated,
            sha256,
            modules,
            optimize,
        }
    }
}
