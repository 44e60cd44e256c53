use std::fmt;

use bf8_vm::{filter_commands, render, Command};
use tracing::{debug, info};

use crate::artifact::{self, ArtifactName, BuildReport};
use crate::compose;
use crate::fingerprint::sha256_hex;
use crate::module_source::ModuleStore;
use crate::optimize::{self, OptimizeStats};
use crate::profile::{self, Profile};
use crate::strings;
use crate::validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub version: String,
    pub family: String,
    pub ext: String,
}

impl BuildOptions {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            family: artifact::DEFAULT_FAMILY.to_string(),
            ext: artifact::DEFAULT_EXT.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        for (field, value) in [
            ("version", &self.version),
            ("family", &self.family),
            ("ext", &self.ext),
        ] {
            validate::validate_name_component(field, value).map_err(|message| {
                CompilerError::new(CompileErrorKind::InvalidBuildOption, message)
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    MissingModule,
    CyclicInclusion,
    AmbiguousModule,
    InvalidModuleKey,
    Budget,
    InvalidBuildOption,
    Io,
    Internal,
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub kind: CompileErrorKind,
    pub message: String,
}

impl CompilerError {
    pub fn new(kind: CompileErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

impl fmt::Display for CompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompilerError {}

#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub name: String,
    pub commands: Vec<Command>,
    pub profile: Profile,
    pub modules: Vec<String>,
    pub optimize_stats: OptimizeStats,
    pub sha256: String,
}

impl BuildArtifact {
    /// Canonical artifact text.
    pub fn text(&self) -> String {
        render(&self.commands)
    }

    pub fn size_bytes(&self) -> usize {
        self.commands.len()
    }

    pub fn report(&self) -> BuildReport {
        BuildReport::new(
            self.name.clone(),
            self.size_bytes(),
            &self.profile,
            self.sha256.clone(),
            self.modules.clone(),
            self.optimize_stats,
        )
    }
}

/// Runs the whole pipeline on `source`: expand, lower, filter, optimize, profile, name.
pub fn build(
    source: &str,
    options: &BuildOptions,
    store: &dyn ModuleStore,
) -> Result<BuildArtifact, CompilerError> {
    options.validate()?;

    let expansion = compose::expand(source, store)?;
    let lowered = strings::lower(&expansion.text);
    debug!(bytes = lowered.len(), "string lowering finished");
    let filtered = filter_commands(&lowered);
    debug!(commands = filtered.len(), "command filter finished");
    let (commands, optimize_stats) = optimize::optimize_with_stats(&filtered);
    let profile = profile::profile(&commands);

    let name = ArtifactName {
        family: &options.family,
        version: &options.version,
        size_class: artifact::size_class(commands.len()),
        depth: profile.depth,
        cell_footprint: profile.cell_footprint,
        ext: &options.ext,
    }
    .to_string();
    let sha256 = sha256_hex(render(&commands).as_bytes());
    info!(name = %name, size = commands.len(), "build finished");

    Ok(BuildArtifact {
        name,
        commands,
        profile,
        modules: expansion.modules,
        optimize_stats,
        sha256,
    })
}
