use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use bf8_contracts::PROJECT_MANIFEST_SCHEMA_VERSIONS_SUPPORTED;
use serde::Deserialize;

use crate::artifact;
use crate::compile::{self, BuildArtifact, BuildOptions};
use crate::module_source::FsModuleStore;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    pub schema_version: String,
    pub entry: String,
    pub module_roots: Vec<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub out_dir: Option<String>,
}

/// Manifest fields resolved against the manifest's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub entry: PathBuf,
    pub module_roots: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub family: String,
    pub ext: String,
}

fn validate_rel_path(field: &str, raw: &str) -> Result<()> {
    if raw.is_empty() {
        anyhow::bail!("{field} must be non-empty");
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        anyhow::bail!("{field} must be a relative path, got {:?}", raw);
    }
    for component in path.components() {
        if component == Component::ParentDir {
            anyhow::bail!("{field} must not contain '..' segments: {:?}", raw)
        }
    }
    Ok(())
}

fn normalize_string_in_place(s: &mut String) {
    if s.trim() != s {
        *s = s.trim().to_string();
    }
}

fn normalize_opt_in_place(s: &mut Option<String>) {
    if let Some(v) = s.as_mut() {
        normalize_string_in_place(v);
    }
    if s.as_deref() == Some("") {
        *s = None;
    }
}

pub fn load_project_manifest(path: &Path) -> Result<ProjectManifest> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("[BF8PROJECT_READ] read project: {}", path.display()))?;
    parse_project_manifest_bytes(&bytes, path)
}

pub fn parse_project_manifest_bytes(bytes: &[u8], path: &Path) -> Result<ProjectManifest> {
    let mut m: ProjectManifest = serde_json::from_slice(bytes)
        .with_context(|| format!("[BF8PROJECT_PARSE] parse project JSON: {}", path.display()))?;

    normalize_string_in_place(&mut m.schema_version);
    normalize_string_in_place(&mut m.entry);
    for root in &mut m.module_roots {
        normalize_string_in_place(root);
    }
    normalize_opt_in_place(&mut m.family);
    normalize_opt_in_place(&mut m.ext);
    normalize_opt_in_place(&mut m.out_dir);

    if !PROJECT_MANIFEST_SCHEMA_VERSIONS_SUPPORTED
        .iter()
        .any(|v| *v == m.schema_version)
    {
        anyhow::bail!(
            "project schema_version mismatch: expected one of {:?} got {:?}",
            PROJECT_MANIFEST_SCHEMA_VERSIONS_SUPPORTED,
            m.schema_version
        );
    }

    validate_rel_path("project.entry", &m.entry)?;
    if m.module_roots.is_empty() {
        anyhow::bail!("project.module_roots must list at least one root");
    }
    for root in &m.module_roots {
        validate_rel_path("project.module_roots[]", root)?;
    }
    if let Some(out_dir) = &m.out_dir {
        validate_rel_path("project.out_dir", out_dir)?;
    }
    Ok(m)
}

impl ProjectManifest {
    pub fn resolve(&self, project_path: &Path) -> ResolvedProject {
        let base = project_path.parent().unwrap_or_else(|| Path::new(""));
        ResolvedProject {
            entry: base.join(&self.entry),
            module_roots: self.module_roots.iter().map(|r| base.join(r)).collect(),
            out_dir: base.join(self.out_dir.as_deref().unwrap_or("build")),
            family: self
                .family
                .clone()
                .unwrap_or_else(|| artifact::DEFAULT_FAMILY.to_string()),
            ext: self
                .ext
                .clone()
                .unwrap_or_else(|| artifact::DEFAULT_EXT.to_string()),
        }
    }
}

impl ResolvedProject {
    pub fn build_options(&self, version: &str) -> BuildOptions {
        BuildOptions {
            version: version.to_string(),
            family: self.family.clone(),
            ext: self.ext.clone(),
        }
    }

    /// Reads the entry file and runs the build pipeline over it.
    pub fn build(&self, version: &str) -> Result<BuildArtifact> {
        let source = std::fs::read_to_string(&self.entry).with_context(|| {
            format!(
                "[BF8ENTRY_READ] read entry: {} (hint: check bf8.json `entry`)",
                self.entry.display()
            )
        })?;
        let store = FsModuleStore::new(self.module_roots.clone());
        Ok(compile::build(&source, &self.build_options(version), &store)?)
    }
}

/// Loads the manifest at `project_path` and builds its entry.
pub fn build_project(project_path: &Path, version: &str) -> Result<(ResolvedProject, BuildArtifact)> {
    let project = load_project_manifest(project_path)?.resolve(project_path);
    let artifact = project.build(version)?;
    Ok((project, artifact))
}
