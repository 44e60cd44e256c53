use std::collections::BTreeMap;
use std::path::PathBuf;

use bf8_contracts::MODULE_FILE_EXT;
use tracing::debug;

use crate::compile::{CompileErrorKind, CompilerError};
use crate::validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    pub key: String,
    pub src: String,
    pub path: Option<PathBuf>,
}

/// Lookup of module text by key.
///
/// `Ok(None)` means the store has no such module; the caller decides how to report it.
pub trait ModuleStore {
    fn read_module(&self, key: &str) -> Result<Option<ModuleSource>, CompilerError>;
}

/// Resolves `<root>/<key>.bf` across a list of module roots.
#[derive(Debug, Clone, Default)]
pub struct FsModuleStore {
    roots: Vec<PathBuf>,
}

impl FsModuleStore {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ModuleStore for FsModuleStore {
    fn read_module(&self, key: &str) -> Result<Option<ModuleSource>, CompilerError> {
        validate::validate_module_key(key)
            .map_err(|message| CompilerError::new(CompileErrorKind::InvalidModuleKey, message))?;

        let mut rel = PathBuf::new();
        for seg in key.split('/') {
            rel.push(seg);
        }
        rel.set_extension(MODULE_FILE_EXT);

        let mut hits: Vec<PathBuf> = Vec::new();
        for root in &self.roots {
            let path = root.join(&rel);
            if path.is_file() {
                hits.push(path);
            }
        }

        match hits.len() {
            0 => Ok(None),
            1 => {
                let path = hits.remove(0);
                let src = std::fs::read_to_string(&path).map_err(|e| {
                    CompilerError::new(
                        CompileErrorKind::Io,
                        format!("read module {key:?} at {}: {e}", path.display()),
                    )
                })?;
                debug!(module = key, path = %path.display(), bytes = src.len(), "module read");
                Ok(Some(ModuleSource {
                    key: key.to_string(),
                    src,
                    path: Some(path),
                }))
            }
            _ => Err(CompilerError::new(
                CompileErrorKind::AmbiguousModule,
                format!("module {key:?} is ambiguous across roots: {hits:?}"),
            )),
        }
    }
}

/// In-memory module table.
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleStore {
    modules: BTreeMap<String, String>,
}

impl MemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, key: impl Into<String>, src: impl Into<String>) -> Self {
        self.insert(key, src);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, src: impl Into<String>) {
        self.modules.insert(key.into(), src.into());
    }
}

impl ModuleStore for MemoryModuleStore {
    fn read_module(&self, key: &str) -> Result<Option<ModuleSource>, CompilerError> {
        Ok(self.modules.get(key).map(|src| ModuleSource {
            key: key.to_string(),
            src: src.clone(),
            path: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_store_resolves_nested_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("add")).expect("mkdir");
        std::fs::write(dir.path().join("add/a.bf"), "+++").expect("write module");

        let store = FsModuleStore::new(vec![dir.path().to_path_buf()]);
        let m = store
            .read_module("add/a")
            .expect("read module")
            .expect("module present");
        assert_eq!(m.src, "+++");
        assert_eq!(m.path, Some(dir.path().join("add/a.bf")));

        assert!(store.read_module("add/b").expect("lookup").is_none());
    }

    #[test]
    fn fs_store_rejects_ambiguous_key() {
        let a = tempfile::tempdir().expect("tempdir");
        let b = tempfile::tempdir().expect("tempdir");
        std::fs::write(a.path().join("m.bf"), "+").expect("write module");
        std::fs::write(b.path().join("m.bf"), "-").expect("write module");

        let store = FsModuleStore::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let err = store.read_module("m").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::AmbiguousModule);
    }

    #[test]
    fn fs_store_rejects_bad_key() {
        let store = FsModuleStore::new(Vec::new());
        let err = store.read_module("a//b").unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidModuleKey);
    }
}
