//! Inclusion expansion.
//!
//! A directive `(key)` is replaced by the fully expanded text of module `key`.
//! Expansion runs in two phases: a worklist pass resolves every reachable module
//! exactly once into an arena, then a depth-first pass expands modules bottom-up,
//! keeping the chain of modules currently being expanded to report cycles.
//! Substituted text is rescanned, since it can form new directives with its neighbours.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::compile::{CompileErrorKind, CompilerError};
use crate::language;
use crate::module_source::{ModuleSource, ModuleStore};
use crate::validate;

/// Label used in diagnostics for directives found in the entry text.
pub const ENTRY_LABEL: &str = "<entry>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// Keys of every module that was included, sorted.
    pub modules: Vec<String>,
}

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([A-Za-z0-9_/]+)\)").expect("valid directive regex"))
}

/// Distinct directive keys in order of first appearance.
pub fn directives(text: &str) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for caps in directive_re().captures_iter(text) {
        if let Some(m) = caps.get(1) {
            if !out.contains(&m.as_str()) {
                out.push(m.as_str());
            }
        }
    }
    out
}

pub fn expand(text: &str, store: &dyn ModuleStore) -> Result<Expansion, CompilerError> {
    let arena = resolve_modules(text, store)?;
    let mut expander = Expander {
        store,
        arena,
        expanded: BTreeMap::new(),
        chain: Vec::new(),
        max_bytes: language::limits::max_expanded_bytes(),
    };
    let text = expander.substitute(text)?;
    debug!(
        modules = expander.arena.len(),
        bytes = text.len(),
        "inclusion expansion finished"
    );
    Ok(Expansion {
        text,
        modules: expander.arena.keys().cloned().collect(),
    })
}

fn fetch_module(
    store: &dyn ModuleStore,
    key: &str,
    referrer: &str,
) -> Result<ModuleSource, CompilerError> {
    validate::validate_module_key(key).map_err(|message| {
        CompilerError::new(
            CompileErrorKind::InvalidModuleKey,
            format!("{message} (included from {referrer:?})"),
        )
    })?;
    store.read_module(key)?.ok_or_else(|| {
        CompilerError::new(
            CompileErrorKind::MissingModule,
            format!("unknown module: {key:?} (included from {referrer:?})"),
        )
    })
}

fn resolve_modules(
    entry: &str,
    store: &dyn ModuleStore,
) -> Result<BTreeMap<String, ModuleSource>, CompilerError> {
    let mut arena: BTreeMap<String, ModuleSource> = BTreeMap::new();
    let mut worklist: VecDeque<(String, String)> = directives(entry)
        .into_iter()
        .map(|key| (key.to_string(), ENTRY_LABEL.to_string()))
        .collect();

    while let Some((key, referrer)) = worklist.pop_front() {
        if arena.contains_key(&key) {
            continue;
        }
        let module = fetch_module(store, &key, &referrer)?;
        for dep in directives(&module.src) {
            if !arena.contains_key(dep) {
                worklist.push_back((dep.to_string(), key.clone()));
            }
        }
        arena.insert(key, module);
    }
    Ok(arena)
}

struct Expander<'a> {
    store: &'a dyn ModuleStore,
    arena: BTreeMap<String, ModuleSource>,
    expanded: BTreeMap<String, String>,
    chain: Vec<String>,
    max_bytes: usize,
}

impl Expander<'_> {
    fn label(&self) -> &str {
        self.chain.last().map_or(ENTRY_LABEL, String::as_str)
    }

    /// Expands `text` until no directive is left. Substituted text can join with its
    /// surroundings into a new directive, so the result is rescanned.
    fn substitute(&mut self, text: &str) -> Result<String, CompilerError> {
        let mut out = self.substitute_once(text)?;
        let mut seen: HashSet<String> = HashSet::new();
        while directive_re().is_match(&out) {
            if !seen.insert(out.clone()) {
                return Err(CompilerError::new(
                    CompileErrorKind::CyclicInclusion,
                    format!(
                        "cyclic inclusion: directives keep re-forming in {:?}",
                        self.label()
                    ),
                ));
            }
            debug!(in_module = self.label(), bytes = out.len(), "rescanning expanded text");
            out = self.substitute_once(&out)?;
        }
        Ok(out)
    }

    fn substitute_once(&mut self, text: &str) -> Result<String, CompilerError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0usize;
        for caps in directive_re().captures_iter(text) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&text[last..whole.start()]);
            let body = self.expand_module(key.as_str())?;
            out.push_str(&body);
            last = whole.end();
            self.check_budget(out.len())?;
        }
        out.push_str(&text[last..]);
        self.check_budget(out.len())?;
        Ok(out)
    }

    fn expand_module(&mut self, key: &str) -> Result<String, CompilerError> {
        if let Some(done) = self.expanded.get(key) {
            return Ok(done.clone());
        }
        if let Some(pos) = self.chain.iter().position(|k| k == key) {
            let mut cycle: Vec<&str> = self.chain[pos..].iter().map(String::as_str).collect();
            cycle.push(key);
            return Err(CompilerError::new(
                CompileErrorKind::CyclicInclusion,
                format!("cyclic inclusion: {}", cycle.join(" -> ")),
            ));
        }
        // Keys formed during a rescan were not visible to the resolution pass.
        let src = match self.arena.get(key) {
            Some(module) => module.src.clone(),
            None => {
                let module = fetch_module(self.store, key, self.label())?;
                let src = module.src.clone();
                self.arena.insert(key.to_string(), module);
                src
            }
        };

        self.chain.push(key.to_string());
        let body = self.substitute(&src)?;
        self.chain.pop();

        self.expanded.insert(key.to_string(), body.clone());
        Ok(body)
    }

    fn check_budget(&self, len: usize) -> Result<(), CompilerError> {
        if len > self.max_bytes {
            return Err(CompilerError::new(
                CompileErrorKind::Budget,
                format!(
                    "expanded program exceeds {} bytes (set BF8_MAX_EXPANDED_BYTES to raise the limit)",
                    self.max_bytes
                ),
            ));
        }
        Ok(())
    }
}
