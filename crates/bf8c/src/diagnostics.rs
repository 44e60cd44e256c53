use serde::Serialize;

use bf8_contracts::BF8DIAG_SCHEMA_VERSION;

use crate::compile::{CompileErrorKind, CompilerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compose,
    Profile,
    Build,
    Project,
    Io,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: &str, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            severity: Severity::Error,
            stage,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn warning(code: &str, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, stage, message)
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl CompileErrorKind {
    pub fn code_str(self) -> &'static str {
        match self {
            CompileErrorKind::MissingModule => "BF8-COMPOSE-MISSING",
            CompileErrorKind::CyclicInclusion => "BF8-COMPOSE-CYCLE",
            CompileErrorKind::AmbiguousModule => "BF8-COMPOSE-AMBIGUOUS",
            CompileErrorKind::InvalidModuleKey => "BF8-COMPOSE-KEY",
            CompileErrorKind::Budget => "BF8-COMPOSE-BUDGET",
            CompileErrorKind::InvalidBuildOption => "BF8-BUILD-OPTION",
            CompileErrorKind::Io => "BF8-IO-READ",
            CompileErrorKind::Internal => "BF8-INTERNAL",
        }
    }

    fn stage(self) -> Stage {
        match self {
            CompileErrorKind::MissingModule
            | CompileErrorKind::CyclicInclusion
            | CompileErrorKind::AmbiguousModule
            | CompileErrorKind::InvalidModuleKey
            | CompileErrorKind::Budget => Stage::Compose,
            CompileErrorKind::InvalidBuildOption | CompileErrorKind::Internal => Stage::Build,
            CompileErrorKind::Io => Stage::Io,
        }
    }
}

impl From<&CompilerError> for Diagnostic {
    fn from(err: &CompilerError) -> Self {
        let d = Diagnostic::error(err.kind.code_str(), err.kind.stage(), err.message.clone());
        match err.kind {
            CompileErrorKind::CyclicInclusion => {
                d.with_note("a module may not include itself, directly or through other modules")
            }
            CompileErrorKind::MissingModule => {
                d.with_note("module keys resolve to <module_root>/<key>.bf")
            }
            _ => d,
        }
    }
}

/// Diagnostic for a failure that is not a [`CompilerError`]: file access is `BF8-IO-READ`,
/// anything else (manifest JSON, schema or path checks) is `BF8-PROJECT`.
pub fn load_failure(err: &anyhow::Error) -> Diagnostic {
    let message = format!("{err:#}");
    if err.chain().any(|cause| cause.is::<std::io::Error>()) {
        Diagnostic::error("BF8-IO-READ", Stage::Io, message)
    } else {
        Diagnostic::error("BF8-PROJECT", Stage::Project, message)
            .with_note("see bf8.json: schema_version, entry, module_roots, out_dir")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub schema_version: String,
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn ok() -> Self {
        Self {
            schema_version: BF8DIAG_SCHEMA_VERSION.to_string(),
            ok: true,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            a.code
                .cmp(&b.code)
                .then_with(|| a.message.cmp(&b.message))
        });
        self.ok = diagnostics.iter().all(|d| d.severity != Severity::Error);
        self.diagnostics = diagnostics;
        self
    }
}
