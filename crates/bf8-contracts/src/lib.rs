//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for schema/version strings that
//! appear in machine-readable I/O of `bf8-vm` and `bf8c`.

pub const BF8_LANG_ID: &str = "bf8-core@0.1.0";

pub const BF8_VM_REPORT_SCHEMA_VERSION: &str = "bf8-vm.report@0.1.0";
pub const BF8C_REPORT_SCHEMA_VERSION: &str = "bf8c.report@0.1.0";
pub const BF8C_PROFILE_SCHEMA_VERSION: &str = "bf8c.profile@0.1.0";
pub const BF8DIAG_SCHEMA_VERSION: &str = "bf8.diag@0.1.0";

pub const PROJECT_MANIFEST_SCHEMA_VERSION: &str = "bf8.project@0.1.0";
pub const PROJECT_MANIFEST_SCHEMA_VERSIONS_SUPPORTED: &[&str] = &[PROJECT_MANIFEST_SCHEMA_VERSION];

/// File extension of source modules resolved from module roots.
pub const MODULE_FILE_EXT: &str = "bf";
