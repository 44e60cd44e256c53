pub mod artifact;
pub mod compile;
pub mod compose;
pub mod diagnostics;
pub mod language;
pub mod module_source;
pub mod optimize;
pub mod profile;
pub mod project;
pub mod strings;
pub mod validate;

mod fingerprint;
