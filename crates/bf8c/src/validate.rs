/// Module keys are `/`-separated paths of `[A-Za-z0-9_]+` segments, relative to a module root.
pub fn validate_module_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("module key must not be empty".to_string());
    }
    if key.starts_with('/') {
        return Err(format!(
            "invalid module key (must be relative): {key:?}"
        ));
    }
    for seg in key.split('/') {
        if seg.is_empty() {
            return Err(format!("invalid module key (empty segment): {key:?}"));
        }
        if seg == "." || seg == ".." {
            return Err(format!(
                "invalid module key (dot segments are not allowed): {key:?}"
            ));
        }
        for c in seg.chars() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!(
                    "invalid module key segment char (allowed [A-Za-z0-9_]): {key:?} segment={seg:?}"
                ));
            }
        }
    }
    Ok(())
}

/// Artifact name components end up in a file name.
pub fn validate_name_component(field: &str, raw: &str) -> Result<(), String> {
    if raw.is_empty() {
        return Err(format!("{field} must be non-empty"));
    }
    if raw
        .chars()
        .any(|c| c == '\0' || c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(format!(
            "{field} must not contain whitespace, '/', '\\\\', or NUL: {raw:?}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_keys() {
        assert!(validate_module_key("main").is_ok());
        assert!(validate_module_key("decode/ab_command").is_ok());
        assert!(validate_module_key("add/9").is_ok());

        assert!(validate_module_key("").is_err());
        assert!(validate_module_key("/abs").is_err());
        assert!(validate_module_key("a//b").is_err());
        assert!(validate_module_key("a/").is_err());
        assert!(validate_module_key("a/../b").is_err());
        assert!(validate_module_key("a-b").is_err());
    }

    #[test]
    fn name_components() {
        assert!(validate_name_component("version", "1.2.0").is_ok());
        assert!(validate_name_component("version", "").is_err());
        assert!(validate_name_component("version", "1 2").is_err());
        assert!(validate_name_component("family", "a/b").is_err());
    }
}
