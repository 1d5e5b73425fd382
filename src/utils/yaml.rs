use crate::error::Result;

/// Parse config text once so broken YAML never reaches the backend.
pub fn validate_yaml(text: &str) -> Result<()> {
    serde_yaml::from_str::<serde_yaml::Value>(text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdminError;

    #[test]
    fn test_valid_config() {
        let text = "layers:\n  - name: osm\n    sources: [osm_cache]\ncaches:\n  osm_cache:\n    grids: [webmercator]\n";
        assert!(validate_yaml(text).is_ok());
        assert!(validate_yaml("").is_ok());
    }

    #[test]
    fn test_broken_config() {
        let err = validate_yaml("layers:\n  - name: osm\n   bad: [").unwrap_err();
        assert!(matches!(err, AdminError::Yaml(_)));
        assert!(err.to_string().starts_with("invalid yaml"));
    }
}
