//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::BuilderConfig;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "verdict.toml";

/// Loads and validates a `verdict.toml` configuration from a project directory.
///
/// A missing file yields the default configuration; any other read error is
/// reported.
pub fn load_config(project_dir: &Path) -> Result<BuilderConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    match std::fs::read_to_string(&config_path) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BuilderConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Parses and validates a `verdict.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<BuilderConfig, ConfigError> {
    let config: BuilderConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &BuilderConfig) -> Result<(), ConfigError> {
    if config.build.batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "build.batch_size must be positive".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CyclePolicy, DEFAULT_BATCH_SIZE};

    #[test]
    fn empty_config_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.build.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.build.cycle_policy, CyclePolicy::Approximate);
        assert!(config.build.full_build_fallback);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[build]
batch_size = 50
cycle_policy = "reject"
full_build_fallback = false
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.build.batch_size, 50);
        assert_eq!(config.build.cycle_policy, CyclePolicy::Reject);
        assert!(!config.build.full_build_fallback);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = load_config_from_str("[build]\nbatch_size = 7\n").unwrap();
        assert_eq!(config.build.batch_size, 7);
        assert_eq!(config.build.cycle_policy, CyclePolicy::Approximate);
    }

    #[test]
    fn zero_batch_size_errors() {
        let err = load_config_from_str("[build]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_policy_errors() {
        let err = load_config_from_str("[build]\ncycle_policy = \"ignore\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[build]\nbatch_size = 3\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.build.batch_size, 3);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config, crate::types::BuilderConfig::default());
    }
}
