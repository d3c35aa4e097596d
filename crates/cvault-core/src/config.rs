use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VaultError, VaultResult};

/// Top-level CLI configuration (loaded from cvault.toml)
///
/// Argon2id parameters are intentionally not part of the schema: a blob can
/// only be decrypted with the parameters it was sealed with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub log: LogConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Suffix appended to the original filename of an encrypted file
    pub encrypted_suffix: String,
    /// Directory for written files (default: current directory)
    pub output_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            encrypted_suffix: ".encrypted".into(),
            output_dir: None,
        }
    }
}

impl VaultConfig {
    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> VaultResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| VaultError::Config(format!("parsing {}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[log]
level = "debug"
format = "json"

[files]
encrypted_suffix = ".cvlt"
output_dir = "/tmp/out"
"#;
        let config = VaultConfig::parse(toml_str).unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, "json");
        assert_eq!(config.files.encrypted_suffix, ".cvlt");
        assert_eq!(config.files.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_parse_defaults() {
        let config = VaultConfig::parse("").unwrap();

        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, "text");
        assert_eq!(config.files.encrypted_suffix, ".encrypted");
        assert!(config.files.output_dir.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config = VaultConfig::parse("[log]\nlevel = \"trace\"\n").unwrap();

        // Overridden
        assert_eq!(config.log.level, "trace");
        // Defaults
        assert_eq!(config.log.format, "text");
        assert_eq!(config.files.encrypted_suffix, ".encrypted");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = VaultConfig::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.files.encrypted_suffix, ".encrypted");
    }

    #[test]
    fn test_load_invalid_file_is_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cvault.toml");
        std::fs::write(&path, "[log\nlevel = ").unwrap();

        let err = VaultConfig::load(&path).unwrap_err();
        assert!(matches!(err, VaultError::Config(_)));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = VaultConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = VaultConfig::parse(&toml_str).unwrap();

        assert_eq!(config.log.level, parsed.log.level);
        assert_eq!(config.files.encrypted_suffix, parsed.files.encrypted_suffix);
    }
}
