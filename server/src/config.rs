//! YAML configuration for the prediction server.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:8501`.
    pub listen_addr: String,
    /// Fitted pipeline written by `potability-train`.
    pub artifact_path: PathBuf,
    /// Largest accepted request body (uploaded CSV included).
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8501".to_string(),
            artifact_path: PathBuf::from("improved_xgboost_model.bin"),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Load a [`ServerConfig`] from a YAML file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the YAML is invalid.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
    let config: ServerConfig = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config YAML: {}", e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper to write YAML to a temp file and return the path.
    fn write_yaml(yaml: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(yaml.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_load_config_full() {
        let yaml = r#"
listen_addr: "0.0.0.0:9000"
artifact_path: "model/improved_xgboost_model.bin"
max_body_bytes: 1048576
"#;
        let f = write_yaml(yaml);
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(
            config.artifact_path,
            PathBuf::from("model/improved_xgboost_model.bin")
        );
        assert_eq!(config.max_body_bytes, 1_048_576);
    }

    #[test]
    fn test_load_config_partial_uses_defaults() {
        let f = write_yaml("listen_addr: \"127.0.0.1:3000\"\n");
        let config = load_config(f.path()).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.artifact_path, ServerConfig::default().artifact_path);
        assert_eq!(
            config.max_body_bytes,
            ServerConfig::default().max_body_bytes
        );
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/config.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_yaml() {
        let f = write_yaml("max_body_bytes: [not, a, number]\n");
        let err = load_config(f.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
