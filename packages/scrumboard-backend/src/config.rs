/// Configuration for the Scrumboard Backend.
/// Reads server.json from ~/.config/scrumboard/server.json (or platform equivalent).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Directory for stories and board-scoped column state.
    #[serde(default)]
    pub data_dir: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            data_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("scrumboard"),
        }
    }
}

/// Default config path: ~/.config/scrumboard/server.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scrumboard")
        .join("server.json")
}

/// Load config from path. Returns default if file doesn't exist.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config {}: {}", path.display(), e);
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!("No config at {}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/scrumboard/server.json"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"port": 9191, "data_dir": "/tmp/scrum"}}"#).unwrap();

        let config = load_config(tmp.path());
        assert_eq!(config.port, 9191);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/scrum"));
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "port = 9191").unwrap();
        assert_eq!(load_config(tmp.path()).port, 8080);
    }
}
