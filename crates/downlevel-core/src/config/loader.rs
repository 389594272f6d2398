//! Configuration file discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use super::DownlevelConfig;
use crate::error::DownlevelError;
use crate::result::Result;

/// File names searched in each directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".downlevelrc.json",
    ".downlevelrc.toml",
    "downlevel.json",
    "downlevel.toml",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Find a config file by walking upward from `start_path`
    ///
    /// `start_path` may be a file; the search then starts in its directory.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let canonical = start_path
            .canonicalize()
            .map_err(|e| DownlevelError::config_error(format!("Invalid path: {e}")))?;
        let mut current = if canonical.is_file() {
            canonical.parent().map(Path::to_path_buf)
        } else {
            Some(canonical)
        };

        while let Some(dir) = current {
            for filename in CONFIG_FILE_NAMES {
                let config_path = dir.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }
            current = dir.parent().map(Path::to_path_buf);
        }

        Ok(None)
    }

    /// Load configuration from a specific file, JSON or TOML by extension
    pub fn load_from_file(path: &Path) -> Result<DownlevelConfig> {
        let content = fs::read_to_string(path).map_err(|e| DownlevelError::io_error(path, e))?;
        let invalid = |message: String| {
            DownlevelError::config_error(format!(
                "Failed to load config from '{}': {message}",
                path.display()
            ))
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| invalid(e.to_string())),
            Some("toml") => toml::from_str(&content).map_err(|e| invalid(e.to_string())),
            _ => Err(invalid(
                "unsupported file extension (expected .json or .toml)".to_string(),
            )),
        }
    }

    /// Load the explicit config if given, else the discovered one, else
    /// defaults
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<DownlevelConfig> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(DownlevelError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Self::load_from_file(path);
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        match Self::auto_discover(search_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(DownlevelConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rewrite::PassKind;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "downlevel.json",
            r#"{ "$schema": "./schema.json", "passes": { "records": false } }"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert!(!config.pass_enabled(PassKind::Records));
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            ".downlevelrc.toml",
            r#"
[nullable]
rewriteBodies = true

[files]
exclude = ["**/Generated/**"]
"#,
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert!(config.rewrite_options().nullable_bodies);
        assert_eq!(config.exclude_patterns(), vec!["**/Generated/**"]);
    }

    #[test]
    fn test_auto_discover_from_nested_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "downlevel.toml", "");

        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "downlevel.toml");
    }

    #[test]
    fn test_auto_discover_from_file() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "downlevel.json", "{}");
        let source = create_temp_config(temp_dir.path(), "Program.cs", "class C { }");

        let found = ConfigLoader::auto_discover(&source).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), "downlevel.json");
    }

    #[test]
    fn test_auto_discover_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "downlevel.json", "{}");
        create_temp_config(temp_dir.path(), ".downlevelrc.toml", "");
        create_temp_config(temp_dir.path(), ".downlevelrc.json", "{}");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap();
        assert_eq!(found.unwrap().file_name().unwrap(), ".downlevelrc.json");
    }

    #[test]
    fn test_explicit_path_wins() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), ".downlevelrc.json", r#"{"output": {"backup": true}}"#);
        let explicit = create_temp_config(temp_dir.path(), "custom.json", "{}");

        let config = ConfigLoader::load(Some(explicit.as_path()), Some(temp_dir.path())).unwrap();
        assert!(!config.backup());
        let config = ConfigLoader::load(None, Some(temp_dir.path())).unwrap();
        assert!(config.backup());
    }

    #[test]
    fn test_errors() {
        let missing = ConfigLoader::load(Some(Path::new("nonexistent.json")), None);
        assert_eq!(missing.unwrap_err().kind(), ErrorKind::Config);

        let temp_dir = TempDir::new().unwrap();
        let invalid = create_temp_config(temp_dir.path(), "downlevel.json", "{ invalid json }");
        assert_eq!(
            ConfigLoader::load_from_file(&invalid).unwrap_err().kind(),
            ErrorKind::Config
        );

        let unknown = create_temp_config(temp_dir.path(), "downlevel.yaml", "passes: {}");
        assert!(ConfigLoader::load_from_file(&unknown).is_err());
    }
}
