//! Configuration management for Datadesk.
//!
//! Handles loading configuration from TOML files and environment variables:
//! workspace directory layout, warehouse session options, and the report
//! protection tag.

use crate::error::{DatadeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Datadesk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Workspace directory names, resolved against a root at run time.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Warehouse session options.
    #[serde(default)]
    pub warehouse: WarehouseConfig,

    /// Report protection settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Directory names for the conventional workspace layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_input")]
    pub input: String,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_queries")]
    pub queries: String,

    #[serde(default = "default_tracker")]
    pub tracker: String,
}

fn default_input() -> String {
    "input_data".to_string()
}

fn default_output() -> String {
    "output_data".to_string()
}

fn default_queries() -> String {
    "query_files".to_string()
}

fn default_tracker() -> String {
    "pass_tracker".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            queries: default_queries(),
            tracker: default_tracker(),
        }
    }
}

/// Options threaded into the warehouse session parameter set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseConfig {
    /// Schema selected for warehouse queries.
    pub schema: Option<String>,

    /// Virtual warehouse to run on.
    pub warehouse: Option<String>,
}

/// Report protection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Tag prefixed to generated protection passwords.
    #[serde(default = "default_report_key")]
    pub key: String,
}

fn default_report_key() -> String {
    "rpt".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            key: default_report_key(),
        }
    }
}

/// Absolute workspace directories for one task.
///
/// Built explicitly from a root and passed into every operation; no ambient
/// mutable path state survives between tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub query_dir: PathBuf,
    pub tracker_dir: PathBuf,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("datadesk")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DatadeskError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DatadeskError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Resolves the workspace directories against `root`, honoring
    /// `DATADESK_*_DIR` environment overrides.
    pub fn workspace(&self, root: &Path) -> Workspace {
        let dir = |env_key: &str, name: &str| -> PathBuf {
            std::env::var(env_key)
                .map(PathBuf::from)
                .unwrap_or_else(|_| root.join(name))
        };

        Workspace {
            input_dir: dir("DATADESK_INPUT_DIR", &self.paths.input),
            output_dir: dir("DATADESK_OUTPUT_DIR", &self.paths.output),
            query_dir: dir("DATADESK_QUERY_DIR", &self.paths.queries),
            tracker_dir: dir("DATADESK_TRACKER_DIR", &self.paths.tracker),
        }
    }

    /// Creates the conventional workspace directories under `root`.
    ///
    /// Fails if any of them already exists, so an accidental re-init cannot
    /// silently adopt a populated directory.
    pub fn init_workspace(&self, root: &Path) -> Result<Workspace> {
        let workspace = self.workspace(root);

        for dir in [
            &workspace.input_dir,
            &workspace.output_dir,
            &workspace.query_dir,
            &workspace.tracker_dir,
        ] {
            if dir.exists() {
                return Err(DatadeskError::config(format!(
                    "Directory {} already exists",
                    dir.display()
                )));
            }
            std::fs::create_dir_all(dir).map_err(|e| {
                DatadeskError::config(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }

        Ok(workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[paths]
output = "exports"
queries = "sql"

[warehouse]
schema = "analytics"
warehouse = "compute_wh"

[report]
key = "hp"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.paths.output, "exports");
        assert_eq!(config.paths.queries, "sql");
        // Unset path entries keep their conventional names.
        assert_eq!(config.paths.input, "input_data");
        assert_eq!(config.paths.tracker, "pass_tracker");
        assert_eq!(config.warehouse.schema, Some("analytics".to_string()));
        assert_eq!(config.report.key, "hp");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.queries, "query_files");
        assert_eq!(config.warehouse.schema, None);
        assert_eq!(config.report.key, "rpt");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.paths.output, "output_data");
    }

    #[test]
    fn test_load_invalid_toml_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[paths\noutput = ").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_workspace_resolves_against_root() {
        let config = Config::default();
        let workspace = config.workspace(Path::new("/reports"));

        assert_eq!(workspace.query_dir, PathBuf::from("/reports/query_files"));
        assert_eq!(workspace.output_dir, PathBuf::from("/reports/output_data"));
        assert_eq!(workspace.tracker_dir, PathBuf::from("/reports/pass_tracker"));
    }

    #[test]
    fn test_init_workspace_creates_all_four() {
        let dir = tempdir().unwrap();
        let config = Config::default();

        let workspace = config.init_workspace(dir.path()).unwrap();

        assert!(workspace.input_dir.is_dir());
        assert!(workspace.output_dir.is_dir());
        assert!(workspace.query_dir.is_dir());
        assert!(workspace.tracker_dir.is_dir());
    }

    #[test]
    fn test_init_workspace_refuses_existing() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        std::fs::create_dir(dir.path().join("query_files")).unwrap();

        let err = config.init_workspace(dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
