//! Client configuration.
//!
//! A [`ClientConfig`] is an explicit value handed to every component
//! constructor. The defaults target the public Go LUCI deployment; a YAML file
//! may override any subset of fields:
//!
//! ```yaml
//! resultdb_host: results.api.cr.dev
//! max_parallelism: 8
//! trace_steps: true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_GITILES_HOST: &str = "go.googlesource.com";
pub const DEFAULT_BUILDBUCKET_HOST: &str = "cr-buildbucket.appspot.com";
pub const DEFAULT_RESULTDB_HOST: &str = "results.api.cr.dev";

/// The result store keeps data for this many days; there is no point looking further back.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub gitiles_host: String,
    pub buildbucket_host: String,
    /// Also the hostname every build's infra metadata must name.
    pub resultdb_host: String,
    /// Build-service project that owns the builders.
    pub project: String,
    pub bucket: String,
    /// Repo whose commit a cross-repo build records alongside its own.
    pub companion_repo: String,
    pub page_size: u32,
    /// Per-builder fetches in flight at once.
    pub max_parallelism: usize,
    /// Log each remote step at info level.
    pub trace_steps: bool,
    pub lookback_days: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gitiles_host: DEFAULT_GITILES_HOST.to_string(),
            buildbucket_host: DEFAULT_BUILDBUCKET_HOST.to_string(),
            resultdb_host: DEFAULT_RESULTDB_HOST.to_string(),
            project: "golang".to_string(),
            bucket: "ci".to_string(),
            companion_repo: "go".to_string(),
            page_size: 1000,
            max_parallelism: 1,
            trace_steps: false,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl ClientConfig {
    /// Load a config from `path`, filling absent fields with defaults.
    ///
    /// Returns `CoreError::ConfigNotFound` if absent, `CoreError::Parse`
    /// (with path + line context) if malformed, `CoreError::InvalidConfig`
    /// if a value is out of range.
    pub fn load_at(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents).map_err(|e| CoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/testtiming/config.yaml`.
    pub fn default_path_at(config_dir: &Path) -> PathBuf {
        config_dir.join("testtiming").join("config.yaml")
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_parallelism == 0 {
            return Err(CoreError::InvalidConfig(
                "max_parallelism must be 1 or higher".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(CoreError::InvalidConfig(
                "page_size must be 1 or higher".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_target_go_ci() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.project, "golang");
        assert_eq!(cfg.bucket, "ci");
        assert_eq!(cfg.page_size, 1000);
        assert_eq!(cfg.resultdb_host, "results.api.cr.dev");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "max_parallelism: 8\ntrace_steps: true\n").expect("write");
        let cfg = ClientConfig::load_at(&path).expect("load");
        assert_eq!(cfg.max_parallelism, 8);
        assert!(cfg.trace_steps);
        assert_eq!(cfg.gitiles_host, DEFAULT_GITILES_HOST);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().expect("tempdir");
        let err = ClientConfig::load_at(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigNotFound { .. }), "got: {err}");
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let cfg = ClientConfig {
            max_parallelism: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn default_path_is_under_config_dir() {
        let path = ClientConfig::default_path_at(Path::new("/home/u/.config"));
        assert!(path.ends_with("testtiming/config.yaml"));
    }
}
