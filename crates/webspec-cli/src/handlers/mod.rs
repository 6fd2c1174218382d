//! Command handlers - extracted from main.rs for testability

pub mod init;
pub mod list;
pub mod run;

pub use init::{execute_init, is_valid_init_path};
pub use list::{execute_list, render_registry};
pub use run::{execute_run, SUPPORTED_BROWSERS};

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};
use webspec::{spec_file, Fixtures, Registry, RunnerConfig};

/// Directory containing the config file, `.` for a bare file name
#[must_use]
pub fn project_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Configuration, fixtures and loaded specs for one invocation
#[derive(Debug)]
pub struct Project {
    /// Directory the config file lives in; config paths resolve against it
    pub root: PathBuf,
    /// Effective configuration
    pub config: RunnerConfig,
    /// Loaded fixtures
    pub fixtures: Fixtures,
    /// Merged registry of every spec file
    pub registry: Registry,
    /// Spec files in load order
    pub files: Vec<PathBuf>,
}

impl Project {
    /// Load the config file (or defaults), fixtures and spec files.
    ///
    /// A `--spec` override is resolved against the working directory; the
    /// configured pattern against the config file's directory.
    pub fn load(config_path: &Path, spec_override: Option<&str>) -> CliResult<Self> {
        let config = RunnerConfig::load_or_default(config_path)?;
        Self::with_config(project_root(config_path), config, spec_override)
    }

    /// Same as [`Self::load`] with an already-built configuration
    pub fn with_config(
        root: PathBuf,
        config: RunnerConfig,
        spec_override: Option<&str>,
    ) -> CliResult<Self> {
        let fixtures = Fixtures::load_dir(&RunnerConfig::resolve(&root, &config.fixtures_folder))?;

        let (pattern, base) = match spec_override {
            Some(pattern) => (pattern.to_string(), PathBuf::from(".")),
            None => (config.spec_pattern.clone(), root.clone()),
        };
        let (registry, files) = spec_file::load_pattern(&pattern, &base, &fixtures)?;
        if files.is_empty() {
            return Err(CliError::config(format!(
                "no spec files match '{pattern}' in {}",
                base.display()
            )));
        }

        Ok(Self {
            root,
            config,
            fixtures,
            registry,
            files,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_uses_config_directory() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("specs")).unwrap();
        std::fs::write(
            temp.path().join("specs/a.yaml"),
            "describe: a\ncases: [{it: one}, {it: two}]\n",
        )
        .unwrap();
        let config_path = temp.path().join(webspec::DEFAULT_CONFIG_FILE);

        let project = Project::load(&config_path, None).unwrap();
        assert_eq!(project.root, temp.path());
        assert_eq!(project.files.len(), 1);
        assert_eq!(project.registry.len(), 2);
        assert!(project.fixtures.is_empty());
    }

    #[test]
    fn test_no_matching_specs_is_config_error() {
        let temp = TempDir::new().unwrap();
        let err = Project::load(&temp.path().join("missing.yaml"), None).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
        assert!(err.to_string().contains("no spec files match"));
    }
}
