//! Configuration management for Sift.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config file (.sift/config.yaml)
//!
//! The configuration is workspace-centric: corpora and their snapshots live
//! under `.sift/` in the workspace root.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the per-workspace state directory.
pub const STATE_DIR: &str = ".sift";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .sift/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

/// Settings read from the process environment.
#[derive(Debug, Clone, Default)]
struct EnvSettings {
    workspace: Option<PathBuf>,
    config_file: Option<PathBuf>,
    log_level: Option<String>,
    no_color: bool,
}

impl EnvSettings {
    fn from_env() -> Self {
        Self {
            workspace: std::env::var("SIFT_WORKSPACE").ok().map(PathBuf::from),
            config_file: std::env::var("SIFT_CONFIG").ok().map(PathBuf::from),
            log_level: std::env::var("RUST_LOG").ok(),
            no_color: std::env::var("NO_COLOR").is_ok(),
        }
    }
}

/// Values given as command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub verbose: bool,
    pub no_color: bool,
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `SIFT_WORKSPACE`: Override workspace path
    /// - `SIFT_CONFIG`: Path to config file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use sift_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(CliOverrides::default())
    }

    /// Load configuration with command-line flags applied.
    ///
    /// The config file is located after `--workspace` and `--config` are
    /// known. Precedence, lowest first: defaults, config file, environment,
    /// flags.
    pub fn load_with(overrides: CliOverrides) -> AppResult<Self> {
        Self::resolve(EnvSettings::from_env(), overrides)
    }

    fn resolve(env: EnvSettings, cli: CliOverrides) -> AppResult<Self> {
        let mut config = Self::default();

        let workspace = cli.workspace.clone().or(env.workspace);
        if let Some(workspace) = &workspace {
            config.workspace = workspace.clone();
        }
        config.config_file = cli.config_file.clone().or(env.config_file);

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.state_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // An explicit workspace beats the one named in the file.
        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if let Some(level) = env.log_level {
            config.log_level = Some(level);
        }
        if env.no_color {
            config.no_color = true;
        }

        Ok(config.with_overrides(None, None, cli.log_level, cli.verbose, cli.no_color))
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the config file.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .sift directory.
    pub fn state_dir(&self) -> PathBuf {
        self.workspace.join(STATE_DIR)
    }

    /// Ensure the .sift directory exists.
    pub fn ensure_state_dir(&self) -> AppResult<()> {
        let state_dir = self.state_dir();
        if !state_dir.exists() {
            std::fs::create_dir_all(&state_dir).map_err(|e| {
                AppError::Config(format!("Failed to create {} directory: {}", STATE_DIR, e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.verbose);
        assert!(!config.no_color);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_state_dir() {
        let config = AppConfig::default();
        assert!(config.state_dir().ends_with(".sift"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some(PathBuf::from("/tmp/ws")),
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.workspace, PathBuf::from("/tmp/ws"));
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_explicit_level_beats_verbose() {
        let overridden =
            AppConfig::default().with_overrides(None, None, Some("warn".to_string()), true, false);
        assert_eq!(overridden.log_level, Some("warn".to_string()));
    }

    #[test]
    fn test_merge_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "workspace:\n  path: /srv/corpus\nlogging:\n  level: trace\n  color: false\n",
        )
        .unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.workspace, PathBuf::from("/srv/corpus"));
        assert_eq!(merged.log_level, Some("trace".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_workspace_flag_picks_up_its_config_file() {
        let workspace = TempDir::new().unwrap();
        std::fs::create_dir_all(workspace.path().join(STATE_DIR)).unwrap();
        std::fs::write(
            workspace.path().join(STATE_DIR).join("config.yaml"),
            "logging:\n  level: trace\n  color: false\n",
        )
        .unwrap();

        let cli = CliOverrides {
            workspace: Some(workspace.path().to_path_buf()),
            ..Default::default()
        };
        let config = AppConfig::resolve(EnvSettings::default(), cli).unwrap();
        assert_eq!(config.workspace, workspace.path());
        assert_eq!(config.log_level, Some("trace".to_string()));
        assert!(config.no_color);
    }

    #[test]
    fn test_config_flag_is_merged() {
        let workspace = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let path = other.path().join("sift.yaml");
        std::fs::write(&path, "workspace:\n  path: /srv/elsewhere\nlogging:\n  level: trace\n").unwrap();

        let cli = CliOverrides {
            workspace: Some(workspace.path().to_path_buf()),
            config_file: Some(path.clone()),
            ..Default::default()
        };
        let config = AppConfig::resolve(EnvSettings::default(), cli).unwrap();
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.log_level, Some("trace".to_string()));
        assert_eq!(config.workspace, workspace.path());
    }

    #[test]
    fn test_flags_beat_environment_and_file() {
        let workspace = TempDir::new().unwrap();
        let path = workspace.path().join("sift.yaml");
        std::fs::write(&path, "logging:\n  level: trace\n").unwrap();

        let env = EnvSettings {
            log_level: Some("info".to_string()),
            ..Default::default()
        };
        let from_env = AppConfig::resolve(
            env.clone(),
            CliOverrides {
                workspace: Some(workspace.path().to_path_buf()),
                config_file: Some(path.clone()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(from_env.log_level, Some("info".to_string()));

        let from_flag = AppConfig::resolve(
            env,
            CliOverrides {
                workspace: Some(workspace.path().to_path_buf()),
                config_file: Some(path),
                log_level: Some("warn".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(from_flag.log_level, Some("warn".to_string()));
    }

    #[test]
    fn test_missing_config_flag_file_rejected() {
        let workspace = TempDir::new().unwrap();
        let cli = CliOverrides {
            workspace: Some(workspace.path().to_path_buf()),
            config_file: Some(workspace.path().join("absent.yaml")),
            ..Default::default()
        };
        let result = AppConfig::resolve(EnvSettings::default(), cli);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_merge_yaml_rejects_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "logging: [unclosed").unwrap();

        let result = AppConfig::default().merge_yaml(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
