use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Settings for one search invocation.
///
/// Loaded from YAML config files and merged with CLI arguments, CLI values
/// taking precedence. Locations, in order of precedence:
/// 1. Custom config file passed via `--config`
/// 2. Local `.qfs.yaml` in the current directory
/// 3. Global `$HOME/.config/qfs/config.yaml`
///
/// Example:
/// ```yaml
/// # Search expression: literal, `a&&b`, `a||b`, or `/regex/`
/// expression: "/.*\\.log/"
///
/// # Directory to start from
/// root_path: "/var"
///
/// # Worker thread budget (default: logical core count)
/// thread_count: 4
///
/// # Print matches as they are found
/// print_live: true
///
/// # Write results to this file after the search
/// save_path: "founded.txt"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "warn"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The search expression; literal substring, `&&`/`||` combination,
    /// or `/regex/`
    #[serde(default)]
    pub expression: Option<String>,

    /// Directory to start the search from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Maximum number of spawned traversal workers
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Whether matches are printed as they are found
    #[serde(default = "default_print_live")]
    pub print_live: bool,

    /// File to save results to, one per line; None disables saving
    #[serde(default)]
    pub save_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_print_live() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            expression: None,
            root_path: default_root_path(),
            thread_count: default_thread_count(),
            print_live: default_print_live(),
            save_path: None,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, additionally reading `config_path` if given.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("qfs/config.yaml")),
            // Local config
            Some(PathBuf::from(".qfs.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments into this configuration; CLI values win.
    pub fn merge_with_cli(mut self, cli: SearchConfig) -> Self {
        if cli.expression.is_some() {
            self.expression = cli.expression;
        }
        if cli.root_path != default_root_path() {
            self.root_path = cli.root_path;
        }
        if cli.thread_count != default_thread_count() {
            self.thread_count = cli.thread_count;
        }
        if !cli.print_live {
            self.print_live = false;
        }
        if cli.save_path.is_some() {
            self.save_path = cli.save_path;
        }
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            expression: "report&&2024"
            root_path: "/srv/data"
            thread_count: 4
            print_live: false
            save_path: "out.txt"
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.expression.as_deref(), Some("report&&2024"));
        assert_eq!(config.root_path, PathBuf::from("/srv/data"));
        assert_eq!(config.thread_count, NonZeroUsize::new(4).unwrap());
        assert!(!config.print_live);
        assert_eq!(config.save_path, Some(PathBuf::from("out.txt")));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"log_level: \"info\"\n").unwrap();

        let config = SearchConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.expression, None);
        assert_eq!(config.root_path, default_root_path());
        assert_eq!(config.thread_count, default_thread_count());
        assert!(config.print_live);
        assert_eq!(config.save_path, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_merge_with_cli() {
        let from_file = SearchConfig {
            expression: Some("report".to_string()),
            root_path: PathBuf::from("/srv"),
            thread_count: NonZeroUsize::new(4).unwrap(),
            print_live: true,
            save_path: None,
            log_level: "warn".to_string(),
        };

        let from_cli = SearchConfig {
            expression: Some("invoice".to_string()),
            root_path: default_root_path(),
            thread_count: NonZeroUsize::new(8).unwrap(),
            print_live: true,
            save_path: Some(PathBuf::from("out.txt")),
            log_level: "debug".to_string(),
        };

        let merged = from_file.merge_with_cli(from_cli);
        assert_eq!(merged.expression.as_deref(), Some("invoice")); // CLI value
        assert_eq!(merged.root_path, PathBuf::from("/srv")); // file value (CLI default)
        assert_eq!(merged.thread_count, NonZeroUsize::new(8).unwrap());
        assert_eq!(merged.save_path, Some(PathBuf::from("out.txt")));
        assert_eq!(merged.log_level, "debug");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(b"thread_count: \"lots\"\n").unwrap();

        let result = SearchConfig::load_from(Some(&config_path));
        assert!(result.is_err(), "Expected error loading invalid config");
    }
}
