use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the user config file
pub const CONFIG_FILE: &str = "useq.json";

/// Default log file name (used by `--log` without a value)
pub const LOG_FILE: &str = "useq.log";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Create PathConfig from CLI arguments and environment variables
    ///
    /// Priority: CLI args → ENV var (USEQ_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| {
            std::env::var("USEQ_CONFIG_DIR")
                .ok()
                .map(PathBuf::from)
        });

        Self { config_dir }
    }
}

/// Get path to a configuration file
///
/// Priority:
/// 1. CLI --config-dir argument
/// 2. USEQ_CONFIG_DIR environment variable
/// 3. Local folder IF useq.json exists there
/// 4. Platform-specific config directory from dirs-next (default)
///
/// Platform paths:
/// - Linux: ~/.config/useq/{name}
/// - macOS: ~/Library/Application Support/useq/{name}
/// - Windows: %APPDATA%\useq\{name}
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    get_config_dir(config).join(name)
}

/// Get path to a data file (logs)
///
/// Same priority as [`config_file`], with the platform data dir as default.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    get_data_dir(config).join(name)
}

/// Ensure the directory holding `file` exists
pub fn ensure_parent(file: &Path) -> Result<()> {
    if let Some(dir) = file.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory
///
/// `~/renders` → `/home/user/renders`. Paths without `~` (or `~user` forms)
/// are returned unchanged, as is everything when no home dir is known.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs_next::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

/// Check if a local config file exists in the given directory
fn has_local_config_file(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).exists()
}

fn local_or(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    // Priority 1: Custom directory from CLI or ENV
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    // Priority 2: Local folder IF config file exists there
    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_config_file(&current_dir) {
            return current_dir;
        }
    }

    // Priority 3: Platform-specific directory
    if let Some(dir) = platform {
        return dir.join("useq");
    }

    // Fallback: "." if everything else fails
    PathBuf::from(".")
}

/// Get the configuration directory
fn get_config_dir(config: &PathConfig) -> PathBuf {
    local_or(config, dirs_next::config_dir())
}

/// Get the data directory
fn get_data_dir(config: &PathConfig) -> PathBuf {
    local_or(config, dirs_next::data_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };

        let path = config_file("useq.json", &config);
        assert_eq!(path, PathBuf::from("/custom/useq.json"));
    }

    #[test]
    fn test_data_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };

        let path = data_file(LOG_FILE, &config);
        assert_eq!(path, PathBuf::from("/custom/useq.log"));
    }

    #[test]
    fn test_cli_dir_beats_env() {
        let config = PathConfig::from_env_and_cli(Some(PathBuf::from("/from/cli")));
        assert_eq!(config.config_dir, Some(PathBuf::from("/from/cli")));
    }

    #[test]
    fn test_expand_home() {
        let plain = Path::new("/renders/shot");
        assert_eq!(expand_home(plain), plain.to_path_buf());

        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(expand_home(Path::new("~/renders")), home.join("renders"));
            assert_eq!(expand_home(Path::new("~")), home);
        }

        // Only a bare "~" component is expanded
        assert_eq!(expand_home(Path::new("~bob/x")), PathBuf::from("~bob/x"));
    }

    #[test]
    fn test_ensure_parent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a/b/useq.json");
        ensure_parent(&file).unwrap();
        assert!(dir.path().join("a/b").is_dir());
    }
}
