//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/warden/config.toml` (XDG user config)
//! 2. `./warden.toml` (project-local)
//! 3. Environment overrides (`WARDEN_TOKEN_TTL_MS`, `WARDEN_PORT`, `WARDEN_BIND`)
//! 4. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, WardenConfig};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "warden.toml";

/// Default config filename within XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Application name for XDG directory resolution.
const APP_NAME: &str = "warden";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "WARDEN_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: WardenConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., plaintext PIN).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Wrap a config loaded from one explicit file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = load_config_file(path)?;
        let mut warnings = Vec::new();
        check_plaintext_pin(&config, &mut warnings);

        Ok(Self {
            config,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings,
        })
    }

    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `WARDEN_CONFIG_DIR` and the platform default.
/// Environment overrides are not applied here; callers apply them last.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = WardenConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    // 1. User config: explicit override, then env var, then platform default
    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        let source = load_layer(&mut config, &path, &mut warnings)?;
        sources.push(source);
    }

    // 2. Project-local config
    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    let source = load_layer(&mut config, &project_path, &mut warnings)?;
    sources.push(source);

    check_plaintext_pin(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<WardenConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    WardenConfig::from_toml(&contents)
}

/// Get the XDG config file path for warden.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the XDG config directory for warden.
///
/// Checks `WARDEN_CONFIG_DIR` env var first, then falls back to platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut WardenConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ConfigSource> {
    if !path.is_file() {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        });
    }

    match load_config_file(path) {
        Ok(layer) => {
            config.merge(layer);
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            })
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            })
        }
    }
}

/// Warn when the merged config carries a raw PIN.
fn check_plaintext_pin(config: &WardenConfig, warnings: &mut Vec<String>) {
    if let Some(ref auth) = config.auth
        && auth.has_plaintext_pin()
    {
        warnings.push(
            "[auth] contains a plaintext PIN. \
             Store pin_hash instead (warden hash-pin) or use the WARDEN_PIN_HASH env var."
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_xdg_config_path_shape() {
        if let Some(p) = xdg_config_path() {
            assert!(p.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[auth]\ntoken_ttl_ms = 1000\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.auth.unwrap().token_ttl_ms, 1000);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let err = load_config_file(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "this is not valid toml {{{{").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_config_no_files() {
        let dir = TempDir::new().unwrap();
        let empty_config_dir = TempDir::new().unwrap();

        let loaded =
            load_config_with_options(Some(dir.path()), Some(empty_config_dir.path())).unwrap();

        assert!(loaded.config.auth.is_none());
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_layered_merge() {
        let user_dir = TempDir::new().unwrap();
        let project_dir = TempDir::new().unwrap();

        fs::write(
            user_dir.path().join("config.toml"),
            r#"
[server]
port = 8080

[auth]
pin_hash = "user-hash"
salt = "user-salt"
"#,
        )
        .unwrap();

        fs::write(
            project_dir.path().join("warden.toml"),
            r#"
[server]
port = 3001
"#,
        )
        .unwrap();

        let loaded =
            load_config_with_options(Some(project_dir.path()), Some(user_dir.path())).unwrap();

        // Project-local overrides the user server section
        assert_eq!(loaded.config.server.as_ref().unwrap().port, 3001);
        // User auth section preserved
        assert_eq!(
            loaded.config.auth.as_ref().unwrap().pin_hash.as_deref(),
            Some("user-hash")
        );
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    fn test_plaintext_pin_warning() {
        let dir = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        fs::write(
            dir.path().join("warden.toml"),
            "[auth]\npin = \"4698\"\nsalt = \"s\"\n",
        )
        .unwrap();

        let loaded = load_config_with_options(Some(dir.path()), Some(empty.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("plaintext"));
    }

    #[test]
    fn test_malformed_config_warns_but_continues() {
        let dir = TempDir::new().unwrap();
        let empty = TempDir::new().unwrap();
        fs::write(dir.path().join("warden.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_config_with_options(Some(dir.path()), Some(empty.path())).unwrap();
        assert!(!loaded.warnings.is_empty());
        assert!(loaded.warnings[0].contains("Failed to load"));
        assert!(loaded.loaded_from().is_empty());
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[server]\nport = 4000\n").unwrap();

        let loaded = LoadedConfig::from_file(&path).unwrap();
        assert_eq!(loaded.config.server.as_ref().unwrap().port, 4000);
        assert_eq!(loaded.loaded_from(), vec![path.as_path()]);
    }
}
