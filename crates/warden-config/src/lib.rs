//! Configuration system for the Warden session server.
//!
//! Provides TOML-based configuration with:
//! - `[server]`, `[auth]` and `[logging]` sections
//! - Config file layering (XDG user config + project-local overrides)
//! - Environment overrides for scalar settings
//! - PIN credential resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, load_config, load_config_file, load_config_with_options, xdg_config_dir,
    xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{
    PIN_ENV, PIN_HASH_ENV, PIN_SALT_ENV, PinCredential, ResolvedCredential, SecretSource,
    resolve_pin_credential, resolve_pin_credential_with,
};
pub use types::*;
