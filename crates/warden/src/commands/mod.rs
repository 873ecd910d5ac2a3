//! CLI command handlers.

pub mod hash_pin;
pub mod start;

use warden_config::LoadedConfig;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Configuration discovered (or named with `--config`) at startup.
    pub loaded: LoadedConfig,
}
