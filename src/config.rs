//! Layered configuration for operator-tunable defaults.
//!
//! These knobs never change lease-protocol *behavior* — they only supply
//! defaults for CLI arguments that are otherwise required (`-o`, `-d`). The
//! protocol's own parameters (`lease_ms`, `op_max_ms`, identity) always come
//! from the command line, never from this layer.

use std::sync::OnceLock;

use directories::ProjectDirs;
use figment::{
   Figment,
   providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Layered configuration, lowest to highest priority: compiled-in defaults,
/// `~/.config/safelease/config.toml`, then `SAFELEASE_`-prefixed environment
/// variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
   /// Sector offset used when `-o` is not given on the command line.
   pub default_offset: u64,
   /// Base debug verbosity, before any `-d` flags are added.
   pub debug: u8,
   /// Column width used to pad the identity field in `query` output.
   pub op_label_width: usize,
}

impl Default for Config {
   fn default() -> Self {
      Self { default_offset: 0, debug: 0, op_label_width: 16 }
   }
}

impl Config {
   fn load() -> Self {
      let figment = Figment::from(Serialized::defaults(Self::default()))
         .merge(Toml::file(config_file_path()))
         .merge(Env::prefixed("SAFELEASE_"));

      figment
         .extract()
         .inspect_err(|e| tracing::warn!("failed to parse config, using defaults: {e}"))
         .unwrap_or_default()
   }
}

/// Returns the process-wide configuration, loading it on first access.
pub fn get() -> &'static Config {
   CONFIG.get_or_init(Config::load)
}

fn config_file_path() -> std::path::PathBuf {
   project_dirs()
      .map(|dirs| dirs.config_dir().join("config.toml"))
      .unwrap_or_else(|| std::path::PathBuf::from("safelease.toml"))
}

fn project_dirs() -> Option<ProjectDirs> {
   ProjectDirs::from("", "", "safelease")
}
