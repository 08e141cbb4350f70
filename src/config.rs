// src/config.rs

//! Configuration loading utilities.
//!
//! Relative paths in a config file are resolved against the directory the
//! file lives in, so the CLI behaves the same from any working directory.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::Config;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "predictions.toml";

/// Load configuration from a TOML file.
///
/// Falls back to defaults if loading fails.
pub fn load_config(path: &Path) -> Config {
    let config = Config::load_or_default(path);
    match path.parent() {
        Some(dir) if path.exists() => resolve_paths(config, dir),
        _ => config,
    }
}

/// Load configuration from an explicit path, or the default file if present.
///
/// An explicit path that does not exist is an error; a missing default
/// file is not.
pub fn load_from(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) if !path.exists() => Err(AppError::config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        Some(path) => {
            let config = Config::load(path)?;
            Ok(match path.parent() {
                Some(dir) => resolve_paths(config, dir),
                None => config,
            })
        }
        None => Ok(load_config(Path::new(DEFAULT_CONFIG_FILE))),
    }
}

/// Rebase relative `[paths]` entries onto `base`.
pub fn resolve_paths(mut config: Config, base: &Path) -> Config {
    let rebase = |p: &PathBuf| -> PathBuf {
        if p.is_absolute() || base.as_os_str().is_empty() {
            p.clone()
        } else {
            base.join(p)
        }
    };
    config.paths.content_root = rebase(&config.paths.content_root);
    config.paths.output_dir = rebase(&config.paths.output_dir);
    config.paths.state_dir = rebase(&config.paths.state_dir);
    config
}
