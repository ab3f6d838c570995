//! Default paths for salas components
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/salas/config.toml` or `~/.config/salas/config.toml`
//! - Data: `$XDG_DATA_HOME/salas` or `~/.local/share/salas`

use std::path::PathBuf;

/// Environment variable for overriding the config file
pub const SALAS_CONFIG_ENV: &str = "SALAS_CONFIG";

/// Environment variable for overriding the data directory
pub const SALAS_DATA_DIR_ENV: &str = "SALAS_DATA_DIR";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "salas.db";

/// Application subdirectory name
const APP_DIR: &str = "salas";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$SALAS_CONFIG` (if set)
/// 2. `$XDG_CONFIG_HOME/salas/config.toml`
/// 3. `~/.config/salas/config.toml`
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(SALAS_CONFIG_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join("config.toml");
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
    }

    PathBuf::from("/etc").join(APP_DIR).join("config.toml")
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$SALAS_DATA_DIR` (if set)
/// 2. `$XDG_DATA_HOME/salas`
/// 3. `~/.local/share/salas`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(SALAS_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    // Last resort
    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

/// Default database path inside the data directory
pub fn default_database_path() -> PathBuf {
    default_data_dir().join(DATABASE_FILENAME)
}
