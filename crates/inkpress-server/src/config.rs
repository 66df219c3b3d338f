//! Application configuration.
//!
//! Sections deserialize with field-level defaults so a partial
//! `inkpress.toml` is enough; environment variables override file values
//! with the `INKPRESS__` prefix (e.g. `INKPRESS__SERVER__PORT=9090`).

use inkpress_auth::AuthConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authentication and token configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Initial admin account, upserted at startup.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if let Some(ref admin) = self.bootstrap.admin {
            if admin.username.is_empty() {
                return Err("bootstrap.admin.username must be non-empty".into());
            }
            if admin.password.len() < inkpress_auth::password::MIN_PASSWORD_LEN {
                return Err("bootstrap.admin.password is below the minimum length".into());
            }
        }
        self.auth.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base log level when RUST_LOG is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Startup seeding. The admin account is upserted by username so restarts
/// converge on the configured credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin: Option<AdminSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: Option<String>,
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("inkpress.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g. INKPRESS__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("INKPRESS")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
