//! Operator configuration
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! `PDF_WORKBENCH__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::error::Result;

/// Environment variable naming a config file when `--config` is not given
pub const CONFIG_PATH_ENV: &str = "PDF_WORKBENCH_CONFIG";

const ENV_PREFIX: &str = "PDF_WORKBENCH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub quota: QuotaConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Cap on a whole request body, in megabytes
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    /// Actions allowed per local calendar day, merge and protect combined
    pub daily_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the per-day counters
    pub usage_file: PathBuf,
    /// Root for per-request staging directories
    pub upload_dir: PathBuf,
    /// Root for per-request output directories
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminConfig {
    /// Shared secret for the reset endpoint; unset disables the endpoint
    pub secret: Option<String>,
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_upload_mb: 10,
            },
            quota: QuotaConfig { daily_limit: 5 },
            storage: StorageConfig {
                usage_file: PathBuf::from("usage.json"),
                upload_dir: PathBuf::from("uploads"),
                output_dir: PathBuf::from("merged"),
            },
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path` (or `$PDF_WORKBENCH_CONFIG`) plus
    /// environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        Self::load_from(file.as_deref(), config::Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    fn load_from(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let defaults = Config::default();

        let mut builder = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.max_upload_mb", defaults.server.max_upload_mb as i64)?
            .set_default("quota.daily_limit", i64::from(defaults.quota.daily_limit))?
            .set_default("storage.usage_file", path_string(&defaults.storage.usage_file))?
            .set_default("storage.upload_dir", path_string(&defaults.storage.upload_dir))?
            .set_default("storage.output_dir", path_string(&defaults.storage.output_dir))?;

        if let Some(file) = file {
            builder = builder.add_source(config::File::from(file).required(true));
        }

        let config = builder.add_source(env).build()?.try_deserialize()?;
        Ok(config)
    }

    /// The admin secret, treating an empty string as unset
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin.secret.as_deref().filter(|secret| !secret.is_empty())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(Some(HashMap::new()))
    }

    #[test]
    fn test_defaults() {
        let config = Config::load_from(None, no_env()).unwrap();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.quota.daily_limit, 5);
        assert_eq!(config.storage.usage_file, PathBuf::from("usage.json"));
        assert!(config.admin_secret().is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workbench.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[quota]
daily_limit = 20

[admin]
secret = "s3cret"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path), no_env()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.quota.daily_limit, 20);
        assert_eq!(config.admin_secret(), Some("s3cret"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workbench.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[quota]
daily_limit = 20

[admin]
secret = "from-file"
"#,
        )
        .unwrap();

        let env = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(HashMap::from([
                ("PDF_WORKBENCH__QUOTA__DAILY_LIMIT".to_string(), "2".to_string()),
                ("PDF_WORKBENCH__ADMIN__SECRET".to_string(), "from-env".to_string()),
            ])));

        let config = Config::load_from(Some(&path), env).unwrap();

        assert_eq!(config.quota.daily_limit, 2);
        assert_eq!(config.admin_secret(), Some("from-env"));
        // Keys the environment leaves alone still come from the file
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_empty_secret_is_unset() {
        let mut config = Config::default();
        config.admin.secret = Some(String::new());
        assert!(config.admin_secret().is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Config::load_from(Some(Path::new("does-not-exist.toml")), no_env());
        assert!(result.is_err());
    }
}
