use crate::domain_model::*;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub jwt: Jwt,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub cleanup: Cleanup,
    #[serde(default)]
    pub filter: Filter,
    pub http: Http,
    pub log: Log,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_true")]
    pub refresh_enabled: bool,
    #[serde(default)]
    pub rotation_enabled: bool,
    #[serde(default)]
    pub refresh_mode: RefreshTokenMode,
    #[serde(default)]
    pub reuse_handling: ReuseHandling,
}

// Keeps the signing secret out of logged settings.
impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("refresh_enabled", &self.refresh_enabled)
            .field("rotation_enabled", &self.rotation_enabled)
            .field("refresh_mode", &self.refresh_mode)
            .field("reuse_handling", &self.reuse_handling)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Store {
    #[serde(default)]
    pub backend: StoreBackend,
    pub mysql_dsn: Option<String>,
    pub redis_dsn: Option<String>,
    #[serde(default)]
    pub redis_prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct Cleanup {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for Cleanup {
    fn default() -> Self {
        Cleanup {
            enabled: true,
            interval_secs: default_cleanup_interval_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Filter {
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    #[serde(default)]
    pub auto_detect_open_paths: bool,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_access_ttl_secs() -> u64 {
    60 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    60 * 60
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "TOKENGATE";

/// Reads the TOML file, then lets `TOKENGATE__SECTION__KEY` variables override it.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("filter.excluded_paths")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn minimal_file_takes_defaults() {
        let settings = from_toml(
            r#"
            [jwt]
            secret = "s3cret"
            [http]
            address = "127.0.0.1:8080"
            [log]
            filter = "info"
            "#,
        );

        assert_eq!(settings.jwt.access_ttl_secs, 3600);
        assert_eq!(settings.jwt.refresh_ttl_secs, 86400);
        assert!(settings.jwt.refresh_enabled);
        assert!(!settings.jwt.rotation_enabled);
        assert_eq!(settings.jwt.refresh_mode, RefreshTokenMode::SimpleValidation);
        assert_eq!(settings.store.backend, StoreBackend::InMemory);
        assert!(settings.cleanup.enabled);
        assert_eq!(settings.cleanup.interval_secs, 3600);
        assert!(settings.filter.excluded_paths.is_empty());
    }

    #[test]
    fn policies_are_snake_case() {
        let settings = from_toml(
            r#"
            [jwt]
            secret = "s3cret"
            rotation_enabled = true
            refresh_mode = "store_and_validate"
            reuse_handling = "blacklist"
            [store]
            backend = "cache"
            redis_dsn = "redis://127.0.0.1:6379"
            redis_prefix = "tg"
            [filter]
            excluded_paths = ["/api/v1/health", "/public/**"]
            auto_detect_open_paths = true
            [http]
            address = "127.0.0.1:8080"
            [log]
            filter = "debug"
            "#,
        );

        assert_eq!(settings.jwt.refresh_mode, RefreshTokenMode::StoreAndValidate);
        assert_eq!(settings.jwt.reuse_handling, ReuseHandling::Blacklist);
        assert_eq!(settings.store.backend, StoreBackend::Cache);
        assert_eq!(settings.store.redis_prefix, "tg");
        assert_eq!(settings.filter.excluded_paths.len(), 2);
        assert!(settings.filter.auto_detect_open_paths);
    }

    #[test]
    fn secret_is_not_debug_printed() {
        let settings = from_toml(
            r#"
            [jwt]
            secret = "do-not-print"
            [http]
            address = "127.0.0.1:8080"
            [log]
            filter = "info"
            "#,
        );

        assert!(!format!("{settings:?}").contains("do-not-print"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }
}
