use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Default location of the TOML config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Environment prefix; nested keys use `__`, e.g. `OHLCV_DATABASE__URL`.
pub const ENV_PREFIX: &str = "OHLCV_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by layering defaults, `config/Config.toml` and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a value has the wrong type.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration from a specific TOML file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed or a value has the wrong type.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading configuration");

        let config: AppConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadPolicy;
    use figment::Jail;

    #[test]
    fn test_load_without_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                [database]
                url = "postgresql://reader@db.internal:5432/market"
                max_connections = 4

                [store]
                read_policy = "propagate"
                "#,
            )?;

            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(
                config.database.url,
                "postgresql://reader@db.internal:5432/market"
            );
            assert_eq!(config.database.max_connections, 4);
            assert_eq!(config.database.acquire_timeout_secs, 10);
            assert_eq!(config.store.read_policy, ReadPolicy::Propagate);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "market.toml",
                r#"
                [database]
                url = "postgresql://from-file/market"
                "#,
            )?;
            jail.set_env("OHLCV_DATABASE__URL", "postgresql://from-env/market");
            jail.set_env("OHLCV_DATABASE__ACQUIRE_TIMEOUT_SECS", "3");

            let config = ConfigLoader::load_from("market.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.database.url, "postgresql://from-env/market");
            assert_eq!(config.database.acquire_timeout_secs, 3);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_read_policy_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bad.toml",
                r#"
                [store]
                read_policy = "ignore"
                "#,
            )?;

            assert!(ConfigLoader::load_from("bad.toml").is_err());
            Ok(())
        });
    }
}
