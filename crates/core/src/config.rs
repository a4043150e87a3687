use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub store: StoreConfig,
}

/// Connection settings for the PostgreSQL instance holding the bar tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string, selects host, port, credentials and target database.
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection.
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://postgres@localhost:5432/opulent_aurum_db".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 10,
        }
    }
}

impl DatabaseConfig {
    /// Builds a config for the given connection string with default pool settings.
    #[must_use]
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub read_policy: ReadPolicy,
}

/// What a store does when a read query fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPolicy {
    /// Log the failure and answer with an empty result.
    #[default]
    Degrade,
    /// Return the failure to the caller.
    Propagate,
}

impl ReadPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadPolicy::Degrade => "degrade",
            ReadPolicy::Propagate => "propagate",
        }
    }
}
