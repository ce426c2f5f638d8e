/// Configuration management for herdbook
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub lineage: LineageSettings,
    #[serde(default)]
    pub transit: TransitSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub base_url: String,
    pub livestock_collection: String,
    pub transit_collection: String,
    pub request_timeout_seconds: u64,
    pub max_retry_elapsed_seconds: u64,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageSettings {
    pub default_depth: u32,
    pub depth_ceiling: u32,
    pub lookup_timeout_ms: u64,
    pub parallel_lookups: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitSettings {
    pub min_checkpoints: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            livestock_collection: "livestock".to_string(),
            transit_collection: "in_transit".to_string(),
            request_timeout_seconds: 10,
            max_retry_elapsed_seconds: 5,
            auth_token: None,
        }
    }
}

impl Default for LineageSettings {
    fn default() -> Self {
        Self {
            default_depth: 3,
            depth_ceiling: 10,
            lookup_timeout_ms: 2000,
            parallel_lookups: true,
        }
    }
}

impl Default for TransitSettings {
    fn default() -> Self {
        Self { min_checkpoints: 2 }
    }
}

impl StoreSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn max_retry_elapsed(&self) -> Duration {
        Duration::from_secs(self.max_retry_elapsed_seconds)
    }
}

impl LineageSettings {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Settings supplied through the environment; `None` leaves the loaded value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub auth_token: Option<String>,
    pub default_depth: Option<u32>,
    pub depth_ceiling: Option<u32>,
    pub lookup_timeout_ms: Option<u64>,
    pub parallel_lookups: Option<bool>,
}

impl ConfigOverrides {
    /// Collect overrides through `lookup`, which maps a variable name to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            base_url: lookup("HERDBOOK_STORE_URL"),
            auth_token: lookup("HERDBOOK_STORE_TOKEN"),
            default_depth: parse_var(&lookup, "HERDBOOK_LINEAGE_DEPTH")?,
            depth_ceiling: parse_var(&lookup, "HERDBOOK_DEPTH_CEILING")?,
            lookup_timeout_ms: parse_var(&lookup, "HERDBOOK_LOOKUP_TIMEOUT_MS")?,
            parallel_lookups: parse_var(&lookup, "HERDBOOK_PARALLEL_LOOKUPS")?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("{}={} is not valid", key, raw)))
        .transpose()
}

impl Config {
    /// Load configuration from file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Read the `HERDBOOK_*` environment overrides
    pub fn load_from_env() -> Result<ConfigOverrides> {
        ConfigOverrides::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides on top of this configuration. Every field the
    /// overrides set wins, even when it equals the default.
    pub fn merge_with(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.base_url {
            self.store.base_url = base_url;
        }
        if let Some(token) = overrides.auth_token {
            self.store.auth_token = Some(token);
        }
        if let Some(depth) = overrides.default_depth {
            self.lineage.default_depth = depth;
        }
        if let Some(ceiling) = overrides.depth_ceiling {
            self.lineage.depth_ceiling = ceiling;
        }
        if let Some(timeout) = overrides.lookup_timeout_ms {
            self.lineage.lookup_timeout_ms = timeout;
        }
        if let Some(parallel) = overrides.parallel_lookups {
            self.lineage.parallel_lookups = parallel;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store.base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("Record store base URL must not be empty"));
        }

        if self.store.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Request timeout must be greater than 0"));
        }

        if self.lineage.lookup_timeout_ms == 0 {
            return Err(anyhow::anyhow!("Lookup timeout must be greater than 0"));
        }

        if self.lineage.depth_ceiling == 0 {
            return Err(anyhow::anyhow!("Depth ceiling must be at least 1"));
        }

        if self.lineage.default_depth > self.lineage.depth_ceiling {
            return Err(anyhow::anyhow!(
                "Default lineage depth {} exceeds the depth ceiling {}",
                self.lineage.default_depth,
                self.lineage.depth_ceiling
            ));
        }

        if self.transit.min_checkpoints < 2 {
            return Err(anyhow::anyhow!(
                "A transit route needs at least 2 checkpoints for departure and arrival"
            ));
        }

        Ok(())
    }
}
