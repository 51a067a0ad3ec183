//! Service configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ServiceConfig::projection_cache_capacity`].
pub const ENV_CACHE_CAPACITY: &str = "BUILDLINE_CACHE_CAPACITY";
/// Environment variable overriding [`ServiceConfig::projection_cache_ttl`], in milliseconds.
pub const ENV_CACHE_TTL_MS: &str = "BUILDLINE_CACHE_TTL_MS";
/// Environment variable overriding [`ServiceConfig::max_parts_per_template`].
pub const ENV_MAX_PARTS: &str = "BUILDLINE_MAX_PARTS";

/// Tuning knobs for the template and catalog services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum number of cached template projections. `0` disables the cache.
    pub projection_cache_capacity: u64,
    /// Time-to-live for a cached projection; `None` keeps entries until
    /// evicted or invalidated.
    #[serde(with = "duration_ms")]
    pub projection_cache_ttl: Option<Duration>,
    /// Upper bound accepted for a template's `numberOfParts`.
    pub max_parts_per_template: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            projection_cache_capacity: 1024,
            projection_cache_ttl: Some(Duration::from_secs(300)),
            max_parts_per_template: 64,
        }
    }
}

impl ServiceConfig {
    /// Defaults with the projection cache turned off.
    #[must_use]
    pub fn uncached() -> Self {
        Self {
            projection_cache_capacity: 0,
            ..Self::default()
        }
    }

    /// Defaults overridden by `BUILDLINE_*` environment variables.
    ///
    /// Unparsable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(capacity) = parse_var(&lookup, ENV_CACHE_CAPACITY) {
            config.projection_cache_capacity = capacity;
        }
        if let Some(ttl_ms) = parse_var::<u64>(&lookup, ENV_CACHE_TTL_MS) {
            config.projection_cache_ttl = (ttl_ms > 0).then(|| Duration::from_millis(ttl_ms));
        }
        if let Some(max_parts) = parse_var(&lookup, ENV_MAX_PARTS) {
            config.max_parts_per_template = max_parts;
        }
        config
    }

    /// Set the projection cache capacity.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.projection_cache_capacity = capacity;
        self
    }

    /// Set the projection cache time-to-live.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.projection_cache_ttl = ttl;
        self
    }

    /// Set the upper bound for `numberOfParts`.
    #[must_use]
    pub fn with_max_parts(mut self, max_parts: u32) -> Self {
        self.max_parts_per_template = max_parts;
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = key, value = %raw, "ignoring unparsable configuration value");
            None
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.projection_cache_capacity, 1024);
        assert_eq!(config.projection_cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.max_parts_per_template, 64);
        assert_eq!(ServiceConfig::uncached().projection_cache_capacity, 0);
    }

    #[test]
    fn env_overrides_apply() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ENV_CACHE_CAPACITY, "16"),
            (ENV_CACHE_TTL_MS, "1500"),
            (ENV_MAX_PARTS, "8"),
        ]));
        assert_eq!(config.projection_cache_capacity, 16);
        assert_eq!(config.projection_cache_ttl, Some(Duration::from_millis(1500)));
        assert_eq!(config.max_parts_per_template, 8);
    }

    #[test]
    fn zero_ttl_means_no_expiry() {
        let config = ServiceConfig::from_lookup(lookup(&[(ENV_CACHE_TTL_MS, "0")]));
        assert_eq!(config.projection_cache_ttl, None);
    }

    #[test]
    fn unparsable_env_values_keep_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[
            (ENV_CACHE_CAPACITY, "lots"),
            (ENV_MAX_PARTS, "-3"),
        ]));
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn deserializes_with_per_field_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"projection_cache_ttl": 250}"#).unwrap();
        assert_eq!(config.projection_cache_ttl, Some(Duration::from_millis(250)));
        assert_eq!(config.projection_cache_capacity, 1024);

        let json = serde_json::to_value(ServiceConfig::uncached()).unwrap();
        assert_eq!(json["projection_cache_ttl"], 300_000);
    }
}
