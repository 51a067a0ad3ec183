//! Logger configuration and presets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Filter directive variable, checked before `RUST_LOG`.
pub(crate) const ENV_LEVEL: &str = "BUILDLINE_LOG";
/// Output format variable: `pretty`, `compact` or `json`.
pub(crate) const ENV_FORMAT: &str = "BUILDLINE_LOG_FORMAT";

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line, human-oriented.
    Pretty,
    /// Single-line, human-oriented.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
}

impl FromStr for Format {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(LogError::Format(other.to_owned())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        })
    }
}

/// Logger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `EnvFilter` directives, e.g. `info,buildline_service=debug`.
    pub level: String,
    /// Output format.
    pub format: Format,
    /// Colored output. Ignored for JSON.
    pub ansi: bool,
    /// Include the event target.
    pub target: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            ansi: true,
            target: true,
        }
    }
}

impl Config {
    /// Create configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup(ENV_LEVEL).or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        // An unknown format keeps the default rather than failing startup.
        if let Some(format) = lookup(ENV_FORMAT)
            && let Ok(format) = format.parse()
        {
            config.format = format;
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            ansi: false,
            target: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn buildline_log_wins_over_rust_log() {
        let config = Config::from_lookup(lookup(&[
            ("RUST_LOG", "warn"),
            (ENV_LEVEL, "buildline_service=debug"),
        ]));
        assert_eq!(config.level, "buildline_service=debug");
    }

    #[test]
    fn rust_log_is_the_fallback() {
        let config = Config::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn unknown_format_keeps_default() {
        let config = Config::from_lookup(lookup(&[(ENV_FORMAT, "logfmt")]));
        assert_eq!(config.format, Format::Compact);
    }

    #[rstest]
    #[case("pretty", Format::Pretty)]
    #[case(" JSON ", Format::Json)]
    #[case("compact", Format::Compact)]
    fn format_parses(#[case] input: &str, #[case] expected: Format) {
        assert_eq!(input.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn presets() {
        let dev = Config::development();
        assert_eq!(dev.format, Format::Pretty);
        assert_eq!(dev.level, "debug");

        let prod = Config::production();
        assert_eq!(prod.format, Format::Json);
        assert!(!prod.ansi);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: Config = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.level, "info");
    }
}
