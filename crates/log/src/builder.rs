//! Subscriber installation.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Config, Format};
use crate::error::LogError;

/// Install the global subscriber described by `config`.
///
/// Fails if the filter does not parse or a subscriber is already installed.
pub fn init(config: &Config) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::Filter(format!("{}: {e}", config.level)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        Format::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(config.ansi)
                    .with_target(config.target),
            )
            .try_init(),
        Format::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(config.ansi)
                    .with_target(config.target),
            )
            .try_init(),
        Format::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(config.target),
            )
            .try_init(),
    };
    installed.map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

    tracing::debug!(format = %config.format, level = %config.level, "logger initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_is_rejected_before_install() {
        let config = Config {
            level: "buildline=loud".into(),
            ..Config::default()
        };
        let err = init(&config).unwrap_err();
        assert!(matches!(err, LogError::Filter(_)), "{err}");
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let config = Config {
            ansi: false,
            ..Config::default()
        };
        init(&config).unwrap();
        let err = init(&config).unwrap_err();
        assert!(matches!(err, LogError::AlreadyInitialized(_)), "{err}");
    }
}
