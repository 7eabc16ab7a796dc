//! Logging.

use histoview_config::GenericConfiguration;
use histoview_error::GenericError;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

mod config;
pub use self::config::LoggingConfiguration;

mod layer;
use self::layer::build_formatting_layer;

/// Initializes the logging subsystem for `tracing`.
///
/// Reads `log_level` from the configuration to determine the filtering directives, defaulting to `info`, and
/// `log_format_json` to choose between JSON and human-readable output on standard output.
///
/// # Errors
///
/// If the logging configuration is invalid, or if the logging subsystem was already initialized, an error will be
/// returned.
pub fn initialize_logging(config: &GenericConfiguration) -> Result<(), GenericError> {
    let logging_config = LoggingConfiguration::from_configuration(config)?;
    let filter_layer = logging_config.level_filter();

    tracing_subscriber::registry()
        .with(build_formatting_layer(&logging_config, std::io::stdout).with_filter(filter_layer))
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use histoview_config::ConfigurationLoader;

    use super::*;

    #[test]
    fn initializes_once() {
        let config = ConfigurationLoader::default()
            .with_property("log_level", "warn")
            .into_generic();

        assert!(initialize_logging(&config).is_ok());
        assert!(initialize_logging(&config).is_err());
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = ConfigurationLoader::default().with_property("log_level", "").into_generic();
        assert!(initialize_logging(&config).is_err());
    }
}
