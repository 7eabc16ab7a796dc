use histoview_config::{ConfigurationError, ConfigurationLoader, GenericConfiguration};
use serde::Deserialize;
use tracing::warn;

/// Property key holding user-supplied bucket boundaries.
pub const BUCKETS_PROPERTY: &str = "otel.histogram.buckets";

/// Prefix used when loading bucket configuration from the environment.
pub const BUCKETS_ENVIRONMENT_PREFIX: &str = "OTEL";

/// Key, relative to [`BUCKETS_ENVIRONMENT_PREFIX`], holding user-supplied bucket boundaries in the environment.
pub const BUCKETS_ENVIRONMENT_KEY: &str = "histogram.buckets";

/// Environment variable holding user-supplied bucket boundaries.
pub const BUCKETS_ENVIRONMENT_VARIABLE: &str = "OTEL_HISTOGRAM_BUCKETS";

/// User-supplied bucket boundary inputs.
///
/// Boundaries can come from two places: a property, and an environment variable. The property takes precedence. An
/// empty value is treated the same as a missing one, so an empty property still lets the environment variable through.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BucketSources {
    property: Option<String>,
    environment: Option<String>,
}

impl BucketSources {
    /// Creates an empty `BucketSources`, with neither source set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the property value.
    pub fn with_property<S: Into<String>>(mut self, value: S) -> Self {
        self.property = Some(value.into());
        self
    }

    /// Sets the environment variable value.
    pub fn with_environment<S: Into<String>>(mut self, value: S) -> Self {
        self.environment = Some(value.into());
        self
    }

    /// Reads both sources from configuration.
    ///
    /// `properties` is queried for [`BUCKETS_PROPERTY`], and `environment` for [`BUCKETS_ENVIRONMENT_KEY`] (that is,
    /// `OTEL_HISTOGRAM_BUCKETS` when loaded with the `OTEL` prefix).
    ///
    /// Values may be strings, single numbers, or lists of numbers or strings, as a YAML or JSON file would express them.
    /// Lists are joined into the comma-separated form. A value of any other type is logged and ignored.
    pub fn from_configuration(properties: &GenericConfiguration, environment: &GenericConfiguration) -> Self {
        Self {
            property: read_boundaries(properties, BUCKETS_PROPERTY),
            environment: read_boundaries(environment, BUCKETS_ENVIRONMENT_KEY),
        }
    }

    /// Reads the property from `properties`, and the environment variable from the process environment.
    ///
    /// # Errors
    ///
    /// If the process environment cannot be loaded, an error is returned.
    pub fn from_process(properties: &GenericConfiguration) -> Result<Self, ConfigurationError> {
        let environment = ConfigurationLoader::default()
            .from_environment(BUCKETS_ENVIRONMENT_PREFIX)?
            .into_generic();

        Ok(Self::from_configuration(properties, &environment))
    }

    /// Returns the property value, if set.
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    /// Returns the environment variable value, if set.
    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    /// Returns the value that should be used, if any.
    ///
    /// This is the property when it is non-empty, otherwise the environment variable when it is non-empty. A value made
    /// only of whitespace is not empty, and is returned as-is.
    pub fn user_value(&self) -> Option<&str> {
        non_empty(self.property()).or_else(|| non_empty(self.environment()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn read_boundaries(config: &GenericConfiguration, key: &'static str) -> Option<String> {
    match config.try_get_typed::<RawBoundaries>(key) {
        Ok(raw) => raw.map(RawBoundaries::into_text),
        Err(e) => {
            warn!(error = %e, key, "Ignoring histogram bucket setting with an unsupported value type.");
            None
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBoundaries {
    Text(String),
    Number(f64),
    List(Vec<RawBoundary>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBoundary {
    Number(f64),
    Text(String),
}

impl RawBoundaries {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(value) => value.to_string(),
            Self::List(values) => values
                .into_iter()
                .map(|value| match value {
                    RawBoundary::Number(value) => value.to_string(),
                    RawBoundary::Text(text) => text,
                })
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}
