//! Primitives for loading and querying configuration data.
#![deny(warnings)]
#![deny(missing_docs)]

use std::{borrow::Cow, collections::HashSet, path::Path, sync::Arc};

pub use figment::value;
use figment::{
    error::Kind,
    providers::{Env, Serialized},
    Figment, Profile, Provider as _,
};
use histoview_error::GenericError;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt as _, Snafu};
use tracing::debug;

mod provider;
use self::provider::ResolvedProvider;

/// A configuration error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum ConfigurationError {
    /// Environment variable prefix was empty.
    #[snafu(display("Environment variable prefix must not be empty."))]
    EmptyPrefix,

    /// Requested field was missing from the configuration.
    #[snafu(display("Missing field '{}' in configuration. {}", field, help_text))]
    MissingField {
        /// Help text describing how to set the missing field.
        ///
        /// Includes the environment variable form of the key when environment variables were loaded.
        help_text: String,

        /// Name of the missing field.
        field: Cow<'static, str>,
    },

    /// Requested field's data type was not the expected data type.
    #[snafu(display(
        "Expected value for field '{}' to be '{}', got '{}' instead.",
        field,
        expected_ty,
        actual_ty
    ))]
    InvalidFieldType {
        /// Name of the invalid field.
        ///
        /// This is a period-separated path to the field.
        field: String,

        /// Expected data type.
        expected_ty: String,

        /// Actual data type.
        actual_ty: String,
    },

    /// Generic configuration error.
    #[snafu(display("Failed to query configuration."))]
    Generic {
        /// Error source.
        source: GenericError,
    },
}

impl From<figment::Error> for ConfigurationError {
    fn from(e: figment::Error) -> Self {
        match e.kind {
            Kind::InvalidType(actual_ty, expected_ty) => Self::InvalidFieldType {
                field: e.path.join("."),
                expected_ty,
                actual_ty: actual_ty.to_string(),
            },
            _ => Self::Generic { source: e.into() },
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum LookupSource {
    /// The configuration key is looked up in a form suitable for environment variables.
    Environment { prefix: String },
}

impl LookupSource {
    fn transform_key(&self, key: &str) -> String {
        match self {
            // The prefix is already uppercased with a trailing underscore.
            LookupSource::Environment { prefix } => format!("{}{}", prefix, key.replace('.', "_").to_uppercase()),
        }
    }
}

struct BoxedProvider(Box<dyn figment::Provider + Send + Sync>);

impl figment::Provider for BoxedProvider {
    fn metadata(&self) -> figment::Metadata {
        self.0.metadata()
    }

    fn data(&self) -> Result<figment::value::Map<figment::Profile, figment::value::Dict>, figment::Error> {
        self.0.data()
    }
}

/// A configuration loader that can pull from various sources.
///
/// This wraps `figment` to expose a small API for loading configuration from several sources and then querying it.
/// Sources added later take precedence over sources added earlier: a value present in a later source replaces the value
/// from an earlier one, including lists.
///
/// # Supported sources
///
/// - YAML file
/// - JSON file
/// - explicit key/value properties (see [`with_property`][Self::with_property])
/// - environment variables (must be prefixed; see [`from_environment`][Self::from_environment])
#[derive(Default)]
pub struct ConfigurationLoader {
    lookup_sources: HashSet<LookupSource>,
    providers: Vec<BoxedProvider>,
}

impl ConfigurationLoader {
    /// Loads the given YAML configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid YAML, an error will be returned.
    pub fn from_yaml<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let resolved_provider = ResolvedProvider::from_yaml(&path).map_err(GenericError::from).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(resolved_provider)));
        Ok(self)
    }

    /// Attempts to load the given YAML configuration file, ignoring any errors.
    ///
    /// Errors include the file not existing, not being readable/accessible, and not being valid YAML.
    pub fn try_from_yaml<P>(mut self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        match ResolvedProvider::from_yaml(&path) {
            Ok(resolved_provider) => {
                self.providers.push(BoxedProvider(Box::new(resolved_provider)));
            }
            Err(e) => {
                debug!(error = %e, file_path = %path.as_ref().to_string_lossy(), "Unable to read YAML configuration file. Ignoring.");
            }
        }
        self
    }

    /// Loads the given JSON configuration file.
    ///
    /// # Errors
    ///
    /// If the file could not be read, or if the file is not valid JSON, an error will be returned.
    pub fn from_json<P>(mut self, path: P) -> Result<Self, ConfigurationError>
    where
        P: AsRef<Path>,
    {
        let resolved_provider = ResolvedProvider::from_json(&path).map_err(GenericError::from).context(Generic)?;
        self.providers.push(BoxedProvider(Box::new(resolved_provider)));
        Ok(self)
    }

    /// Attempts to load the given JSON configuration file, ignoring any errors.
    ///
    /// Errors include the file not existing, not being readable/accessible, and not being valid JSON.
    pub fn try_from_json<P>(mut self, path: P) -> Self
    where
        P: AsRef<Path>,
    {
        match ResolvedProvider::from_json(&path) {
            Ok(resolved_provider) => {
                self.providers.push(BoxedProvider(Box::new(resolved_provider)));
            }
            Err(e) => {
                debug!(error = %e, file_path = %path.as_ref().to_string_lossy(), "Unable to read JSON configuration file. Ignoring.");
            }
        }
        self
    }

    /// Sets a single configuration value.
    ///
    /// The key must be in the form of `a.b.c`, where periods (`.`) indicate nesting, so `otel.histogram.buckets` can be
    /// queried back with the same key.
    pub fn with_property<V>(mut self, key: &str, value: V) -> Self
    where
        V: Serialize + Send + Sync + 'static,
    {
        self.providers.push(BoxedProvider(Box::new(Serialized::default(key, value))));
        self
    }

    /// Loads configuration from the process environment.
    ///
    /// The prefix given will have an underscore appended to it if it does not already end with one. For example, with a
    /// prefix of `app`, any environment variable starting with `app_` would be matched. The prefix is case-insensitive.
    ///
    /// Values that look like numbers or booleans are loaded as such, so `OTEL_FOO=5` is read back as the number `5`.
    ///
    /// # Errors
    ///
    /// If the prefix is empty, or the environment could not be read, an error will be returned.
    pub fn from_environment(mut self, prefix: &str) -> Result<Self, ConfigurationError> {
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }

        let prefix = if prefix.ends_with('_') {
            prefix.to_uppercase()
        } else {
            format!("{}_", prefix.to_uppercase())
        };

        // `Env` is neither `Send` nor `Sync`, so its values are snapshotted into a serialized provider.
        let values = Env::prefixed(&prefix).data()?;
        if let Some(default_dict) = values.get(&Profile::Default) {
            self.providers
                .push(BoxedProvider(Box::new(Serialized::defaults(default_dict.clone()))));
            self.lookup_sources.insert(LookupSource::Environment { prefix });
        }
        Ok(self)
    }

    fn build_figment(providers: &[BoxedProvider]) -> Figment {
        providers
            .iter()
            .fold(Figment::new(), |figment, provider| figment.merge(provider))
    }

    /// Consumes the configuration loader, deserializing it as `T`.
    ///
    /// ## Errors
    ///
    /// If the configuration could not be deserialized into `T`, an error will be returned.
    pub fn into_typed<'a, T>(self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        Self::build_figment(&self.providers).extract().map_err(Into::into)
    }

    /// Consumes the configuration loader and wraps it in a generic wrapper.
    pub fn into_generic(self) -> GenericConfiguration {
        let figment = Self::build_figment(&self.providers);
        GenericConfiguration {
            inner: Arc::new(Inner {
                figment,
                lookup_sources: self.lookup_sources,
            }),
        }
    }
}

#[derive(Debug)]
struct Inner {
    figment: Figment,
    lookup_sources: HashSet<LookupSource>,
}

/// A generic configuration object.
///
/// This represents the merged configuration derived from [`ConfigurationLoader`] in its raw form. Values can be
/// queried by key, and can be extracted either as typed values or in their raw form.
///
/// Keys must be in the form of `a.b.c`, where periods (`.`) indicate a nested value. Querying `a.b.c` against the
/// following YAML returns `"value"`:
///
/// ```yaml
/// a:
///   b:
///     c: value
/// ```
///
/// Environment variables are never nested, so a key that is missing in its nested form is retried with every `.`
/// replaced by `_`. This way `histogram.buckets` finds the value of `OTEL_HISTOGRAM_BUCKETS` loaded with an `OTEL`
/// prefix.
#[derive(Clone, Debug)]
pub struct GenericConfiguration {
    inner: Arc<Inner>,
}

impl GenericConfiguration {
    fn get<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.inner.figment.extract_inner(key) {
            Ok(value) => Ok(value),
            Err(e) => {
                if matches!(e.kind, Kind::MissingField(_)) {
                    let fallback_key = key.replace('.', "_");
                    self.inner
                        .figment
                        .extract_inner(&fallback_key)
                        .map_err(|fallback_e| from_figment_error(&self.inner.lookup_sources, fallback_e))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Gets a configuration value by key.
    ///
    /// ## Errors
    ///
    /// If the key does not exist in the configuration, or if the value could not be deserialized into `T`, an error
    /// variant will be returned.
    pub fn get_typed<'a, T>(&self, key: &str) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.get(key)
    }

    /// Gets a configuration value by key, or the default value if a key does not exist or could not be deserialized.
    ///
    /// This swallows any errors and should be used sparingly.
    pub fn get_typed_or_default<'a, T>(&self, key: &str) -> T
    where
        T: Default + Deserialize<'a>,
    {
        self.get(key).unwrap_or_default()
    }

    /// Gets a configuration value by key, if it exists.
    ///
    /// Returns `Ok(None)` when the key is missing.
    ///
    /// ## Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn try_get_typed<'a, T>(&self, key: &str) -> Result<Option<T>, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigurationError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Attempts to deserialize the entire configuration as `T`.
    ///
    /// ## Errors
    ///
    /// If the value could not be deserialized into `T`, an error will be returned.
    pub fn as_typed<'a, T>(&self) -> Result<T, ConfigurationError>
    where
        T: Deserialize<'a>,
    {
        self.inner
            .figment
            .extract()
            .map_err(|e| from_figment_error(&self.inner.lookup_sources, e))
    }
}

fn from_figment_error(lookup_sources: &HashSet<LookupSource>, e: figment::Error) -> ConfigurationError {
    match e.kind {
        Kind::MissingField(field) => {
            let mut valid_keys = lookup_sources
                .iter()
                .map(|source| source.transform_key(&field))
                .collect::<Vec<_>>();

            // Always specify the original key as a valid key to try.
            valid_keys.insert(0, field.to_string());

            let help_text = format!("Try setting `{}`.", valid_keys.join("` or `"));

            ConfigurationError::MissingField { help_text, field }
        }
        Kind::InvalidType(actual_ty, expected_ty) => ConfigurationError::InvalidFieldType {
            field: e.path.join("."),
            expected_ty,
            actual_ty: actual_ty.to_string(),
        },
        _ => ConfigurationError::Generic { source: e.into() },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use figment::Jail;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Logging {
        log_level: String,
        #[serde(default)]
        log_format_json: bool,
    }

    #[test]
    fn empty_environment_prefix() {
        let result = ConfigurationLoader::default().from_environment("");
        assert!(matches!(result, Err(ConfigurationError::EmptyPrefix)));
    }

    #[test]
    fn environment_key_matches_nested_lookup() {
        Jail::expect_with(|jail| {
            jail.set_env("OTEL_HISTOGRAM_BUCKETS", "0,5,10");
            jail.set_env("HISTOVIEW_TEST_UNRELATED", "value");

            let config = ConfigurationLoader::default().from_environment("otel").unwrap().into_generic();

            let buckets: String = config.get_typed("histogram.buckets").unwrap();
            assert_eq!(buckets, "0,5,10");
            assert_eq!(config.try_get_typed::<String>("histoview_test_unrelated").unwrap(), None);
            Ok(())
        });
    }

    #[test]
    fn environment_values_are_typed() {
        Jail::expect_with(|jail| {
            jail.set_env("OTEL_HISTOGRAM_BUCKETS", "5");

            let config = ConfigurationLoader::default().from_environment("OTEL_").unwrap().into_generic();

            let buckets: f64 = config.get_typed("histogram_buckets").unwrap();
            assert_eq!(buckets, 5.0);
            Ok(())
        });
    }

    #[test]
    fn missing_field_mentions_environment_variable() {
        Jail::expect_with(|jail| {
            jail.set_env("OTEL_SERVICE_NAME", "checkout");

            let config = ConfigurationLoader::default().from_environment("OTEL").unwrap().into_generic();

            match config.get_typed::<String>("histogram.buckets") {
                Err(ConfigurationError::MissingField { help_text, .. }) => {
                    assert!(help_text.contains("OTEL_HISTOGRAM_BUCKETS"), "help text: {}", help_text);
                }
                other => panic!("expected missing field error, got {:?}", other),
            }
            Ok(())
        });
    }

    #[test]
    fn property_is_nested() {
        let config = ConfigurationLoader::default()
            .with_property("otel.histogram.buckets", "1,2,3")
            .into_generic();

        assert_eq!(
            config.try_get_typed::<String>("otel.histogram.buckets").unwrap(),
            Some("1,2,3".to_string())
        );
        assert_eq!(config.try_get_typed::<String>("otel.histogram.unknown").unwrap(), None);
    }

    #[test]
    fn later_sources_take_precedence() {
        let config = ConfigurationLoader::default()
            .with_property("otel.histogram.buckets", vec![1.0, 2.0])
            .with_property("otel.histogram.buckets", vec![3.0])
            .into_generic();

        let buckets: Vec<f64> = config.get_typed("otel.histogram.buckets").unwrap();
        assert_eq!(buckets, vec![3.0]);
    }

    #[test]
    fn yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level: debug\notel:\n  histogram:\n    buckets: [0, 10, 100]").unwrap();

        let config = ConfigurationLoader::default().from_yaml(file.path()).unwrap().into_generic();

        let buckets: Vec<f64> = config.get_typed("otel.histogram.buckets").unwrap();
        assert_eq!(buckets, vec![0.0, 10.0, 100.0]);
        assert_eq!(config.get_typed::<String>("log_level").unwrap(), "debug");
    }

    #[test]
    fn json_file_into_typed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "log_level": "warn", "log_format_json": true }}"#).unwrap();

        let logging: Logging = ConfigurationLoader::default().from_json(file.path()).unwrap().into_typed().unwrap();
        assert_eq!(
            logging,
            Logging {
                log_level: "warn".to_string(),
                log_format_json: true
            }
        );
    }

    #[test]
    fn missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");

        assert!(ConfigurationLoader::default().from_yaml(&path).is_err());

        let config = ConfigurationLoader::default().try_from_yaml(&path).try_from_json(&path).into_generic();
        assert_eq!(config.try_get_typed::<String>("log_level").unwrap(), None);
    }

    #[test]
    fn get_typed_or_default_swallows_type_errors() {
        let config = ConfigurationLoader::default().with_property("log_level", "info").into_generic();

        assert!(config.get_typed::<bool>("log_level").is_err());
        assert!(!config.get_typed_or_default::<bool>("log_level"));
    }
}
