//! Views for the Prometheus exporter.
//!
//! [`PrometheusBuilder`] only lets histogram bucket boundaries be overridden, by matching on the metric name's prefix,
//! suffix, or the full name. Views are translated accordingly:
//!
//! - `*` (or no name criterion) sets the default buckets for all histograms
//! - `*suffix` matches names ending with `suffix`
//! - `prefix*` matches names starting with `prefix`
//! - a pattern without wildcards matches that exact name
//!
//! Name matching is case-sensitive in the exporter, unlike [`NamePattern::matches`].
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder};
use snafu::{ResultExt as _, Snafu};

use crate::{Aggregation, InstrumentKind, InstrumentSelector, NamePattern, View, ViewRegistry};

/// An error registering a view with the Prometheus exporter.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
pub enum PrometheusViewError {
    /// The selector targets an instrument kind other than histograms.
    #[snafu(display("Bucket overrides only apply to histograms, not {:?} instruments.", kind))]
    UnsupportedInstrumentKind {
        /// Selected instrument kind.
        kind: InstrumentKind,
    },

    /// The view uses an aggregation the exporter cannot apply.
    #[snafu(display("The '{}' aggregation is not supported by the Prometheus exporter.", aggregation))]
    UnsupportedAggregation {
        /// Name of the aggregation.
        aggregation: &'static str,
    },

    /// The name pattern has no equivalent metric matcher.
    #[snafu(display("Name pattern '{}' cannot be expressed as a Prometheus metric matcher.", pattern))]
    UnsupportedNamePattern {
        /// The name pattern.
        pattern: String,
    },

    /// The exporter rejected the buckets.
    #[snafu(display("Failed to set histogram buckets."))]
    Build {
        /// Error source.
        source: BuildError,
    },
}

impl ViewRegistry for PrometheusBuilder {
    type Error = PrometheusViewError;

    fn register_view(self, selector: InstrumentSelector, view: View) -> Result<Self, Self::Error> {
        if let Some(kind) = selector.kind() {
            if kind != InstrumentKind::Histogram {
                return UnsupportedInstrumentKind { kind }.fail();
            }
        }

        let boundaries = match view.aggregation() {
            Aggregation::Default => return Ok(self),
            Aggregation::ExplicitBucketHistogram { boundaries, .. } => boundaries,
            other => {
                return UnsupportedAggregation {
                    aggregation: other.name(),
                }
                .fail()
            }
        };

        let builder = match selector.name().map(name_matcher).transpose()?.flatten() {
            Some(matcher) => self.set_buckets_for_metric(matcher, boundaries.as_slice()),
            None => self.set_buckets(boundaries.as_slice()),
        };
        builder.context(Build)
    }
}

/// Translates a name pattern into a metric matcher.
///
/// Returns `Ok(None)` when the pattern matches every name.
fn name_matcher(pattern: &NamePattern) -> Result<Option<Matcher>, PrometheusViewError> {
    let raw = pattern.as_str();
    if raw.chars().all(|c| c == '*') && !raw.is_empty() {
        return Ok(None);
    }

    if !raw.contains('?') {
        if !pattern.has_wildcards() {
            return Ok(Some(Matcher::Full(raw.to_string())));
        }

        if let Some(suffix) = raw.strip_prefix('*') {
            if !suffix.contains('*') {
                return Ok(Some(Matcher::Suffix(suffix.to_string())));
            }
        }

        if let Some(prefix) = raw.strip_suffix('*') {
            if !prefix.contains('*') {
                return Ok(Some(Matcher::Prefix(prefix.to_string())));
            }
        }
    }

    UnsupportedNamePattern { pattern: raw }.fail()
}
