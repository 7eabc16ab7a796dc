use tracing::debug;

use crate::{
    resolve_buckets, Aggregation, BoundarySet, BucketSources, InstrumentKind, InstrumentSelector, View, ViewRegistry,
};

/// Name pattern selecting the instruments whose buckets are customized.
pub const DURATION_INSTRUMENT_PATTERN: &str = "*duration";

/// Applies custom bucket boundaries to duration histograms.
///
/// Registers a single view with a metrics runtime: every histogram whose name matches [`DURATION_INSTRUMENT_PATTERN`]
/// is aggregated as an explicit-bucket histogram with the configured boundaries.
#[derive(Clone, Debug)]
pub struct HistogramBucketCustomizer {
    boundaries: BoundarySet,
}

impl HistogramBucketCustomizer {
    /// Creates a new `HistogramBucketCustomizer` with the given boundaries.
    pub fn new(boundaries: BoundarySet) -> Self {
        Self { boundaries }
    }

    /// Creates a new `HistogramBucketCustomizer` with the boundaries resolved from `sources`.
    ///
    /// See [`resolve_buckets`] for how the boundaries are chosen.
    pub fn from_sources(sources: &BucketSources) -> Self {
        Self::new(resolve_buckets(sources))
    }

    /// Returns the bucket boundaries.
    pub fn boundaries(&self) -> &BoundarySet {
        &self.boundaries
    }

    /// Returns the selector for duration histograms.
    pub fn selector(&self) -> InstrumentSelector {
        InstrumentSelector::new()
            .with_kind(InstrumentKind::Histogram)
            .with_name(DURATION_INSTRUMENT_PATTERN)
    }

    /// Returns the view applied to duration histograms.
    pub fn view(&self) -> View {
        View::new(Aggregation::explicit_bucket_histogram(self.boundaries.clone()))
    }

    /// Registers the duration histogram view with `registry`.
    ///
    /// # Errors
    ///
    /// If the registry rejects the view, an error is returned.
    pub fn customize<R: ViewRegistry>(&self, registry: R) -> Result<R, R::Error> {
        debug!(
            pattern = DURATION_INSTRUMENT_PATTERN,
            boundaries = %self.boundaries,
            "Registering duration histogram view."
        );
        registry.register_view(self.selector(), self.view())
    }
}
