//! Views: aggregation overrides for selected instruments.
//!
//! A metrics runtime decides how to aggregate the measurements of each instrument. A [`View`] overrides that decision for
//! every instrument matched by an [`InstrumentSelector`]. Runtimes accept views by implementing [`ViewRegistry`].

use std::convert::Infallible;

use crate::BoundarySet;

static DEFAULT_AGGREGATION: Aggregation = Aggregation::Default;

mod pattern;
pub use self::pattern::NamePattern;

/// The kind of an instrument.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InstrumentKind {
    /// Monotonic counter.
    Counter,

    /// Non-monotonic counter.
    UpDownCounter,

    /// Histogram.
    Histogram,

    /// Gauge.
    Gauge,

    /// Monotonic counter, observed via callback.
    ObservableCounter,

    /// Non-monotonic counter, observed via callback.
    ObservableUpDownCounter,

    /// Gauge, observed via callback.
    ObservableGauge,
}

/// Selects instruments by kind and name.
///
/// Each criterion is optional, and an instrument is selected only when it satisfies every criterion that is set. A
/// selector with no criteria selects all instruments.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstrumentSelector {
    kind: Option<InstrumentKind>,
    name: Option<NamePattern>,
}

impl InstrumentSelector {
    /// Creates a selector that selects all instruments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the selector to instruments of the given kind.
    pub fn with_kind(mut self, kind: InstrumentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts the selector to instruments whose name matches the given pattern.
    pub fn with_name<P: Into<NamePattern>>(mut self, pattern: P) -> Self {
        self.name = Some(pattern.into());
        self
    }

    /// Returns the instrument kind criterion, if any.
    pub fn kind(&self) -> Option<InstrumentKind> {
        self.kind
    }

    /// Returns the name pattern criterion, if any.
    pub fn name(&self) -> Option<&NamePattern> {
        self.name.as_ref()
    }

    /// Returns `true` if an instrument of the given kind and name is selected.
    pub fn matches(&self, kind: InstrumentKind, name: &str) -> bool {
        self.kind.map_or(true, |selected| selected == kind)
            && self.name.as_ref().map_or(true, |pattern| pattern.matches(name))
    }
}

/// An aggregation strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum Aggregation {
    /// Whatever the runtime would use for the instrument kind.
    Default,

    /// Measurements are dropped.
    Drop,

    /// Measurements are summed.
    Sum,

    /// The last measurement is kept.
    LastValue,

    /// Measurements are counted into buckets with fixed, caller-specified boundaries.
    ExplicitBucketHistogram {
        /// Bucket boundaries.
        boundaries: BoundarySet,

        /// Whether the minimum and maximum measurement are recorded as well.
        record_min_max: bool,
    },
}

impl Aggregation {
    /// Creates an explicit-bucket histogram aggregation with the given boundaries, recording min/max.
    pub fn explicit_bucket_histogram(boundaries: BoundarySet) -> Self {
        Self::ExplicitBucketHistogram {
            boundaries,
            record_min_max: true,
        }
    }

    /// Returns the bucket boundaries, if this is an explicit-bucket histogram aggregation.
    pub fn boundaries(&self) -> Option<&BoundarySet> {
        match self {
            Self::ExplicitBucketHistogram { boundaries, .. } => Some(boundaries),
            _ => None,
        }
    }

    /// Returns a short name for the aggregation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Drop => "drop",
            Self::Sum => "sum",
            Self::LastValue => "last value",
            Self::ExplicitBucketHistogram { .. } => "explicit bucket histogram",
        }
    }
}

/// An aggregation override for the instruments matched by a selector.
#[derive(Clone, Debug, PartialEq)]
pub struct View {
    aggregation: Aggregation,
}

impl View {
    /// Creates a view that applies the given aggregation.
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }

    /// Returns the aggregation applied by this view.
    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }
}

/// A metrics runtime that accepts views.
///
/// Registration is builder-style: the registry is consumed and handed back on success, so runtimes configured through
/// a builder can implement this directly on the builder.
pub trait ViewRegistry: Sized {
    /// Error returned when a view cannot be registered.
    type Error;

    /// Registers `view` for every instrument matched by `selector`.
    ///
    /// # Errors
    ///
    /// If the runtime cannot express the selector or the view, an error is returned.
    fn register_view(self, selector: InstrumentSelector, view: View) -> Result<Self, Self::Error>;
}

/// An in-memory view registry.
///
/// Views are kept in registration order. When several views select the same instrument, the one registered first
/// wins.
#[derive(Clone, Debug, Default)]
pub struct RegisteredViews {
    views: Vec<(InstrumentSelector, View)>,
}

impl RegisteredViews {
    /// Creates an empty `RegisteredViews`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view that applies to the given instrument, if any.
    pub fn view_for(&self, kind: InstrumentKind, name: &str) -> Option<&View> {
        self.views
            .iter()
            .find(|(selector, _)| selector.matches(kind, name))
            .map(|(_, view)| view)
    }

    /// Returns the aggregation to use for the given instrument.
    ///
    /// Falls back to [`Aggregation::Default`] when no view applies.
    pub fn aggregation_for(&self, kind: InstrumentKind, name: &str) -> &Aggregation {
        self.view_for(kind, name)
            .map(View::aggregation)
            .unwrap_or(&DEFAULT_AGGREGATION)
    }

    /// Returns an iterator over the registered views, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&InstrumentSelector, &View)> {
        self.views.iter().map(|(selector, view)| (selector, view))
    }

    /// Returns the number of registered views.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Returns `true` if no views are registered.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

impl ViewRegistry for RegisteredViews {
    type Error = Infallible;

    fn register_view(mut self, selector: InstrumentSelector, view: View) -> Result<Self, Self::Error> {
        self.views.push((selector, view));
        Ok(self)
    }
}
