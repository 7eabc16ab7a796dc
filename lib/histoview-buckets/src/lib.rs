//! Histogram bucket boundaries for duration metrics.
//!
//! At startup, a [`BoundarySet`] is resolved from user configuration (the `otel.histogram.buckets` property, then the
//! `OTEL_HISTOGRAM_BUCKETS` environment variable), falling back to a fixed default set. The resolved set is then
//! registered with a metrics runtime as a view that applies explicit-bucket histogram aggregation to every histogram
//! whose name matches `*duration`.
//!
//! ```
//! use histoview_buckets::{BucketSources, HistogramBucketCustomizer, InstrumentKind, RegisteredViews};
//!
//! let sources = BucketSources::new().with_environment("0, 10, 100");
//! let views = HistogramBucketCustomizer::from_sources(&sources)
//!     .customize(RegisteredViews::new())
//!     .unwrap();
//!
//! let view = views.view_for(InstrumentKind::Histogram, "http.server.duration").unwrap();
//! assert_eq!(view.aggregation().boundaries().unwrap().as_slice(), &[0.0, 10.0, 100.0]);
//! ```
#![deny(warnings)]
#![deny(missing_docs)]

mod boundaries;
pub use self::boundaries::{BoundaryParseError, BoundarySet, DEFAULT_BOUNDARIES};

mod customizer;
pub use self::customizer::{HistogramBucketCustomizer, DURATION_INSTRUMENT_PATTERN};

#[cfg(feature = "prometheus")]
pub mod prometheus;

mod resolver;
pub use self::resolver::{resolve_buckets, try_resolve_buckets};

mod sources;
pub use self::sources::{
    BucketSources, BUCKETS_ENVIRONMENT_KEY, BUCKETS_ENVIRONMENT_PREFIX, BUCKETS_ENVIRONMENT_VARIABLE, BUCKETS_PROPERTY,
};

pub mod view;
pub use self::view::{Aggregation, InstrumentKind, InstrumentSelector, NamePattern, RegisteredViews, View, ViewRegistry};
