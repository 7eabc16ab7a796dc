//! Application bootstrap helpers.
//!
//! Hosts call into this crate once at startup to initialize logging and to install a metrics recorder that applies the
//! duration histogram buckets.
#![deny(warnings)]
#![deny(missing_docs)]

#[cfg(feature = "logging")]
mod deser;

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Common imports.
pub mod prelude {
    #[cfg(feature = "logging")]
    pub use super::logging::{initialize_logging, LoggingConfiguration};
    #[cfg(feature = "metrics")]
    pub use super::metrics::{build_metrics_recorder, initialize_metrics};
}
