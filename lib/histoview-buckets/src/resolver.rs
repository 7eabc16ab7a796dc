use tracing::{info, warn};

use crate::{BoundaryParseError, BoundarySet, BucketSources};

/// Parses the user-supplied boundaries, if there are any.
///
/// Returns `Ok(None)` when neither source holds a value.
///
/// # Errors
///
/// If a user value exists but is not a valid list of boundaries, an error is returned.
pub fn try_resolve_buckets(sources: &BucketSources) -> Result<Option<BoundarySet>, BoundaryParseError> {
    sources.user_value().map(BoundarySet::parse).transpose()
}

/// Resolves the bucket boundaries to use for duration histograms.
///
/// The user-supplied boundaries are used when present and valid. Otherwise, the default boundaries are used: an invalid
/// user value is logged and discarded as a whole, never partially applied.
///
/// Logs the chosen boundaries before returning.
pub fn resolve_buckets(sources: &BucketSources) -> BoundarySet {
    let boundaries = match try_resolve_buckets(sources) {
        Ok(Some(boundaries)) => {
            if !boundaries.is_strictly_ascending() {
                warn!(%boundaries, "Histogram bucket boundaries are not in strictly ascending order.");
            }
            boundaries
        }
        Ok(None) => BoundarySet::default(),
        Err(e) => {
            warn!(
                error = %e,
                input = sources.user_value().unwrap_or_default(),
                "Invalid histogram bucket boundaries. Falling back to default boundaries."
            );
            BoundarySet::default()
        }
    };

    info!(%boundaries, "Histogram buckets customized.");
    boundaries
}

#[cfg(test)]
mod tests {
    use std::{
        fmt,
        sync::{Arc, Mutex},
    };

    use similar_asserts::assert_eq;
    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{layer::Context, layer::SubscriberExt as _, Layer};

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedEvents(Arc<Mutex<Vec<(Level, String)>>>);

    impl CapturedEvents {
        fn take(&self) -> Vec<(Level, String)> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedEvents {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            self.0.lock().unwrap().push((*event.metadata().level(), visitor.0));
        }
    }

    #[derive(Default)]
    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    fn resolve_captured(sources: &BucketSources) -> (BoundarySet, Vec<(Level, String)>) {
        let captured = CapturedEvents::default();
        let subscriber = tracing_subscriber::registry().with(captured.clone());
        let boundaries = tracing::subscriber::with_default(subscriber, || resolve_buckets(sources));
        (boundaries, captured.take())
    }

    fn set(values: &[f64]) -> BoundarySet {
        BoundarySet::new(values.to_vec()).unwrap()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(resolve_buckets(&BucketSources::new()), BoundarySet::default());
        assert_eq!(
            resolve_buckets(&BucketSources::new().with_property("").with_environment("")),
            BoundarySet::default()
        );
    }

    #[test]
    fn well_formed_property() {
        let sources = BucketSources::new().with_property("0,5,10");
        assert_eq!(resolve_buckets(&sources), set(&[0.0, 5.0, 10.0]));
    }

    #[test]
    fn well_formed_environment() {
        let sources = BucketSources::new().with_environment(" 0 , 5 ,10");
        assert_eq!(resolve_buckets(&sources), set(&[0.0, 5.0, 10.0]));
    }

    #[test]
    fn malformed_input_falls_back_to_defaults() {
        let sources = BucketSources::new().with_property("0,abc,10");
        assert_eq!(resolve_buckets(&sources), BoundarySet::default());
        assert!(try_resolve_buckets(&sources).is_err());
    }

    #[test]
    fn trailing_commas_are_ignored() {
        let sources = BucketSources::new().with_property("1,2,");
        assert_eq!(resolve_buckets(&sources), set(&[1.0, 2.0]));

        let sources = BucketSources::new().with_environment("1,2,,,");
        assert_eq!(resolve_buckets(&sources), set(&[1.0, 2.0]));
    }

    #[test]
    fn malformed_property_does_not_fall_through_to_environment() {
        let sources = BucketSources::new().with_property("0,abc,10").with_environment("1,2,3");
        assert_eq!(resolve_buckets(&sources), BoundarySet::default());
    }

    #[test]
    fn property_takes_precedence() {
        let sources = BucketSources::new().with_property("1,2,3").with_environment("4,5,6");
        assert_eq!(resolve_buckets(&sources), set(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn idempotent() {
        let sources = BucketSources::new().with_environment("0, 10, 100");
        assert_eq!(resolve_buckets(&sources), resolve_buckets(&sources));
    }

    #[test]
    fn try_resolve_without_user_value() {
        assert!(matches!(try_resolve_buckets(&BucketSources::new()), Ok(None)));
    }

    #[test]
    fn logs_chosen_boundaries_once() {
        let (boundaries, events) = resolve_captured(&BucketSources::new().with_property("0,5,10"));
        assert_eq!(boundaries, set(&[0.0, 5.0, 10.0]));
        assert_eq!(events, vec![(Level::INFO, "Histogram buckets customized.".to_string())]);
    }

    #[test]
    fn logs_warning_on_malformed_input() {
        let (boundaries, events) = resolve_captured(&BucketSources::new().with_environment("0,abc,10"));
        assert_eq!(boundaries, BoundarySet::default());
        assert_eq!(
            events,
            vec![
                (
                    Level::WARN,
                    "Invalid histogram bucket boundaries. Falling back to default boundaries.".to_string()
                ),
                (Level::INFO, "Histogram buckets customized.".to_string()),
            ]
        );
    }

    #[test]
    fn logs_warning_on_unordered_input() {
        let (boundaries, events) = resolve_captured(&BucketSources::new().with_property("10,5"));
        assert_eq!(boundaries, set(&[10.0, 5.0]));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, Level::WARN);
    }
}
