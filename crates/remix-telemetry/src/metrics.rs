//! Metric names and recorders for the generation pipeline

use std::time::Instant;

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// Variants produced, tagged with `outcome` (`generated` or `placeholder`)
pub const VARIANT_COUNT: &str = "imagegen.variant.count";

/// Wall-clock time to answer a generation request, in seconds
pub const REQUEST_DURATION: &str = "imagegen.request.duration";

/// Instruments shared by every generation request
///
/// Backed by the global meter provider, so recording is a no-op until
/// [`crate::init`] installs an exporter.
#[derive(Clone)]
pub struct GenerationMetrics {
    variants: Counter<u64>,
    duration: Histogram<f64>,
}

impl GenerationMetrics {
    pub fn new() -> Self {
        let meter = global::meter("remix");

        Self {
            variants: meter
                .u64_counter(VARIANT_COUNT)
                .with_description("Image variants returned, by provenance")
                .build(),
            duration: meter
                .f64_histogram(REQUEST_DURATION)
                .with_description("Generation request duration")
                .with_unit("s")
                .build(),
        }
    }

    /// Count one variant with its provenance
    pub fn record_variant(&self, outcome: &'static str) {
        self.variants.add(1, &[KeyValue::new("outcome", outcome)]);
    }

    /// Record how long a request took since `start`
    pub fn record_request(&self, start: Instant, route: &'static str) {
        self.duration
            .record(start.elapsed().as_secs_f64(), &[KeyValue::new("route", route)]);
    }
}

impl Default for GenerationMetrics {
    fn default() -> Self {
        Self::new()
    }
}
