//! Shared test setup: tracing subscriber and sample holdings rows.

use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{CellValue, RawRecord, Schema};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        // global logging subscriber, used by all tracing log macros
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    debug!("INIT: Attempting logger init from testing.rs");

    // RUST_LOG when set, debug otherwise
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(env_filter),
    );

    // Only set if we haven't already set a global subscriber
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Two-level schema used by the sample rows: region / asset class, weighted by value.
pub fn sample_schema() -> Schema {
    Schema::new(["region", "class"], "value")
}

/// One sample row for [`sample_schema`].
pub fn sample_row(region: &str, class: &str, value: impl Into<CellValue>) -> RawRecord {
    RawRecord::new()
        .with("region", region)
        .with("class", class)
        .with("value", value)
}

/// US/Equity 100, US/Bond 50, EU/Equity 30.
pub fn sample_rows() -> Vec<RawRecord> {
    vec![
        sample_row("US", "Equity", 100.0),
        sample_row("US", "Bond", 50.0),
        sample_row("EU", "Equity", 30.0),
    ]
}
