// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize telemetry (logs + metric descriptions)
///
/// No metrics recorder is installed here; counters are no-ops unless the
/// embedding process installs one.
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "delegation_node=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    describe_metrics();
}

pub fn describe_metrics() {
    metrics::describe_counter!("registry_events_committed_total", "Mutations accepted and appended to the event log");
    metrics::describe_counter!("registry_rejections_total", "Mutations refused by validation");
    metrics::describe_counter!("registry_index_events_applied_total", "Events applied to the active-delegation index");
    metrics::describe_histogram!("registry_replay_duration_seconds", "Time taken to replay the event log");
}
