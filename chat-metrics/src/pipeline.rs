//! The instruments the dispatch pipeline records against: one counter per
//! terminal outcome, a session gauge, and latency histograms for the two
//! hot paths (send and dispatch).

use opentelemetry::metrics::{Counter, Histogram, UpDownCounter};

use crate::MetricsError;

#[derive(Debug)]
pub struct PipelineMetrics {
    pub messages_sent_total: Counter<u64>,
    pub messages_delivered_live_total: Counter<u64>,
    pub messages_deposited_offline_total: Counter<u64>,
    pub messages_failed_total: Counter<u64>,
    pub sessions_active: UpDownCounter<i64>,
    pub send_duration_seconds: Histogram<f64>,
    pub dispatch_duration_seconds: Histogram<f64>,
}

impl PipelineMetrics {
    /// # Errors
    /// Never fails today; returns a `Result` so a future instrument that can
    /// fail to register doesn't change this function's signature.
    pub fn new() -> Result<Self, MetricsError> {
        let meter = opentelemetry::global::meter("chat");

        Ok(Self {
            messages_sent_total: meter
                .u64_counter("chat.messages.sent.total")
                .with_description("Total number of sends accepted by ingress")
                .build(),
            messages_delivered_live_total: meter
                .u64_counter("chat.messages.delivered_live.total")
                .with_description("Total number of messages delivered to a live session")
                .build(),
            messages_deposited_offline_total: meter
                .u64_counter("chat.messages.deposited_offline.total")
                .with_description("Total number of messages deposited to the offline inbox")
                .build(),
            messages_failed_total: meter
                .u64_counter("chat.messages.failed.total")
                .with_description("Total number of sends rejected or failed to publish")
                .build(),
            sessions_active: meter
                .i64_up_down_counter("chat.sessions.active")
                .with_description("Number of currently bound gateway sessions")
                .build(),
            send_duration_seconds: meter
                .f64_histogram("chat.ingress.send.duration.seconds")
                .with_description("Distribution of ingress send durations")
                .build(),
            dispatch_duration_seconds: meter
                .f64_histogram("chat.dispatcher.dispatch.duration.seconds")
                .with_description("Distribution of consume-path dispatch durations")
                .build(),
        })
    }
}
