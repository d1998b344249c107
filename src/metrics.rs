// src/metrics.rs
//! Counter names and one-time descriptions.
//!
//! No exporter is installed here; whichever recorder the embedding process
//! installs (Prometheus, statsd, ...) picks these series up.

use metrics::describe_counter;
use once_cell::sync::OnceCell;

pub const MESSAGES_TOTAL: &str = "responder_messages_total";
pub const MATCHES_TOTAL: &str = "responder_matches_total";
pub const DELIVERY_FAILURES_TOTAL: &str = "responder_delivery_failures_total";
pub const RELOADS_TOTAL: &str = "responder_reloads_total";
pub const RELOAD_FAILURES_TOTAL: &str = "responder_reload_failures_total";

/// One-time metrics registration (so series carry help text).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(MESSAGES_TOTAL, "Inbound messages evaluated.");
        describe_counter!(MATCHES_TOTAL, "Messages for which a rule fired.");
        describe_counter!(
            DELIVERY_FAILURES_TOTAL,
            "Rendered replies the delivery collaborator failed to send."
        );
        describe_counter!(RELOADS_TOTAL, "Rule sets published via reload.");
        describe_counter!(
            RELOAD_FAILURES_TOTAL,
            "Reload attempts rejected because the source was unreadable."
        );
    });
}
