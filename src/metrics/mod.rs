//! Prometheus metrics for the mailer.
//!
//! - Notification metrics (sent, failed by kind and reason)
//! - Template resolution metrics (fallbacks, misses)
//! - Delivery latency per provider
//! - Queue listener metrics (commands received, rejected, retried)

mod helpers;

pub use helpers::{
    encode_metrics, CommandMetrics, DeliveryMetrics, NotificationMetrics, TemplateMetrics,
};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    // ============================================================================
    // Notification Metrics
    // ============================================================================

    /// Notifications handed to the delivery client, by kind
    pub static ref NOTIFICATIONS_SENT_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_sent_total", METRIC_PREFIX),
        "Total notifications accepted by the delivery client",
        &["kind"]
    ).unwrap();

    /// Failed notification attempts, by kind and failure reason
    pub static ref NOTIFICATIONS_FAILED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_failed_total", METRIC_PREFIX),
        "Total failed notification attempts",
        &["kind", "reason"]
    ).unwrap();

    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Lookups served by the default culture template
    pub static ref TEMPLATE_FALLBACKS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_fallbacks_total", METRIC_PREFIX),
        "Template lookups that fell back to the default culture",
        &["codename"]
    ).unwrap();

    /// Lookups with no template in either culture
    pub static ref TEMPLATES_NOT_FOUND_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_templates_not_found_total", METRIC_PREFIX),
        "Template lookups with no match in requested or default culture",
        &["codename"]
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    /// Time spent in the delivery client
    pub static ref DELIVERY_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_delivery_latency_seconds", METRIC_PREFIX),
        "Delivery client call latency in seconds",
        &["provider"],
        vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    ).unwrap();

    // ============================================================================
    // Queue Listener Metrics
    // ============================================================================

    /// Commands received from the queue
    pub static ref COMMANDS_RECEIVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_commands_received_total", METRIC_PREFIX),
        "Total commands received from Redis"
    ).unwrap();

    /// Commands dropped without a successful send
    pub static ref COMMANDS_DROPPED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_commands_dropped_total", METRIC_PREFIX),
        "Commands dropped by the listener",
        &["reason"]
    ).unwrap();

    /// Redelivery attempts after a transient failure
    pub static ref COMMAND_RETRIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_command_retries_total", METRIC_PREFIX),
        "Command redelivery attempts",
        &["kind"]
    ).unwrap();

    /// Redis subscription status (1 = subscribed, 0 = disconnected)
    pub static ref REDIS_SUBSCRIPTION_STATUS: IntGauge = register_int_gauge!(
        format!("{}_redis_subscription_status", METRIC_PREFIX),
        "Redis subscription status (1=subscribed, 0=disconnected)"
    ).unwrap();

    /// Redis reconnection attempts
    pub static ref REDIS_RECONNECTIONS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_redis_reconnections_total", METRIC_PREFIX),
        "Total Redis reconnection attempts"
    ).unwrap();
}
