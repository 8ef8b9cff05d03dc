//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::notification::NotificationKind;

use super::{
    COMMANDS_DROPPED_TOTAL, COMMANDS_RECEIVED_TOTAL, COMMAND_RETRIES_TOTAL, DELIVERY_LATENCY,
    NOTIFICATIONS_FAILED_TOTAL, NOTIFICATIONS_SENT_TOTAL, REDIS_RECONNECTIONS_TOTAL,
    REDIS_SUBSCRIPTION_STATUS, TEMPLATES_NOT_FOUND_TOTAL, TEMPLATE_FALLBACKS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording notification outcomes
pub struct NotificationMetrics;

impl NotificationMetrics {
    pub fn record_sent(kind: NotificationKind) {
        NOTIFICATIONS_SENT_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    pub fn record_failed(kind: NotificationKind, reason: &str) {
        NOTIFICATIONS_FAILED_TOTAL
            .with_label_values(&[kind.as_str(), reason])
            .inc();
    }
}

/// Helper struct for recording template resolution
pub struct TemplateMetrics;

impl TemplateMetrics {
    pub fn record_fallback(codename: &str) {
        TEMPLATE_FALLBACKS_TOTAL.with_label_values(&[codename]).inc();
    }

    pub fn record_not_found(codename: &str) {
        TEMPLATES_NOT_FOUND_TOTAL.with_label_values(&[codename]).inc();
    }
}

/// Helper struct for recording delivery client calls
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn record_latency(provider: &str, seconds: f64) {
        DELIVERY_LATENCY
            .with_label_values(&[provider])
            .observe(seconds);
    }
}

/// Helper struct for recording queue listener activity
pub struct CommandMetrics;

impl CommandMetrics {
    pub fn record_received() {
        COMMANDS_RECEIVED_TOTAL.inc();
    }

    pub fn record_dropped(reason: &str) {
        COMMANDS_DROPPED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn record_retry(kind: NotificationKind) {
        COMMAND_RETRIES_TOTAL.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn set_subscribed(subscribed: bool) {
        REDIS_SUBSCRIPTION_STATUS.set(if subscribed { 1 } else { 0 });
    }

    pub fn record_reconnect() {
        REDIS_RECONNECTIONS_TOTAL.inc();
    }
}
