//! In-memory delivery client.

use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DeliveryClient, DeliveryError, DeliveryReceipt};
use crate::message::OutboundMessage;

/// Records every message instead of sending it.
///
/// `fail_next` makes the following sends fail with a provider rejection,
/// which lets callers exercise their redelivery handling.
#[derive(Default)]
pub struct MemoryDeliveryClient {
    sent: Mutex<Vec<OutboundMessage>>,
    failures_remaining: AtomicU32,
    failure_status: AtomicU16,
}

impl MemoryDeliveryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` sends with the given HTTP status
    pub fn fail_next(&self, times: u32, status: u16) {
        self.failure_status.store(status, Ordering::SeqCst);
        self.failures_remaining.store(times, Ordering::SeqCst);
    }

    /// Messages recorded so far, oldest first
    pub async fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    fn take_failure(&self) -> Option<u16> {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|_| self.failure_status.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl DeliveryClient for MemoryDeliveryClient {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        if let Some(status) = self.take_failure() {
            return Err(DeliveryError::Rejected {
                status,
                message: "simulated failure".to_string(),
            });
        }

        tracing::info!(
            message_id = %message.id,
            subject = %message.subject,
            template = ?message.template_ref(),
            "Recorded email in memory delivery client"
        );

        self.sent.lock().await.push(message.clone());

        Ok(DeliveryReceipt {
            provider: self.name(),
            message_id: Some(message.id.to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
