//! Email delivery clients.
//!
//! This module contains the `DeliveryClient` trait and implementations:
//! - `SendGridClient`: SendGrid v3 mail send API over HTTPS
//! - `MemoryDeliveryClient`: records messages in memory (local runs, tests)
//!
//! Use `create_delivery_client()` to pick one from configuration.

mod memory;
mod sendgrid;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DeliveryConfig;
use crate::message::OutboundMessage;

pub use memory::MemoryDeliveryClient;
pub use sendgrid::{SendGridClient, SendGridConfig};

/// Errors reported by a delivery client
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Delivery transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Delivery client unavailable: {0}")]
    Unavailable(String),
}

impl DeliveryError {
    /// Whether a later attempt with the same message may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::Transport(_) | DeliveryError::Unavailable(_) => true,
            DeliveryError::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Accepted message as reported by the provider
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub provider: &'static str,
    /// Provider message id, when the provider returns one
    pub message_id: Option<String>,
}

/// Sends outbound messages through an email provider
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Create a delivery client based on configuration.
///
/// - `"memory"`: `MemoryDeliveryClient`
/// - `"sendgrid"` (default): `SendGridClient`; without an API key this falls
///   back to memory so a local instance can run without credentials
pub fn create_delivery_client(
    settings: &DeliveryConfig,
) -> Result<Arc<dyn DeliveryClient>, DeliveryError> {
    match settings.backend.as_str() {
        "memory" => {
            tracing::info!(backend = "memory", "Creating memory delivery client");
            Ok(Arc::new(MemoryDeliveryClient::new()))
        }
        _ => match settings.sendgrid_api_key.as_deref() {
            Some(api_key) if !api_key.trim().is_empty() => {
                let config = SendGridConfig {
                    api_key: api_key.to_string(),
                    api_url: settings.sendgrid_api_url.clone(),
                    timeout: Duration::from_secs(settings.timeout_seconds),
                };
                tracing::info!(
                    backend = "sendgrid",
                    api_url = %config.api_url,
                    "Creating SendGrid delivery client"
                );
                Ok(Arc::new(SendGridClient::new(config)?))
            }
            _ => {
                tracing::warn!(
                    "SendGrid delivery requested but no API key configured, falling back to memory"
                );
                Ok(Arc::new(MemoryDeliveryClient::new()))
            }
        },
    }
}
