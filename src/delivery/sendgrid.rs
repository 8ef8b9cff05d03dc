//! SendGrid v3 mail send client.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DeliveryClient, DeliveryError, DeliveryReceipt};
use crate::message::{MessageBody, OutboundMessage};

/// SendGrid API configuration
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    pub api_key: String,
    /// API base URL, e.g. `https://api.sendgrid.com/v3`
    pub api_url: String,
    pub timeout: Duration,
}

/// SendGrid delivery client
pub struct SendGridClient {
    config: SendGridConfig,
    client: Client,
}

impl SendGridClient {
    pub fn new(config: SendGridConfig) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn send_url(&self) -> String {
        format!("{}/mail/send", self.config.api_url.trim_end_matches('/'))
    }
}

// SendGrid API request/response structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<Vec<Content>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    substitutions: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorResponse {
    errors: Vec<SendGridErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct SendGridErrorDetail {
    message: String,
}

impl From<&OutboundMessage> for SendGridRequest {
    fn from(message: &OutboundMessage) -> Self {
        let (content, template_id) = match &message.body {
            MessageBody::Plain(body) => (
                Some(vec![Content {
                    content_type: "text/plain".to_string(),
                    value: body.clone(),
                }]),
                None,
            ),
            MessageBody::Template(template_ref) => (None, Some(template_ref.clone())),
        };

        SendGridRequest {
            personalizations: vec![Personalization {
                to: vec![EmailAddress {
                    email: message.recipient.clone(),
                    name: None,
                }],
                substitutions: message.substitutions.clone(),
            }],
            from: EmailAddress {
                email: message.sender.email.clone(),
                name: message.sender.name.clone(),
            },
            subject: message.subject.clone(),
            content,
            template_id,
        }
    }
}

/// Join SendGrid's `errors[].message` entries, or return the raw body
fn rejection_message(body: String) -> String {
    match serde_json::from_str::<SendGridErrorResponse>(&body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect::<Vec<_>>()
            .join(", "),
        _ => body,
    }
}

#[async_trait]
impl DeliveryClient for SendGridClient {
    async fn send(&self, message: &OutboundMessage) -> Result<DeliveryReceipt, DeliveryError> {
        let request = SendGridRequest::from(message);

        tracing::debug!(
            message_id = %message.id,
            to = %message.recipient,
            templated = message.is_templated(),
            substitutions = message.substitutions.len(),
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let provider_message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status.is_success() {
            tracing::info!(
                message_id = %message.id,
                provider_message_id = ?provider_message_id,
                "Email accepted by SendGrid"
            );
            return Ok(DeliveryReceipt {
                provider: self.name(),
                message_id: provider_message_id,
            });
        }

        let body = response.text().await.unwrap_or_default();
        let rejection = rejection_message(body);
        tracing::warn!(
            message_id = %message.id,
            status = %status,
            error = %rejection,
            "SendGrid rejected email"
        );

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            message: rejection,
        })
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageBuilder, Sender, TemplateParameter};
    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };

    fn builder() -> MessageBuilder {
        MessageBuilder::new(Sender::new("no-reply@example.com").with_name("Ara"))
    }

    #[test]
    fn test_template_request_shape() {
        let message = builder()
            .build_from_template(
                "alice@example.com",
                "Activate your account",
                "d-activate",
                vec![TemplateParameter::new("username", "alice")],
            )
            .unwrap();

        let json = serde_json::to_value(SendGridRequest::from(&message)).unwrap();
        assert_eq!(json["template_id"], "d-activate");
        assert_eq!(json["subject"], "Activate your account");
        assert_eq!(json["from"]["email"], "no-reply@example.com");
        assert_eq!(json["from"]["name"], "Ara");
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "alice@example.com");
        assert_eq!(json["personalizations"][0]["substitutions"]["-username-"], "alice");
        assert!(json.get("content").is_none());
    }

    #[test]
    fn test_plain_request_shape() {
        let message = builder()
            .build_plain(
                Some(Sender::new("user@example.com")),
                "support@example.com",
                "Question",
                "Hello",
            )
            .unwrap();

        let json = serde_json::to_value(SendGridRequest::from(&message)).unwrap();
        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][0]["value"], "Hello");
        assert_eq!(json["from"]["email"], "user@example.com");
        assert!(json["from"].get("name").is_none());
        assert!(json.get("template_id").is_none());
        assert!(json["personalizations"][0].get("substitutions").is_none());
    }

    #[test]
    fn test_rejection_message_parsing() {
        let body = concat!(
            r#"{"errors":[{"message":"The template_id must be a valid GUID","#,
            r#""field":"template_id"},"#,
            r#"{"message":"Bad from"}]}"#
        );
        assert_eq!(
            rejection_message(body.to_string()),
            "The template_id must be a valid GUID, Bad from"
        );

        assert_eq!(rejection_message("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_send_url_trims_slash() {
        let client = SendGridClient::new(SendGridConfig {
            api_key: "SG.key".to_string(),
            api_url: "https://api.sendgrid.com/v3/".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(client.send_url(), "https://api.sendgrid.com/v3/mail/send");
    }

    /// Serve `router` on an ephemeral port and return its `/v3` base URL
    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v3", addr)
    }

    fn client_for(api_url: String) -> SendGridClient {
        SendGridClient::new(SendGridConfig {
            api_key: "SG.test".to_string(),
            api_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn activation_message() -> OutboundMessage {
        builder()
            .build_from_template(
                "alice@example.com",
                "Activate your account",
                "d-activate",
                vec![TemplateParameter::new("username", "alice")],
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_accepted_returns_provider_id() {
        async fn accept(
            headers: HeaderMap,
            Json(body): Json<serde_json::Value>,
        ) -> impl IntoResponse {
            let authorized = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                == Some("Bearer SG.test");
            if !authorized || body["template_id"] != "d-activate" {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            (StatusCode::ACCEPTED, [("x-message-id", "sg-1")]).into_response()
        }

        let url = spawn_provider(Router::new().route("/v3/mail/send", post(accept))).await;
        let receipt = client_for(url).send(&activation_message()).await.unwrap();

        assert_eq!(receipt.provider, "sendgrid");
        assert_eq!(receipt.message_id.as_deref(), Some("sg-1"));
    }

    #[tokio::test]
    async fn test_send_rejected_joins_errors() {
        async fn reject() -> impl IntoResponse {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"errors": [{"message": "bad from"}]})),
            )
        }

        let url = spawn_provider(Router::new().route("/v3/mail/send", post(reject))).await;
        let err = client_for(url).send(&activation_message()).await.unwrap_err();

        assert!(!err.is_transient());
        match err {
            DeliveryError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad from");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_unavailable_is_transient() {
        async fn unavailable() -> impl IntoResponse {
            (StatusCode::SERVICE_UNAVAILABLE, "try later")
        }

        let url = spawn_provider(Router::new().route("/v3/mail/send", post(unavailable))).await;
        let err = client_for(url).send(&activation_message()).await.unwrap_err();

        assert!(err.is_transient());
        match err {
            DeliveryError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "try later");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_unreachable_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{}/v3", addr))
            .send(&activation_message())
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Transport(_)));
        assert!(err.is_transient());
    }
}
