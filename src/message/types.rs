use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Sender address with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sender {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Sender {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Named value substituted into a provider-hosted template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameter {
    /// Placeholder name without delimiters, e.g. "username"
    pub replacement_tag: String,
    pub value: String,
}

impl TemplateParameter {
    pub fn new(replacement_tag: impl Into<String>, value: impl ToString) -> Self {
        Self {
            replacement_tag: replacement_tag.into(),
            value: value.to_string(),
        }
    }
}

/// Message content: either an inline body or a provider template reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageBody {
    Plain(String),
    Template(String),
}

/// Provider-agnostic email ready to hand to a delivery client
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    /// Local identifier used to correlate logs
    pub id: Uuid,
    pub sender: Sender,
    pub recipient: String,
    pub subject: String,
    pub body: MessageBody,
    /// Wrapped placeholder key to value; empty for plain messages
    pub substitutions: BTreeMap<String, String>,
}

impl OutboundMessage {
    /// Inline body, set only for plain messages
    pub fn body(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Plain(body) => Some(body),
            MessageBody::Template(_) => None,
        }
    }

    /// Provider template reference, set only for templated messages
    pub fn template_ref(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Template(template_ref) => Some(template_ref),
            MessageBody::Plain(_) => None,
        }
    }

    pub fn is_templated(&self) -> bool {
        matches!(self.body, MessageBody::Template(_))
    }
}
