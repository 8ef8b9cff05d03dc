use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::MailConfig;
use crate::notification::{require, NotificationError};

use super::types::{MessageBody, OutboundMessage, Sender, TemplateParameter};

/// Delimiter placed on both sides of a tag. Must match the placeholders in
/// the provider-hosted templates (`-username-`).
pub const SUBSTITUTION_DELIMITER: &str = "-";

/// Turn a replacement tag into the provider placeholder key
pub fn wrap_tag(tag: &str) -> String {
    format!("{}{}{}", SUBSTITUTION_DELIMITER, tag, SUBSTITUTION_DELIMITER)
}

/// Builds outbound messages. Holds nothing but the no-reply sender.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    no_reply: Sender,
}

impl MessageBuilder {
    pub fn new(no_reply: Sender) -> Self {
        Self { no_reply }
    }

    pub fn from_config(config: &MailConfig) -> Self {
        let mut sender = Sender::new(&config.no_reply_email);
        sender.name = config.no_reply_name.clone();
        Self::new(sender)
    }

    pub fn no_reply(&self) -> &Sender {
        &self.no_reply
    }

    /// Build a message with an inline plain text body
    pub fn build_plain(
        &self,
        sender: Option<Sender>,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<OutboundMessage, NotificationError> {
        require("recipient", recipient)?;
        require("body", body)?;

        let sender = match sender {
            Some(sender) if !sender.email.trim().is_empty() => sender,
            _ => self.no_reply.clone(),
        };

        Ok(OutboundMessage {
            id: Uuid::new_v4(),
            sender,
            recipient: recipient.trim().to_string(),
            subject: subject.to_string(),
            body: MessageBody::Plain(body.to_string()),
            substitutions: BTreeMap::new(),
        })
    }

    /// Build a message rendered by the provider from `template_ref`
    pub fn build_from_template(
        &self,
        recipient: &str,
        subject: &str,
        template_ref: &str,
        params: impl IntoIterator<Item = TemplateParameter>,
    ) -> Result<OutboundMessage, NotificationError> {
        require("recipient", recipient)?;
        require("template reference", template_ref)?;

        let mut substitutions = BTreeMap::new();
        for param in params {
            require("replacement tag", &param.replacement_tag)?;
            let key = wrap_tag(&param.replacement_tag);
            if substitutions.insert(key, param.value).is_some() {
                return Err(NotificationError::InvalidParameter(format!(
                    "duplicate replacement tag: {}",
                    param.replacement_tag
                )));
            }
        }

        Ok(OutboundMessage {
            id: Uuid::new_v4(),
            sender: self.no_reply.clone(),
            recipient: recipient.trim().to_string(),
            subject: subject.to_string(),
            body: MessageBody::Template(template_ref.to_string()),
            substitutions,
        })
    }
}
