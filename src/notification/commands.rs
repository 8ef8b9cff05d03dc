//! Inbound notification commands.
//!
//! Commands arrive as JSON envelopes:
//!
//! ```json
//! {
//!   "command": "remark_created",
//!   "payload": { "email": "...", "remark_id": "...", ... },
//!   "correlation_id": "req-123"
//! }
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPasswordCommand {
    pub email: String,
    pub token: String,
    /// Reset page URL; email and token are appended as query parameters
    pub endpoint: String,
    #[serde(default)]
    pub culture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateAccountCommand {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub culture: Option<String>,
}

/// Message from a user to the support mailbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportMessageCommand {
    /// Address of the user writing in, used as the sender
    pub email: String,
    #[serde(default)]
    pub subject: String,
    pub message: String,
}

/// Remark fields shared by every remark notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkDetails {
    pub remark_id: String,
    pub category: String,
    pub address: String,
    /// Author of the change being notified about
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkCreatedCommand {
    pub email: String,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(flatten)]
    pub remark: RemarkDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkStateChangedCommand {
    pub email: String,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(flatten)]
    pub remark: RemarkDetails,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAddedCommand {
    pub email: String,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(flatten)]
    pub remark: RemarkDetails,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotosAddedCommand {
    pub email: String,
    #[serde(default)]
    pub culture: Option<String>,
    #[serde(flatten)]
    pub remark: RemarkDetails,
}

/// One command per notification kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "snake_case")]
pub enum NotificationCommand {
    ResetPassword(ResetPasswordCommand),
    ActivateAccount(ActivateAccountCommand),
    SupportMessage(SupportMessageCommand),
    RemarkCreated(RemarkCreatedCommand),
    RemarkStateChanged(RemarkStateChangedCommand),
    CommentAdded(CommentAddedCommand),
    PhotosAdded(PhotosAddedCommand),
}

impl NotificationCommand {
    pub fn kind(&self) -> NotificationKind {
        match self {
            NotificationCommand::ResetPassword(_) => NotificationKind::ResetPassword,
            NotificationCommand::ActivateAccount(_) => NotificationKind::ActivateAccount,
            NotificationCommand::SupportMessage(_) => NotificationKind::SupportMessage,
            NotificationCommand::RemarkCreated(_) => NotificationKind::RemarkCreated,
            NotificationCommand::RemarkStateChanged(_) => NotificationKind::RemarkStateChanged,
            NotificationCommand::CommentAdded(_) => NotificationKind::CommentAdded,
            NotificationCommand::PhotosAdded(_) => NotificationKind::PhotosAdded,
        }
    }
}

/// Command as received from the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(flatten)]
    pub command: NotificationCommand,
    /// Correlation ID for tracing (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Notification kinds handled by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    ResetPassword,
    ActivateAccount,
    SupportMessage,
    RemarkCreated,
    RemarkStateChanged,
    CommentAdded,
    PhotosAdded,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ResetPassword => "reset_password",
            NotificationKind::ActivateAccount => "activate_account",
            NotificationKind::SupportMessage => "support_message",
            NotificationKind::RemarkCreated => "remark_created",
            NotificationKind::RemarkStateChanged => "remark_state_changed",
            NotificationKind::CommentAdded => "comment_added",
            NotificationKind::PhotosAdded => "photos_added",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
