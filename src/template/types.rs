//! Template types and error definitions

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template store error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Template already exists: {codename} ({culture})")]
    AlreadyExists { codename: String, culture: String },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Failed to load template seed: {0}")]
    Seed(String),

    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
}

/// Result type for template store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A provider-hosted email template registered for one culture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Culture independent name, e.g. "ResetPassword"
    pub codename: String,

    /// Culture code, e.g. "en-US"
    pub culture: String,

    /// Subject line used for messages built from this template
    pub subject: String,

    /// Template reference understood by the email provider
    pub provider_template_id: String,
}

impl Template {
    pub fn new(
        codename: impl Into<String>,
        culture: impl Into<String>,
        subject: impl Into<String>,
        provider_template_id: impl Into<String>,
    ) -> Self {
        Self {
            codename: codename.into(),
            culture: culture.into(),
            subject: subject.into(),
            provider_template_id: provider_template_id.into(),
        }
    }

    /// Validate the template before it enters a store
    pub fn validate(&self) -> StoreResult<()> {
        if self.codename.trim().is_empty() || self.codename.len() > 64 {
            return Err(StoreError::InvalidTemplate(
                "Codename must be 1-64 characters".to_string(),
            ));
        }

        if self.culture.trim().is_empty() || self.culture.len() > 16 {
            return Err(StoreError::InvalidTemplate(
                "Culture must be 1-16 characters".to_string(),
            ));
        }

        if self.provider_template_id.trim().is_empty() {
            return Err(StoreError::InvalidTemplate(format!(
                "Template {} ({}) has no provider template id",
                self.codename, self.culture
            )));
        }

        Ok(())
    }
}

/// Codenames of the templates this service sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateCodename {
    ResetPassword,
    ActivateAccount,
    RemarkCreated,
    RemarkStateChanged,
    CommentAdded,
    PhotosAdded,
}

impl TemplateCodename {
    pub const ALL: [TemplateCodename; 6] = [
        TemplateCodename::ResetPassword,
        TemplateCodename::ActivateAccount,
        TemplateCodename::RemarkCreated,
        TemplateCodename::RemarkStateChanged,
        TemplateCodename::CommentAdded,
        TemplateCodename::PhotosAdded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateCodename::ResetPassword => "ResetPassword",
            TemplateCodename::ActivateAccount => "ActivateAccount",
            TemplateCodename::RemarkCreated => "RemarkCreated",
            TemplateCodename::RemarkStateChanged => "RemarkStateChanged",
            TemplateCodename::CommentAdded => "CommentAdded",
            TemplateCodename::PhotosAdded => "PhotosAdded",
        }
    }
}

impl fmt::Display for TemplateCodename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
