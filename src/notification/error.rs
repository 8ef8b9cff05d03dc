use thiserror::Error;

use crate::delivery::DeliveryError;
use crate::template::StoreError;

/// Failure of a single notification attempt
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Template not found: {codename}")]
    TemplateNotFound { codename: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),
}

impl NotificationError {
    /// Whether redelivering the same command may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            NotificationError::Delivery(e) => e.is_transient(),
            NotificationError::Store(StoreError::Postgres(_)) => true,
            _ => false,
        }
    }

    /// Short label used in metrics
    pub fn reason(&self) -> &'static str {
        match self {
            NotificationError::TemplateNotFound { .. } => "template_not_found",
            NotificationError::InvalidParameter(_) => "invalid_parameter",
            NotificationError::Delivery(_) => "delivery_failure",
            NotificationError::Store(_) => "store_error",
        }
    }
}

/// Reject blank required fields
pub(crate) fn require(field: &str, value: &str) -> Result<(), NotificationError> {
    if value.trim().is_empty() {
        return Err(NotificationError::InvalidParameter(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        let transient = NotificationError::Delivery(DeliveryError::Rejected {
            status: 502,
            message: "Bad gateway".to_string(),
        });
        let permanent = NotificationError::Delivery(DeliveryError::Rejected {
            status: 401,
            message: "Unauthorized".to_string(),
        });

        assert!(transient.is_retryable());
        assert!(!permanent.is_retryable());
        assert!(!NotificationError::InvalidParameter("email".to_string()).is_retryable());
        assert!(!NotificationError::TemplateNotFound {
            codename: "ResetPassword".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_delivery_error_is_transparent() {
        let err = NotificationError::from(DeliveryError::Unavailable("provider down".to_string()));
        assert_eq!(err.to_string(), "Delivery client unavailable: provider down");
        assert_eq!(err.reason(), "delivery_failure");
    }

    #[test]
    fn test_require() {
        assert!(require("email", "a@b.c").is_ok());
        assert!(matches!(
            require("email", " "),
            Err(NotificationError::InvalidParameter(msg)) if msg == "email must not be empty"
        ));
    }
}
