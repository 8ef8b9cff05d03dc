use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::config::MailConfig;
use crate::delivery::DeliveryClient;
use crate::message::{MessageBuilder, OutboundMessage, Sender};
use crate::metrics::{DeliveryMetrics, NotificationMetrics};
use crate::template::{TemplateCodename, TemplateResolver};

use super::commands::{
    ActivateAccountCommand, CommentAddedCommand, NotificationCommand, NotificationKind,
    PhotosAddedCommand, RemarkCreatedCommand, RemarkDetails, RemarkStateChangedCommand,
    ResetPasswordCommand, SupportMessageCommand,
};
use super::error::{require, NotificationError};
use super::formatting::format_long_date_time;
use super::parameters::{
    ActivateAccountParameters, CommentAddedParameters, RemarkParameters,
    RemarkStateChangedParameters, ResetPasswordParameters, TemplateParameters,
};

const REMARK_ID_PLACEHOLDER: &str = "{remarkId}";
const DEFAULT_SUPPORT_SUBJECT: &str = "Support request";

/// Service statistics
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub total_sent: AtomicU64,
    pub total_failed: AtomicU64,
    pub invalid_parameters: AtomicU64,
    pub templates_missing: AtomicU64,
    pub delivery_failures: AtomicU64,
    pub store_errors: AtomicU64,
}

impl ServiceStats {
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            invalid_parameters: self.invalid_parameters.load(Ordering::Relaxed),
            templates_missing: self.templates_missing.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatsSnapshot {
    pub total_sent: u64,
    pub total_failed: u64,
    pub invalid_parameters: u64,
    pub templates_missing: u64,
    pub delivery_failures: u64,
    pub store_errors: u64,
}

/// Sends one email per notification command.
///
/// Every operation is independent: resolve the template for the requested
/// culture, format parameters for the resolved culture, build the message
/// and hand it to the delivery client. Failures are returned to the caller
/// untouched; retrying is the caller's decision.
pub struct NotificationService {
    resolver: TemplateResolver,
    builder: MessageBuilder,
    delivery: Arc<dyn DeliveryClient>,
    support_email: String,
    remark_url: String,
    stats: ServiceStats,
}

impl NotificationService {
    pub fn new(
        resolver: TemplateResolver,
        delivery: Arc<dyn DeliveryClient>,
        mail: &MailConfig,
    ) -> Self {
        Self {
            resolver,
            builder: MessageBuilder::from_config(mail),
            delivery,
            support_email: mail.support_email.clone(),
            remark_url: mail.remark_url.clone(),
            stats: ServiceStats::default(),
        }
    }

    /// Get service statistics
    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn delivery_client_name(&self) -> &'static str {
        self.delivery.name()
    }

    /// Route a decoded command to its operation
    pub async fn dispatch(&self, command: NotificationCommand) -> Result<(), NotificationError> {
        match command {
            NotificationCommand::ResetPassword(cmd) => self.send_reset_password(cmd).await,
            NotificationCommand::ActivateAccount(cmd) => self.send_activate_account(cmd).await,
            NotificationCommand::SupportMessage(cmd) => self.send_support_message(cmd).await,
            NotificationCommand::RemarkCreated(cmd) => self.send_remark_created(cmd).await,
            NotificationCommand::RemarkStateChanged(cmd) => {
                self.send_remark_state_changed(cmd).await
            }
            NotificationCommand::CommentAdded(cmd) => self.send_comment_added(cmd).await,
            NotificationCommand::PhotosAdded(cmd) => self.send_photos_added(cmd).await,
        }
    }

    #[tracing::instrument(name = "notification.reset_password", skip_all)]
    pub async fn send_reset_password(
        &self,
        command: ResetPasswordCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::ResetPassword, async {
            require("email", &command.email)?;
            require("token", &command.token)?;
            require("endpoint", &command.endpoint)?;

            let link = reset_link(&command.endpoint, &command.email, &command.token)?;
            let email = command.email.clone();
            self.send_templated(
                TemplateCodename::ResetPassword,
                &command.email,
                command.culture.as_deref(),
                |_| ResetPasswordParameters { email, link },
            )
            .await
        })
        .await
    }

    #[tracing::instrument(name = "notification.activate_account", skip_all)]
    pub async fn send_activate_account(
        &self,
        command: ActivateAccountCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::ActivateAccount, async {
            require("username", &command.username)?;

            let params = ActivateAccountParameters {
                email: command.email.clone(),
                username: command.username.clone(),
            };
            self.send_templated(
                TemplateCodename::ActivateAccount,
                &command.email,
                command.culture.as_deref(),
                |_| params,
            )
            .await
        })
        .await
    }

    /// Forward a user's message to the support mailbox as a plain email
    #[tracing::instrument(name = "notification.support_message", skip_all)]
    pub async fn send_support_message(
        &self,
        command: SupportMessageCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::SupportMessage, async {
            require("email", &command.email)?;

            let subject = if command.subject.trim().is_empty() {
                DEFAULT_SUPPORT_SUBJECT
            } else {
                command.subject.as_str()
            };

            let message = self.builder.build_plain(
                Some(Sender::new(command.email.trim())),
                &self.support_email,
                subject,
                &command.message,
            )?;
            self.deliver(message).await
        })
        .await
    }

    #[tracing::instrument(
        name = "notification.remark_created",
        skip_all,
        fields(remark_id = %command.remark.remark_id)
    )]
    pub async fn send_remark_created(
        &self,
        command: RemarkCreatedCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::RemarkCreated, async {
            validate_remark(&command.remark)?;

            self.send_templated(
                TemplateCodename::RemarkCreated,
                &command.email,
                command.culture.as_deref(),
                |culture| self.remark_parameters(&command.remark, culture),
            )
            .await
        })
        .await
    }

    #[tracing::instrument(
        name = "notification.remark_state_changed",
        skip_all,
        fields(remark_id = %command.remark.remark_id)
    )]
    pub async fn send_remark_state_changed(
        &self,
        command: RemarkStateChangedCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::RemarkStateChanged, async {
            validate_remark(&command.remark)?;
            require("state", &command.state)?;

            self.send_templated(
                TemplateCodename::RemarkStateChanged,
                &command.email,
                command.culture.as_deref(),
                |culture| RemarkStateChangedParameters {
                    remark: self.remark_parameters(&command.remark, culture),
                    state: command.state.clone(),
                },
            )
            .await
        })
        .await
    }

    #[tracing::instrument(
        name = "notification.comment_added",
        skip_all,
        fields(remark_id = %command.remark.remark_id)
    )]
    pub async fn send_comment_added(
        &self,
        command: CommentAddedCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::CommentAdded, async {
            validate_remark(&command.remark)?;
            require("comment", &command.comment)?;

            self.send_templated(
                TemplateCodename::CommentAdded,
                &command.email,
                command.culture.as_deref(),
                |culture| CommentAddedParameters {
                    remark: self.remark_parameters(&command.remark, culture),
                    comment: command.comment.clone(),
                },
            )
            .await
        })
        .await
    }

    #[tracing::instrument(
        name = "notification.photos_added",
        skip_all,
        fields(remark_id = %command.remark.remark_id)
    )]
    pub async fn send_photos_added(
        &self,
        command: PhotosAddedCommand,
    ) -> Result<(), NotificationError> {
        self.track(NotificationKind::PhotosAdded, async {
            validate_remark(&command.remark)?;

            self.send_templated(
                TemplateCodename::PhotosAdded,
                &command.email,
                command.culture.as_deref(),
                |culture| self.remark_parameters(&command.remark, culture),
            )
            .await
        })
        .await
    }

    /// Resolve, build and deliver a templated message. `params` receives the
    /// culture of the resolved template, which differs from the requested
    /// one after a fallback.
    async fn send_templated<P, F>(
        &self,
        codename: TemplateCodename,
        recipient: &str,
        culture: Option<&str>,
        params: F,
    ) -> Result<(), NotificationError>
    where
        P: TemplateParameters,
        F: FnOnce(&str) -> P,
    {
        require("email", recipient)?;

        let culture = match culture.map(str::trim) {
            Some(culture) if !culture.is_empty() => culture,
            _ => self.resolver.default_culture(),
        };

        let template = self.resolver.resolve(codename.as_str(), culture).await?;
        let params = params(&template.culture).into_parameters();

        let message = self.builder.build_from_template(
            recipient,
            &template.subject,
            &template.provider_template_id,
            params,
        )?;

        tracing::debug!(
            message_id = %message.id,
            codename = %codename,
            requested_culture = %culture,
            template_culture = %template.culture,
            "Built templated message"
        );

        self.deliver(message).await
    }

    async fn deliver(&self, message: OutboundMessage) -> Result<(), NotificationError> {
        let provider = self.delivery.name();
        let started = Instant::now();
        let result = self.delivery.send(&message).await;
        DeliveryMetrics::record_latency(provider, started.elapsed().as_secs_f64());

        let receipt = result?;
        tracing::debug!(
            message_id = %message.id,
            provider = %receipt.provider,
            provider_message_id = ?receipt.message_id,
            "Message handed to delivery client"
        );
        Ok(())
    }

    fn remark_parameters(&self, remark: &RemarkDetails, culture: &str) -> RemarkParameters {
        RemarkParameters {
            remark_id: remark.remark_id.clone(),
            category: remark.category.clone(),
            address: remark.address.clone(),
            username: remark.username.clone(),
            date: format_long_date_time(
                &remark.created_at,
                culture,
                self.resolver.default_culture(),
            ),
            url: self.remark_url.replace(REMARK_ID_PLACEHOLDER, &remark.remark_id),
        }
    }

    /// Record the outcome of one operation in stats, metrics and logs
    async fn track<F>(&self, kind: NotificationKind, operation: F) -> Result<(), NotificationError>
    where
        F: Future<Output = Result<(), NotificationError>>,
    {
        let result = operation.await;

        match &result {
            Ok(()) => {
                self.stats.total_sent.fetch_add(1, Ordering::Relaxed);
                NotificationMetrics::record_sent(kind);
                tracing::info!(kind = %kind, "Notification sent");
            }
            Err(e) => {
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                let counter = match e {
                    NotificationError::InvalidParameter(_) => &self.stats.invalid_parameters,
                    NotificationError::TemplateNotFound { .. } => &self.stats.templates_missing,
                    NotificationError::Delivery(_) => &self.stats.delivery_failures,
                    NotificationError::Store(_) => &self.stats.store_errors,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                NotificationMetrics::record_failed(kind, e.reason());
                tracing::warn!(kind = %kind, error = %e, "Notification failed");
            }
        }

        result
    }
}

fn validate_remark(remark: &RemarkDetails) -> Result<(), NotificationError> {
    require("remark_id", &remark.remark_id)?;
    require("category", &remark.category)?;
    require("username", &remark.username)?;
    Ok(())
}

/// `endpoint?email=..&token=..`, keeping any query already on the endpoint
fn reset_link(endpoint: &str, email: &str, token: &str) -> Result<String, NotificationError> {
    let params = [("email", email.trim()), ("token", token)];
    reqwest::Url::parse_with_params(endpoint.trim(), &params)
        .map(|url| url.to_string())
        .map_err(|e| {
            NotificationError::InvalidParameter(format!("endpoint is not a valid URL: {}", e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MemoryDeliveryClient;
    use crate::template::{
        MemoryTemplateStore, StoreError, StoreResult, Template, TemplateStore,
    };
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct UnreachableStore;

    #[async_trait]
    impl TemplateStore for UnreachableStore {
        async fn get_by_codename_and_culture(
            &self,
            _codename: &str,
            _culture: &str,
        ) -> StoreResult<Option<Template>> {
            Err(StoreError::Postgres(sqlx::Error::PoolTimedOut))
        }

        fn backend_name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn service_with(templates: Vec<Template>) -> (NotificationService, Arc<MemoryDeliveryClient>) {
        let store = Arc::new(MemoryTemplateStore::with_templates(templates).unwrap());
        let resolver = TemplateResolver::new(store, "en-US");
        let delivery = Arc::new(MemoryDeliveryClient::new());
        let mut mail = MailConfig::new("no-reply@example.com", "support@example.com");
        mail.remark_url = "https://app.example.com/remarks/{remarkId}".to_string();

        (NotificationService::new(resolver, delivery.clone(), &mail), delivery)
    }

    fn remark() -> RemarkDetails {
        RemarkDetails {
            remark_id: "r-42".to_string(),
            category: "litter".to_string(),
            address: "Main St 1".to_string(),
            username: "bob".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_reset_link() {
        let link =
            reset_link("https://app.example.com/reset", "alice@example.com", "t0k en").unwrap();
        assert_eq!(
            link,
            "https://app.example.com/reset?email=alice%40example.com&token=t0k+en"
        );

        assert!(matches!(
            reset_link("not a url", "a@b.c", "t"),
            Err(NotificationError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_remark_created_substitutions() {
        let (service, delivery) = service_with(vec![Template::new(
            "RemarkCreated",
            "en-US",
            "New remark",
            "tpl-remark-created",
        )]);

        service
            .send_remark_created(RemarkCreatedCommand {
                email: "alice@example.com".to_string(),
                culture: Some("en-US".to_string()),
                remark: remark(),
            })
            .await
            .unwrap();

        let sent = delivery.sent().await;
        assert_eq!(sent.len(), 1);
        let message = &sent[0];
        assert_eq!(message.template_ref(), Some("tpl-remark-created"));
        assert_eq!(message.subject, "New remark");
        assert_eq!(message.substitutions["-remarkId-"], "r-42");
        assert_eq!(message.substitutions["-date-"], "Friday, March 1, 2024 10:00:00 AM");
        assert_eq!(
            message.substitutions["-url-"],
            "https://app.example.com/remarks/r-42"
        );
        assert_eq!(message.substitutions.len(), 6);
    }

    #[tokio::test]
    async fn test_missing_template_aborts_before_delivery() {
        let (service, delivery) = service_with(vec![]);

        let result = service
            .send_photos_added(PhotosAddedCommand {
                email: "alice@example.com".to_string(),
                culture: None,
                remark: remark(),
            })
            .await;

        assert!(matches!(result, Err(NotificationError::TemplateNotFound { .. })));
        assert_eq!(delivery.sent_count().await, 0);
        assert_eq!(service.stats().templates_missing, 1);
    }

    #[tokio::test]
    async fn test_empty_recipient_rejected() {
        let (service, delivery) = service_with(vec![Template::new(
            "ActivateAccount",
            "en-US",
            "Activate",
            "tpl-activate",
        )]);

        let result = service
            .send_activate_account(ActivateAccountCommand {
                email: "".to_string(),
                username: "alice".to_string(),
                culture: None,
            })
            .await;

        assert!(matches!(result, Err(NotificationError::InvalidParameter(_))));
        assert_eq!(delivery.sent_count().await, 0);
        assert_eq!(service.stats().invalid_parameters, 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_propagates() {
        let (service, delivery) = service_with(vec![Template::new(
            "ResetPassword",
            "en-US",
            "Reset",
            "tpl-reset",
        )]);
        delivery.fail_next(1, 500);

        let result = service
            .send_reset_password(ResetPasswordCommand {
                email: "alice@example.com".to_string(),
                token: "abc".to_string(),
                endpoint: "https://app.example.com/reset".to_string(),
                culture: None,
            })
            .await;

        match result {
            Err(NotificationError::Delivery(e)) => assert!(e.is_transient()),
            other => panic!("Expected delivery failure, got {:?}", other),
        }
        assert_eq!(service.stats().delivery_failures, 1);
    }

    #[tokio::test]
    async fn test_store_failure_counted_separately() {
        let resolver = TemplateResolver::new(Arc::new(UnreachableStore), "en-US");
        let delivery = Arc::new(MemoryDeliveryClient::new());
        let mail = MailConfig::new("no-reply@example.com", "support@example.com");
        let service = NotificationService::new(resolver, delivery.clone(), &mail);

        let result = service
            .send_activate_account(ActivateAccountCommand {
                email: "alice@example.com".to_string(),
                username: "alice".to_string(),
                culture: None,
            })
            .await;

        assert!(matches!(result, Err(NotificationError::Store(_))));
        let stats = service.stats();
        assert_eq!(stats.store_errors, 1);
        assert_eq!(stats.delivery_failures, 0);
        assert_eq!(stats.total_failed, 1);
        assert_eq!(delivery.sent_count().await, 0);
    }
}
