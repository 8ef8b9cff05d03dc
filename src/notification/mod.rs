//! Notification operations.
//!
//! `NotificationService` exposes one operation per notification kind:
//! - account: reset password, activate account
//! - support: forward a user message to the support mailbox (no template)
//! - remarks: created, state changed, comment added, photos added
//!
//! Each templated operation resolves its template by codename and culture,
//! formats dates for the resolved culture and hands a single message to the
//! configured `DeliveryClient`.

mod commands;
mod error;
mod formatting;
mod parameters;
mod service;

pub(crate) use error::require;

pub use commands::{
    ActivateAccountCommand, CommandEnvelope, CommentAddedCommand, NotificationCommand,
    NotificationKind, PhotosAddedCommand, RemarkCreatedCommand, RemarkDetails,
    RemarkStateChangedCommand, ResetPasswordCommand, SupportMessageCommand,
};
pub use error::NotificationError;
pub use formatting::{format_long_date_time, locale_for};
pub use parameters::{
    ActivateAccountParameters, CommentAddedParameters, RemarkParameters,
    RemarkStateChangedParameters, ResetPasswordParameters, TemplateParameters,
};
pub use service::{NotificationService, ServiceStats, ServiceStatsSnapshot};
