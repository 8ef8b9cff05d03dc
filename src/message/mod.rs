//! Outbound message construction.
//!
//! Messages are either plain (inline body, support path) or templated
//! (provider template reference plus `-tag-` keyed substitutions). The
//! `MessageBody` enum keeps the two forms mutually exclusive.

mod builder;
mod types;

pub use builder::{wrap_tag, MessageBuilder, SUBSTITUTION_DELIMITER};
pub use types::{MessageBody, OutboundMessage, Sender, TemplateParameter};
