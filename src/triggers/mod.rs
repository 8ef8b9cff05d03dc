//! Inbound command sources.

mod redis;

pub use redis::{handle_command, CommandOutcome, RedisCommandListener, DEFAULT_COMMAND_CHANNEL};
