//! Infrastructure layer modules
//!
//! This module contains shared infrastructure components:
//! - `backoff`: Exponential backoff with jitter for reconnects and retries
//! - `postgres`: PostgreSQL connection pool

pub mod backoff;
pub mod postgres;
