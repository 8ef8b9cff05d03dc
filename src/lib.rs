// Infrastructure layer (shared components)
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod telemetry;

pub use infrastructure::postgres;

// Domain layer (business logic)
pub mod delivery;
pub mod message;
pub mod notification;
pub mod template;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;
