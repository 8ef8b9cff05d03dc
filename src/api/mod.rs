//! API layer - HTTP endpoint handlers organized by domain.

mod health;
mod metrics;
mod routes;
mod template;

pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use template::get_template;
