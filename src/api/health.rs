//! Health check and statistics endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::metrics::REDIS_SUBSCRIPTION_STATUS;
use crate::notification::ServiceStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub redis: RedisHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub delivery: DeliveryHealthResponse,
    pub templates: TemplateHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct RedisHealthResponse {
    pub subscribed: bool,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, Serialize)]
pub struct DeliveryHealthResponse {
    pub provider: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateHealthResponse {
    pub backend: String,
    pub default_culture: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub notifications: ServiceStatsSnapshot,
}

/// GET /health
///
/// Reports "degraded" when the command subscription is down or the
/// template database does not answer.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let subscribed = REDIS_SUBSCRIPTION_STATUS.get() == 1;

    let postgres = match state.postgres_pool {
        Some(ref pool) => {
            let connected = match pool.ping().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "PostgreSQL health check failed");
                    false
                }
            };
            let inner_pool = pool.pool();
            Some(PostgresHealthResponse {
                status: if connected { "connected" } else { "unreachable" }.to_string(),
                connected,
                pool_size: inner_pool.size(),
                idle_connections: inner_pool.num_idle() as u32,
            })
        }
        None => None,
    };

    let postgres_ok = postgres.as_ref().map_or(true, |p| p.connected);
    let status = if subscribed && postgres_ok {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        redis: RedisHealthResponse { subscribed },
        postgres,
        delivery: DeliveryHealthResponse {
            provider: state.service.delivery_client_name().to_string(),
        },
        templates: TemplateHealthResponse {
            backend: state.resolver.store_backend().to_string(),
            default_culture: state.resolver.default_culture().to_string(),
        },
    })
}

/// GET /stats
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        notifications: state.service.stats(),
    })
}
