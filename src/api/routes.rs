use axum::{routing::get, Router};

use crate::server::AppState;

use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::template::get_template;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new().route("/templates/{codename}/{culture}", get(get_template)),
        )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    use crate::config::MailConfig;
    use crate::delivery::MemoryDeliveryClient;
    use crate::notification::NotificationService;
    use crate::server::{create_app, AppState};
    use crate::template::{MemoryTemplateStore, Template, TemplateResolver};

    fn test_app() -> Router {
        let mail = MailConfig::new("noreply@example.com", "support@example.com");
        let store = MemoryTemplateStore::with_templates([
            Template::new("ResetPassword", "en-US", "Reset your password", "tpl-reset-en"),
            Template::new("ResetPassword", "pl-PL", "Zresetuj hasło", "tpl-reset-pl"),
        ])
        .unwrap();
        let resolver = TemplateResolver::new(Arc::new(store), "en-US");
        let service = Arc::new(NotificationService::new(
            resolver.clone(),
            Arc::new(MemoryDeliveryClient::new()),
            &mail,
        ));

        create_app(AppState::new(service, resolver, None))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_get_template_exact_culture() {
        let (status, body) = get_json(test_app(), "/api/v1/templates/ResetPassword/pl-PL").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["culture"], "pl-PL");
        assert_eq!(body["provider_template_id"], "tpl-reset-pl");
    }

    #[tokio::test]
    async fn test_get_template_falls_back() {
        let (status, body) = get_json(test_app(), "/api/v1/templates/ResetPassword/fr-FR").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["culture"], "en-US");
        assert_eq!(body["provider_template_id"], "tpl-reset-en");
    }

    #[tokio::test]
    async fn test_get_template_not_found() {
        let (status, body) = get_json(test_app(), "/api/v1/templates/CommentAdded/en-US").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "TEMPLATE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_health_reports_backends() {
        let (status, body) = get_json(test_app(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["delivery"]["provider"], "memory");
        assert_eq!(body["templates"]["backend"], "memory");
        assert_eq!(body["templates"]["default_culture"], "en-US");
        assert!(body.get("postgres").is_none());
    }

    #[tokio::test]
    async fn test_stats_start_at_zero() {
        let (status, body) = get_json(test_app(), "/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["notifications"]["total_sent"], 0);
        assert_eq!(body["notifications"]["total_failed"], 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = test_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
