use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use ara_mailer::config::Settings;
use ara_mailer::delivery::create_delivery_client;
use ara_mailer::notification::NotificationService;
use ara_mailer::postgres::PostgresPool;
use ara_mailer::server::{create_app, AppState};
use ara_mailer::telemetry::init_telemetry;
use ara_mailer::template::{create_template_store, prepare_postgres_store, TemplateResolver};
use ara_mailer::triggers::RedisCommandListener;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    let _telemetry_guard = init_telemetry(&settings.otel)?;
    tracing::info!("Configuration loaded");

    // PostgreSQL is only needed for the postgres template store
    let postgres_pool = if settings.templates.backend == "postgres" {
        let pool = PostgresPool::new(&settings.database).await?;
        tracing::info!(url = %pool.database_url_masked(), "Connected to PostgreSQL");
        prepare_postgres_store(&pool, &settings.templates).await?;
        Some(Arc::new(pool))
    } else {
        None
    };

    let template_store = create_template_store(&settings.templates, postgres_pool.clone())?;
    let resolver = TemplateResolver::new(template_store, settings.mail.default_culture.clone());
    let delivery = create_delivery_client(&settings.delivery)?;
    let service = Arc::new(NotificationService::new(
        resolver.clone(),
        delivery,
        &settings.mail,
    ));
    tracing::info!(
        delivery = service.delivery_client_name(),
        templates = resolver.store_backend(),
        default_culture = %resolver.default_culture(),
        "Notification service initialized"
    );

    // Create Redis command listener
    let listener = Arc::new(RedisCommandListener::new(
        settings.redis.clone(),
        settings.listener.clone(),
        service.clone(),
    ));
    let shutdown_signal = listener.shutdown_signal();

    let listener_clone = listener.clone();
    let listener_handle = tokio::spawn(async move {
        if let Err(e) = listener_clone.start().await {
            tracing::error!(error = %e, "Redis command listener failed");
        }
    });

    let state = AppState::new(service, resolver, postgres_pool.clone());
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let tcp_listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(tcp_listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_signal))
        .await?;

    tracing::info!("Waiting for background tasks to finish...");
    let _ = listener_handle.await;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the command listener
    let _ = shutdown_tx.send(());
}
