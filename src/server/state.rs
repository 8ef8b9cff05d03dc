use std::sync::Arc;
use std::time::Instant;

use crate::infrastructure::postgres::PostgresPool;
use crate::notification::NotificationService;
use crate::template::TemplateResolver;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<NotificationService>,
    pub resolver: TemplateResolver,
    pub postgres_pool: Option<Arc<PostgresPool>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        service: Arc<NotificationService>,
        resolver: TemplateResolver,
        postgres_pool: Option<Arc<PostgresPool>>,
    ) -> Self {
        Self {
            service,
            resolver,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
