//! Email template system.
//!
//! This module provides:
//! - Template definitions keyed by codename and culture
//! - Template stores (in-memory with JSON seeding, PostgreSQL)
//! - Resolution with a single fallback to the default culture
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryTemplateStore::with_templates(vec![
//!     Template::new("ActivateAccount", "en-US", "Activate your account", "d-1f2e"),
//! ])?;
//! let resolver = TemplateResolver::new(Arc::new(store), "en-US");
//!
//! // No fr-FR template registered, the en-US one is returned
//! let template = resolver.resolve("ActivateAccount", "fr-FR").await?;
//! ```

mod postgres_store;
mod resolver;
mod store;
mod types;

use std::sync::Arc;

use crate::config::TemplateStoreConfig;
use crate::infrastructure::postgres::PostgresPool;

pub use postgres_store::PostgresTemplateStore;
pub use resolver::TemplateResolver;
pub use store::{load_seed_file, MemoryTemplateStore, TemplateStore};
pub use types::{StoreError, StoreResult, Template, TemplateCodename};

/// Create a template store based on configuration.
///
/// - `"postgres"`: `PostgresTemplateStore` if a PostgreSQL pool is provided
/// - `"memory"` (default): `MemoryTemplateStore`, seeded from `seed_path` when set
///
/// A requested PostgreSQL backend without a pool falls back to memory.
pub fn create_template_store(
    settings: &TemplateStoreConfig,
    postgres_pool: Option<Arc<PostgresPool>>,
) -> StoreResult<Arc<dyn TemplateStore>> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL template store");
                return Ok(Arc::new(PostgresTemplateStore::new(pool.pool().clone())));
            }
            tracing::warn!(
                "PostgreSQL template store requested but no pool provided, falling back to memory"
            );
            create_memory_store(settings)
        }
        _ => create_memory_store(settings),
    }
}

/// Create the `mail_templates` table and, when it is empty, fill it from
/// `seed_path`. Returns the number of templates written.
///
/// A populated table is never touched, so edits made in the database survive
/// restarts.
pub async fn prepare_postgres_store(
    pool: &PostgresPool,
    settings: &TemplateStoreConfig,
) -> StoreResult<usize> {
    let store = PostgresTemplateStore::new(pool.pool().clone());
    store.ensure_schema().await?;

    let Some(path) = settings.seed_path.as_deref() else {
        return Ok(0);
    };

    let existing = store.count().await?;
    if existing > 0 {
        tracing::debug!(existing, "Template table already populated, skipping seed");
        return Ok(0);
    }

    let templates = load_seed_file(path)?;
    for template in &templates {
        template.validate()?;
    }
    for template in &templates {
        store.upsert(template).await?;
    }

    tracing::info!(path = %path, count = templates.len(), "Seeded PostgreSQL template store");
    Ok(templates.len())
}

fn create_memory_store(settings: &TemplateStoreConfig) -> StoreResult<Arc<dyn TemplateStore>> {
    let store = match &settings.seed_path {
        Some(path) => MemoryTemplateStore::from_seed_file(path)?,
        None => {
            tracing::warn!("Memory template store has no seed file, all lookups will miss");
            MemoryTemplateStore::new()
        }
    };
    tracing::info!(backend = "memory", templates = store.len(), "Creating memory template store");
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;

    const SHIPPED_SEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/templates.json");

    #[test]
    fn test_factory_defaults_to_memory() {
        let settings = TemplateStoreConfig::default();
        let store = create_template_store(&settings, None).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_factory_postgres_without_pool_falls_back() {
        let settings = TemplateStoreConfig {
            backend: "postgres".to_string(),
            seed_path: None,
        };
        let store = create_template_store(&settings, None).unwrap();
        assert_eq!(store.backend_name(), "memory");
    }

    #[test]
    fn test_factory_bad_seed_path_fails() {
        let settings = TemplateStoreConfig {
            backend: "memory".to_string(),
            seed_path: Some("/nonexistent/seed.json".to_string()),
        };
        assert!(create_template_store(&settings, None).is_err());
    }

    #[test]
    fn test_shipped_seed_file_is_valid() {
        let templates = load_seed_file(SHIPPED_SEED).unwrap();

        assert!(!templates.is_empty());
        assert!(templates.iter().all(|t| t.validate().is_ok()));
    }

    async fn test_pool() -> Arc<PostgresPool> {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let config = DatabaseConfig {
            url: Some(url),
            ..DatabaseConfig::default()
        };
        Arc::new(PostgresPool::new(&config).await.unwrap())
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL. Run with TEST_DATABASE_URL set"]
    async fn test_postgres_seeded_once_and_resolvable() {
        let pool = test_pool().await;
        sqlx::query("DROP TABLE IF EXISTS mail_templates")
            .execute(pool.pool())
            .await
            .unwrap();

        let settings = TemplateStoreConfig {
            backend: "postgres".to_string(),
            seed_path: Some(SHIPPED_SEED.to_string()),
        };

        let written = prepare_postgres_store(&pool, &settings).await.unwrap();
        assert_eq!(written, 12);

        let store = PostgresTemplateStore::new(pool.pool().clone());
        store
            .upsert(&Template::new("ResetPassword", "en-US", "Edited", "d-edited"))
            .await
            .unwrap();

        // Second start leaves the populated table alone
        assert_eq!(prepare_postgres_store(&pool, &settings).await.unwrap(), 0);

        let resolver = TemplateResolver::new(
            create_template_store(&settings, Some(pool.clone())).unwrap(),
            "en-US",
        );
        let template = resolver.resolve("ResetPassword", "fr-FR").await.unwrap();
        assert_eq!(template.provider_template_id, "d-edited");
        assert_eq!(store.count().await.unwrap(), 12);
    }
}
