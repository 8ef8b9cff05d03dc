//! Template store trait and the in-memory backend

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;

use super::types::{StoreError, StoreResult, Template};

/// Read access to template definitions.
///
/// Templates are seeded by an administrative process; the service only reads
/// them at send time.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Look up the template registered for an exact `(codename, culture)` pair
    async fn get_by_codename_and_culture(
        &self,
        codename: &str,
        culture: &str,
    ) -> StoreResult<Option<Template>>;

    /// Backend name for logging and health output
    fn backend_name(&self) -> &'static str;
}

/// Read a JSON array of templates, as used by `MemoryTemplateStore::from_seed_file`
/// and the PostgreSQL startup seeding
pub fn load_seed_file(path: impl AsRef<Path>) -> StoreResult<Vec<Template>> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| StoreError::Seed(format!("{}: {}", path.display(), e)))
}

/// In-memory template storage keyed by `(codename, culture)`
pub struct MemoryTemplateStore {
    templates: DashMap<(String, String), Template>,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
        }
    }

    /// Create a store holding the given templates
    pub fn with_templates(templates: impl IntoIterator<Item = Template>) -> StoreResult<Self> {
        let store = Self::new();
        for template in templates {
            store.insert(template)?;
        }
        Ok(store)
    }

    /// Load a JSON array of templates from disk
    pub fn from_seed_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let store = Self::with_templates(load_seed_file(path)?)?;
        tracing::info!(
            path = %path.display(),
            count = store.len(),
            "Loaded template seed"
        );
        Ok(store)
    }

    /// Insert a template; `(codename, culture)` must be unique
    pub fn insert(&self, template: Template) -> StoreResult<()> {
        template.validate()?;

        let key = (template.codename.clone(), template.culture.clone());
        if self.templates.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                codename: key.0,
                culture: key.1,
            });
        }

        self.templates.insert(key, template);
        Ok(())
    }

    /// List all templates
    pub fn list(&self) -> Vec<Template> {
        self.templates
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get_by_codename_and_culture(
        &self,
        codename: &str,
        culture: &str,
    ) -> StoreResult<Option<Template>> {
        let key = (codename.to_string(), culture.to_string());
        Ok(self.templates.get(&key).map(|t| t.value().clone()))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
