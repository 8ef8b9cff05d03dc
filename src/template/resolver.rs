//! Culture-aware template resolution

use std::sync::Arc;

use crate::metrics::TemplateMetrics;
use crate::notification::NotificationError;

use super::store::TemplateStore;
use super::types::Template;

/// Resolves a template for the requested culture, falling back to the
/// configured default culture.
///
/// Only two lookups are ever made: the exact requested culture, then the
/// default culture. Partial matches such as "en" for "en-GB" are never tried.
#[derive(Clone)]
pub struct TemplateResolver {
    store: Arc<dyn TemplateStore>,
    default_culture: String,
}

impl TemplateResolver {
    pub fn new(store: Arc<dyn TemplateStore>, default_culture: impl Into<String>) -> Self {
        Self {
            store,
            default_culture: default_culture.into(),
        }
    }

    pub fn default_culture(&self) -> &str {
        &self.default_culture
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn resolve(
        &self,
        codename: &str,
        requested_culture: &str,
    ) -> Result<Template, NotificationError> {
        if let Some(template) = self
            .store
            .get_by_codename_and_culture(codename, requested_culture)
            .await?
        {
            return Ok(template);
        }

        if requested_culture != self.default_culture {
            if let Some(template) = self
                .store
                .get_by_codename_and_culture(codename, &self.default_culture)
                .await?
            {
                tracing::debug!(
                    codename = %codename,
                    requested_culture = %requested_culture,
                    default_culture = %self.default_culture,
                    "Falling back to default culture template"
                );
                TemplateMetrics::record_fallback(codename);
                return Ok(template);
            }
        }

        TemplateMetrics::record_not_found(codename);
        Err(NotificationError::TemplateNotFound {
            codename: codename.to_string(),
        })
    }
}
