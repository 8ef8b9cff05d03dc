//! PostgreSQL-backed template store.
//!
//! Templates live in a single table keyed by `(codename, culture)`:
//!
//! ```sql
//! CREATE TABLE mail_templates (
//!     codename             TEXT NOT NULL,
//!     culture              TEXT NOT NULL,
//!     subject              TEXT NOT NULL,
//!     provider_template_id TEXT NOT NULL,
//!     PRIMARY KEY (codename, culture)
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;

use super::store::TemplateStore;
use super::types::{StoreResult, Template};

#[derive(Debug, sqlx::FromRow)]
struct TemplateRow {
    codename: String,
    culture: String,
    subject: String,
    provider_template_id: String,
}

impl From<TemplateRow> for Template {
    fn from(row: TemplateRow) -> Self {
        Template {
            codename: row.codename,
            culture: row.culture,
            subject: row.subject,
            provider_template_id: row.provider_template_id,
        }
    }
}

/// Template store reading from the `mail_templates` table
pub struct PostgresTemplateStore {
    pool: PgPool,
}

impl PostgresTemplateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the templates table if it does not exist yet
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mail_templates (
                codename             TEXT NOT NULL,
                culture              TEXT NOT NULL,
                subject              TEXT NOT NULL,
                provider_template_id TEXT NOT NULL,
                PRIMARY KEY (codename, culture)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of stored templates
    pub async fn count(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mail_templates")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert or replace a template
    pub async fn upsert(&self, template: &Template) -> StoreResult<()> {
        template.validate()?;

        sqlx::query(
            r#"
            INSERT INTO mail_templates (codename, culture, subject, provider_template_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (codename, culture)
            DO UPDATE SET subject = EXCLUDED.subject,
                          provider_template_id = EXCLUDED.provider_template_id
            "#,
        )
        .bind(&template.codename)
        .bind(&template.culture)
        .bind(&template.subject)
        .bind(&template.provider_template_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TemplateStore for PostgresTemplateStore {
    async fn get_by_codename_and_culture(
        &self,
        codename: &str,
        culture: &str,
    ) -> StoreResult<Option<Template>> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT codename, culture, subject, provider_template_id
            FROM mail_templates
            WHERE codename = $1 AND culture = $2
            "#,
        )
        .bind(codename)
        .bind(culture)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Template::from))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion() {
        let row = TemplateRow {
            codename: "CommentAdded".to_string(),
            culture: "en-US".to_string(),
            subject: "New comment".to_string(),
            provider_template_id: "d-42".to_string(),
        };

        let template: Template = row.into();
        assert_eq!(
            template,
            Template::new("CommentAdded", "en-US", "New comment", "d-42")
        );
    }
}
