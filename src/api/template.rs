//! Template lookup endpoint.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::Result;
use crate::server::AppState;
use crate::template::Template;

/// GET /api/v1/templates/{codename}/{culture}
///
/// Returns the template a notification for this culture would use,
/// including a default culture fallback.
#[tracing::instrument(
    name = "http.get_template",
    skip_all,
    fields(codename = %codename, culture = %culture)
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path((codename, culture)): Path<(String, String)>,
) -> Result<Json<Template>> {
    let template = state.resolver.resolve(&codename, &culture).await?;
    Ok(Json(template))
}
