use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::auth::AuthUser;
use crate::api::state::AppState;
use crate::application::{ContactReceipt, SearchFilters, SearchResults};
use crate::domain::policy::contact_throttle::ContactUsage;

/// Query string for partner search
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub sector: Option<String>,
    pub current_province: Option<String>,
    pub desired_province: Option<String>,
}

impl From<SearchQuery> for SearchFilters {
    fn from(query: SearchQuery) -> Self {
        Self {
            sector: query.sector,
            current_province: query.current_province,
            desired_province: query.desired_province,
        }
    }
}

/// Search swap partners
///
/// GET /api/users/search?sector&currentProvince&desiredProvince
pub async fn search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResults>, ApiError> {
    let results = state.search.search(user.id, &query.into()).await?;
    Ok(Json(results))
}

/// Reveal a user's number, counting against the daily quota
///
/// POST /api/contacts/:id
pub async fn contact(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(target_id): Path<Uuid>,
) -> Result<Json<ContactReceipt>, ApiError> {
    let receipt = state.contacts.contact(user.id, target_id).await?;
    Ok(Json(receipt))
}

/// GET /api/contacts/usage
pub async fn contact_usage(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ContactUsage>, ApiError> {
    Ok(Json(state.contacts.usage(user.id).await?))
}
