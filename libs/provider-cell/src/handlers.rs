use axum::{
    extract::{Path, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, JsonBody};

use crate::models::CreateProviderRequest;
use crate::services::provider::ProviderService;
use crate::state::ProviderState;

#[axum::debug_handler]
pub async fn list_providers(
    State(state): State<ProviderState>,
) -> Result<Json<Value>, AppError> {
    let providers = ProviderService::new(state.directory.clone())
        .list_providers()
        .await?;

    Ok(Json(json!(providers)))
}

#[axum::debug_handler]
pub async fn get_provider(
    State(state): State<ProviderState>,
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let provider = ProviderService::new(state.directory.clone())
        .get_provider(&provider_id)
        .await?;

    Ok(Json(json!(provider)))
}

#[axum::debug_handler]
pub async fn create_provider(
    State(state): State<ProviderState>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<CreateProviderRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let provider = ProviderService::new(state.directory.clone())
        .create_provider(request)
        .await?;

    Ok((StatusCode::CREATED, Json(json!(provider))))
}

#[axum::debug_handler]
pub async fn seed_providers(
    State(state): State<ProviderState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let seeded = ProviderService::new(state.directory.clone())
        .seed_default()
        .await?;

    Ok(Json(json!(seeded)))
}
