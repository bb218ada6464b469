use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{User, UserKey};
use crate::patch::assembler::compile_patch;
use crate::state::AppState;
use crate::validate::validate_user;

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> Result<StatusCode, AppError> {
    validate_user(&user)?;
    state.store.create(&user).await?;
    info!(user_id = %user.user_id, "created resume record");
    Ok(StatusCode::CREATED)
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state.store.fetch_by_key(&UserKey { user_id: id }).await?;
    Ok(Json(user))
}

/// PUT /api/v1/users/:id
///
/// Fetches the current record, compiles the diff against the proposed one
/// and applies it as a single patch. The fetch-diff-apply sequence is not
/// transactional; a concurrent writer between fetch and apply wins or loses
/// whole fields (last-writer-wins at the store).
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut proposed): Json<User>,
) -> Result<StatusCode, AppError> {
    // The record key is path-addressed and immutable.
    proposed.user_id = id.clone();
    validate_user(&proposed)?;

    let key = UserKey { user_id: id };
    let current = state.store.fetch_by_key(&key).await?;
    let patch = compile_patch(&current, &proposed, Utc::now())?;
    state.store.apply_patch(&key, &patch).await?;

    info!(
        user_id = %key.user_id,
        sets = patch.set_ops.len(),
        removes = patch.remove_ops.len(),
        adds = patch.add_ops.len(),
        "applied resume update"
    );
    Ok(StatusCode::ACCEPTED)
}

/// DELETE /api/v1/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&UserKey { user_id: id }).await?;
    Ok(StatusCode::ACCEPTED)
}
