use crate::dtos::{NotificationListResponse, NotificationResponse, UnreadCountResponse};
use crate::services::NotificationStore;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use service_core::error::AppError;

pub async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<NotificationListResponse>, AppError> {
    let notifications = state.local_db.list_notifications().await?;
    let unread = state.local_db.unread_count().await?;

    Ok(Json(NotificationListResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        unread,
    }))
}

/// Reads the live count rather than querying the database.
pub async fn unread_count(State(state): State<AppState>) -> Json<UnreadCountResponse> {
    let count = *state.local_db.unread_count_stream().borrow();
    Json(UnreadCountResponse::from(count))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.local_db.mark_read(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Notification {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let updated = state.local_db.mark_all_read().await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state.local_db.delete_notification(id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Notification {} not found",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
