use crate::dtos::{DocumentListResponse, LibraryEntryRequest, ProfileDeleteResponse};
use crate::models::NewLibraryEntry;
use crate::observers::ProfileTab;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

fn parse_tab(raw: &str) -> Result<ProfileTab, AppError> {
    raw.parse::<ProfileTab>().map_err(AppError::NotFound)
}

/// Returns the cached list for `tab`. Never queries a store and leaves the
/// active tab unchanged.
pub async fn list_documents(
    State(state): State<AppState>,
    Path(tab): Path<String>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let tab = parse_tab(&tab)?;
    let documents = state.aggregator.list_for(tab);
    Ok(Json(DocumentListResponse { tab, documents }))
}

/// Only published documents can be deleted; the remote record is removed and
/// the published list refreshed.
pub async fn delete_document(
    State(state): State<AppState>,
    Path((tab, id)): Path<(String, String)>,
) -> Result<Json<ProfileDeleteResponse>, AppError> {
    match parse_tab(&tab)? {
        ProfileTab::Published => {
            let deleted = state.published.delete(&id).await?;
            if !deleted {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Document {} not found",
                    id
                )));
            }
            tracing::info!(document_id = %id, "Published document deleted");
            Ok(Json(ProfileDeleteResponse { deleted }))
        }
        other => Err(AppError::BadRequest(anyhow::anyhow!(
            "Deleting from the {} tab is not supported",
            other
        ))),
    }
}

/// Adds an entry to the saved or downloaded shelf.
pub async fn add_to_shelf(
    State(state): State<AppState>,
    Path(tab): Path<String>,
    Json(req): Json<LibraryEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let tab = parse_tab(&tab)?;
    let entry = NewLibraryEntry::from(req);

    match tab {
        ProfileTab::Saved => state.local_db.save_document(&entry).await?,
        ProfileTab::Downloaded => state.local_db.record_download(&entry).await?,
        ProfileTab::Published => {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Published documents are created through uploads"
            )))
        }
    }

    Ok(StatusCode::CREATED)
}
