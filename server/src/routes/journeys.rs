use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use histoury_data_management::PhotoUpload;
use histoury_lib::journey::{Journey, JourneyPhoto};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{auth::CurrentUser, core::gpx_util, error::AppError, server_state::ServerState};

use super::read_files;

const PHOTO_FIELD: &str = "photo";

#[derive(Serialize)]
pub struct StoredPhoto {
    #[serde(flatten)]
    photo: JourneyPhoto,
    url: String,
}

pub async fn history(State(state): State<Arc<ServerState>>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Journey>>, AppError> {
    Ok(Json(state.data_manager.get_journeys(&user.user_id).await?))
}

pub async fn history_gpx(State(state): State<Arc<ServerState>>, CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, AppError> {
    let journeys = state.data_manager.get_journeys(&user.user_id).await?;
    let gpx = gpx_util::journeys_to_gpx(&journeys, Utc::now());
    let bytes = gpx_util::write_gpx(&gpx)
        .map_err(|err| AppError::Internal(format!("Failed to write GPX: {err}")))?;

    Ok((
        [
            (CONTENT_TYPE, "application/gpx+xml"),
            (CONTENT_DISPOSITION, "attachment; filename=\"journeys.gpx\""),
        ],
        bytes,
    ))
}

pub async fn delete_journey(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(journey_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.data_manager.delete_journey(&user.user_id, &journey_id).await?;
    Ok(Json(json!({ "message": "Journey deleted successfully" })))
}

pub async fn upload_photos(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(journey_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Vec<StoredPhoto>>, AppError> {
    let files = read_files(&mut multipart, PHOTO_FIELD).await?;
    if files.is_empty() {
        return Err(AppError::BadRequest("No photo provided".to_string()));
    }

    let mut uploads = Vec::with_capacity(files.len());
    for file in &files {
        let extension = image_extension(&file.content_type)
            .ok_or_else(|| AppError::BadRequest(format!("{} is not a supported image", file.file_name)))?;
        uploads.push(PhotoUpload { content_type: &file.content_type, extension, bytes: &file.bytes });
    }

    let stored: Vec<StoredPhoto> = state.data_manager
        .add_journey_photos(&user.user_id, &journey_id, &uploads).await?
        .into_iter()
        .map(|photo| StoredPhoto { url: photo.url(), photo })
        .collect();

    tracing::debug!("Attached {} photos to journey {}", stored.len(), journey_id);
    Ok(Json(stored))
}

pub async fn get_photo(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path((journey_id, photo_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (photo, bytes) = state.data_manager.get_journey_photo(&user.user_id, &journey_id, &photo_id).await?;
    Ok((
        [
            (CONTENT_TYPE, photo.content_type),
            (X_CONTENT_TYPE_OPTIONS, "nosniff".to_string()),
        ],
        bytes,
    ))
}

/// Raster formats only; anything a browser could run as markup is refused.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}
