use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use histoury_lib::{landmark, recognition::RecognizedLandmark};
use serde::Serialize;

use crate::{error::AppError, server_state::ServerState};

use super::read_files;

const IMAGE_FIELD: &str = "image";

#[derive(Debug, Serialize)]
pub struct Detection {
    name: String,
    lat: f64,
    lng: f64,
    source: &'static str,
    /// Catalog page for the landmark, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    slug: Option<&'static str>,
}

impl Detection {
    fn new(found: RecognizedLandmark, source: &'static str) -> Self {
        Self {
            slug: landmark::find_by_name(&found.name).map(|landmark| landmark.slug),
            name: found.name,
            lat: found.location.lat,
            lng: found.location.lng,
            source,
        }
    }
}

/// Tries each detector in turn. A failing detector is skipped.
pub async fn detect_landmark(State(state): State<Arc<ServerState>>, mut multipart: Multipart) -> Result<Json<Detection>, AppError> {
    let image = read_files(&mut multipart, IMAGE_FIELD).await?
        .into_iter()
        .next()
        .ok_or(AppError::BadRequest("No image provided".to_string()))?;

    let stored = state.data_manager.store_upload(&image.file_name, &image.bytes).await?;
    tracing::debug!("Scanning {} ({} bytes)", stored, image.bytes.len());

    for detector in &state.detectors {
        match detector.detect(&image.bytes).await {
            Ok(Some(found)) => {
                tracing::info!("{} recognized {} in {}", detector.source(), found.name, stored);
                return Ok(Json(Detection::new(found, detector.source())));
            }
            Ok(None) => tracing::debug!("{} found no landmark in {}", detector.source(), stored),
            Err(err) => tracing::warn!("{} detector failed on {}: {err}", detector.source(), stored),
        }
    }

    Err(AppError::NotFound("Landmark not recognized".to_string()))
}
