use axum::{
    extract::{Path, Query},
    Json,
};
use axum_extra::extract::WithRejection;
use histoury_lib::landmark::{self, Landmark};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    landmark: &'static Landmark,
    excerpt: String,
}

pub async fn list() -> Json<&'static [Landmark]> {
    Json(landmark::catalog())
}

pub async fn search(WithRejection(Query(query), _): WithRejection<Query<SearchQuery>, AppError>) -> Json<Vec<SearchResult>> {
    let results = landmark::search(&query.q)
        .into_iter()
        .map(|landmark| SearchResult { landmark, excerpt: landmark::excerpt(landmark.description) })
        .collect();

    Json(results)
}

pub async fn suggestions() -> Json<Vec<&'static Landmark>> {
    Json(landmark::suggestions())
}

pub async fn get_landmark(Path(slug): Path<String>) -> Result<Json<&'static Landmark>, AppError> {
    landmark::find_by_slug(&slug)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No landmark named {slug}")))
}
