use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use axum_extra::extract::WithRejection;
use histoury_lib::{
    places::{LatLng, NearbyPlaces, DEFAULT_SEARCH_RADIUS_M},
    trip::validate_coordinates,
};
use serde::Deserialize;

use crate::{core::map_html, error::AppError, server_state::ServerState, services::places::find_nearby_places};

/// Google rejects larger radii.
const MAX_RADIUS_M: u32 = 50_000;

#[derive(Deserialize)]
pub struct NearbyQuery {
    lat: f64,
    lng: f64,
    radius: Option<u32>,
}

impl NearbyQuery {
    fn origin(&self) -> Result<LatLng, AppError> {
        validate_coordinates(self.lat, self.lng)?;
        Ok(LatLng::new(self.lat, self.lng))
    }

    fn radius(&self) -> u32 {
        self.radius.unwrap_or(DEFAULT_SEARCH_RADIUS_M).clamp(1, MAX_RADIUS_M)
    }
}

async fn lookup(state: &ServerState, query: &NearbyQuery) -> Result<NearbyPlaces, AppError> {
    Ok(find_nearby_places(state.places.as_ref(), query.origin()?, query.radius()).await?)
}

pub async fn nearby_places(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(query), _): WithRejection<Query<NearbyQuery>, AppError>,
) -> Result<Json<NearbyPlaces>, AppError> {
    Ok(Json(lookup(&state, &query).await?))
}

pub async fn generate_map(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(query), _): WithRejection<Query<NearbyQuery>, AppError>,
) -> Result<Html<String>, AppError> {
    let places = lookup(&state, &query).await?;
    Ok(Html(map_html::render_map(&places)))
}
