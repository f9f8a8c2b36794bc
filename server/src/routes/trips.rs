use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use histoury_lib::trip::{Trip, TripDraft, TripUpdate};
use serde_json::{json, Value};

use crate::{auth::CurrentUser, error::AppError, server_state::ServerState};

pub async fn create_trip(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(draft), _): WithRejection<Json<TripDraft>, AppError>,
) -> Result<Json<Trip>, AppError> {
    let new_trip = draft.validate(Utc::now())?;
    let trip = state.data_manager.create_trip(&user.user_id, new_trip).await?;

    tracing::info!("User {} planned trip {} to {}", user.user_id, trip.trip_id, trip.place_name);
    Ok(Json(trip))
}

pub async fn get_trips(State(state): State<Arc<ServerState>>, CurrentUser(user): CurrentUser) -> Result<Json<Vec<Trip>>, AppError> {
    Ok(Json(state.data_manager.get_trips(&user.user_id).await?))
}

pub async fn get_trip(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<String>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.data_manager.get_trip(&user.user_id, &trip_id).await?))
}

pub async fn update_trip(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<String>,
    WithRejection(Json(update), _): WithRejection<Json<TripUpdate>, AppError>,
) -> Result<Json<Trip>, AppError> {
    let trip = state.data_manager.get_trip(&user.user_id, &trip_id).await?;
    if update.is_empty() {
        return Ok(Json(trip));
    }

    let updated = update.apply_to(&trip, Utc::now())?;
    state.data_manager.save_trip(&updated).await?;

    Ok(Json(updated))
}

pub async fn delete_trip(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.data_manager.delete_trip(&user.user_id, &trip_id).await?;
    Ok(Json(json!({ "message": "Trip deleted successfully" })))
}

pub async fn complete_trip(
    State(state): State<Arc<ServerState>>,
    CurrentUser(user): CurrentUser,
    Path(trip_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let journey = state.data_manager.complete_trip(&user.user_id, &trip_id).await?;
    Ok(Json(json!({
        "message": "Trip marked as completed and moved to journeys",
        "journey_id": journey.journey_id,
    })))
}
