use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::trip::Trip;

/// A completed trip.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Journey {
    pub journey_id: String,
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub place_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub photos: Vec<JourneyPhoto>,
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct JourneyPhoto {
    pub photo_id: String,
    pub journey_id: String,
    pub content_type: String,
    #[serde(skip)]
    pub file_name: String,
    pub created_at: DateTime<Utc>,
}

impl Journey {
    pub fn from_trip(trip: &Trip, journey_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            journey_id,
            user_id: trip.user_id.clone(),
            lat: trip.lat,
            lng: trip.lng,
            description: trip.description.clone(),
            place_name: trip.place_name.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            created_at,
            photos: Vec::new(),
        }
    }
}

impl JourneyPhoto {
    pub fn url(&self) -> String {
        format!("/journeys/{}/photos/{}", self.journey_id, self.photo_id)
    }
}
