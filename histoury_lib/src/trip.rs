use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A planned visit. Promoted to a [`crate::journey::Journey`] once completed.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub user_id: String,
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub place_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Trip creation payload as sent by clients. Everything is optional so that
/// missing fields can be reported together.
#[derive(Debug, Default, Deserialize)]
pub struct TripDraft {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub description: Option<String>,
    pub place_name: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub lat: f64,
    pub lng: f64,
    pub description: String,
    pub place_name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Fields a client may change on an existing trip.
#[derive(Debug, Default, Deserialize)]
pub struct TripUpdate {
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    /// `Some(None)` clears the end date, `None` leaves it alone.
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub place_name: Option<String>,
}

/// Separates an explicit `null` from an absent field.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq)]
pub enum TripValidationError {
    MissingFields(Vec<&'static str>),
    CoordinatesOutOfRange,
    EndBeforeStart,
}

impl fmt::Display for TripValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TripValidationError::MissingFields(fields) => write!(f, "Missing required fields: {}", fields.join(", ")),
            TripValidationError::CoordinatesOutOfRange => write!(f, "Coordinates out of range"),
            TripValidationError::EndBeforeStart => write!(f, "end_date must not be before start_date"),
        }
    }
}

pub fn validate_coordinates(lat: f64, lng: f64) -> Result<(), TripValidationError> {
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
        Ok(())
    } else {
        Err(TripValidationError::CoordinatesOutOfRange)
    }
}

fn validate_dates(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<(), TripValidationError> {
    match end {
        Some(end) if end < start => Err(TripValidationError::EndBeforeStart),
        _ => Ok(()),
    }
}

impl TripDraft {
    /// `now` becomes the start date when none was given.
    pub fn validate(self, now: DateTime<Utc>) -> Result<NewTrip, TripValidationError> {
        let mut missing = Vec::new();
        if self.lat.is_none() {
            missing.push("lat");
        }
        if self.lng.is_none() {
            missing.push("lng");
        }
        if self.description.is_none() {
            missing.push("description");
        }
        if self.place_name.is_none() {
            missing.push("place_name");
        }

        let (Some(lat), Some(lng), Some(description), Some(place_name)) = (self.lat, self.lng, self.description, self.place_name) else {
            return Err(TripValidationError::MissingFields(missing));
        };

        validate_coordinates(lat, lng)?;

        let start_date = self.start_date.unwrap_or(now);
        validate_dates(start_date, self.end_date)?;

        Ok(NewTrip {
            lat,
            lng,
            description,
            place_name,
            start_date,
            end_date: self.end_date,
        })
    }
}

impl NewTrip {
    pub fn into_trip(self, trip_id: String, user_id: String, created_at: DateTime<Utc>) -> Trip {
        Trip {
            trip_id,
            user_id,
            lat: self.lat,
            lng: self.lng,
            description: self.description,
            place_name: self.place_name,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at,
            updated_at: None,
        }
    }
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.start_date.is_none() && self.end_date.is_none() && self.place_name.is_none()
    }

    /// Merges the update into `trip`. An empty update leaves the trip untouched.
    pub fn apply_to(self, trip: &Trip, now: DateTime<Utc>) -> Result<Trip, TripValidationError> {
        if self.is_empty() {
            return Ok(trip.clone());
        }

        let mut updated = trip.clone();
        if let Some(description) = self.description {
            updated.description = description;
        }
        if let Some(place_name) = self.place_name {
            updated.place_name = place_name;
        }
        if let Some(start_date) = self.start_date {
            updated.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            updated.end_date = end_date;
        }

        validate_dates(updated.start_date, updated.end_date)?;
        updated.updated_at = Some(now);

        Ok(updated)
    }
}
