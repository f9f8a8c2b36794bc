use std::fmt;

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_RADIUS_M: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn to_point(self) -> Point {
        Point::new(self.lng, self.lat)
    }
}

/// Place types looked up around a landmark, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Restaurant,
    Lodging,
    Cafe,
    TouristAttraction,
    Hotel,
    Bank,
    Atm,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 7] = [
        PlaceCategory::Restaurant,
        PlaceCategory::Lodging,
        PlaceCategory::Cafe,
        PlaceCategory::TouristAttraction,
        PlaceCategory::Hotel,
        PlaceCategory::Bank,
        PlaceCategory::Atm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Lodging => "lodging",
            PlaceCategory::Cafe => "cafe",
            PlaceCategory::TouristAttraction => "tourist_attraction",
            PlaceCategory::Hotel => "hotel",
            PlaceCategory::Bank => "bank",
            PlaceCategory::Atm => "atm",
        }
    }

    pub fn marker_color(&self) -> &'static str {
        match self {
            PlaceCategory::Restaurant | PlaceCategory::Cafe => "red",
            PlaceCategory::Lodging | PlaceCategory::Hotel => "green",
            PlaceCategory::TouristAttraction => "purple",
            PlaceCategory::Bank | PlaceCategory::Atm => "blue",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw result from the places provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceCandidate {
    pub name: String,
    pub location: LatLng,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPlace {
    pub name: String,
    #[serde(rename = "type")]
    pub category: PlaceCategory,
    pub lat: f64,
    pub lng: f64,
    pub rating: Option<f64>,
    pub price_level: Option<u8>,
    pub address: Option<String>,
    pub distance_km: f64,
    pub route_url: String,
    pub marker_color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyPlaces {
    pub landmark_location: LatLng,
    pub nearby_places: Vec<NearbyPlace>,
}

impl NearbyPlace {
    pub fn from_candidate(origin: LatLng, category: PlaceCategory, candidate: PlaceCandidate) -> Self {
        let destination = candidate.location;
        Self {
            name: candidate.name,
            category,
            lat: destination.lat,
            lng: destination.lng,
            rating: candidate.rating,
            price_level: candidate.price_level,
            address: candidate.address,
            distance_km: round_2(distance_km(origin, destination)),
            route_url: route_url(origin, destination),
            marker_color: category.marker_color(),
        }
    }
}

impl NearbyPlaces {
    /// Places are ordered nearest first.
    pub fn new(landmark_location: LatLng, mut nearby_places: Vec<NearbyPlace>) -> Self {
        nearby_places.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Self {
            landmark_location,
            nearby_places,
        }
    }
}

/// Great-circle distance in kilometres.
pub fn distance_km(from: LatLng, to: LatLng) -> f64 {
    Haversine.distance(from.to_point(), to.to_point()) / 1000.
}

pub fn route_url(origin: LatLng, destination: LatLng) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={},{}&destination={},{}&travelmode=transit",
        origin.lat, origin.lng, destination.lat, destination.lng
    )
}

fn round_2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAJ_MAHAL: LatLng = LatLng { lat: 27.1751, lng: 78.0421 };
    const QUTUB_MINAR: LatLng = LatLng { lat: 28.5245, lng: 77.1855 };

    #[test]
    fn distance_between_landmarks() {
        let distance = distance_km(TAJ_MAHAL, QUTUB_MINAR);
        assert!((165. ..180.).contains(&distance), "{distance}");
        assert_eq!(distance_km(TAJ_MAHAL, TAJ_MAHAL), 0.);
    }

    #[test]
    fn candidate_conversion() {
        let candidate = PlaceCandidate {
            name: "Pinch of Spice".into(),
            location: LatLng::new(27.18, 78.04),
            rating: Some(4.3),
            price_level: Some(2),
            address: Some("Fatehabad Road".into()),
        };

        let place = NearbyPlace::from_candidate(TAJ_MAHAL, PlaceCategory::Restaurant, candidate);
        assert_eq!(place.marker_color, "red");
        assert_eq!(place.distance_km, round_2(place.distance_km));
        assert!(place.route_url.contains("origin=27.1751,78.0421"));
        assert!(place.route_url.ends_with("destination=27.18,78.04&travelmode=transit"));

        let json = serde_json::to_value(&place).unwrap();
        assert_eq!(json["type"], "restaurant");
    }

    #[test]
    fn places_sorted_by_distance() {
        let far = PlaceCandidate {
            name: "Far".into(),
            location: LatLng::new(27.20, 78.06),
            rating: None,
            price_level: None,
            address: None,
        };
        let near = PlaceCandidate {
            name: "Near".into(),
            location: LatLng::new(27.176, 78.043),
            ..far.clone()
        };

        let places = NearbyPlaces::new(
            TAJ_MAHAL,
            vec![
                NearbyPlace::from_candidate(TAJ_MAHAL, PlaceCategory::Atm, far),
                NearbyPlace::from_candidate(TAJ_MAHAL, PlaceCategory::Hotel, near),
            ],
        );

        assert_eq!(places.nearby_places[0].name, "Near");
        assert_eq!(places.nearby_places[0].marker_color, "green");
        assert_eq!(places.nearby_places[1].marker_color, "blue");
    }
}
