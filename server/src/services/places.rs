use async_trait::async_trait;
use futures::future::try_join_all;
use histoury_lib::places::{LatLng, NearbyPlace, NearbyPlaces, PlaceCandidate, PlaceCategory};
use serde::Deserialize;

use super::{PlacesProvider, ServiceError};

const NEARBY_SEARCH_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";

pub struct GooglePlaces {
    http: reqwest::Client,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[derive(Deserialize)]
struct NearbySearchResponse {
    status: String,
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Deserialize)]
struct PlaceResult {
    name: String,
    geometry: Geometry,
    rating: Option<f64>,
    price_level: Option<u8>,
    vicinity: Option<String>,
}

#[derive(Deserialize)]
struct Geometry {
    location: LatLng,
}

#[async_trait]
impl PlacesProvider for GooglePlaces {
    async fn nearby(&self, origin: LatLng, radius_m: u32, category: PlaceCategory) -> Result<Vec<PlaceCandidate>, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::NotConfigured("Google Places"));
        }

        let response: NearbySearchResponse = self.http
            .get(NEARBY_SEARCH_ENDPOINT)
            .query(&[
                ("location", format!("{},{}", origin.lat, origin.lng)),
                ("radius", radius_m.to_string()),
                ("type", category.as_str().to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        into_candidates(response)
    }
}

fn into_candidates(response: NearbySearchResponse) -> Result<Vec<PlaceCandidate>, ServiceError> {
    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response.results.into_iter()
            .map(|place| PlaceCandidate {
                name: place.name,
                location: place.geometry.location,
                rating: place.rating,
                price_level: place.price_level,
                address: place.vicinity,
            })
            .collect()),
        status => Err(ServiceError::Upstream(format!(
            "Places search failed with {status}: {}",
            response.error_message.unwrap_or_default()
        ))),
    }
}

/// Looks up every [`PlaceCategory`] around `origin` concurrently.
pub async fn find_nearby_places(provider: &dyn PlacesProvider, origin: LatLng, radius_m: u32) -> Result<NearbyPlaces, ServiceError> {
    let lookups = PlaceCategory::ALL.into_iter().map(|category| async move {
        provider.nearby(origin, radius_m, category).await.map(|candidates| (category, candidates))
    });

    let places = try_join_all(lookups).await?
        .into_iter()
        .flat_map(|(category, candidates)| {
            candidates.into_iter().map(move |candidate| NearbyPlace::from_candidate(origin, category, candidate))
        })
        .collect();

    Ok(NearbyPlaces::new(origin, places))
}
