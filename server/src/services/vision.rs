use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use histoury_lib::{places::LatLng, recognition::RecognizedLandmark};
use serde::Deserialize;
use serde_json::json;

use super::{LandmarkDetector, ServiceError};

const ANNOTATE_ENDPOINT: &str = "https://vision.googleapis.com/v1/images:annotate";

/// Google Cloud Vision landmark detection.
pub struct GoogleVisionDetector {
    http: reqwest::Client,
    api_key: String,
}

impl GoogleVisionDetector {
    pub fn new(http: reqwest::Client, api_key: String) -> Self {
        Self { http, api_key }
    }
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    landmark_annotations: Vec<LandmarkAnnotation>,
    error: Option<Status>,
}

#[derive(Deserialize)]
struct LandmarkAnnotation {
    description: String,
    #[serde(default)]
    locations: Vec<LocationInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocationInfo {
    lat_lng: VisionLatLng,
}

#[derive(Deserialize)]
struct VisionLatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct Status {
    message: String,
}

#[async_trait]
impl LandmarkDetector for GoogleVisionDetector {
    fn source(&self) -> &'static str {
        "vision"
    }

    async fn detect(&self, image: &[u8]) -> Result<Option<RecognizedLandmark>, ServiceError> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "LANDMARK_DETECTION", "maxResults": 1 }],
            }]
        });

        let response = self.http
            .post(ANNOTATE_ENDPOINT)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!("Vision API returned {status}: {text}")));
        }

        parse_annotation(response.json().await?)
    }
}

/// First annotated landmark that carries a position.
fn parse_annotation(response: AnnotateResponse) -> Result<Option<RecognizedLandmark>, ServiceError> {
    let Some(image) = response.responses.into_iter().next() else {
        return Ok(None);
    };

    if let Some(error) = image.error {
        return Err(ServiceError::Upstream(format!("Vision API error: {}", error.message)));
    }

    Ok(image.landmark_annotations.into_iter().find_map(|annotation| {
        let location = annotation.locations.first()?;
        Some(RecognizedLandmark {
            name: annotation.description,
            location: LatLng::new(location.lat_lng.latitude, location.lat_lng.longitude),
        })
    }))
}
