use async_trait::async_trait;
use histoury_lib::recognition::{resolve_label, RecognizedLandmark};
use serde::Deserialize;

use super::{LandmarkDetector, ServiceError};

/// Self-hosted landmark classifier. Receives the raw image and answers with a class label.
pub struct ClassifierDetector {
    http: reqwest::Client,
    url: String,
}

impl ClassifierDetector {
    pub fn new(http: reqwest::Client, url: String) -> Self {
        Self { http, url }
    }
}

#[derive(Deserialize)]
struct Prediction {
    label: String,
}

#[async_trait]
impl LandmarkDetector for ClassifierDetector {
    fn source(&self) -> &'static str {
        "model"
    }

    async fn detect(&self, image: &[u8]) -> Result<Option<RecognizedLandmark>, ServiceError> {
        let response = self.http
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Upstream(format!("Landmark classifier returned {status}")));
        }

        let prediction: Prediction = response.json().await?;
        let landmark = resolve_label(&prediction.label);
        if landmark.is_none() {
            tracing::warn!("Classifier produced unknown label {:?}", prediction.label);
        }

        Ok(landmark)
    }
}
