use async_trait::async_trait;
use histoury_lib::{
    language::Language,
    places::{LatLng, PlaceCandidate, PlaceCategory},
    recognition::RecognizedLandmark,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod classifier;
pub mod openai;
pub mod places;
pub mod speech;
pub mod vision;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Upstream(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Identifies the landmark shown in an image.
#[async_trait]
pub trait LandmarkDetector: Send + Sync {
    fn source(&self) -> &'static str;

    /// `Ok(None)` means the image was understood but nothing was recognized.
    async fn detect(&self, image: &[u8]) -> Result<Option<RecognizedLandmark>, ServiceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String, ServiceError>;
}

/// Text to speech, producing MP3 bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ServiceError>;
}

#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn nearby(&self, origin: LatLng, radius_m: u32, category: PlaceCategory) -> Result<Vec<PlaceCandidate>, ServiceError>;
}
