use std::time::Duration;

use anyhow::{anyhow, Context};
use histoury_data_management::DataManager;

use crate::{
    auth::{google::{GoogleIdentityProvider, IdentityProvider}, oauth_state::PendingLogins, token::AuthTokens},
    config::Config,
    guide::ChatLog,
    services::{
        classifier::ClassifierDetector, openai::OpenAiChat, places::GooglePlaces, speech::GoogleTranslateSpeech,
        vision::GoogleVisionDetector, ChatModel, LandmarkDetector, PlacesProvider, SpeechSynthesizer,
    },
};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ServerState {
    pub config: Config,
    pub data_manager: DataManager,
    pub tokens: AuthTokens,
    pub pending_logins: PendingLogins,
    pub identity: Box<dyn IdentityProvider>,
    /// Tried in order until one recognizes the image.
    pub detectors: Vec<Box<dyn LandmarkDetector>>,
    pub chat: Box<dyn ChatModel>,
    pub speech: Box<dyn SpeechSynthesizer>,
    pub places: Box<dyn PlacesProvider>,
    pub chat_log: ChatLog,
}

impl ServerState {
    /// Wires up the Google, OpenAI and classifier clients from `config`.
    pub fn new(config: Config, data_manager: DataManager) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        let tokens = AuthTokens::new(&config.secret_key).map_err(|err| anyhow!("Unusable SECRET_KEY: {err}"))?;

        let mut detectors: Vec<Box<dyn LandmarkDetector>> = Vec::new();
        match &config.google_vision_api_key {
            Some(key) => detectors.push(Box::new(GoogleVisionDetector::new(http.clone(), key.clone()))),
            None => tracing::warn!("GOOGLE_VISION_API_KEY not set, Vision landmark detection disabled"),
        }
        if let Some(url) = &config.landmark_model_url {
            detectors.push(Box::new(ClassifierDetector::new(http.clone(), url.clone())));
        }
        if detectors.is_empty() {
            tracing::warn!("No landmark detectors configured, every scan will come back unrecognized");
        }

        Ok(Self {
            identity: Box::new(GoogleIdentityProvider::new(
                http.clone(),
                config.google_client_id.clone(),
                config.google_client_secret.clone(),
                config.google_discovery_url.clone(),
            )),
            chat: Box::new(OpenAiChat::new(http.clone(), config.openai_api_key.clone(), config.openai_model.clone())),
            speech: Box::new(GoogleTranslateSpeech::new(http.clone())),
            places: Box::new(GooglePlaces::new(http, config.google_places_api_key.clone())),
            detectors,
            tokens,
            pending_logins: PendingLogins::default(),
            chat_log: ChatLog::default(),
            data_manager,
            config,
        })
    }
}
