use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatModel, ServiceError};

const COMPLETIONS_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const TEMPERATURE: f32 = 0.7;

pub struct OpenAiChat {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self { http, api_key, model }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String, ServiceError> {
        if self.api_key.is_empty() {
            return Err(ServiceError::NotConfigured("OpenAI"));
        }

        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: TEMPERATURE,
        };

        let response = self.http
            .post(COMPLETIONS_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Upstream(format!("OpenAI returned {status}: {text}")));
        }

        first_choice(response.json().await?)
    }
}

fn first_choice(response: CompletionResponse) -> Result<String, ServiceError> {
    response.choices.into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or(ServiceError::Upstream("OpenAI returned no choices".to_string()))
}
