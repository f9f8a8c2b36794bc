use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use histoury_data_management::media::media_store::sanitize_file_name;
use histoury_lib::language::Language;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    guide::{self, Exchange, ANSWER_MAX_TOKENS, SUMMARY_MAX_TOKENS},
    server_state::ServerState,
};

use super::FormFields;

#[derive(Deserialize)]
pub struct AudioQuery {
    path: String,
}

#[derive(Deserialize)]
pub struct AskRequest {
    prompt: String,
    #[serde(default)]
    language: Language,
}

pub async fn generate_summary(State(state): State<Arc<ServerState>>, fields: FormFields) -> Result<Json<Value>, AppError> {
    let landmark = fields.get("landmark")
        .ok_or(AppError::BadRequest("Missing required fields: landmark".to_string()))?
        .trim()
        .to_string();
    let language: Language = fields.get("language").unwrap_or("en").parse()?;

    let summary = state.chat.complete(&guide::summary_messages(&landmark, language), SUMMARY_MAX_TOKENS).await?;
    let audio_file = speak(&state, &summary, language, guide::summary_audio_name(&landmark, language)).await;

    Ok(Json(json!({ "summary": summary, "audio_file": audio_file })))
}

/// Only the file name of `path` is used, so nothing outside the audio directory can be served.
pub async fn download_audio(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(query), _): WithRejection<Query<AudioQuery>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let file_name = sanitize_file_name(&query.path)
        .ok_or_else(|| AppError::NotFound(format!("No such file: {}", query.path)))?;

    let bytes = state.data_manager.read_audio(&file_name).await?;
    Ok(([(CONTENT_TYPE, "audio/mpeg")], bytes))
}

pub async fn ask(
    State(state): State<Arc<ServerState>>,
    WithRejection(Json(request), _): WithRejection<Json<AskRequest>, AppError>,
) -> Json<Value> {
    let previous = state.chat_log.latest().await;
    let messages = guide::question_messages(&request.prompt, request.language, previous.as_ref());

    let text = match state.chat.complete(&messages, ANSWER_MAX_TOKENS).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!("Guide could not answer: {err}");
            return Json(json!({ "text": format!("Error: {err}"), "audio_url": null }));
        }
    };

    let audio_url = speak(&state, &text, request.language, guide::answer_audio_name(request.language)).await
        .map(|file_name| guide::audio_url(&file_name));

    state.chat_log.push(Exchange {
        prompt: request.prompt,
        response: text.clone(),
        language: request.language,
    }).await;

    Json(json!({ "text": text, "audio_url": audio_url }))
}

pub async fn history(State(state): State<Arc<ServerState>>) -> Json<Vec<Exchange>> {
    Json(state.chat_log.history().await)
}

/// Stores the spoken `text` and returns its file name. Speech is optional, so failures only log.
async fn speak(state: &ServerState, text: &str, language: Language, file_name: String) -> Option<String> {
    let audio = match state.speech.synthesize(text, language).await {
        Ok(audio) => audio,
        Err(err) => {
            tracing::warn!("Speech synthesis failed for {file_name}: {err}");
            return None;
        }
    };

    match state.data_manager.store_audio(&file_name, &audio).await {
        Ok(stored) => Some(stored),
        Err(err) => {
            tracing::error!("Failed to store {file_name}: {err:?}");
            None
        }
    }
}
