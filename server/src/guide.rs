use std::collections::VecDeque;

use histoury_lib::language::Language;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::services::ChatMessage;

pub const CHAT_LOG_CAPACITY: usize = 50;
pub const SUMMARY_MAX_TOKENS: u32 = 750;
pub const ANSWER_MAX_TOKENS: u32 = 500;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a travel guide AI.";
const GUIDE_SYSTEM_PROMPT: &str = "You are a helpful multilingual tour guide.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub prompt: String,
    pub response: String,
    pub language: Language,
}

/// Recent guide conversations, shared by all clients. Oldest entries are dropped first.
pub struct ChatLog {
    exchanges: Mutex<VecDeque<Exchange>>,
    capacity: usize,
}

impl ChatLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            exchanges: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub async fn push(&self, exchange: Exchange) {
        let mut exchanges = self.exchanges.lock().await;
        while exchanges.len() >= self.capacity {
            exchanges.pop_front();
        }
        exchanges.push_back(exchange);
    }

    pub async fn latest(&self) -> Option<Exchange> {
        self.exchanges.lock().await.back().cloned()
    }

    /// Oldest first.
    pub async fn history(&self) -> Vec<Exchange> {
        self.exchanges.lock().await.iter().cloned().collect()
    }
}

impl Default for ChatLog {
    fn default() -> Self {
        Self::new(CHAT_LOG_CAPACITY)
    }
}

pub fn summary_messages(landmark: &str, language: Language) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Write a short, informative, and engaging historical summary about the landmark called '{landmark}' in {}. \
             Ensure the full summary fits within 500 words and is complete.",
            language.name()
        )),
    ]
}

pub fn question_messages(prompt: &str, language: Language, previous: Option<&Exchange>) -> Vec<ChatMessage> {
    let mut question = format!("{prompt}\nAnswer this in {}.", language.name());
    if let Some(previous) = previous {
        question.push_str(&format!(
            "\nUse the following for context. Previous prompt: {} Your response to the previous prompt, in {}: {}",
            previous.prompt,
            previous.language.name(),
            previous.response
        ));
    }

    vec![ChatMessage::system(GUIDE_SYSTEM_PROMPT), ChatMessage::user(question)]
}

/// `summary_<landmark-slug>_<lang>.mp3`
pub fn summary_audio_name(landmark: &str, language: Language) -> String {
    format!("summary_{}_{}.mp3", slugify(landmark), language.code())
}

pub fn answer_audio_name(language: Language) -> String {
    format!("{}_{}.mp3", uuid::Uuid::new_v4().simple(), language.code())
}

pub fn audio_url(file_name: &str) -> String {
    format!("/download_audio/?path={file_name}")
}

/// Lowercase ASCII letters and digits, everything else collapsed into single dashes.
fn slugify(text: &str) -> String {
    let slug = text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() { "landmark".to_string() } else { slug }
}
