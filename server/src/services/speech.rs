use async_trait::async_trait;
use histoury_lib::language::Language;

use super::{ServiceError, SpeechSynthesizer};

const TRANSLATE_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// The endpoint rejects longer requests.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Google Translate's speech endpoint. Long text is spoken chunk by chunk and the MP3 frames concatenated.
pub struct GoogleTranslateSpeech {
    http: reqwest::Client,
}

impl GoogleTranslateSpeech {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateSpeech {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ServiceError> {
        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ServiceError::Upstream("Nothing to synthesize".to_string()));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let response = self.http
                .get(TRANSLATE_TTS_ENDPOINT)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language.code()),
                    ("client", "tw-ob"),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", chunk.chars().count().to_string().as_str()),
                ])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ServiceError::Upstream(format!("Speech endpoint returned {status} for chunk {idx}")));
            }

            audio.extend_from_slice(&response.bytes().await?);
        }

        Ok(audio)
    }
}

const PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '।', '॥'];

/// Packs whitespace separated words into chunks of at most `max_chars` characters.
/// A full chunk is cut after its last punctuation mark when it has one, otherwise
/// at the last word. Words longer than `max_chars` are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current).join(" "));
            }
            let rest = word.split_off(max_chars);
            chunks.push(word.into_iter().collect());
            word = rest;
        }

        if word.is_empty() {
            continue;
        }

        while !current.is_empty() && joined_len(&current) + 1 + word.len() > max_chars {
            let cut = current.iter()
                .rposition(|w| w.ends_with(PUNCTUATION))
                .map_or(current.len(), |i| i + 1);
            let rest = current.split_off(cut);
            chunks.push(current.join(" "));
            current = rest;
        }

        current.push(word.into_iter().collect());
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn joined_len(words: &[String]) -> usize {
    words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("  Namaste,   traveller! ", 100), vec!["Namaste, traveller!"]);
        assert!(split_text("   ", 100).is_empty());
    }

    #[test]
    fn chunks_respect_limit_and_keep_words() {
        let text = "The Sun Temple at Konark was built in the thirteenth century by King Narasimhadeva I of the Eastern Ganga dynasty.";
        let chunks = split_text(text, 40);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 40));
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn long_words_are_cut() {
        let chunks = split_text("ab abcdefgh cd", 4);
        assert_eq!(chunks, vec!["ab", "abcd", "efgh", "cd"]);
    }

    #[test]
    fn chunks_prefer_punctuation_boundaries() {
        let chunks = split_text("Konark is in Odisha. It faces the rising sun", 30);
        assert_eq!(chunks, vec!["Konark is in Odisha.", "It faces the rising sun"]);

        let chunks = split_text("नमस्ते। आप कैसे हैं", 12);
        assert_eq!(chunks, vec!["नमस्ते।", "आप कैसे हैं"]);
    }

    #[test]
    fn counts_characters_not_bytes() {
        // Devanagari is three bytes per char in UTF-8
        let text = "नमस्ते नमस्ते";
        assert_eq!(split_text(text, 13), vec![text]);
    }
}
