//! LLM providers and client.
//!
//! Gemini handles chat, translation and fallback transcription over its REST
//! API; Groq provides Whisper transcription and chat through the
//! OpenAI-compatible client. Transcription runs a primary/fallback ladder so
//! a voice note survives one provider having a bad day.

pub mod common;
pub mod http_utils;
pub mod openai_compat;
pub mod providers;

use crate::assistant::messages::Language;
use crate::config::{CHAT_MODEL, TRANSCRIBE_MODELS_FALLBACK, TRANSCRIBE_MODEL_PRIMARY};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Missing client/API key: {0}")]
    MissingConfig(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl LlmError {
    /// Whether retrying against a fallback model is worth it
    #[must_use]
    pub fn is_transient(&self) -> bool {
        let text = self.to_string().to_lowercase();
        text.contains("503")
            || text.contains("429")
            || text.contains("500")
            || text.contains("overloaded")
            || text.contains("unavailable")
            || text.contains("timeout")
            || matches!(self, Self::Network(_))
    }
}

/// One turn of chat context
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat_completion(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
        model_id: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError>;

    async fn transcribe_audio(
        &self,
        audio_bytes: Vec<u8>,
        mime_type: &str,
        model_id: &str,
    ) -> Result<String, LlmError>;

    async fn translate(
        &self,
        text: &str,
        target: Language,
        model_id: &str,
    ) -> Result<String, LlmError>;
}

pub struct LlmClient {
    gemini: Option<providers::GeminiProvider>,
    groq: Option<providers::GroqProvider>,
}

impl LlmClient {
    #[must_use]
    pub fn new(settings: &crate::config::Settings) -> Self {
        Self {
            gemini: settings
                .gemini_api_key
                .as_ref()
                .map(|k| providers::GeminiProvider::new(k.clone())),
            groq: settings
                .groq_api_key
                .as_ref()
                .map(|k| providers::GroqProvider::new(k.clone())),
        }
    }

    fn gemini(&self) -> Result<&providers::GeminiProvider, LlmError> {
        self.gemini
            .as_ref()
            .ok_or_else(|| LlmError::MissingConfig("gemini".to_string()))
    }

    /// Conversational reply in the assistant persona.
    ///
    /// # Errors
    ///
    /// Returns an error when Gemini is unconfigured or the request fails.
    pub async fn chat_reply(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
    ) -> Result<String, LlmError> {
        self.gemini()?
            .chat_completion(
                system_prompt,
                history,
                user_message,
                CHAT_MODEL.id,
                CHAT_MODEL.max_tokens,
            )
            .await
    }

    /// Translate text into the target language.
    ///
    /// # Errors
    ///
    /// Returns an error when Gemini is unconfigured or the request fails.
    pub async fn translate(&self, text: &str, target: Language) -> Result<String, LlmError> {
        self.gemini()?.translate(text, target, CHAT_MODEL.id).await
    }

    /// Transcribe a voice note: Groq Whisper first, Gemini models as fallback.
    ///
    /// The primary gets 3 attempts with a 2s pause; each fallback model gets
    /// up to 5 attempts with a 3s pause, bailing early on non-transient
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns the last error when every rung of the ladder fails.
    pub async fn transcribe_voice_note(
        &self,
        audio_bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, LlmError> {
        if let Some(groq) = self.groq.as_ref() {
            for attempt in 1..=3 {
                match groq
                    .transcribe_audio(audio_bytes.clone(), mime_type, TRANSCRIBE_MODEL_PRIMARY)
                    .await
                {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        warn!(
                            "Groq transcription error ({}, attempt {}/3): {}",
                            TRANSCRIBE_MODEL_PRIMARY, attempt, e
                        );
                        if attempt < 3 {
                            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                        }
                    }
                }
            }
            info!(
                "All attempts with {} failed, switching to Gemini fallback",
                TRANSCRIBE_MODEL_PRIMARY
            );
        }

        let gemini = self.gemini()?;
        let mut last_error = LlmError::Api("No transcription model available".to_string());

        for model_id in TRANSCRIBE_MODELS_FALLBACK {
            for attempt in 1..=5 {
                match gemini
                    .transcribe_audio(audio_bytes.clone(), mime_type, model_id)
                    .await
                {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        warn!(
                            "Gemini transcription error ({}, attempt {}/5): {}",
                            model_id, attempt, e
                        );
                        let transient = e.is_transient();
                        last_error = e;
                        if !transient {
                            // Permanent failure on this model; try the next one
                            break;
                        }
                        if attempt < 5 {
                            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                        }
                    }
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_detection() {
        assert!(LlmError::Api("API error: 503 - overloaded".into()).is_transient());
        assert!(LlmError::Api("429 too many requests".into()).is_transient());
        assert!(LlmError::Network("connection reset".into()).is_transient());
        assert!(!LlmError::Api("API error: 401 - bad key".into()).is_transient());
        assert!(!LlmError::MissingConfig("gemini".into()).is_transient());
    }
}
