use crate::assistant::messages::Language;
use crate::config::GROQ_CHAT_TEMPERATURE;
use crate::llm::{openai_compat, LlmError, LlmProvider, Message};
use async_openai::types::audio::{AudioInput, CreateTranscriptionRequestArgs};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;

/// LLM provider implementation for Groq (OpenAI-compatible API).
///
/// Groq hosts Whisper, which is the primary transcription path for
/// voice notes.
pub struct GroqProvider {
    client: Client<OpenAIConfig>,
}

impl GroqProvider {
    /// Create a new Groq provider instance
    #[must_use]
    pub fn new(api_key: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base("https://api.groq.com/openai/v1");
        Self {
            client: Client::with_config(config),
        }
    }
}

/// Map a MIME type to the filename extension the multipart upload needs
fn filename_for_mime(mime_type: &str) -> String {
    let ext = match mime_type {
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mp4" | "audio/m4a" => "m4a",
        _ => "ogg", // WhatsApp voice notes default to ogg/opus
    };
    format!("voice-note.{ext}")
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn chat_completion(
        &self,
        system_prompt: &str,
        history: &[Message],
        user_message: &str,
        model_id: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        openai_compat::chat_completion(
            &self.client,
            system_prompt,
            history,
            user_message,
            model_id,
            max_tokens,
            GROQ_CHAT_TEMPERATURE,
        )
        .await
    }

    async fn transcribe_audio(
        &self,
        audio_bytes: Vec<u8>,
        mime_type: &str,
        model_id: &str,
    ) -> Result<String, LlmError> {
        let input = AudioInput::from_vec_u8(filename_for_mime(mime_type), audio_bytes);

        let request = CreateTranscriptionRequestArgs::default()
            .file(input)
            .model(model_id)
            .build()
            .map_err(|e| LlmError::Unknown(e.to_string()))?;

        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        Ok(response.text)
    }

    async fn translate(
        &self,
        _text: &str,
        _target: Language,
        _model_id: &str,
    ) -> Result<String, LlmError> {
        Err(LlmError::Unknown("Not implemented for Groq".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_for_mime() {
        assert_eq!(filename_for_mime("audio/ogg"), "voice-note.ogg");
        assert_eq!(filename_for_mime("audio/mpeg"), "voice-note.mp3");
        assert_eq!(filename_for_mime("application/pdf"), "voice-note.ogg");
    }
}
