//! Configuration and settings management
//!
//! Loads settings from environment variables and defines service constants.

use chrono::FixedOffset;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Twilio account SID
    pub twilio_account_sid: String,
    /// Twilio auth token
    pub twilio_auth_token: String,
    /// Twilio WhatsApp sender, `whatsapp:+...` form
    #[serde(default = "default_whatsapp_number")]
    pub twilio_whatsapp_number: String,
    /// Twilio voice caller ID for reminder calls
    pub twilio_voice_number: Option<String>,

    /// Gemini API key
    pub gemini_api_key: Option<String>,
    /// Groq API key
    pub groq_api_key: Option<String>,

    /// Google OAuth client ID for Calendar access
    pub google_client_id: Option<String>,
    /// Google OAuth client secret
    pub google_client_secret: Option<String>,
    /// Google OAuth refresh token (obtained out-of-band)
    pub google_refresh_token: Option<String>,

    /// R2 Storage access key ID
    pub r2_access_key_id: Option<String>,
    /// R2 Storage secret access key
    pub r2_secret_access_key: Option<String>,
    /// R2 Storage endpoint URL
    pub r2_endpoint_url: Option<String>,
    /// R2 Storage bucket name
    pub r2_bucket_name: Option<String>,

    /// Bind address for the webhook server
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port for the webhook server
    #[serde(default = "default_port")]
    pub port: u16,

    /// Assistant persona used for LLM fallback replies
    pub system_message: Option<String>,
}

fn default_whatsapp_number() -> String {
    "whatsapp:+14155238886".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case;
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let mut settings: Self = s.try_deserialize()?;

        // Fallback: check environment variables directly if config didn't pick them up
        for (slot, var) in [
            (&mut settings.r2_endpoint_url, "R2_ENDPOINT_URL"),
            (&mut settings.r2_access_key_id, "R2_ACCESS_KEY_ID"),
            (&mut settings.r2_secret_access_key, "R2_SECRET_ACCESS_KEY"),
            (&mut settings.r2_bucket_name, "R2_BUCKET_NAME"),
        ] {
            if slot.is_none() {
                if let Ok(val) = std::env::var(var) {
                    if !val.is_empty() {
                        *slot = Some(val);
                    }
                }
            }
        }

        Ok(settings)
    }

    /// Whether Google Calendar access is fully configured
    #[must_use]
    pub fn calendar_configured(&self) -> bool {
        self.google_client_id.is_some()
            && self.google_client_secret.is_some()
            && self.google_refresh_token.is_some()
    }
}

/// Read the HTTP timeout for LLM requests (seconds) from the environment
#[must_use]
pub fn get_llm_http_timeout_secs() -> u64 {
    env_u64("LLM_HTTP_TIMEOUT_SECS", 30)
}

/// Read the webhook dedup cache TTL (seconds) from the environment
#[must_use]
pub fn get_dedup_cache_ttl() -> u64 {
    env_u64("WEBHOOK_DEDUP_TTL_SECS", 3600)
}

/// Read the webhook dedup cache capacity from the environment
#[must_use]
pub fn get_dedup_cache_max_size() -> u64 {
    env_u64("WEBHOOK_DEDUP_MAX_SIZE", 10_000)
}

fn env_u64(var: &str, default: u64) -> u64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Indian Standard Time, the assistant's home timezone. Fixed UTC+05:30, no DST.
///
/// # Panics
///
/// Never panics: the offset is a valid constant.
#[must_use]
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is valid")
}

/// WhatsApp message body limit with safety margin (official limit is 1600)
pub const WHATSAPP_MESSAGE_LIMIT: usize = 1550;

/// Chat history turns sent to the LLM
pub const CHAT_HISTORY_LIMIT: usize = 10;

/// Days of inactivity after which proactive check-ins stop
pub const PROACTIVE_ACTIVE_DAYS: i64 = 7;

/// Local-hour windows for proactive check-in slots (start..=end, inclusive)
pub const PROACTIVE_MORNING_WINDOW: (u32, u32) = (7, 10);
/// Afternoon check-in window
pub const PROACTIVE_AFTERNOON_WINDOW: (u32, u32) = (14, 16);
/// Evening check-in window
pub const PROACTIVE_EVENING_WINDOW: (u32, u32) = (18, 20);

/// Daily goal check-in hours (IST)
pub const GOAL_CHECKIN_HOURS: [u32; 3] = [14, 17, 20];

/// Morning briefing hour (IST)
pub const MORNING_BRIEFING_HOUR: u32 = 7;
/// Proactive sweep schedule: (hour, minute, slot name), IST
pub const PROACTIVE_SWEEPS: [(u32, u32, &str); 3] =
    [(8, 30, "morning"), (14, 30, "afternoon"), (18, 30, "evening")];

/// Default calendar event duration in minutes
pub const CALENDAR_DEFAULT_DURATION_MIN: i64 = 60;
/// Calendar popup reminder lead time in minutes
pub const CALENDAR_POPUP_LEAD_MIN: i64 = 10;

/// Snooze offset applied when the user presses 2 on a reminder call
pub const CALL_SNOOZE_MINUTES: i64 = 10;
/// Snooze offset applied when the user replies "snooze" to a reminder
pub const REPLY_SNOOZE_MINUTES: i64 = 30;

/// Twilio API retry configuration
pub const TWILIO_API_MAX_RETRIES: usize = 3;
/// Initial backoff for Twilio API retries
pub const TWILIO_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Backoff ceiling for Twilio API retries
pub const TWILIO_API_MAX_BACKOFF_MS: u64 = 4000;

/// Temperature for Gemini chat completions
pub const GEMINI_CHAT_TEMPERATURE: f32 = 0.7;
/// Temperature for Gemini audio transcription
pub const GEMINI_AUDIO_TRANSCRIBE_TEMPERATURE: f32 = 0.0;
/// Temperature for Gemini translation requests
pub const GEMINI_TRANSLATE_TEMPERATURE: f32 = 0.1;
/// Temperature for Groq chat completions
pub const GROQ_CHAT_TEMPERATURE: f32 = 0.7;

/// Prompt used when transcribing voice notes via Gemini
pub const GEMINI_AUDIO_TRANSCRIBE_PROMPT: &str = "Transcribe this audio verbatim. \
The speaker may mix Hindi and English; keep each word in the language it was spoken. \
Return only the transcription text.";

/// Information about a supported LLM model
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Internal model identifier
    pub id: &'static str,
    /// Maximum allowed output tokens
    pub max_tokens: u32,
    /// Provider name
    pub provider: &'static str,
}

/// Chat model used for fallback conversational replies
pub const CHAT_MODEL: ModelInfo = ModelInfo {
    id: "gemini-2.5-flash-lite",
    max_tokens: 2048,
    provider: "gemini",
};

/// Primary transcription model (Groq-hosted Whisper)
pub const TRANSCRIBE_MODEL_PRIMARY: &str = "whisper-large-v3";
/// Fallback transcription models (Gemini), tried in order
pub const TRANSCRIBE_MODELS_FALLBACK: [&str; 2] = ["gemini-flash-latest", "gemini-2.5-flash"];

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    // Tests run sequentially to avoid environment variable race conditions
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TWILIO_ACCOUNT_SID", "ACdummy");
        env::set_var("TWILIO_AUTH_TOKEN", "dummy_token");
        env::set_var("R2_ENDPOINT_URL", "https://example.com");

        let settings = Settings::new()?;
        assert_eq!(settings.twilio_account_sid, "ACdummy");
        assert_eq!(
            settings.r2_endpoint_url,
            Some("https://example.com".to_string())
        );
        assert_eq!(settings.twilio_whatsapp_number, "whatsapp:+14155238886");
        assert_eq!(settings.port, 8080);

        // Empty env var is treated as unset
        env::set_var("R2_ENDPOINT_URL", "");
        let settings = Settings::new()?;
        assert_eq!(settings.r2_endpoint_url, None);

        env::remove_var("R2_ENDPOINT_URL");
        env::remove_var("TWILIO_ACCOUNT_SID");
        env::remove_var("TWILIO_AUTH_TOKEN");
        Ok(())
    }

    #[test]
    fn test_calendar_configured() {
        let mut settings = Settings {
            twilio_account_sid: "AC".into(),
            twilio_auth_token: "tok".into(),
            twilio_whatsapp_number: default_whatsapp_number(),
            twilio_voice_number: None,
            gemini_api_key: None,
            groq_api_key: None,
            google_client_id: None,
            google_client_secret: None,
            google_refresh_token: None,
            r2_access_key_id: None,
            r2_secret_access_key: None,
            r2_endpoint_url: None,
            r2_bucket_name: None,
            host: default_host(),
            port: default_port(),
            system_message: None,
        };
        assert!(!settings.calendar_configured());

        settings.google_client_id = Some("id".into());
        settings.google_client_secret = Some("secret".into());
        assert!(!settings.calendar_configured());

        settings.google_refresh_token = Some("refresh".into());
        assert!(settings.calendar_configured());
    }

    #[test]
    fn test_ist_offset() {
        assert_eq!(ist().local_minus_utc(), 5 * 3600 + 30 * 60);
    }
}
