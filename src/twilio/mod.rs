//! Twilio REST client: outbound WhatsApp messages, reminder voice calls,
//! and authenticated media downloads.
//!
//! All calls go through the `2010-04-01` API with basic auth. Sends are
//! wrapped in the standard retry/backoff policy; messages longer than the
//! WhatsApp body limit are split before sending.

pub mod twiml;

use crate::config::{Settings, WHATSAPP_MESSAGE_LIMIT};
use crate::utils::{retry_twilio_operation, split_long_message};
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Error, Debug)]
pub enum TwilioError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Media download error: {0}")]
    Media(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Subset of the message resource Twilio returns on create
#[derive(Debug, Deserialize)]
pub struct MessageResource {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Subset of the call resource Twilio returns on create
#[derive(Debug, Deserialize)]
pub struct CallResource {
    pub sid: String,
}

pub struct TwilioClient {
    http_client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    whatsapp_number: String,
    voice_number: Option<String>,
}

impl TwilioClient {
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http_client: crate::llm::http_utils::create_http_client(),
            account_sid: settings.twilio_account_sid.clone(),
            auth_token: settings.twilio_auth_token.clone(),
            whatsapp_number: settings.twilio_whatsapp_number.clone(),
            voice_number: settings.twilio_voice_number.clone(),
        }
    }

    /// Send a WhatsApp message, splitting bodies over the size limit.
    ///
    /// # Errors
    ///
    /// Returns an error when any part fails to send after retries.
    pub async fn send_whatsapp(&self, to: &str, body: &str) -> Result<(), TwilioError> {
        for part in split_long_message(body, WHATSAPP_MESSAGE_LIMIT) {
            self.send_whatsapp_part(to, &part).await?;
        }
        Ok(())
    }

    async fn send_whatsapp_part(&self, to: &str, body: &str) -> Result<(), TwilioError> {
        let url = format!("{API_BASE}/Accounts/{}/Messages.json", self.account_sid);

        let resource: MessageResource = retry_twilio_operation(|| async {
            let response = self
                .http_client
                .post(&url)
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .form(&[
                    ("From", self.whatsapp_number.as_str()),
                    ("To", to),
                    ("Body", body),
                ])
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("Twilio send error: {e}"))?;

            parse_response(response)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))
        })
        .await
        .map_err(|e| TwilioError::Network(e.to_string()))?;

        debug!("WhatsApp message {} sent to {}", resource.sid, to);
        Ok(())
    }

    /// Place a voice call that speaks the given TwiML.
    ///
    /// The `whatsapp:` prefix is stripped from the callee; the call is
    /// skipped with an error when no voice number is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when the voice number is missing or the API call fails.
    pub async fn place_call(&self, to: &str, twiml: &str) -> Result<String, TwilioError> {
        let from = self
            .voice_number
            .as_ref()
            .ok_or_else(|| TwilioError::Config("TWILIO_VOICE_NUMBER is missing".into()))?;

        let url = format!("{API_BASE}/Accounts/{}/Calls.json", self.account_sid);
        let to_number = to.trim_start_matches("whatsapp:");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("From", from.as_str()), ("To", to_number), ("Twiml", twiml)])
            .send()
            .await
            .map_err(|e| TwilioError::Network(e.to_string()))?;

        let resource: CallResource = parse_response(response).await?;
        info!("Reminder call {} placed to {}", resource.sid, to_number);
        Ok(resource.sid)
    }

    /// Download a media attachment (voice note) with API credentials.
    ///
    /// Twilio media URLs redirect to a CDN; reqwest follows redirects by
    /// default.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure or a non-success status.
    pub async fn download_media(&self, media_url: &str) -> Result<Bytes, TwilioError> {
        let response = self
            .http_client
            .get(media_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| TwilioError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(TwilioError::Media(format!(
                "media download returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| TwilioError::Media(e.to_string()))
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TwilioError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(TwilioError::Api {
            status: status.as_u16(),
            body: crate::utils::truncate_str(body, 500),
        });
    }

    response
        .json()
        .await
        .map_err(|e| TwilioError::Api {
            status: status.as_u16(),
            body: format!("invalid response body: {e}"),
        })
}
