//! Twilio webhook form payloads.
//!
//! Twilio posts `application/x-www-form-urlencoded` bodies with PascalCase
//! field names. Only the fields the service reads are modeled; the rest of
//! the form is ignored.

use serde::Deserialize;

/// Inbound WhatsApp message webhook
#[derive(Debug, Deserialize, Default)]
pub struct InboundMessage {
    /// Message text; empty for media-only messages
    #[serde(rename = "Body", default)]
    pub body: String,
    /// Sender in `whatsapp:+<E.164>` form
    #[serde(rename = "From", default)]
    pub from: String,
    /// Unique message id, used for retry deduplication
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,
    /// Number of media attachments
    #[serde(rename = "NumMedia", default)]
    pub num_media: Option<String>,
    /// First media attachment URL (voice notes)
    #[serde(rename = "MediaUrl0", default)]
    pub media_url: Option<String>,
    /// First media attachment content type
    #[serde(rename = "MediaContentType0", default)]
    pub media_content_type: Option<String>,
}

impl InboundMessage {
    /// Whether this message carries a media attachment
    #[must_use]
    pub fn has_media(&self) -> bool {
        self.media_url.is_some()
            && self
                .num_media
                .as_deref()
                .and_then(|n| n.parse::<u32>().ok())
                .unwrap_or(0)
                > 0
    }

    /// Media content type, defaulting to the WhatsApp voice-note codec
    #[must_use]
    pub fn media_mime(&self) -> &str {
        self.media_content_type.as_deref().unwrap_or("audio/ogg")
    }
}

/// Voice-call DTMF webhook (`Gather` action callback)
#[derive(Debug, Deserialize, Default)]
pub struct CallResponse {
    /// Digits the callee pressed
    #[serde(rename = "Digits", default)]
    pub digits: String,
    /// Callee number
    #[serde(rename = "To", default)]
    pub to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_decoding() {
        let form: InboundMessage = serde_urlencoded::from_str(
            "Body=hello&From=whatsapp%3A%2B919876543210&MessageSid=SM123&NumMedia=0",
        )
        .expect("decode form");
        assert_eq!(form.body, "hello");
        assert_eq!(form.from, "whatsapp:+919876543210");
        assert_eq!(form.message_sid, "SM123");
        assert!(!form.has_media());
    }

    #[test]
    fn test_voice_note_form() {
        let form: InboundMessage = serde_urlencoded::from_str(
            "Body=&From=whatsapp%3A%2B919876543210&MessageSid=SM124&NumMedia=1\
            &MediaUrl0=https%3A%2F%2Fapi.twilio.com%2Fmedia%2FME1&MediaContentType0=audio%2Fogg",
        )
        .expect("decode form");
        assert!(form.has_media());
        assert_eq!(form.media_mime(), "audio/ogg");
        assert!(form.body.is_empty());
    }

    #[test]
    fn test_digits_form() {
        let form: CallResponse =
            serde_urlencoded::from_str("Digits=1&To=%2B919876543210").expect("decode form");
        assert_eq!(form.digits, "1");
    }
}
