//! TwiML voice response builder.
//!
//! Produces the `<Response>` documents Twilio executes on reminder calls:
//! spoken text (`Say` with a Polly voice), pauses, and DTMF collection
//! (`Gather`). Text content is XML-escaped.

use crate::assistant::messages::Language;

/// Builder for a TwiML `<Response>` document
#[derive(Debug, Default)]
pub struct VoiceResponse {
    verbs: Vec<String>,
}

impl VoiceResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Speak text with the language's Polly voice
    #[must_use]
    pub fn say(mut self, text: &str, lang: Language) -> Self {
        self.verbs.push(format!(
            r#"<Say voice="{voice}" language="{locale}">{text}</Say>"#,
            voice = lang.polly_voice(),
            locale = lang.locale(),
            text = html_escape::encode_text(text),
        ));
        self
    }

    /// Pause for the given number of seconds
    #[must_use]
    pub fn pause(mut self, seconds: u32) -> Self {
        self.verbs.push(format!(r#"<Pause length="{seconds}"/>"#));
        self
    }

    /// Collect DTMF digits and POST them to `action`
    #[must_use]
    pub fn gather(mut self, num_digits: u32, action: &str) -> Self {
        self.verbs.push(format!(
            r#"<Gather numDigits="{num_digits}" action="{action}" method="POST"/>"#,
            action = html_escape::encode_double_quoted_attribute(action),
        ));
        self
    }

    /// Render the full document
    #[must_use]
    pub fn build(self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
            self.verbs.join("")
        )
    }
}

/// The TwiML spoken on an outbound reminder call: the reminder itself plus
/// a confirm/snooze prompt whose digits post back to `/reminder-response`.
#[must_use]
pub fn reminder_call(script: &str, lang: Language) -> String {
    VoiceResponse::new()
        .say(script, lang)
        .pause(1)
        .say(
            "Press 1 to confirm, or 2 to snooze for 10 minutes",
            lang,
        )
        .gather(1, "/reminder-response")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_say_with_polly_voice() {
        let xml = VoiceResponse::new().say("Hello", Language::En).build();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
        assert!(xml.contains(r#"<Say voice="Polly.Raveena" language="en-IN">Hello</Say>"#));
        assert!(xml.ends_with("</Response>"));
    }

    #[test]
    fn test_hindi_voice() {
        let xml = VoiceResponse::new().say("नमस्ते", Language::Hi).build();
        assert!(xml.contains(r#"voice="Polly.Aditi""#));
        assert!(xml.contains(r#"language="hi-IN""#));
        assert!(xml.contains("नमस्ते"));
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = VoiceResponse::new()
            .say("Meet <boss> & team", Language::En)
            .build();
        assert!(xml.contains("Meet &lt;boss&gt; &amp; team"));
        assert!(!xml.contains("<boss>"));
    }

    #[test]
    fn test_reminder_call_document() {
        let xml = reminder_call("This is your reminder: Take Medicine", Language::En);
        assert!(xml.contains("Take Medicine"));
        assert!(xml.contains(r#"<Pause length="1"/>"#));
        assert!(xml.contains(r#"<Gather numDigits="1" action="/reminder-response" method="POST"/>"#));
    }
}
