//! Utility functions for text processing and message formatting.
//!
//! This module uses the `lazy-regex` crate for efficient and safe regular expression handling.
//! Patterns are validated at compile time and initialized lazily on first use.

#![allow(clippy::non_std_lazy_statics)]

use anyhow::Result;
use lazy_regex::lazy_regex;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Match bold text: **text**
static RE_BOLD: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\*\*(.*?)\*\*");

/// Match markdown headings at start of line
static RE_HEADING: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?m)^#{1,6}\s+(.*)$");

/// Match bullet points at start of line: -
static RE_DASH_BULLET: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?m)^- ");

/// Match 3+ consecutive newlines
static RE_MULTI_NEWLINE: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"\n{3,}");

/// Formats markdown-like text into WhatsApp-compatible styling.
///
/// WhatsApp renders `*bold*`, `_italic_` and `` ```mono``` `` natively, so the
/// conversion only has to collapse markdown-isms LLMs tend to emit:
/// - Bold: `**text**` -> `*text*`
/// - Headings: `## Title` -> `*Title*`
/// - Bullets: `- ` at the start of a line -> `• `
/// - Multiple newlines (3+) are collapsed into two.
///
/// # Examples
///
/// ```
/// use dost_bot::utils::format_whatsapp;
/// let input = "## Plan\n**Bold** text\n- item";
/// assert_eq!(format_whatsapp(input), "*Plan*\n*Bold* text\n• item");
/// ```
#[must_use]
pub fn format_whatsapp(text: &str) -> String {
    let mut text_owned = RE_BOLD.replace_all(text, "*$1*").to_string();
    text_owned = RE_HEADING.replace_all(&text_owned, "*$1*").to_string();
    text_owned = RE_DASH_BULLET.replace_all(&text_owned, "• ").to_string();
    text_owned = RE_MULTI_NEWLINE
        .replace_all(&text_owned, "\n\n")
        .to_string();
    text_owned.trim().to_string()
}

/// Splits a long message into multiple parts that fit within WhatsApp's body limit.
///
/// Code fences (triple backticks) are closed and reopened across part
/// boundaries so monospace blocks stay intact.
///
/// **Edge case handling:**
/// - If a single line exceeds `max_length`, it is split by grapheme clusters
///   (Unicode-safe), which matters for Devanagari and emoji content.
///
/// # Examples
///
/// ```
/// use dost_bot::utils::split_long_message;
/// let long_msg = "A very long message...\n".repeat(300);
/// let parts = split_long_message(&long_msg, 1550);
/// assert!(parts.len() > 1);
/// ```
#[must_use]
pub fn split_long_message(message: &str, max_length: usize) -> Vec<String> {
    if message.is_empty() {
        return Vec::new();
    }

    if message.len() <= max_length {
        return vec![message.to_string()];
    }

    let mut parts = Vec::new();
    let mut current_message = String::new();
    let mut code_block = false;
    let code_fence = "```";

    for line in message.lines() {
        // Handle very long lines without newlines (edge case)
        if line.len() > max_length {
            if !current_message.is_empty() {
                if code_block {
                    current_message.push_str(code_fence);
                    current_message.push('\n');
                }
                parts.push(current_message.trim_end().to_string());
                current_message.clear();
                if code_block {
                    current_message.push_str(code_fence);
                    current_message.push('\n');
                }
            }

            let graphemes: Vec<&str> = line.graphemes(true).collect();
            let mut chunk = String::new();
            for grapheme in graphemes {
                if chunk.len() + grapheme.len() > max_length {
                    parts.push(chunk.trim_end().to_string());
                    chunk.clear();
                }
                chunk.push_str(grapheme);
            }
            if !chunk.is_empty() {
                current_message.push_str(&chunk);
                current_message.push('\n');
            }
            continue;
        }

        if line.starts_with(code_fence) {
            code_block = !code_block;
        }

        let new_length = current_message.len() + line.len() + 1; // +1 for newline

        if new_length > max_length && !current_message.is_empty() {
            if code_block {
                current_message.push_str(code_fence);
                current_message.push('\n');
            }

            parts.push(current_message.trim_end().to_string());
            current_message.clear();

            if code_block {
                current_message.push_str(code_fence);
                current_message.push('\n');
                if !line.starts_with(code_fence) {
                    current_message.push_str(line);
                    current_message.push('\n');
                }
            } else {
                current_message.push_str(line);
                current_message.push('\n');
            }
        } else {
            current_message.push_str(line);
            current_message.push('\n');
        }
    }

    if !current_message.is_empty() {
        if code_block {
            current_message.push_str(code_fence);
            current_message.push('\n');
        }
        parts.push(current_message.trim_end().to_string());
    }

    parts
}

/// Safely truncates a string to a maximum character length (not bytes).
///
/// This is UTF-8 safe and will not panic on multi-byte characters.
///
/// # Examples
///
/// ```
/// use dost_bot::utils::truncate_str;
/// let s = "नमस्ते दुनिया";
/// assert_eq!(truncate_str(s, 6), "नमस्ते");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Title-case a task description: first letter of each word uppercased.
///
/// ASCII-only uppercasing; Devanagari has no case so Hindi tasks pass through.
#[must_use]
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Retry a Twilio API operation with exponential backoff.
///
/// Designed for outbound message/call operations that may fail due to
/// transient network errors. The strategy uses exponential backoff with
/// jitter to avoid thundering herd:
/// - Initial delay: 500ms
/// - Max delay: 4s
/// - Max attempts: 3 (constants in `config.rs`)
///
/// # Errors
///
/// Returns the last error if all attempts fail.
///
/// # Examples
///
/// ```no_run
/// use dost_bot::utils::retry_twilio_operation;
/// use anyhow::Result;
///
/// async fn send() -> Result<()> { Ok(()) }
///
/// # async fn example() -> Result<()> {
/// retry_twilio_operation(|| async { send().await }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn retry_twilio_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TWILIO_API_INITIAL_BACKOFF_MS, TWILIO_API_MAX_BACKOFF_MS, TWILIO_API_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TWILIO_API_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TWILIO_API_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TWILIO_API_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Twilio API operation failed after {} attempts: {}",
            TWILIO_API_MAX_RETRIES, e
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str_unicode() {
        let s = "नमस्ते दुनिया";
        assert_eq!(truncate_str(s, 6), "नमस्ते");
        assert_eq!(truncate_str(s, 50), "नमस्ते दुनिया");
    }

    #[test]
    fn test_format_whatsapp_bold_and_headings() {
        let input = "# Today\n**Important** meeting";
        assert_eq!(format_whatsapp(input), "*Today*\n*Important* meeting");
    }

    #[test]
    fn test_format_whatsapp_bullets_and_newlines() {
        let input = "- one\n- two\n\n\n\nend";
        assert_eq!(format_whatsapp(input), "• one\n• two\n\nend");
    }

    #[test]
    fn test_format_whatsapp_preserves_native_styling() {
        // Single asterisks are already valid WhatsApp bold
        let input = "*Reminder* from Assistant";
        assert_eq!(format_whatsapp(input), "*Reminder* from Assistant");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("call mom tomorrow"), "Call Mom Tomorrow");
        assert_eq!(title_case("दवा लेना"), "दवा लेना");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_split_long_message_simple() {
        let input = "Line 1\nLine 2\nLine 3";
        // Max length 13. "Line 1\n" is 7. 7+7=14 > 13.
        let parts = split_long_message(input, 13);
        assert_eq!(parts, vec!["Line 1", "Line 2", "Line 3"]);
    }

    #[test]
    fn test_split_long_message_with_code_block() {
        let input = "Start\n```\nLine 1\nLine 2\n```\nEnd";
        let parts = split_long_message(input, 15);

        assert!(parts.len() > 1);
        assert!(parts[0].ends_with("```"));
        assert!(parts[1].starts_with("```"));
    }

    #[test]
    fn test_split_very_long_line() {
        let input = "a".repeat(5000);
        let parts = split_long_message(&input, 1550);

        assert!(parts.len() >= 3);
        for part in &parts {
            assert!(part.len() <= 1550);
        }

        let concatenated: String = parts.join("");
        assert_eq!(concatenated.len(), input.len());
    }

    #[test]
    fn test_split_unicode_graphemes() {
        let input = "🔥".repeat(2000); // Each emoji is ~4 bytes
        let parts = split_long_message(&input, 1550);

        assert!(parts.len() >= 3);
        for part in &parts {
            assert!(part.len() <= 1550);
            assert!(part.chars().all(|c| c != '\u{FFFD}'));
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failure() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let attempts = AtomicUsize::new(0);

        let result = retry_twilio_operation(|| async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(anyhow::anyhow!("transient"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
