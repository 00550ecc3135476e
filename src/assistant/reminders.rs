//! Reminder parsing: absolute and relative times, Hindi and English.
//!
//! Times resolve against IST. A time that has already passed today rolls to
//! tomorrow. Voice-note transcripts are split into candidate sentences and
//! each is parsed independently.

#![allow(clippy::non_std_lazy_statics)]

use crate::assistant::messages::Language;
use chrono::{DateTime, Duration, FixedOffset, Timelike};
use lazy_regex::lazy_regex;

/// Match "7 am" / "11 PM"
static RE_TIME_EN: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)(\d{1,2})\s*(am|pm)");
/// Match "7 बजे"
static RE_TIME_HI: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(\d{1,2})\s*बजे");
/// Match "in 30 min(utes)" / "in 2 hour(s)"; the unit word is consumed
/// whole so task extraction does not keep its tail
static RE_RELATIVE_MIN: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)in (\d+) min(?:ute)?s?");
static RE_RELATIVE_HOUR: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(?i)in (\d+) hours?");
/// Hindi relative forms: "30 मिनट में" / "2 घंटे में"
static RE_RELATIVE_MIN_HI: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(\d+) मिनट");
static RE_RELATIVE_HOUR_HI: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(\d+) घंटे");

/// Time markers that flag a sentence as a reminder candidate
static RE_MARKER_EN: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(?i)\d+\s*(am|pm)|\d+:\d+|morning|evening|afternoon|night");
static RE_MARKER_HI: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"\d+\s*बजे|\d+:\d+|सुबह|शाम|दोपहर|रात");

const TOMORROW_WORDS: [&str; 3] = ["tomorrow", "कल", "kal"];
const MEDICINE_WORDS: [&str; 2] = ["medicine", "दवा"];

/// Words stripped from the text when recovering the task description
const STOP_WORDS_EN: [&str; 10] = [
    "remind", "reminder", "me", "to", "at", "am", "pm", "tomorrow", "in", "alarm",
];
const STOP_WORDS_HI: [&str; 7] = ["याद", "दिलाना", "दिलाओ", "रिमाइंडर", "बजे", "कल", "में"];

/// A reminder recovered from message text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReminder {
    pub task: String,
    pub due: DateTime<FixedOffset>,
    /// Medicine reminders additionally place a voice call
    pub call_worthy: bool,
}

/// Parse a reminder request.
///
/// Tries relative forms first ("in 30 minutes"), then absolute wall-clock
/// times. Returns `None` when no time can be recovered; the caller answers
/// with a usage example in that case.
#[must_use]
pub fn parse_reminder(
    text: &str,
    lang: Language,
    now: DateTime<FixedOffset>,
) -> Option<ParsedReminder> {
    let lowered = text.to_lowercase();

    if let Some((due, matched)) = parse_relative(&lowered, lang, now) {
        let task = extract_task(&lowered, &matched, lang);
        return Some(build(task, due, &lowered));
    }

    let (due, matched) = parse_absolute(&lowered, lang, now)?;
    let task = extract_task(&lowered, &matched, lang);
    Some(build(task, due, &lowered))
}

fn build(task: String, due: DateTime<FixedOffset>, lowered: &str) -> ParsedReminder {
    ParsedReminder {
        call_worthy: MEDICINE_WORDS.iter().any(|w| lowered.contains(w)),
        task,
        due,
    }
}

/// "in N minutes" / "in N hours" offsets from now
fn parse_relative(
    text: &str,
    lang: Language,
    now: DateTime<FixedOffset>,
) -> Option<(DateTime<FixedOffset>, String)> {
    let (minute_re, hour_re): (&regex::Regex, &regex::Regex) = match lang {
        Language::En => (&RE_RELATIVE_MIN, &RE_RELATIVE_HOUR),
        Language::Hi => (&RE_RELATIVE_MIN_HI, &RE_RELATIVE_HOUR_HI),
    };

    if let Some(caps) = minute_re.captures(text) {
        let minutes: i64 = caps.get(1)?.as_str().parse().ok()?;
        return Some((now + Duration::minutes(minutes), caps[0].to_string()));
    }
    if let Some(caps) = hour_re.captures(text) {
        let hours: i64 = caps.get(1)?.as_str().parse().ok()?;
        return Some((now + Duration::hours(hours), caps[0].to_string()));
    }
    None
}

/// Absolute wall-clock time, optionally pushed to tomorrow
fn parse_absolute(
    text: &str,
    lang: Language,
    now: DateTime<FixedOffset>,
) -> Option<(DateTime<FixedOffset>, String)> {
    let (hour, matched) = match lang {
        Language::En => {
            let caps = RE_TIME_EN.captures(text)?;
            let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
            if hour > 12 {
                return None;
            }
            let period = caps.get(2)?.as_str().to_lowercase();
            if period == "pm" && hour != 12 {
                hour += 12;
            } else if period == "am" && hour == 12 {
                hour = 0;
            }
            (hour, caps[0].to_string())
        }
        Language::Hi => {
            let caps = RE_TIME_HI.captures(text)?;
            let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
            if hour > 12 {
                return None;
            }
            // Day-period qualifiers disambiguate the 12-hour clock
            if (text.contains("शाम") || text.contains("रात")) && hour < 12 {
                hour += 12;
            } else if text.contains("दोपहर") && hour <= 4 {
                hour += 12;
            }
            (hour % 24, caps[0].to_string())
        }
    };

    let mut due = now
        .with_hour(hour)?
        .with_minute(0)?
        .with_second(0)?
        .with_nanosecond(0)?;

    if TOMORROW_WORDS.iter().any(|w| text.contains(w)) {
        due += Duration::days(1);
    } else if due <= now {
        // Time already passed today: assume tomorrow
        due += Duration::days(1);
    }

    Some((due, matched))
}

/// Recover the task description: drop the matched time text and stop words
fn extract_task(text: &str, time_match: &str, lang: Language) -> String {
    let without_time = text.replace(time_match, " ");
    let stop_words: &[&str] = match lang {
        Language::En => &STOP_WORDS_EN,
        Language::Hi => &STOP_WORDS_HI,
    };

    let task = without_time
        .split_whitespace()
        .filter(|word| {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            !stop_words.contains(&bare) && !bare.chars().all(|c| c.is_ascii_digit())
        })
        .collect::<Vec<_>>()
        .join(" ");

    if task.is_empty() {
        "Reminder".to_string()
    } else {
        crate::utils::title_case(&task)
    }
}

/// Split a voice-note transcript into reminder candidates and parse each.
///
/// Sentences are split on `।`, `.`, `,` and `;`. A sentence qualifies when
/// it carries a time marker or a task keyword.
#[must_use]
pub fn extract_tasks(
    text: &str,
    lang: Language,
    now: DateTime<FixedOffset>,
) -> Vec<ParsedReminder> {
    let task_keywords: &[&str] = match lang {
        Language::Hi => &["फिर", "और", "उसके बाद", "भी", "रिमाइंड", "याद"],
        Language::En => &["then", "and", "also", "after that", "remind", "remember"],
    };
    let marker: &regex::Regex = match lang {
        Language::Hi => &RE_MARKER_HI,
        Language::En => &RE_MARKER_EN,
    };

    text.split(['।', '.', ',', ';'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            marker.is_match(&lowered) || task_keywords.iter().any(|k| lowered.contains(k))
        })
        .filter_map(|sentence| parse_reminder(sentence, lang, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ist;
    use chrono::{Datelike, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        ist()
            .with_ymd_and_hms(2025, 3, 10, hour, minute, 0)
            .single()
            .expect("valid test time")
    }

    #[test]
    fn test_parse_pm_time() {
        let parsed = parse_reminder("Remind me to call mom at 5 PM", Language::En, at(10, 0))
            .expect("should parse");
        assert_eq!(parsed.due.hour(), 17);
        assert_eq!(parsed.due.minute(), 0);
        assert_eq!(parsed.task, "Call Mom");
        assert!(!parsed.call_worthy);
    }

    #[test]
    fn test_parse_12_hour_edges() {
        let noon = parse_reminder("remind me at 12 pm", Language::En, at(9, 0))
            .expect("should parse");
        assert_eq!(noon.due.hour(), 12);

        let midnight = parse_reminder("remind me at 12 am", Language::En, at(9, 0))
            .expect("should parse");
        // 12 AM is hour 0, already past at 09:00 -> tomorrow
        assert_eq!(midnight.due.hour(), 0);
        assert_eq!(midnight.due.day(), 11);
    }

    #[test]
    fn test_past_time_rolls_to_tomorrow() {
        let parsed = parse_reminder("Remind me to exercise at 6 AM", Language::En, at(10, 0))
            .expect("should parse");
        assert_eq!(parsed.due.hour(), 6);
        assert_eq!(parsed.due.day(), 11);
    }

    #[test]
    fn test_tomorrow_keyword() {
        let parsed = parse_reminder(
            "Remind me tomorrow at 9 AM to take medicine",
            Language::En,
            at(8, 0),
        )
        .expect("should parse");
        assert_eq!(parsed.due.day(), 11);
        assert_eq!(parsed.due.hour(), 9);
        assert!(parsed.call_worthy);
        assert_eq!(parsed.task, "Take Medicine");
    }

    #[test]
    fn test_relative_minutes() {
        let parsed = parse_reminder(
            "Remind me in 30 minutes to take medicine",
            Language::En,
            at(10, 0),
        )
        .expect("should parse");
        assert_eq!(parsed.due.hour(), 10);
        assert_eq!(parsed.due.minute(), 30);
        assert_eq!(parsed.task, "Take Medicine");
        assert!(parsed.call_worthy);
    }

    #[test]
    fn test_relative_hours() {
        let parsed =
            parse_reminder("remind me in 2 hours", Language::En, at(10, 15)).expect("should parse");
        assert_eq!(parsed.due.hour(), 12);
        assert_eq!(parsed.due.minute(), 15);
        assert_eq!(parsed.task, "Reminder");
    }

    #[test]
    fn test_hindi_morning() {
        let parsed = parse_reminder("कल सुबह 7 बजे याद दिलाना", Language::Hi, at(12, 0))
            .expect("should parse");
        assert_eq!(parsed.due.hour(), 7);
        assert_eq!(parsed.due.day(), 11);
    }

    #[test]
    fn test_hindi_evening_qualifier() {
        let parsed =
            parse_reminder("शाम 6 बजे याद दिलाना", Language::Hi, at(10, 0)).expect("should parse");
        assert_eq!(parsed.due.hour(), 18);
        assert_eq!(parsed.due.day(), 10);
    }

    #[test]
    fn test_no_time_returns_none() {
        assert_eq!(
            parse_reminder("remind me to call mom", Language::En, at(10, 0)),
            None
        );
    }

    #[test]
    fn test_extract_tasks_from_transcript() {
        let transcript =
            "Remind me at 5 pm to call the plumber. Also remind me at 7 pm to water the plants";
        let tasks = extract_tasks(transcript, Language::En, at(10, 0));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].due.hour(), 17);
        assert_eq!(tasks[1].due.hour(), 19);
        assert!(tasks[0].task.contains("Plumber"));
    }

    #[test]
    fn test_extract_tasks_skips_smalltalk() {
        let transcript = "Hello how are you. The weather is nice";
        let tasks = extract_tasks(transcript, Language::En, at(10, 0));
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_extract_tasks_hindi_transcript() {
        let transcript = "5 बजे दवा याद दिलाना। फिर शाम 7 बजे पापा को फोन";
        let tasks = extract_tasks(transcript, Language::Hi, at(10, 0));
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].call_worthy);
        assert_eq!(tasks[1].due.hour(), 19);
    }
}
