//! Intent detection over incoming message text.
//!
//! Keyword matching in the user's language. More specific intents are
//! checked first: "add meeting tomorrow to calendar" must resolve to
//! [`Intent::CalendarAdd`] even though it also contains generic schedule
//! words.

#![allow(clippy::non_std_lazy_statics)]

use crate::assistant::messages::Language;
use lazy_regex::lazy_regex;

/// What the user is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    /// "Your name is Jarvis"
    SetName,
    /// Set a reminder
    Reminder,
    /// "done" / "completed X" / "all done" - reminder or goal completion
    Done,
    /// "snooze" reply to a fired reminder
    Snooze,
    /// "My goals today are ..."
    Goals,
    /// Today's schedule request
    Schedule,
    /// Recipe lookup
    Recipe,
    /// Add an event to Google Calendar
    CalendarAdd,
    /// Enable/ask about morning briefings
    Briefing,
    /// Time-of-day activity suggestions
    Suggest,
    Help,
    Unknown,
}

/// True when `keyword` occurs in `text` on word boundaries.
///
/// Hindi keywords are matched as substrings: Devanagari text is not reliably
/// space-delimited around particles.
fn contains_keyword(text: &str, keyword: &str) -> bool {
    if keyword.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return text.contains(keyword);
    }
    if keyword.contains(' ') {
        return text.contains(keyword);
    }
    text.split(|c: char| !c.is_alphanumeric())
        .any(|word| word == keyword)
}

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_keyword(text, k))
}

/// Detect user intent from a message.
///
/// Checked in precedence order, most specific first.
#[must_use]
pub fn detect(text: &str, lang: Language) -> Intent {
    let text = text.to_lowercase();

    let set_name: &[&str] = match lang {
        Language::Hi => &["तुम्हारा नाम", "आपका नाम", "नाम है"],
        Language::En => &["your name is", "call you", "name you"],
    };
    if matches_any(&text, set_name) {
        return Intent::SetName;
    }

    if contains_keyword(&text, "morning briefing") || contains_keyword(&text, "ब्रीफिंग") {
        return Intent::Briefing;
    }

    let goals: &[&str] = match lang {
        Language::Hi => &["मेरे लक्ष्य", "आज के लक्ष्य"],
        Language::En => &["my goals", "today i want to"],
    };
    if matches_any(&text, goals) {
        return Intent::Goals;
    }

    if contains_keyword(&text, "snooze") {
        return Intent::Snooze;
    }
    if matches_any(&text, &["completed", "done", "finished", "पूरा", "हो गया"]) {
        return Intent::Done;
    }

    let calendar_add: &[&str] = match lang {
        Language::Hi => &["कैलेंडर में", "जोड़", "मीटिंग"],
        Language::En => &["add to calendar", "to my calendar", "add meeting", "schedule meeting"],
    };
    if matches_any(&text, calendar_add) {
        return Intent::CalendarAdd;
    }

    let reminder: &[&str] = match lang {
        Language::Hi => &["याद", "रिमाइंडर", "बजे"],
        Language::En => &["remind", "reminder", "alarm"],
    };
    if matches_any(&text, reminder) {
        return Intent::Reminder;
    }

    let schedule: &[&str] = match lang {
        Language::Hi => &["कार्यक्रम", "शेड्यूल", "कैलेंडर", "आज"],
        Language::En => &["schedule", "calendar", "appointments"],
    };
    if matches_any(&text, schedule) {
        return Intent::Schedule;
    }

    let recipe: &[&str] = match lang {
        Language::Hi => &["रेसिपी", "खाना", "बनाना", "व्यंजन"],
        Language::En => &["recipe", "cook", "food", "dish"],
    };
    if matches_any(&text, recipe) {
        return Intent::Recipe;
    }

    let greeting: &[&str] = match lang {
        Language::Hi => &["नमस्ते", "हेलो", "हाय", "हैलो"],
        Language::En => &["hello", "hi", "hey", "namaste", "start"],
    };
    if matches_any(&text, greeting) {
        return Intent::Greeting;
    }

    if matches_any(&text, &["suggest", "suggestion", "suggestions", "सुझाव"]) {
        return Intent::Suggest;
    }

    if matches_any(&text, &["help", "मदद", "सहायता"]) {
        return Intent::Help;
    }

    Intent::Unknown
}

static RE_NAME_EN_1: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"your name is (\w+)");
static RE_NAME_EN_2: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"call you (\w+)");
static RE_NAME_EN_3: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"name you (\w+)");
static RE_NAME_EN_4: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"i'll call you (\w+)");
static RE_NAME_HI_1: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"तुम्हारा नाम (\w+)");
static RE_NAME_HI_2: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"आपका नाम (\w+)");
static RE_NAME_HI_3: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"नाम है (\w+)");
static RE_NAME_HI_4: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(\w+) नाम है");

/// Extract the assistant's new name from a set-name message.
///
/// Returns the name capitalized, or `None` when no pattern matched.
#[must_use]
pub fn extract_assistant_name(text: &str, lang: Language) -> Option<String> {
    let text = text.to_lowercase();
    let patterns: &[&lazy_regex::Lazy<regex::Regex>] = match lang {
        Language::En => &[&RE_NAME_EN_1, &RE_NAME_EN_2, &RE_NAME_EN_3, &RE_NAME_EN_4],
        Language::Hi => &[&RE_NAME_HI_1, &RE_NAME_HI_2, &RE_NAME_HI_3, &RE_NAME_HI_4],
    };

    for pattern in patterns {
        if let Some(caps) = pattern.captures(&text) {
            let raw = caps.get(1)?.as_str();
            let mut chars = raw.chars();
            let name = chars.next().map(|first| {
                first.to_uppercase().collect::<String>() + chars.as_str()
            })?;
            return Some(name);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_reminder() {
        assert_eq!(
            detect("Remind me to call mom at 5 PM", Language::En),
            Intent::Reminder
        );
        assert_eq!(
            detect("कल सुबह 7 बजे याद दिलाना", Language::Hi),
            Intent::Reminder
        );
    }

    #[test]
    fn test_detect_calendar_add_beats_schedule() {
        // Contains both "calendar" (schedule keyword) and the add phrasing
        assert_eq!(
            detect("Add meeting tomorrow at 3 PM to my calendar", Language::En),
            Intent::CalendarAdd
        );
        assert_eq!(
            detect("कल 3 बजे मीटिंग कैलेंडर में जोड़ें", Language::Hi),
            Intent::CalendarAdd
        );
    }

    #[test]
    fn test_detect_schedule() {
        assert_eq!(
            detect("What's my schedule today?", Language::En),
            Intent::Schedule
        );
        assert_eq!(detect("आज का कार्यक्रम", Language::Hi), Intent::Schedule);
    }

    #[test]
    fn test_detect_greeting_word_boundaries() {
        assert_eq!(detect("hi", Language::En), Intent::Greeting);
        assert_eq!(detect("नमस्ते", Language::Hi), Intent::Greeting);
        // "hi" must not match inside "this"
        assert_eq!(detect("this is nothing", Language::En), Intent::Unknown);
    }

    #[test]
    fn test_detect_set_name() {
        assert_eq!(
            detect("Your name is Jarvis", Language::En),
            Intent::SetName
        );
        assert_eq!(
            detect("तुम्हारा नाम राज है", Language::Hi),
            Intent::SetName
        );
    }

    #[test]
    fn test_detect_goals_and_progress() {
        assert_eq!(
            detect("My goals today are study and exercise", Language::En),
            Intent::Goals
        );
        assert_eq!(detect("completed exercise", Language::En), Intent::Done);
        assert_eq!(detect("all done", Language::En), Intent::Done);
        assert_eq!(detect("snooze", Language::En), Intent::Snooze);
    }

    #[test]
    fn test_detect_recipe() {
        assert_eq!(
            detect("Find recipe for pasta", Language::En),
            Intent::Recipe
        );
        assert_eq!(detect("पनीर की रेसिपी", Language::Hi), Intent::Recipe);
    }

    #[test]
    fn test_detect_briefing_and_help() {
        assert_eq!(
            detect("Enable morning briefings", Language::En),
            Intent::Briefing
        );
        assert_eq!(detect("help", Language::En), Intent::Help);
        assert_eq!(detect("any suggestions?", Language::En), Intent::Suggest);
        assert_eq!(detect("कोई सुझाव दो", Language::Hi), Intent::Suggest);
    }

    #[test]
    fn test_extract_name_english() {
        assert_eq!(
            extract_assistant_name("Your name is jarvis", Language::En),
            Some("Jarvis".to_string())
        );
        assert_eq!(
            extract_assistant_name("I'll call you friday", Language::En),
            Some("Friday".to_string())
        );
        assert_eq!(extract_assistant_name("Your name is", Language::En), None);
    }

    #[test]
    fn test_extract_name_hindi() {
        assert_eq!(
            extract_assistant_name("तुम्हारा नाम राज है", Language::Hi),
            Some("राज".to_string())
        );
    }
}
