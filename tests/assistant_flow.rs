//! End-to-end domain flows without network: a message's path from intent
//! detection through parsing to the reply template, in both languages.

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike};
use dost_bot::assistant::messages::{self, Language};
use dost_bot::assistant::{calendar, goals, intent, reminders};
use dost_bot::config::ist;

fn tuesday_9am() -> DateTime<FixedOffset> {
    // 2025-03-11 is a Tuesday
    ist()
        .with_ymd_and_hms(2025, 3, 11, 9, 0, 0)
        .single()
        .expect("valid test time")
}

#[test]
fn english_reminder_roundtrip() {
    let text = "Remind me to take medicine at 9 PM";
    let lang = Language::detect(text);
    assert_eq!(lang, Language::En);
    assert_eq!(intent::detect(text, lang), intent::Intent::Reminder);

    let parsed = reminders::parse_reminder(text, lang, tuesday_9am()).expect("parses");
    assert_eq!(parsed.due.hour(), 21);
    assert!(parsed.call_worthy);

    let reply = messages::reminder_set(
        lang,
        &parsed.task,
        &parsed.due.format("%d/%m/%Y").to_string(),
        &parsed.due.format("%I:%M %p").to_string(),
    );
    assert!(reply.contains("Take Medicine"));
    assert!(reply.contains("11/03/2025"));
    assert!(reply.contains("09:00 PM"));
}

#[test]
fn hindi_reminder_roundtrip() {
    let text = "कल सुबह 7 बजे योग याद दिलाना";
    let lang = Language::detect(text);
    assert_eq!(lang, Language::Hi);
    assert_eq!(intent::detect(text, lang), intent::Intent::Reminder);

    let parsed = reminders::parse_reminder(text, lang, tuesday_9am()).expect("parses");
    assert_eq!(parsed.due.day(), 12);
    assert_eq!(parsed.due.hour(), 7);
    assert!(!parsed.call_worthy);

    let reply = messages::reminder_set(
        lang,
        &parsed.task,
        &parsed.due.format("%d/%m/%Y").to_string(),
        &parsed.due.format("%I:%M %p").to_string(),
    );
    assert!(reply.contains("रिमाइंडर सेट"));
    assert!(reply.contains("योग"));
}

#[test]
fn mixed_language_voice_note_schedules_both_tasks() {
    // A transcript mixing connectives and two timed tasks
    let transcript = "Remind me at 5 pm to call the bank, then at 8 pm remind me about dinner";
    let lang = Language::detect(transcript);
    let tasks = reminders::extract_tasks(transcript, lang, tuesday_9am());

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].due.hour(), 17);
    assert_eq!(tasks[1].due.hour(), 20);

    let lines: Vec<String> = tasks
        .iter()
        .map(|t| format!("• {} - {}", t.task, t.due.format("%I:%M %p")))
        .collect();
    let reply = messages::voice_processed(lang, &lines.join("\n"));
    assert!(reply.contains("05:00 PM"));
    assert!(reply.contains("08:00 PM"));
}

#[test]
fn goals_lifecycle() {
    let text = "My goals today are study math, exercise and call 5 clients";
    let lang = Language::detect(text);
    assert_eq!(intent::detect(text, lang), intent::Intent::Goals);

    let parsed = goals::parse_goals(text, lang);
    assert_eq!(parsed.len(), 3);

    let mut sheet = goals::new_sheet("2025-03-11".to_string(), parsed.clone());
    let confirmation = messages::goals_set(lang, &goals::format_goal_list(&parsed));
    assert!(confirmation.contains("✓ Study Math"));
    assert!(confirmation.contains("2:00 PM"));

    // Progress: one goal done, two pending
    assert_eq!(intent::detect("completed exercise", lang), intent::Intent::Done);
    let outcome = goals::apply_completion(&mut sheet, "completed exercise");
    let goals::CompletionOutcome::Progress(pending) = outcome else {
        panic!("expected progress outcome");
    };
    assert_eq!(pending.len(), 2);

    // Everything done
    let outcome = goals::apply_completion(&mut sheet, "all done");
    assert_eq!(outcome, goals::CompletionOutcome::AllDone);
    assert!(sheet.pending().is_empty());
}

#[test]
fn calendar_command_to_confirmation() {
    let text = "Add sprint review to my calendar on friday at 2 pm for 90 min";
    let lang = Language::detect(text);
    assert_eq!(intent::detect(text, lang), intent::Intent::CalendarAdd);

    let event = calendar::parse_command(text, lang, tuesday_9am()).expect("parses");
    assert_eq!(event.title, "Sprint Review");
    // Tuesday the 11th -> Friday the 14th
    assert_eq!(event.start.day(), 14);
    assert_eq!(event.start.hour(), 14);
    assert_eq!(event.duration_minutes, 90);

    let reply = messages::calendar_add(
        lang,
        &event.title,
        &event.start.format("%d/%m/%Y").to_string(),
        &event.start.format("%I:%M %p").to_string(),
        event.duration_minutes,
        "https://calendar.google.com/event?eid=abc",
    );
    assert!(reply.contains("Sprint Review"));
    assert!(reply.contains("14/03/2025"));
    assert!(reply.contains("90 minutes"));
}

#[test]
fn greeting_uses_custom_name_when_set() {
    let lang = Language::En;
    assert_eq!(intent::detect("hello", lang), intent::Intent::Greeting);

    let named = messages::introduction(lang, "Jarvis");
    assert!(named.contains("Jarvis"));

    let set_name_text = "Your name is Jarvis";
    assert_eq!(intent::detect(set_name_text, lang), intent::Intent::SetName);
    assert_eq!(
        intent::extract_assistant_name(set_name_text, lang),
        Some("Jarvis".to_string())
    );
}

#[test]
fn schedule_request_composes_morning_greeting() {
    let lang = Language::En;
    assert_eq!(
        intent::detect("What's my schedule today", lang),
        intent::Intent::Schedule
    );

    let now = tuesday_9am();
    let schedule = calendar::format_schedule(&[], lang);
    let quote = messages::quote_of_the_day(lang, now.day());
    let reply = messages::morning_greeting(
        lang,
        &now.format("%d %B %Y").to_string(),
        &schedule,
        quote,
    );

    assert!(reply.contains("11 March 2025"));
    assert!(reply.contains("No meetings today"));
    assert!(!quote.is_empty());
}
