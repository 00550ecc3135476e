//! Daily goal tracking: parse a goal list, mark progress, report pending work.

use crate::assistant::messages::Language;
use crate::storage::{Goal, GoalSheet};
use crate::utils::title_case;
use chrono::Utc;

/// Lead-in phrases stripped before splitting the goal list
const LEAD_PHRASES_EN: [&str; 4] = [
    "my goals today are",
    "my goals are",
    "today i want to",
    "i want to",
];
const LEAD_PHRASES_HI: [&str; 3] = ["मेरे लक्ष्य हैं", "मेरे लक्ष्य", "आज के लक्ष्य"];

/// Parse a free-form goal list into individual goals.
///
/// Splits on `,`/`;` and the connectives "and"/"then" (Hindi: और/फिर).
#[must_use]
pub fn parse_goals(text: &str, lang: Language) -> Vec<String> {
    let mut body = text.to_lowercase();
    let leads: &[&str] = match lang {
        Language::En => &LEAD_PHRASES_EN,
        Language::Hi => &LEAD_PHRASES_HI,
    };
    for lead in leads {
        body = body.replace(lead, "");
    }

    for connective in [" and ", " then ", " और ", " फिर "] {
        body = body.replace(connective, ",");
    }

    body.split([',', ';'])
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Build a fresh goal sheet for the given IST date
#[must_use]
pub fn new_sheet(date: String, goals: Vec<String>) -> GoalSheet {
    let added_at = Utc::now();
    GoalSheet {
        date,
        goals: goals
            .into_iter()
            .map(|text| Goal {
                text,
                completed: false,
                added_at,
            })
            .collect(),
    }
}

/// Outcome of applying a completion message to the goal sheet
#[derive(Debug, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// No goals were set today
    NoGoals,
    /// "all done": everything marked complete
    AllDone,
    /// Some goals matched; carries the still-pending goal texts
    Progress(Vec<String>),
    /// Goals matched and nothing remains pending
    Finished,
    /// The message named no known goal
    NothingMatched,
}

/// Mark goals named in `text` as completed.
///
/// "all done" completes everything; otherwise any goal whose text occurs in
/// the message (case-insensitive) is marked.
pub fn apply_completion(sheet: &mut GoalSheet, text: &str) -> CompletionOutcome {
    if sheet.goals.is_empty() {
        return CompletionOutcome::NoGoals;
    }

    let lowered = text.to_lowercase();

    if lowered.contains("all done") || lowered.contains("सब हो गया") {
        for goal in &mut sheet.goals {
            goal.completed = true;
        }
        return CompletionOutcome::AllDone;
    }

    let mut matched_any = false;
    for goal in &mut sheet.goals {
        if lowered.contains(&goal.text.to_lowercase()) {
            goal.completed = true;
            matched_any = true;
        }
    }

    if !matched_any {
        return CompletionOutcome::NothingMatched;
    }

    let pending: Vec<String> = sheet.pending().iter().map(ToString::to_string).collect();
    if pending.is_empty() {
        CompletionOutcome::Finished
    } else {
        CompletionOutcome::Progress(pending)
    }
}

/// Format the goal list for the confirmation message, `✓` prefixed, max 10
#[must_use]
pub fn format_goal_list(goals: &[String]) -> String {
    goals
        .iter()
        .take(10)
        .map(|g| format!("✓ {}", title_case(g)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format pending goals for check-ins, `•` prefixed, max 5
#[must_use]
pub fn format_pending(pending: &[&str]) -> String {
    pending
        .iter()
        .take(5)
        .map(|g| format!("• {}", title_case(g)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_goals_english() {
        let goals = parse_goals(
            "My goals today are study math, exercise and finish report",
            Language::En,
        );
        assert_eq!(goals, vec!["study math", "exercise", "finish report"]);
    }

    #[test]
    fn test_parse_goals_hindi() {
        let goals = parse_goals("मेरे लक्ष्य हैं योग और पढ़ाई", Language::Hi);
        assert_eq!(goals, vec!["योग", "पढ़ाई"]);
    }

    #[test]
    fn test_parse_goals_empty() {
        assert!(parse_goals("My goals today are", Language::En).is_empty());
    }

    #[test]
    fn test_all_done() {
        let mut sheet = new_sheet(
            "2025-03-10".into(),
            vec!["study".into(), "exercise".into()],
        );
        assert_eq!(apply_completion(&mut sheet, "all done"), CompletionOutcome::AllDone);
        assert!(sheet.goals.iter().all(|g| g.completed));
    }

    #[test]
    fn test_partial_completion() {
        let mut sheet = new_sheet(
            "2025-03-10".into(),
            vec!["study math".into(), "exercise".into()],
        );
        let outcome = apply_completion(&mut sheet, "I completed exercise today");
        assert_eq!(
            outcome,
            CompletionOutcome::Progress(vec!["study math".to_string()])
        );
    }

    #[test]
    fn test_finishing_last_goal() {
        let mut sheet = new_sheet("2025-03-10".into(), vec!["exercise".into()]);
        assert_eq!(
            apply_completion(&mut sheet, "completed exercise"),
            CompletionOutcome::Finished
        );
    }

    #[test]
    fn test_nothing_matched() {
        let mut sheet = new_sheet("2025-03-10".into(), vec!["study".into()]);
        assert_eq!(
            apply_completion(&mut sheet, "completed swimming"),
            CompletionOutcome::NothingMatched
        );
    }

    #[test]
    fn test_no_goals() {
        let mut sheet = GoalSheet::default();
        assert_eq!(
            apply_completion(&mut sheet, "all done"),
            CompletionOutcome::NoGoals
        );
    }

    #[test]
    fn test_format_helpers() {
        let formatted = format_goal_list(&["study math".into(), "exercise".into()]);
        assert_eq!(formatted, "✓ Study Math\n✓ Exercise");

        let pending = format_pending(&["call clients"]);
        assert_eq!(pending, "• Call Clients");
    }
}
