//! Google Calendar integration: OAuth refresh-token flow, today's schedule,
//! event creation, and natural-language command parsing.

#![allow(clippy::non_std_lazy_statics)]

use crate::assistant::messages::{self, Language};
use crate::config::{ist, CALENDAR_DEFAULT_DURATION_MIN, CALENDAR_POPUP_LEAD_MIN};
use crate::utils::title_case;
use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};
use lazy_regex::lazy_regex;
use moka::future::Cache;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

/// Access tokens are valid for an hour; refresh a little early
const TOKEN_CACHE_TTL_SECS: u64 = 3300;

#[derive(Error, Debug, Clone)]
pub enum CalendarError {
    #[error("Token error: {0}")]
    Token(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("API error: {0}")]
    Api(String),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// One calendar event as listed by the API
#[derive(Debug, Deserialize, Clone)]
pub struct CalendarEvent {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
}

/// Event start time: `dateTime` for timed events, `date` for all-day ones
#[derive(Debug, Deserialize, Clone)]
pub struct EventTime {
    #[serde(rename = "dateTime", default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventsListResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// Result of inserting an event
#[derive(Debug, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
    #[serde(rename = "htmlLink", default)]
    pub html_link: Option<String>,
}

pub struct CalendarClient {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    /// Single-entry cache holding the current access token until near-expiry
    token_cache: Cache<(), String>,
}

impl CalendarClient {
    #[must_use]
    pub fn new(client_id: String, client_secret: String, refresh_token: String) -> Self {
        let token_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(std::time::Duration::from_secs(TOKEN_CACHE_TTL_SECS))
            .build();

        Self {
            http_client: crate::llm::http_utils::create_http_client(),
            client_id,
            client_secret,
            refresh_token,
            token_cache,
        }
    }

    async fn access_token(&self) -> Result<String, CalendarError> {
        self.token_cache
            .try_get_with((), async {
                debug!("Refreshing Google Calendar access token");
                self.fetch_access_token().await
            })
            .await
            .map_err(|e: Arc<CalendarError>| (*e).clone())
    }

    async fn fetch_access_token(&self) -> Result<String, CalendarError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CalendarError::Token(format!(
                "Token refresh failed: {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Token(e.to_string()))?;
        Ok(token.access_token)
    }

    /// List today's events (IST day), earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the token refresh or the listing request fails.
    pub async fn today_events(&self) -> Result<Vec<CalendarEvent>, CalendarError> {
        let token = self.access_token().await?;

        let now = Utc::now().with_timezone(&ist());
        let day_start = now
            .with_hour(0)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .ok_or_else(|| CalendarError::Api("invalid day start".into()))?;
        let day_end = day_start + Duration::days(1);

        let response = self
            .http_client
            .get(EVENTS_URL)
            .bearer_auth(&token)
            .query(&[
                ("timeMin", day_start.to_rfc3339()),
                ("timeMax", day_end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CalendarError::Api(format!(
                "events.list returned {}",
                response.status()
            )));
        }

        let listing: EventsListResponse = response
            .json()
            .await
            .map_err(|e| CalendarError::Api(e.to_string()))?;
        Ok(listing.items)
    }

    /// Insert an event with a 10-minute popup reminder.
    ///
    /// # Errors
    ///
    /// Returns an error when the token refresh or the insert fails.
    pub async fn create_event(
        &self,
        title: &str,
        start: DateTime<FixedOffset>,
        duration_minutes: i64,
    ) -> Result<CreatedEvent, CalendarError> {
        let token = self.access_token().await?;
        let end = start + Duration::minutes(duration_minutes);

        let body = json!({
            "summary": title,
            "start": {
                "dateTime": start.to_rfc3339(),
                "timeZone": "Asia/Kolkata",
            },
            "end": {
                "dateTime": end.to_rfc3339(),
                "timeZone": "Asia/Kolkata",
            },
            "reminders": {
                "useDefault": false,
                "overrides": [
                    {"method": "popup", "minutes": CALENDAR_POPUP_LEAD_MIN},
                ],
            },
        });

        let response = self
            .http_client
            .post(EVENTS_URL)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CalendarError::Api(format!(
                "events.insert returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| CalendarError::Api(e.to_string()))
    }
}

/// Format listed events for WhatsApp, one `• HH:MM - title` line per event.
///
/// All-day events (no `dateTime`) are skipped.
#[must_use]
pub fn format_schedule(events: &[CalendarEvent], lang: Language) -> String {
    let lines: Vec<String> = events
        .iter()
        .filter_map(|event| {
            let start = event.start.as_ref()?.date_time.as_ref()?;
            let time = DateTime::parse_from_rfc3339(start).ok()?;
            let title = event.summary.as_deref().unwrap_or("No title");
            Some(format!("• {} - {}", time.format("%I:%M %p"), title))
        })
        .collect();

    if lines.is_empty() {
        messages::no_events(lang)
    } else {
        lines.into_iter().take(5).collect::<Vec<_>>().join("\n")
    }
}

/// A parsed "add to calendar" command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

static RE_CAL_TITLE_EN_1: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"add (.+?) to my calendar");
static RE_CAL_TITLE_EN_2: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"schedule (.+?) for");
static RE_CAL_TITLE_EN_3: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"calendar (.+?) at");
static RE_CAL_TITLE_EN_4: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"meeting about (.+?) on");
static RE_CAL_TITLE_HI_1: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"कैलेंडर में (.+?) जोड़");
static RE_CAL_TITLE_HI_2: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(.+?) के लिए समय");
static RE_CAL_TITLE_HI_3: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(.+?) की मीटिंग");

static RE_CAL_TIME: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"(\d{1,2})\s*(am|pm|बजे)");
static RE_CAL_DURATION: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"(\d+)\s*(hour|hr|घंटे|minute|min|मिनट)");

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Words removed when no title pattern matched
const TITLE_NOISE: [&str; 19] = [
    "add",
    "calendar",
    "schedule",
    "meeting",
    "tomorrow",
    "today",
    "at",
    "on",
    "for",
    "to",
    "my",
    "कैलेंडर",
    "में",
    "जोड़ें",
    "जोड़",
    "कल",
    "आज",
    "के",
    "लिए",
];

/// Parse an "add to calendar" command into title, start and duration.
///
/// Returns `None` when the extracted title is empty; a missing time defaults
/// to 09:00, a missing duration to one hour.
#[must_use]
pub fn parse_command(
    text: &str,
    lang: Language,
    now: DateTime<FixedOffset>,
) -> Option<ParsedEvent> {
    let lowered = text.to_lowercase();

    let title = extract_title(&lowered, lang)?;

    let mut start = now;

    // Date: tomorrow, an explicit weekday, or today
    if lowered.contains("tomorrow") || lowered.contains("कल") {
        start += Duration::days(1);
    } else if let Some(target) = WEEKDAYS.iter().position(|d| lowered.contains(d)) {
        let current = start.weekday().num_days_from_monday() as i64;
        let mut days_ahead = (target as i64 - current).rem_euclid(7);
        if days_ahead == 0 {
            days_ahead = 7; // same weekday means next week
        }
        start += Duration::days(days_ahead);
    }

    // Time of day, default 09:00
    let hour = RE_CAL_TIME.captures(&lowered).and_then(|caps| {
        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        if hour > 12 {
            return None;
        }
        let period = caps.get(2)?.as_str();
        if (period == "pm" || period == "बजे") && hour != 12 {
            hour += 12;
        } else if period == "am" && hour == 12 {
            hour = 0;
        }
        Some(hour)
    });
    start = start
        .with_hour(hour.unwrap_or(9))?
        .with_minute(0)?
        .with_second(0)?
        .with_nanosecond(0)?;

    // Duration, default one hour
    let duration_minutes = RE_CAL_DURATION
        .captures(&lowered)
        .and_then(|caps| {
            let value: i64 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2)?.as_str();
            Some(if matches!(unit, "hour" | "hr" | "घंटे") {
                value * 60
            } else {
                value
            })
        })
        .unwrap_or(CALENDAR_DEFAULT_DURATION_MIN);

    Some(ParsedEvent {
        title: title_case(&title),
        start,
        duration_minutes,
    })
}

fn extract_title(lowered: &str, lang: Language) -> Option<String> {
    let patterns: &[&lazy_regex::Lazy<regex::Regex>] = match lang {
        Language::En => &[
            &RE_CAL_TITLE_EN_1,
            &RE_CAL_TITLE_EN_2,
            &RE_CAL_TITLE_EN_3,
            &RE_CAL_TITLE_EN_4,
        ],
        Language::Hi => &[&RE_CAL_TITLE_HI_1, &RE_CAL_TITLE_HI_2, &RE_CAL_TITLE_HI_3],
    };

    for pattern in patterns {
        if let Some(caps) = pattern.captures(lowered) {
            let title = caps.get(1)?.as_str().trim().to_string();
            if !title.is_empty() {
                return Some(title);
            }
        }
    }

    // Fallback: strip noise words and keep the first few meaningful ones
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| {
            !TITLE_NOISE.contains(w)
                && !w.chars().all(|c| c.is_ascii_digit())
                && *w != "am"
                && *w != "pm"
                && *w != "बजे"
        })
        .take(5)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn monday_10am() -> DateTime<FixedOffset> {
        // 2025-03-10 is a Monday
        ist()
            .with_ymd_and_hms(2025, 3, 10, 10, 0, 0)
            .single()
            .expect("valid test time")
    }

    #[test]
    fn test_parse_add_to_calendar() {
        let event = parse_command(
            "Add project review to my calendar tomorrow at 3 pm",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert_eq!(event.title, "Project Review");
        assert_eq!(event.start.day(), 11);
        assert_eq!(event.start.hour(), 15);
        assert_eq!(event.duration_minutes, 60);
    }

    #[test]
    fn test_parse_weekday_resolution() {
        let event = parse_command(
            "Schedule standup for friday at 10 am",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        // Monday -> Friday is 4 days ahead
        assert_eq!(event.start.day(), 14);
        assert_eq!(event.start.hour(), 10);
        assert_eq!(event.title, "Standup");
    }

    #[test]
    fn test_same_weekday_means_next_week() {
        let event = parse_command(
            "Schedule review for monday at 10 am",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert_eq!(event.start.day(), 17);
    }

    #[test]
    fn test_default_time_and_duration() {
        let event = parse_command(
            "Add dentist visit to my calendar tomorrow",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert_eq!(event.start.hour(), 9);
        assert_eq!(event.duration_minutes, 60);
    }

    #[test]
    fn test_explicit_duration() {
        let event = parse_command(
            "Add sprint planning to my calendar tomorrow at 2 pm for 2 hours",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert_eq!(event.duration_minutes, 120);

        let event = parse_command(
            "Add sync to my calendar tomorrow at 2 pm for 30 min",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert_eq!(event.duration_minutes, 30);
    }

    #[test]
    fn test_hindi_command() {
        let event = parse_command(
            "कल 3 बजे मीटिंग कैलेंडर में जोड़ें",
            Language::Hi,
            monday_10am(),
        )
        .expect("should parse");
        // बजे without qualifier reads as afternoon for calendar commands
        assert_eq!(event.start.hour(), 15);
        assert_eq!(event.start.day(), 11);
    }

    #[test]
    fn test_title_fallback_strips_noise() {
        let event = parse_command(
            "calendar dentist appointment 5 pm",
            Language::En,
            monday_10am(),
        )
        .expect("should parse");
        assert!(event.title.to_lowercase().contains("dentist"));
    }

    #[test]
    fn test_format_schedule_with_events() {
        let events = vec![
            CalendarEvent {
                summary: Some("Standup".into()),
                start: Some(EventTime {
                    date_time: Some("2025-03-10T09:30:00+05:30".into()),
                    date: None,
                }),
            },
            CalendarEvent {
                summary: None,
                start: Some(EventTime {
                    date_time: None,
                    date: Some("2025-03-10".into()),
                }),
            },
        ];
        let schedule = format_schedule(&events, Language::En);
        assert!(schedule.contains("09:30 AM - Standup"));
        // All-day event skipped
        assert_eq!(schedule.lines().count(), 1);
    }

    #[test]
    fn test_format_schedule_empty() {
        assert!(format_schedule(&[], Language::En).contains("No meetings today"));
        assert!(format_schedule(&[], Language::Hi).contains("कोई मीटिंग नहीं"));
    }
}
