//! Proactive messaging: morning briefings and time-of-day check-ins.
//!
//! Sweeps iterate every stored user. Check-ins go only to users active in
//! the last week and only inside the slot's local-time window; briefings go
//! to users who enabled them. Per-user failures are logged and the sweep
//! moves on.

use crate::assistant::calendar::format_schedule;
use crate::assistant::messages;
use crate::bot::AppState;
use crate::config::{
    ist, MORNING_BRIEFING_HOUR, PROACTIVE_ACTIVE_DAYS, PROACTIVE_AFTERNOON_WINDOW,
    PROACTIVE_EVENING_WINDOW, PROACTIVE_MORNING_WINDOW, PROACTIVE_SWEEPS,
};
use crate::scheduler::job_fn;
use crate::storage::UserProfile;
use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Timelike, Utc};
use tracing::{error, info, warn};

/// Register the recurring sweep jobs: briefings at 07:00 IST and the three
/// proactive check-in slots.
///
/// # Errors
///
/// Returns an error when a job cannot be registered.
pub fn register_daily_jobs(state: &AppState) -> Result<()> {
    let briefing_state = state.clone();
    state
        .scheduler
        .schedule_daily(
            "morning_briefings",
            MORNING_BRIEFING_HOUR,
            0,
            job_fn(move || {
                let state = briefing_state.clone();
                async move {
                    run_morning_briefings(&state).await;
                }
            }),
        )
        .context("registering morning briefings")?;

    for (hour, minute, slot) in PROACTIVE_SWEEPS {
        let sweep_state = state.clone();
        state
            .scheduler
            .schedule_daily(
                format!("proactive_{slot}"),
                hour,
                minute,
                job_fn(move || {
                    let state = sweep_state.clone();
                    async move {
                        run_proactive_sweep(&state, slot).await;
                    }
                }),
            )
            .with_context(|| format!("registering {slot} sweep"))?;
    }

    Ok(())
}

/// Whether the user interacted within the activity horizon
fn recently_active(profile: &UserProfile) -> bool {
    profile.last_interaction.is_some_and(|last| {
        Utc::now() - last < Duration::days(PROACTIVE_ACTIVE_DAYS)
    })
}

/// The slot's inclusive local-hour window
fn slot_window(slot: &str) -> (u32, u32) {
    match slot {
        "morning" => PROACTIVE_MORNING_WINDOW,
        "afternoon" => PROACTIVE_AFTERNOON_WINDOW,
        _ => PROACTIVE_EVENING_WINDOW,
    }
}

/// Send the slot's check-in to every recently active user inside the window
pub async fn run_proactive_sweep(state: &AppState, slot: &str) {
    let users = match state.storage.list_user_ids().await {
        Ok(users) => users,
        Err(e) => {
            error!("Proactive sweep could not list users: {}", e);
            return;
        }
    };

    let hour = Utc::now().with_timezone(&ist()).hour();
    let (window_start, window_end) = slot_window(slot);
    if !(window_start..=window_end).contains(&hour) {
        info!("Skipping {} sweep outside window (hour {})", slot, hour);
        return;
    }

    let mut sent = 0_u32;
    for phone in users {
        let profile = match state.storage.get_profile(&phone).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Skipping {} in sweep: {}", phone, e);
                continue;
            }
        };
        if !recently_active(&profile) {
            continue;
        }

        let body = messages::proactive(slot, profile.language, &profile.assistant_name);
        match state.twilio.send_whatsapp(&phone, &body).await {
            Ok(()) => {
                sent += 1;
                info!("Sent {} check-in to {}", slot, phone);
            }
            Err(e) => error!("Proactive message to {} failed: {}", phone, e),
        }
    }

    info!("{} sweep complete, {} messages sent", slot, sent);
}

/// Send morning briefings: today's calendar, quote of the day, signature
pub async fn run_morning_briefings(state: &AppState) {
    let users = match state.storage.list_user_ids().await {
        Ok(users) => users,
        Err(e) => {
            error!("Briefing sweep could not list users: {}", e);
            return;
        }
    };

    let now = Utc::now().with_timezone(&ist());

    for phone in users {
        let profile = match state.storage.get_profile(&phone).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Skipping briefing for {}: {}", phone, e);
                continue;
            }
        };
        if !profile.morning_briefing {
            continue;
        }

        let schedule = match &state.calendar {
            Some(calendar) => match calendar.today_events().await {
                Ok(events) => format_schedule(&events, profile.language),
                Err(e) => {
                    warn!("Calendar unavailable for briefing: {}", e);
                    messages::no_events(profile.language)
                }
            },
            None => messages::no_events(profile.language),
        };

        let quote = messages::quote_of_the_day(profile.language, now.day());
        let mut body = messages::morning_greeting(
            profile.language,
            &now.format("%d %B %Y").to_string(),
            &schedule,
            quote,
        );
        body.push_str(&match profile.language {
            messages::Language::Hi => {
                format!("\n\n- आपका {} 🤖", profile.assistant_name)
            }
            messages::Language::En => {
                format!("\n\n- Your {} 🤖", profile.assistant_name)
            }
        });

        match state.twilio.send_whatsapp(&phone, &body).await {
            Ok(()) => info!("Morning briefing sent to {}", phone),
            Err(e) => error!("Morning briefing to {} failed: {}", phone, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recently_active() {
        let mut profile = UserProfile::default();
        assert!(!recently_active(&profile));

        profile.last_interaction = Some(Utc::now() - Duration::hours(5));
        assert!(recently_active(&profile));

        profile.last_interaction = Some(Utc::now() - Duration::days(8));
        assert!(!recently_active(&profile));
    }

    #[test]
    fn test_slot_windows() {
        assert_eq!(slot_window("morning"), (7, 10));
        assert_eq!(slot_window("afternoon"), (14, 16));
        assert_eq!(slot_window("evening"), (18, 20));
    }
}
