//! Reminder and goal check-in delivery.
//!
//! Scheduling writes the reminder to the per-user ledger and registers a
//! scheduler job; delivery sends the WhatsApp message (plus a voice call for
//! medicine reminders) and advances the ledger status. Pending reminders are
//! restored into the scheduler at startup.

use crate::assistant::goals::format_pending;
use crate::assistant::messages;
use crate::assistant::reminders::ParsedReminder;
use crate::bot::AppState;
use crate::config::{GOAL_CHECKIN_HOURS, REPLY_SNOOZE_MINUTES};
use crate::scheduler::job_fn;
use crate::storage::{Reminder, ReminderStatus};
use crate::twilio::twiml;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, Timelike};
use tracing::{error, info, warn};

/// Job id for a reminder, `reminder_{phone}_{unix_ts}`
#[must_use]
pub fn reminder_job_id(phone: &str, due: DateTime<FixedOffset>) -> String {
    format!("reminder_{phone}_{}", due.timestamp())
}

/// Job id for a goal check-in slot
#[must_use]
pub fn checkin_job_id(phone: &str, due: DateTime<FixedOffset>) -> String {
    format!("checkin_{phone}_{}", due.timestamp())
}

/// Persist a parsed reminder and register its delivery job.
///
/// # Errors
///
/// Returns an error when the ledger write or scheduling fails.
pub async fn schedule_reminder(
    state: &AppState,
    phone: &str,
    parsed: &ParsedReminder,
    language: messages::Language,
) -> Result<Reminder> {
    let reminder = Reminder {
        id: reminder_job_id(phone, parsed.due),
        task: parsed.task.clone(),
        due: parsed.due,
        language,
        status: ReminderStatus::Pending,
        call_worthy: parsed.call_worthy,
    };

    state
        .storage
        .add_reminder(phone, reminder.clone())
        .await
        .context("persisting reminder")?;

    register_delivery_job(state, phone, &reminder)?;

    info!(
        "Reminder {} scheduled for {} at {}",
        reminder.id, phone, reminder.due
    );
    Ok(reminder)
}

/// Register (or re-register) the scheduler job that delivers a reminder
pub fn register_delivery_job(state: &AppState, phone: &str, reminder: &Reminder) -> Result<()> {
    let job_state = state.clone();
    let job_phone = phone.to_string();
    let job_reminder_id = reminder.id.clone();

    state
        .scheduler
        .schedule_at(
            reminder.id.clone(),
            reminder.due,
            job_fn(move || {
                let state = job_state.clone();
                let phone = job_phone.clone();
                let reminder_id = job_reminder_id.clone();
                async move {
                    deliver_reminder(&state, &phone, &reminder_id).await;
                }
            }),
        )
        .context("registering reminder job")
}

/// Deliver a reminder: WhatsApp message, optional voice call, ledger update.
///
/// Runs as a scheduler job; failures are logged, never propagated.
pub async fn deliver_reminder(state: &AppState, phone: &str, reminder_id: &str) {
    let reminder = match state.storage.get_reminders(phone).await {
        Ok(reminders) => reminders.into_iter().find(|r| r.id == reminder_id),
        Err(e) => {
            error!("Loading ledger for {} failed: {}", phone, e);
            return;
        }
    };

    let Some(reminder) = reminder else {
        warn!("Reminder {} vanished from ledger, skipping", reminder_id);
        return;
    };
    if matches!(reminder.status, ReminderStatus::Done | ReminderStatus::Sent) {
        return;
    }

    let assistant_name = match state.storage.get_profile(phone).await {
        Ok(profile) => profile.assistant_name,
        Err(e) => {
            warn!("Profile load failed for {}: {}", phone, e);
            "Assistant".to_string()
        }
    };

    let body = messages::reminder_fire(reminder.language, &assistant_name, &reminder.task);
    if let Err(e) = state.twilio.send_whatsapp(phone, &body).await {
        error!("Reminder {} delivery failed: {}", reminder_id, e);
        return;
    }

    if reminder.call_worthy {
        let script =
            messages::reminder_call_script(reminder.language, &assistant_name, &reminder.task);
        let document = twiml::reminder_call(&script, reminder.language);
        match state.twilio.place_call(phone, &document).await {
            Ok(sid) => info!("Reminder call {} placed for {}", sid, reminder_id),
            Err(e) => warn!("Reminder call for {} failed: {}", reminder_id, e),
        }
    }

    if let Err(e) = state
        .storage
        .modify_reminder(phone, reminder_id, |r| r.status = ReminderStatus::Sent)
        .await
    {
        error!("Marking reminder {} sent failed: {}", reminder_id, e);
    }
}

/// Push a reminder out by `minutes` and re-register its delivery job.
///
/// Returns the updated reminder, or `None` when the id is unknown.
///
/// # Errors
///
/// Returns an error when the ledger update or re-scheduling fails.
pub async fn snooze_reminder(
    state: &AppState,
    phone: &str,
    reminder_id: &str,
    minutes: i64,
) -> Result<Option<Reminder>> {
    let updated = state
        .storage
        .modify_reminder(phone, reminder_id, |r| {
            r.due += Duration::minutes(minutes);
            r.status = ReminderStatus::Snoozed;
        })
        .await
        .context("snoozing reminder")?;

    if let Some(reminder) = &updated {
        register_delivery_job(state, phone, reminder)?;
        info!(
            "Reminder {} snoozed by {} minutes to {}",
            reminder_id, minutes, reminder.due
        );
    }
    Ok(updated)
}

/// Snooze the most recently delivered reminder after a "snooze" reply
///
/// # Errors
///
/// Returns an error when the ledger lookup or update fails.
pub async fn snooze_last_reminder(state: &AppState, phone: &str) -> Result<Option<Reminder>> {
    let Some(last) = state.storage.last_sent_reminder(phone).await? else {
        return Ok(None);
    };
    snooze_reminder(state, phone, &last.id, REPLY_SNOOZE_MINUTES).await
}

/// Mark the most recently delivered reminder done after a "done" reply
///
/// # Errors
///
/// Returns an error when the ledger lookup or update fails.
pub async fn complete_last_reminder(state: &AppState, phone: &str) -> Result<Option<Reminder>> {
    let Some(last) = state.storage.last_sent_reminder(phone).await? else {
        return Ok(None);
    };
    Ok(state
        .storage
        .modify_reminder(phone, &last.id, |r| r.status = ReminderStatus::Done)
        .await?)
}

/// Re-register every pending reminder after a restart.
///
/// Reminders that came due while the service was down fire immediately
/// instead of being dropped.
///
/// # Errors
///
/// Returns an error when the user listing fails; per-user failures are
/// logged and skipped.
pub async fn restore_pending_reminders(state: &AppState) -> Result<usize> {
    let users = state.storage.list_user_ids().await?;
    let mut restored = 0;

    for phone in users {
        let reminders = match state.storage.get_reminders(&phone).await {
            Ok(reminders) => reminders,
            Err(e) => {
                warn!("Skipping reminder restore for {}: {}", phone, e);
                continue;
            }
        };

        for reminder in reminders
            .iter()
            .filter(|r| matches!(r.status, ReminderStatus::Pending | ReminderStatus::Snoozed))
        {
            if let Err(e) = register_delivery_job(state, &phone, reminder) {
                warn!("Could not restore reminder {}: {}", reminder.id, e);
                continue;
            }
            restored += 1;
        }
    }

    info!("Restored {} pending reminders", restored);
    Ok(restored)
}

/// Schedule today's remaining goal check-ins (14:00, 17:00, 20:00 IST)
///
/// # Errors
///
/// Returns an error when a job cannot be registered.
pub fn schedule_goal_checkins(
    state: &AppState,
    phone: &str,
    now: DateTime<FixedOffset>,
) -> Result<()> {
    for hour in GOAL_CHECKIN_HOURS {
        let Some(checkin_time) = now
            .with_hour(hour)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
        else {
            continue;
        };
        if checkin_time <= now {
            continue;
        }

        let job_state = state.clone();
        let job_phone = phone.to_string();
        state
            .scheduler
            .schedule_at(
                checkin_job_id(phone, checkin_time),
                checkin_time,
                job_fn(move || {
                    let state = job_state.clone();
                    let phone = job_phone.clone();
                    async move {
                        send_goal_checkin(&state, &phone).await;
                    }
                }),
            )
            .context("registering goal check-in")?;
    }
    Ok(())
}

/// Send a goal check-in listing pending tasks; silent when nothing pends
pub async fn send_goal_checkin(state: &AppState, phone: &str) {
    let sheet = match state.storage.get_goals(phone).await {
        Ok(sheet) => sheet,
        Err(e) => {
            error!("Loading goals for {} failed: {}", phone, e);
            return;
        }
    };

    let pending = sheet.pending();
    if pending.is_empty() {
        return;
    }

    let profile = match state.storage.get_profile(phone).await {
        Ok(profile) => profile,
        Err(e) => {
            error!("Profile load failed for {}: {}", phone, e);
            return;
        }
    };

    let body = messages::goal_checkin(
        profile.language,
        &profile.assistant_name,
        &format_pending(&pending),
    );
    if let Err(e) = state.twilio.send_whatsapp(phone, &body).await {
        error!("Goal check-in to {} failed: {}", phone, e);
    }
}
