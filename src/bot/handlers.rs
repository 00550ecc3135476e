//! Webhook handlers: inbound message dispatch, voice-note processing,
//! reminder-call DTMF callbacks, health and the manual briefing trigger.

use crate::assistant::messages::{self, Language};
use crate::assistant::{calendar, goals, intent, recipes, reminders};
use crate::bot::error::HttpError;
use crate::bot::forms::{CallResponse, InboundMessage};
use crate::bot::{messaging, proactive, AppState};
use crate::config::{ist, CALL_SNOOZE_MINUTES, CHAT_HISTORY_LIMIT};
use crate::llm::Message as LlmMessage;
use crate::twilio::twiml::VoiceResponse;
use crate::utils::format_whatsapp;
use anyhow::{Context, Result};
use axum::extract::{Form, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

/// `POST /webhook` - inbound WhatsApp messages
pub async fn whatsapp_webhook(
    State(state): State<AppState>,
    Form(form): Form<InboundMessage>,
) -> Result<Json<Value>, HttpError> {
    if form.from.is_empty() {
        return Err(HttpError::BadRequest("missing From".into()));
    }

    // Twilio retries deliveries it considers failed; process each SID once
    if !state.dedup.first_delivery(&form.message_sid).await {
        return Ok(Json(json!({ "status": "success" })));
    }

    info!(
        "Received from {}: {}",
        form.from,
        if form.body.is_empty() {
            "<media>"
        } else {
            form.body.as_str()
        }
    );

    match process_message(&state, &form).await {
        Ok(()) => Ok(Json(json!({ "status": "success" }))),
        Err(e) => Err(HttpError::Internal(format!("{e:#}"))),
    }
}

async fn process_message(state: &AppState, form: &InboundMessage) -> Result<()> {
    let phone = form.from.as_str();

    let mut profile = state
        .storage
        .get_profile(phone)
        .await
        .context("loading profile")?;
    profile.last_interaction = Some(Utc::now());

    // The reply language follows the language of this message
    if !form.body.is_empty() {
        profile.language = Language::detect(&form.body);
    }
    state
        .storage
        .update_profile(phone, &profile)
        .await
        .context("updating profile")?;

    if form.has_media() && form.body.is_empty() {
        return handle_voice_note(state, form, &profile).await;
    }

    let reply = dispatch_text(state, phone, &form.body, &profile).await;
    send_reply(state, phone, &reply).await
}

async fn send_reply(state: &AppState, phone: &str, reply: &str) -> Result<()> {
    state
        .twilio
        .send_whatsapp(phone, &format_whatsapp(reply))
        .await
        .context("sending reply")
}

/// Voice-note flow: ack, download, transcribe, extract reminders, schedule.
async fn handle_voice_note(
    state: &AppState,
    form: &InboundMessage,
    profile: &crate::storage::UserProfile,
) -> Result<()> {
    let phone = form.from.as_str();
    let lang = profile.language;

    send_reply(state, phone, &messages::voice_received(lang)).await?;

    let media_url = form
        .media_url
        .as_deref()
        .context("media message without MediaUrl0")?;
    let audio = match state.twilio.download_media(media_url).await {
        Ok(audio) => audio,
        Err(e) => {
            error!("Media download failed: {}", e);
            return send_reply(state, phone, &messages::voice_failed(lang)).await;
        }
    };

    let transcript = match state
        .llm
        .transcribe_voice_note(audio.to_vec(), form.media_mime())
        .await
    {
        Ok(transcript) => transcript,
        Err(e) => {
            error!("Transcription failed: {}", e);
            return send_reply(state, phone, &messages::voice_failed(lang)).await;
        }
    };

    // The speaker's language wins over the profile for this exchange
    let spoken_lang = Language::detect(&transcript);
    let now = Utc::now().with_timezone(&ist());
    let tasks = reminders::extract_tasks(&transcript, spoken_lang, now);

    if tasks.is_empty() {
        // Echo the transcript in the user's usual language so they can
        // correct it, translating when the note was spoken in the other one
        let echo = if spoken_lang == lang {
            transcript
        } else {
            match state.llm.translate(&transcript, lang).await {
                Ok(translated) => translated,
                Err(e) => {
                    warn!("Transcript translation failed: {}", e);
                    transcript
                }
            }
        };
        return send_reply(state, phone, &messages::voice_no_tasks(lang, &echo)).await;
    }

    let mut lines = Vec::new();
    for task in &tasks {
        messaging::schedule_reminder(state, phone, task, spoken_lang).await?;
        lines.push(format!("• {} - {}", task.task, task.due.format("%I:%M %p")));
    }

    send_reply(
        state,
        phone,
        &messages::voice_processed(spoken_lang, &lines.join("\n")),
    )
    .await
}

/// Route a text message by intent and produce the reply body
async fn dispatch_text(
    state: &AppState,
    phone: &str,
    text: &str,
    profile: &crate::storage::UserProfile,
) -> String {
    let lang = profile.language;

    match intent::detect(text, lang) {
        intent::Intent::Greeting => {
            if profile.has_custom_name() {
                messages::introduction(lang, &profile.assistant_name)
            } else {
                messages::welcome(lang)
            }
        }
        intent::Intent::SetName => handle_set_name(state, phone, text, lang).await,
        intent::Intent::Reminder => handle_reminder(state, phone, text, lang).await,
        intent::Intent::Snooze => handle_snooze(state, phone, lang).await,
        intent::Intent::Done => handle_done(state, phone, text, lang).await,
        intent::Intent::Goals => handle_goals(state, phone, text, lang).await,
        intent::Intent::Schedule => handle_schedule(state, lang).await,
        intent::Intent::Recipe => handle_recipe(state, text, lang).await,
        intent::Intent::CalendarAdd => handle_calendar_add(state, text, lang).await,
        intent::Intent::Briefing => handle_briefing(state, phone, text, lang).await,
        intent::Intent::Suggest => {
            let hour = chrono::Timelike::hour(&Utc::now().with_timezone(&ist()));
            messages::suggestions(lang, hour)
        }
        intent::Intent::Help => messages::help(lang),
        intent::Intent::Unknown => handle_unknown(state, phone, text, profile).await,
    }
}

async fn handle_set_name(state: &AppState, phone: &str, text: &str, lang: Language) -> String {
    let Some(name) = intent::extract_assistant_name(text, lang) else {
        return messages::name_prompt(lang);
    };

    match state
        .storage
        .modify_profile(phone, |p| p.assistant_name = name.clone())
        .await
    {
        Ok(()) => messages::name_set(lang, &name),
        Err(e) => {
            error!("Saving assistant name failed: {}", e);
            messages::name_prompt(lang)
        }
    }
}

async fn handle_reminder(state: &AppState, phone: &str, text: &str, lang: Language) -> String {
    let now = Utc::now().with_timezone(&ist());
    let Some(parsed) = reminders::parse_reminder(text, lang, now) else {
        return messages::reminder_time_missing(lang);
    };

    match messaging::schedule_reminder(state, phone, &parsed, lang).await {
        Ok(reminder) => messages::reminder_set(
            lang,
            &reminder.task,
            &reminder.due.format("%d/%m/%Y").to_string(),
            &reminder.due.format("%I:%M %p").to_string(),
        ),
        Err(e) => {
            error!("Scheduling reminder failed: {}", e);
            messages::reminder_time_missing(lang)
        }
    }
}

async fn handle_snooze(state: &AppState, phone: &str, lang: Language) -> String {
    match messaging::snooze_last_reminder(state, phone).await {
        Ok(Some(_)) => messages::reminder_snoozed(lang, crate::config::REPLY_SNOOZE_MINUTES),
        Ok(None) => messages::reminder_none_active(lang),
        Err(e) => {
            error!("Snooze failed: {}", e);
            messages::reminder_none_active(lang)
        }
    }
}

/// "done"-family replies complete goals when a sheet is active, otherwise
/// they complete the most recent reminder.
async fn handle_done(state: &AppState, phone: &str, text: &str, lang: Language) -> String {
    let mut sheet = match state.storage.get_goals(phone).await {
        Ok(sheet) => sheet,
        Err(e) => {
            error!("Loading goals failed: {}", e);
            return messages::no_goals_today(lang);
        }
    };

    match goals::apply_completion(&mut sheet, text) {
        goals::CompletionOutcome::NoGoals | goals::CompletionOutcome::NothingMatched
            if text.trim().to_lowercase() == "done" =>
        {
            match messaging::complete_last_reminder(state, phone).await {
                Ok(Some(_)) => messages::reminder_done(lang),
                Ok(None) => messages::reminder_none_active(lang),
                Err(e) => {
                    error!("Completing reminder failed: {}", e);
                    messages::reminder_none_active(lang)
                }
            }
        }
        goals::CompletionOutcome::NoGoals => messages::no_goals_today(lang),
        goals::CompletionOutcome::NothingMatched => messages::goal_nothing_matched(lang),
        outcome => {
            if let Err(e) = state.storage.update_goals(phone, &sheet).await {
                error!("Saving goals failed: {}", e);
            }
            match outcome {
                goals::CompletionOutcome::AllDone | goals::CompletionOutcome::Finished => {
                    messages::goals_all_done(lang)
                }
                goals::CompletionOutcome::Progress(pending) => {
                    let pending_refs: Vec<&str> = pending.iter().map(String::as_str).collect();
                    messages::goal_progress(lang, &goals::format_pending(&pending_refs))
                }
                _ => messages::goals_all_done(lang),
            }
        }
    }
}

async fn handle_goals(state: &AppState, phone: &str, text: &str, lang: Language) -> String {
    let parsed = goals::parse_goals(text, lang);
    if parsed.is_empty() {
        return messages::goals_prompt(lang);
    }

    let now = Utc::now().with_timezone(&ist());
    let sheet = goals::new_sheet(now.format("%Y-%m-%d").to_string(), parsed.clone());

    if let Err(e) = state.storage.update_goals(phone, &sheet).await {
        error!("Saving goals failed: {}", e);
        return messages::goals_prompt(lang);
    }
    if let Err(e) = messaging::schedule_goal_checkins(state, phone, now) {
        warn!("Scheduling goal check-ins failed: {}", e);
    }

    messages::goals_set(lang, &goals::format_goal_list(&parsed))
}

async fn handle_schedule(state: &AppState, lang: Language) -> String {
    let now = Utc::now().with_timezone(&ist());
    let schedule = match &state.calendar {
        Some(calendar) => match calendar.today_events().await {
            Ok(events) => calendar::format_schedule(&events, lang),
            Err(e) => {
                warn!("Calendar listing failed: {}", e);
                messages::no_events(lang)
            }
        },
        None => messages::no_events(lang),
    };

    let quote = messages::quote_of_the_day(lang, chrono::Datelike::day(&now));
    messages::morning_greeting(lang, &now.format("%d %B %Y").to_string(), &schedule, quote)
}

async fn handle_recipe(state: &AppState, text: &str, lang: Language) -> String {
    let query = recipes::extract_query(text, lang);
    if query.is_empty() {
        return recipes::query_prompt(lang);
    }

    match state.recipes.search(&query).await {
        Ok(Some(recipe)) => recipe,
        Ok(None) => recipes::builtin_recipe(&query, lang)
            .unwrap_or_else(|| recipes::not_found(&query, lang)),
        Err(e) => {
            warn!("Recipe search failed: {}", e);
            recipes::builtin_recipe(&query, lang)
                .unwrap_or_else(|| recipes::not_found(&query, lang))
        }
    }
}

async fn handle_calendar_add(state: &AppState, text: &str, lang: Language) -> String {
    let Some(client) = &state.calendar else {
        return messages::calendar_error(lang);
    };

    let now = Utc::now().with_timezone(&ist());
    let Some(event) = calendar::parse_command(text, lang, now) else {
        return messages::calendar_error(lang);
    };

    match client
        .create_event(&event.title, event.start, event.duration_minutes)
        .await
    {
        Ok(created) => messages::calendar_add(
            lang,
            &event.title,
            &event.start.format("%d/%m/%Y").to_string(),
            &event.start.format("%I:%M %p").to_string(),
            event.duration_minutes,
            created.html_link.as_deref().unwrap_or(""),
        ),
        Err(e) => {
            error!("Calendar insert failed: {}", e);
            messages::calendar_error(lang)
        }
    }
}

async fn handle_briefing(state: &AppState, phone: &str, text: &str, lang: Language) -> String {
    let lowered = text.to_lowercase();
    let wants_enable = ["enable", "start", "yes", "चालू", "हां"]
        .iter()
        .any(|w| lowered.contains(w));

    if !wants_enable {
        return messages::briefing_offer(lang);
    }

    match state
        .storage
        .modify_profile(phone, |p| p.morning_briefing = true)
        .await
    {
        Ok(()) => messages::briefing_enabled(lang),
        Err(e) => {
            error!("Enabling briefings failed: {}", e);
            messages::briefing_offer(lang)
        }
    }
}

/// Unmatched messages get a conversational LLM reply in the assistant
/// persona; LLM failure falls back to the welcome card.
async fn handle_unknown(
    state: &AppState,
    phone: &str,
    text: &str,
    profile: &crate::storage::UserProfile,
) -> String {
    let lang = profile.language;
    let persona = state.settings.system_message.clone().unwrap_or_else(|| {
        format!(
            "You are {name}, a warm personal assistant on WhatsApp for users in India. \
            Reply briefly in {language}. You can set reminders, track daily goals, \
            find recipes and manage the calendar when asked.",
            name = profile.assistant_name,
            language = match lang {
                Language::Hi => "Hindi",
                Language::En => "English",
            },
        )
    });

    let history = match state.storage.get_chat_history(phone, CHAT_HISTORY_LIMIT).await {
        Ok(history) => history
            .into_iter()
            .map(|m| LlmMessage {
                role: m.role,
                content: m.content,
            })
            .collect::<Vec<_>>(),
        Err(e) => {
            warn!("History load failed: {}", e);
            Vec::new()
        }
    };

    match state.llm.chat_reply(&persona, &history, text).await {
        Ok(reply) => {
            let save = async {
                state
                    .storage
                    .save_message(phone, "user".to_string(), text.to_string())
                    .await?;
                state
                    .storage
                    .save_message(phone, "assistant".to_string(), reply.clone())
                    .await
            };
            if let Err(e) = save.await {
                warn!("Saving chat history failed: {}", e);
            }
            reply
        }
        Err(e) => {
            warn!("LLM fallback reply failed: {}", e);
            messages::welcome(lang)
        }
    }
}

/// `POST /reminder-response` - DTMF digits from a reminder call, answered
/// with TwiML.
pub async fn reminder_response(
    State(state): State<AppState>,
    Form(form): Form<CallResponse>,
) -> Response {
    let phone = if form.to.is_empty() {
        None
    } else {
        Some(format!("whatsapp:{}", form.to))
    };

    let response = match form.digits.as_str() {
        "1" => {
            if let Some(phone) = &phone {
                if let Err(e) = messaging::complete_last_reminder(&state, phone).await {
                    warn!("Confirming reminder by call failed: {}", e);
                }
            }
            VoiceResponse::new().say("Thank you. Reminder confirmed.", Language::En)
        }
        "2" => {
            if let Some(phone) = &phone {
                if let Err(e) = snooze_from_call(&state, phone).await {
                    warn!("Snoozing reminder by call failed: {}", e);
                }
            }
            VoiceResponse::new().say("Reminder snoozed for 10 minutes.", Language::En)
        }
        _ => VoiceResponse::new().say("Invalid input. Goodbye.", Language::En),
    };

    (
        [(header::CONTENT_TYPE, "text/xml")],
        response.build(),
    )
        .into_response()
}

async fn snooze_from_call(state: &AppState, phone: &str) -> Result<()> {
    let Some(last) = state.storage.last_sent_reminder(phone).await? else {
        return Ok(());
    };
    messaging::snooze_reminder(state, phone, &last.id, CALL_SNOOZE_MINUTES).await?;
    Ok(())
}

/// `GET /health` - liveness plus scheduler stats
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "scheduler": state.scheduler.is_running(),
            "jobs": state.scheduler.job_count(),
            "suppressed_duplicates": state.dedup.duplicate_count(),
        },
    }))
}

/// `POST /briefing-trigger` - run the morning briefing sweep now (testing aid)
pub async fn briefing_trigger(State(state): State<AppState>) -> Json<Value> {
    proactive::run_morning_briefings(&state).await;
    Json(json!({ "status": "Morning briefings sent" }))
}
