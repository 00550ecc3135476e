//! Webhook server layer: axum routes, Twilio form handling, intent
//! dispatch, reminder delivery and proactive sweeps.

pub mod dedup;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod messaging;
pub mod proactive;
pub mod routes;

pub use dedup::DedupCache;

use crate::assistant::calendar::CalendarClient;
use crate::assistant::recipes::RecipeClient;
use crate::config::Settings;
use crate::llm::LlmClient;
use crate::scheduler::Scheduler;
use crate::storage::R2Storage;
use crate::twilio::TwilioClient;
use std::sync::Arc;

/// Shared handler state; everything the webhook and scheduled jobs touch
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub storage: Arc<R2Storage>,
    pub twilio: Arc<TwilioClient>,
    pub llm: Arc<LlmClient>,
    /// Present only when Google Calendar credentials are configured
    pub calendar: Option<Arc<CalendarClient>>,
    pub recipes: Arc<RecipeClient>,
    pub scheduler: Scheduler,
    pub dedup: Arc<DedupCache>,
}
