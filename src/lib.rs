//! Dost - WhatsApp personal assistant service
//!
//! A Twilio-backed WhatsApp bot that answers in Hindi or English, sets real
//! reminders (with voice calls for the important ones), tracks daily goals,
//! finds recipes, reads and writes Google Calendar, and turns voice notes
//! into scheduled reminders.

/// Assistant domain logic (intents, reminders, goals, recipes, calendar)
pub mod assistant;
/// Webhook server, handlers and proactive messaging
pub mod bot;
/// Configuration management
pub mod config;
/// LLM providers and client
pub mod llm;
/// Tokio-native job scheduler
pub mod scheduler;
/// Storage layer (R2/S3)
pub mod storage;
/// Twilio REST client and TwiML builder
pub mod twilio;
/// Text processing utilities
pub mod utils;
