//! Assistant domain logic: intents, reminders, goals, recipes, calendar,
//! and the bilingual reply templates.

pub mod calendar;
pub mod goals;
pub mod intent;
pub mod messages;
pub mod recipes;
pub mod reminders;
