use crate::assistant::messages::Language;
use crate::config::Settings;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    #[error("S3 put error: {0}")]
    S3Put(String),
    #[error("S3 list error: {0}")]
    S3List(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-user profile and preferences
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    /// Preferred reply language, updated from incoming messages
    pub language: Language,
    /// IANA timezone name; the assistant operates in IST either way
    pub timezone: String,
    /// What the user is called in greetings
    pub user_name: String,
    /// What the user named the assistant ("Your name is Jarvis")
    pub assistant_name: String,
    pub created_at: DateTime<Utc>,
    /// Last inbound message time, gates proactive check-ins
    pub last_interaction: Option<DateTime<Utc>>,
    /// Whether the 7 AM morning briefing is enabled
    pub morning_briefing: bool,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            language: Language::En,
            timezone: "Asia/Kolkata".to_string(),
            user_name: "Friend".to_string(),
            assistant_name: "Assistant".to_string(),
            created_at: Utc::now(),
            last_interaction: None,
            morning_briefing: false,
        }
    }
}

impl UserProfile {
    /// Whether the user has given the assistant a custom name
    #[must_use]
    pub fn has_custom_name(&self) -> bool {
        self.assistant_name != "Assistant"
    }
}

/// Lifecycle of a scheduled reminder
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ReminderStatus {
    Pending,
    Sent,
    Done,
    Snoozed,
}

/// A scheduled reminder persisted to the per-user ledger
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reminder {
    /// Job id, `reminder_{phone}_{unix_ts}`
    pub id: String,
    pub task: String,
    /// Due time in the user's local offset (IST)
    pub due: DateTime<FixedOffset>,
    pub language: Language,
    pub status: ReminderStatus,
    /// Whether delivery should also place a voice call (medicine reminders)
    pub call_worthy: bool,
}

/// One daily goal
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Goal {
    pub text: String,
    pub completed: bool,
    pub added_at: DateTime<Utc>,
}

/// The day's goal sheet for a user
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoalSheet {
    /// Date the sheet belongs to, `YYYY-MM-DD` in IST
    pub date: String,
    pub goals: Vec<Goal>,
}

impl GoalSheet {
    /// Texts of goals not yet completed
    #[must_use]
    pub fn pending(&self) -> Vec<&str> {
        self.goals
            .iter()
            .filter(|g| !g.completed)
            .map(|g| g.text.as_str())
            .collect()
    }
}

/// Chat message stored in per-user history for LLM context
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

pub struct R2Storage {
    client: Client,
    bucket: String,
}

impl R2Storage {
    /// Create a new R2 storage instance
    ///
    /// # Errors
    ///
    /// Returns an error if R2 configuration is missing.
    pub async fn new(settings: &Settings) -> Result<Self, StorageError> {
        let endpoint_url = settings
            .r2_endpoint_url
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ENDPOINT_URL is missing".into()))?;
        let access_key = settings
            .r2_access_key_id
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ACCESS_KEY_ID is missing".into()))?;
        let secret_key = settings
            .r2_secret_access_key
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_SECRET_ACCESS_KEY is missing".into()))?;
        let bucket = settings
            .r2_bucket_name
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_BUCKET_NAME is missing".into()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "r2-storage");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: bucket.clone(),
        })
    }

    /// Save data as JSON to R2
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization or S3 upload fails.
    pub async fn save_json<T: serde::Serialize + Sync>(
        &self,
        key: &str,
        data: &T,
    ) -> Result<(), StorageError> {
        let body = serde_json::to_string_pretty(data)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.into_bytes()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        Ok(())
    }

    /// Load data from JSON in R2
    ///
    /// # Errors
    ///
    /// Returns an error if S3 download or JSON deserialization fails.
    pub async fn load_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?;
                let json_data = serde_json::from_slice(&data.into_bytes())?;
                Ok(Some(json_data))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StorageError::S3Get(Box::new(e))),
        }
    }

    /// Delete object from R2
    ///
    /// # Errors
    ///
    /// Returns an error if S3 deletion fails.
    pub async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::S3Put(e.to_string()))?;

        Ok(())
    }

    // --- Profile functions ---

    /// Get the user's profile, creating the default on first contact
    ///
    /// # Errors
    ///
    /// Returns an error if loading or first-write fails.
    pub async fn get_profile(&self, phone: &str) -> Result<UserProfile, StorageError> {
        if let Some(profile) = self.load_json(&profile_key(phone)).await? {
            return Ok(profile);
        }
        let profile = UserProfile::default();
        self.save_json(&profile_key(phone), &profile).await?;
        Ok(profile)
    }

    /// Persist the user's profile
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub async fn update_profile(
        &self,
        phone: &str,
        profile: &UserProfile,
    ) -> Result<(), StorageError> {
        self.save_json(&profile_key(phone), profile).await
    }

    /// Atomically modify the profile using a closure.
    ///
    /// # Errors
    ///
    /// Returns an error if modification or saving fails.
    pub async fn modify_profile<F>(&self, phone: &str, modifier: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let mut profile = self.get_profile(phone).await?;
        modifier(&mut profile);
        self.update_profile(phone, &profile).await
    }

    // --- Reminder ledger ---

    /// Load the user's reminder ledger
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn get_reminders(&self, phone: &str) -> Result<Vec<Reminder>, StorageError> {
        Ok(self
            .load_json(&reminders_key(phone))
            .await?
            .unwrap_or_default())
    }

    /// Append a reminder to the ledger
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub async fn add_reminder(&self, phone: &str, reminder: Reminder) -> Result<(), StorageError> {
        let mut reminders = self.get_reminders(phone).await?;
        reminders.push(reminder);
        self.save_json(&reminders_key(phone), &reminders).await
    }

    /// Modify a reminder by id; no-op if the id is not in the ledger
    ///
    /// # Errors
    ///
    /// Returns an error if loading or saving fails.
    pub async fn modify_reminder<F>(
        &self,
        phone: &str,
        reminder_id: &str,
        modifier: F,
    ) -> Result<Option<Reminder>, StorageError>
    where
        F: FnOnce(&mut Reminder),
    {
        let mut reminders = self.get_reminders(phone).await?;
        let Some(reminder) = reminders.iter_mut().find(|r| r.id == reminder_id) else {
            return Ok(None);
        };
        modifier(reminder);
        let updated = reminder.clone();
        self.save_json(&reminders_key(phone), &reminders).await?;
        Ok(Some(updated))
    }

    /// The most recently sent reminder, for "done"/"snooze" replies
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn last_sent_reminder(&self, phone: &str) -> Result<Option<Reminder>, StorageError> {
        let reminders = self.get_reminders(phone).await?;
        Ok(reminders
            .into_iter()
            .filter(|r| r.status == ReminderStatus::Sent)
            .max_by_key(|r| r.due))
    }

    // --- Goal sheet ---

    /// Load the user's goal sheet
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails.
    pub async fn get_goals(&self, phone: &str) -> Result<GoalSheet, StorageError> {
        Ok(self.load_json(&goals_key(phone)).await?.unwrap_or_default())
    }

    /// Persist the user's goal sheet
    ///
    /// # Errors
    ///
    /// Returns an error if saving fails.
    pub async fn update_goals(&self, phone: &str, sheet: &GoalSheet) -> Result<(), StorageError> {
        self.save_json(&goals_key(phone), sheet).await
    }

    // --- Chat history ---

    /// Save message to chat history
    ///
    /// # Errors
    ///
    /// Returns an error if history loading or saving fails.
    pub async fn save_message(
        &self,
        phone: &str,
        role: String,
        content: String,
    ) -> Result<(), StorageError> {
        let key = history_key(phone);
        let mut history: Vec<ChatMessage> = self.load_json(&key).await?.unwrap_or_default();
        history.push(ChatMessage { role, content });
        self.save_json(&key, &history).await
    }

    /// Get chat history for a user, most recent `limit` entries
    ///
    /// # Errors
    ///
    /// Returns an error if history loading fails.
    pub async fn get_chat_history(
        &self,
        phone: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StorageError> {
        let history: Vec<ChatMessage> = self
            .load_json(&history_key(phone))
            .await?
            .unwrap_or_default();
        let start = history.len().saturating_sub(limit);
        Ok(history[start..].to_vec())
    }

    // --- User enumeration (proactive sweeps) ---

    /// List every stored user id (phone number) under the `users/` prefix
    ///
    /// # Errors
    ///
    /// Returns an error if the listing request fails.
    pub async fn list_user_ids(&self) -> Result<Vec<String>, StorageError> {
        let mut users = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix("users/")
                .delimiter("/");
            if let Some(token) = continuation {
                req = req.continuation_token(token);
            }

            let output = req
                .send()
                .await
                .map_err(|e| StorageError::S3List(e.to_string()))?;

            for common in output.common_prefixes() {
                if let Some(prefix) = common.prefix() {
                    // "users/{phone}/" -> "{phone}"
                    let id = prefix
                        .trim_start_matches("users/")
                        .trim_end_matches('/')
                        .to_string();
                    if !id.is_empty() {
                        users.push(id);
                    }
                }
            }

            match output.next_continuation_token() {
                Some(token) => continuation = Some(token.to_string()),
                None => break,
            }
        }

        Ok(users)
    }

    /// Check connection to R2 storage
    ///
    /// # Errors
    ///
    /// Returns an error if listing buckets fails.
    pub async fn check_connection(&self) -> Result<(), String> {
        match self.client.list_buckets().send().await {
            Ok(_) => {
                info!("Successfully connected to R2 storage.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("R2 connectivity test failed: {e:#?}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

#[must_use]
pub fn profile_key(phone: &str) -> String {
    format!("users/{phone}/profile.json")
}

#[must_use]
pub fn reminders_key(phone: &str) -> String {
    format!("users/{phone}/reminders.json")
}

#[must_use]
pub fn goals_key(phone: &str) -> String {
    format!("users/{phone}/goals.json")
}

#[must_use]
pub fn history_key(phone: &str) -> String {
    format!("users/{phone}/history.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_keys() {
        assert_eq!(
            profile_key("whatsapp:+919876543210"),
            "users/whatsapp:+919876543210/profile.json"
        );
        assert_eq!(
            reminders_key("whatsapp:+919876543210"),
            "users/whatsapp:+919876543210/reminders.json"
        );
        assert_eq!(
            goals_key("whatsapp:+919876543210"),
            "users/whatsapp:+919876543210/goals.json"
        );
    }

    #[test]
    fn test_default_profile() {
        let profile = UserProfile::default();
        assert_eq!(profile.user_name, "Friend");
        assert_eq!(profile.assistant_name, "Assistant");
        assert_eq!(profile.timezone, "Asia/Kolkata");
        assert!(!profile.has_custom_name());
        assert!(!profile.morning_briefing);
    }

    #[test]
    fn test_goal_sheet_pending() {
        let sheet = GoalSheet {
            date: "2025-03-01".to_string(),
            goals: vec![
                Goal {
                    text: "study math".into(),
                    completed: true,
                    added_at: Utc::now(),
                },
                Goal {
                    text: "exercise".into(),
                    completed: false,
                    added_at: Utc::now(),
                },
            ],
        };
        assert_eq!(sheet.pending(), vec!["exercise"]);
    }
}
