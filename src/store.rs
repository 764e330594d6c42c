use crate::dates::normalize_date_format;
use crate::errors::AppResult;
use crate::models::{Activity, Profile};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const JOINED_ACTIVITIES_KEY: &str = "joinedActivities";
pub const PROFILE_KEY: &str = "profileData";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }
}

/// The `try_*` operations report failures. The plain operations never do:
/// they log and fall back to an empty read or a skipped write, so callers
/// observe failure only as unchanged state.
#[derive(Clone)]
pub struct ActivityStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ActivityStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn try_save(&self, mut activity: Activity) -> AppResult<bool> {
        activity.date = normalize_date_format(&activity.date);
        let mut activities = self.try_load_all().await?;
        if activities.iter().any(|existing| existing.id == activity.id) {
            return Ok(false);
        }
        activities.push(activity);
        self.write_activities(&activities).await?;
        Ok(true)
    }

    pub async fn try_remove(&self, activity_id: &str) -> AppResult<bool> {
        let activities = self.try_load_all().await?;
        let before = activities.len();
        let remaining = activities
            .into_iter()
            .filter(|activity| activity.id != activity_id)
            .collect::<Vec<_>>();
        self.write_activities(&remaining).await?;
        Ok(remaining.len() != before)
    }

    pub async fn try_load_all(&self) -> AppResult<Vec<Activity>> {
        let Some(raw) = self.kv.get(JOINED_ACTIVITIES_KEY).await? else {
            return Ok(Vec::new());
        };
        let members = serde_json::from_str::<Option<Vec<serde_json::Value>>>(&raw)?.unwrap_or_default();
        Ok(members
            .into_iter()
            .filter_map(|member| match serde_json::from_value::<Activity>(member) {
                Ok(activity) => Some(activity),
                Err(error) => {
                    tracing::warn!(error = %error, "skipping unreadable joined activity");
                    None
                }
            })
            .collect())
    }

    pub async fn try_is_joined(&self, activity_id: &str) -> AppResult<bool> {
        let activities = self.try_load_all().await?;
        Ok(activities.iter().any(|activity| activity.id == activity_id))
    }

    pub async fn try_clear_all(&self) -> AppResult<()> {
        self.kv.remove(JOINED_ACTIVITIES_KEY).await
    }

    pub async fn save(&self, activity: Activity) {
        let activity_id = activity.id.clone();
        match self.try_save(activity).await {
            Ok(true) => tracing::debug!(activity_id = %activity_id, "joined activity saved"),
            Ok(false) => tracing::debug!(activity_id = %activity_id, "activity already joined"),
            Err(error) => tracing::error!(activity_id = %activity_id, error = %error, "saving joined activity failed"),
        }
    }

    pub async fn remove(&self, activity_id: &str) {
        if let Err(error) = self.try_remove(activity_id).await {
            tracing::error!(activity_id = %activity_id, error = %error, "removing joined activity failed");
        }
    }

    pub async fn load_all(&self) -> Vec<Activity> {
        match self.try_load_all().await {
            Ok(activities) => {
                tracing::debug!(count = activities.len(), "loaded joined activities");
                activities
            }
            Err(error) => {
                tracing::error!(error = %error, "loading joined activities failed");
                Vec::new()
            }
        }
    }

    pub async fn is_joined(&self, activity_id: &str) -> bool {
        self.try_is_joined(activity_id).await.unwrap_or_else(|error| {
            tracing::error!(activity_id = %activity_id, error = %error, "checking joined activity failed");
            false
        })
    }

    pub async fn clear_all(&self) {
        match self.try_clear_all().await {
            Ok(()) => tracing::info!("cleared joined activities"),
            Err(error) => tracing::error!(error = %error, "clearing joined activities failed"),
        }
    }

    pub async fn try_save_profile(&self, profile: &Profile) -> AppResult<()> {
        let raw = serde_json::to_string(profile)?;
        self.kv.set(PROFILE_KEY, &raw).await
    }

    pub async fn try_load_profile(&self) -> AppResult<Option<Profile>> {
        match self.kv.get(PROFILE_KEY).await? {
            Some(raw) => Ok(serde_json::from_str::<Option<Profile>>(&raw)?),
            None => Ok(None),
        }
    }

    pub async fn try_update_profile(&self, update: Profile) -> AppResult<Profile> {
        let mut merged = self.try_load_profile().await?.unwrap_or_default();
        merged.extend(update);
        self.try_save_profile(&merged).await?;
        Ok(merged)
    }

    pub async fn try_clear_profile(&self) -> AppResult<()> {
        self.kv.remove(PROFILE_KEY).await
    }

    pub async fn save_profile(&self, profile: &Profile) {
        match self.try_save_profile(profile).await {
            Ok(()) => tracing::info!("profile saved"),
            Err(error) => tracing::error!(error = %error, "saving profile failed"),
        }
    }

    pub async fn load_profile(&self) -> Option<Profile> {
        self.try_load_profile().await.unwrap_or_else(|error| {
            tracing::error!(error = %error, "loading profile failed");
            None
        })
    }

    pub async fn update_profile(&self, update: Profile) {
        match self.try_update_profile(update).await {
            Ok(_) => tracing::info!("profile updated"),
            Err(error) => tracing::error!(error = %error, "updating profile failed"),
        }
    }

    pub async fn clear_profile(&self) {
        match self.try_clear_profile().await {
            Ok(()) => tracing::info!("profile cleared"),
            Err(error) => tracing::error!(error = %error, "clearing profile failed"),
        }
    }

    async fn write_activities(&self, activities: &[Activity]) -> AppResult<()> {
        let raw = serde_json::to_string(activities)?;
        self.kv.set(JOINED_ACTIVITIES_KEY, &raw).await
    }
}
