use crate::errors::AppResult;
use crate::models::{Activity, ActivityDraft};
use crate::notifications::{Reminder, ReminderScheduler};
use crate::store::ActivityStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Joined { reminders: Vec<Reminder> },
    Left,
}

/// A toggle runs in two phases: a fallible local edit written through to the
/// store, then an unconditional reload that replaces the in-memory set with
/// what the store holds. The public surface never returns errors; callers
/// re-query [`JoinCoordinator::is_joined`] to learn the outcome.
pub struct JoinCoordinator {
    store: ActivityStore,
    reminders: ReminderScheduler,
    joined: RwLock<Vec<Activity>>,
    loading: AtomicBool,
}

impl JoinCoordinator {
    pub fn new(store: ActivityStore, reminders: ReminderScheduler) -> Self {
        Self {
            store,
            reminders,
            joined: RwLock::new(Vec::new()),
            loading: AtomicBool::new(true),
        }
    }

    pub async fn initialize(&self) -> Vec<Activity> {
        let activities = self.reload().await;
        self.loading.store(false, Ordering::SeqCst);
        tracing::info!(count = activities.len(), "joined activities loaded");
        activities
    }

    pub async fn reload(&self) -> Vec<Activity> {
        let activities = self.store.load_all().await;
        *self.write() = activities.clone();
        activities
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_joined(&self, activity_id: &str) -> bool {
        self.read().iter().any(|activity| activity.id == activity_id)
    }

    pub fn joined_activities(&self) -> Vec<Activity> {
        self.read().clone()
    }

    pub fn store(&self) -> &ActivityStore {
        &self.store
    }

    pub async fn toggle(&self, activity: &Activity) {
        match self.apply(activity).await {
            Ok(Transition::Joined { reminders }) => {
                tracing::info!(activity_id = %activity.id, reminders = reminders.len(), "joined activity");
            }
            Ok(Transition::Left) => {
                tracing::info!(activity_id = %activity.id, "left activity");
            }
            Err(error) => {
                tracing::error!(activity_id = %activity.id, error = %error, "toggling join state failed");
            }
        }
        self.reload().await;
    }

    pub async fn create_activity(&self, draft: ActivityDraft, creator: &str) -> AppResult<Activity> {
        let activity = Activity::from_draft(draft, creator)?;
        self.toggle(&activity).await;
        Ok(activity)
    }

    async fn apply(&self, activity: &Activity) -> AppResult<Transition> {
        if self.is_joined(&activity.id) {
            self.write().retain(|joined| joined.id != activity.id);
            self.store.try_remove(&activity.id).await?;
            return Ok(Transition::Left);
        }

        let joined = Activity {
            joined: true,
            ..activity.clone()
        };
        self.write().push(joined.clone());
        self.store.try_save(joined.clone()).await?;

        let reminders = match joined.start_time() {
            Some(start) => self.reminders.schedule(&joined.id, start).await,
            None => {
                tracing::warn!(
                    activity_id = %joined.id,
                    date = %joined.date,
                    time = %joined.time,
                    "activity start is not a valid date and time; no reminders scheduled"
                );
                Vec::new()
            }
        };
        Ok(Transition::Joined { reminders })
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Activity>> {
        self.joined.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Activity>> {
        self.joined.write().unwrap_or_else(PoisonError::into_inner)
    }
}
