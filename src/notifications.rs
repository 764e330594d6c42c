use crate::errors::AppResult;
use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderKind {
    MorningOf,
    HourBefore,
    FollowUp,
}

impl ReminderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MorningOf => "morning-of",
            Self::HourBefore => "hour-before",
            Self::FollowUp => "follow-up",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::MorningOf => "Today's Activity Reminder",
            Self::HourBefore => "Upcoming Activity",
            Self::FollowUp => "How did it go?",
        }
    }

    fn body(self) -> &'static str {
        match self {
            Self::MorningOf => "You have an activity today! Get ready!",
            Self::HourBefore => "Your activity starts in 1 hour!",
            Self::FollowUp => "How was your activity? Tap to rate and share your experience!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub activity_id: String,
    pub kind: ReminderKind,
    pub title: String,
    pub body: String,
    pub fire_at: NaiveDateTime,
    pub sound: bool,
}

impl Reminder {
    fn new(activity_id: &str, kind: ReminderKind, fire_at: NaiveDateTime) -> Self {
        Self {
            activity_id: activity_id.to_string(),
            kind,
            title: kind.title().to_string(),
            body: kind.body().to_string(),
            fire_at,
            sound: true,
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.activity_id, self.kind.as_str(), self.fire_at)
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn schedule_at(&self, reminder: &Reminder) -> AppResult<()>;
}

/// Each candidate is gated on its own fire time being strictly after `now`:
/// 08:00 on the day of the activity, one hour before the start and three
/// hours after it.
pub fn plan_reminders(activity_id: &str, start: NaiveDateTime, now: NaiveDateTime) -> Vec<Reminder> {
    let candidates = [
        (ReminderKind::MorningOf, start.date().and_hms_opt(8, 0, 0)),
        (ReminderKind::HourBefore, start.checked_sub_signed(Duration::hours(1))),
        (ReminderKind::FollowUp, start.checked_add_signed(Duration::hours(3))),
    ];

    candidates
        .into_iter()
        .filter_map(|(kind, fire_at)| fire_at.map(|fire_at| (kind, fire_at)))
        .filter(|(_, fire_at)| *fire_at > now)
        .map(|(kind, fire_at)| Reminder::new(activity_id, kind, fire_at))
        .collect()
}

#[derive(Clone)]
pub struct ReminderScheduler {
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl ReminderScheduler {
    pub fn new(sink: Arc<dyn NotificationSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    pub async fn schedule(&self, activity_id: &str, start: NaiveDateTime) -> Vec<Reminder> {
        let now = self.clock.now();
        let mut accepted = Vec::new();
        for reminder in plan_reminders(activity_id, start, now) {
            match self.sink.schedule_at(&reminder).await {
                Ok(()) => {
                    tracing::debug!(
                        activity_id = %activity_id,
                        kind = reminder.kind.as_str(),
                        fire_at = %reminder.fire_at,
                        "reminder scheduled"
                    );
                    accepted.push(reminder);
                }
                Err(error) => {
                    tracing::warn!(
                        activity_id = %activity_id,
                        kind = reminder.kind.as_str(),
                        error = %error,
                        "scheduling reminder failed"
                    );
                }
            }
        }
        accepted
    }
}
