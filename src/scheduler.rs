use crate::errors::{AppError, AppResult};
use crate::notifications::{NotificationSink, Reminder};
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{Mutex, Notify};
use tokio::time::Duration;

const MAX_IDLE_DELAY: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct QueuedReminder {
    pub reminder: Reminder,
    pub queued_at: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
}

pub type DeliveryFuture = Pin<Box<dyn Future<Output = bool> + Send>>;
pub type Delivery = Arc<dyn Fn(Reminder) -> DeliveryFuture + Send + Sync>;

/// Reminders are never cancelled once queued.
#[derive(Clone)]
pub struct NotificationQueue {
    queue: Arc<Mutex<Vec<QueuedReminder>>>,
    notify: Arc<Notify>,
    delivery: Arc<RwLock<Option<Delivery>>>,
    max_queue_size: usize,
}

impl NotificationQueue {
    pub fn new(max_queue_size: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            delivery: Arc::new(RwLock::new(None)),
            max_queue_size,
        }
    }

    pub fn set_delivery(&self, delivery: Delivery) {
        let mut writer = self.delivery.write().unwrap_or_else(PoisonError::into_inner);
        *writer = Some(delivery);
    }

    /// Queues `reminder`. A reminder with the same key already waiting is kept
    /// and the new one dropped.
    pub async fn enqueue(&self, reminder: Reminder) -> AppResult<()> {
        let fire_at = to_utc(&reminder)?;
        {
            let mut queue = self.queue.lock().await;
            let key = reminder.key();
            if queue.iter().any(|queued| queued.reminder.key() == key) {
                return Ok(());
            }
            if queue.len() >= self.max_queue_size {
                return Err(AppError::Internal(format!(
                    "Notification queue capacity exceeded (max {}).",
                    self.max_queue_size
                )));
            }
            queue.push(QueuedReminder {
                reminder,
                queued_at: Utc::now(),
                fire_at,
            });
        }
        self.notify.notify_one();
        Ok(())
    }

    pub async fn pending(&self) -> Vec<Reminder> {
        let queue = self.queue.lock().await;
        queue.iter().map(|queued| queued.reminder.clone()).collect()
    }

    pub fn start(&self) {
        let queue = self.clone();
        tokio::spawn(async move {
            queue.run_loop().await;
        });
    }

    async fn run_loop(self) {
        loop {
            self.notify.notified().await;
            loop {
                let (maybe_due, next_delay) = self.pick_next_due().await;
                let Some(queued) = maybe_due else {
                    if let Some(delay) = next_delay {
                        let notify = self.notify.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            notify.notify_one();
                        });
                    }
                    break;
                };

                let queue = self.clone();
                tokio::spawn(async move {
                    let key = queued.reminder.key();
                    if !queue.deliver(queued.reminder).await {
                        tracing::warn!(reminder = %key, "reminder delivery failed");
                    }
                });
            }
        }
    }

    async fn deliver(&self, reminder: Reminder) -> bool {
        let delivery = self
            .delivery
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match delivery {
            Some(delivery) => delivery(reminder).await,
            None => {
                tracing::info!(
                    activity_id = %reminder.activity_id,
                    title = %reminder.title,
                    body = %reminder.body,
                    "reminder due"
                );
                true
            }
        }
    }

    async fn pick_next_due(&self) -> (Option<QueuedReminder>, Option<Duration>) {
        let mut queue = self.queue.lock().await;
        if queue.is_empty() {
            return (None, None);
        }

        let now = Utc::now();
        let due_index = queue
            .iter()
            .enumerate()
            .filter(|(_, queued)| queued.fire_at <= now)
            .min_by_key(|(_, queued)| (queued.fire_at, queued.queued_at))
            .map(|(index, _)| index);

        match due_index {
            Some(index) => (Some(queue.remove(index)), None),
            None => {
                let delay = queue.iter().map(|queued| queued.fire_at).min().map(|at| {
                    let diff = at.signed_duration_since(now).num_milliseconds();
                    Duration::from_millis(diff.max(0) as u64).min(MAX_IDLE_DELAY)
                });
                (None, delay)
            }
        }
    }
}

#[async_trait]
impl NotificationSink for NotificationQueue {
    async fn schedule_at(&self, reminder: &Reminder) -> AppResult<()> {
        self.enqueue(reminder.clone()).await
    }
}

fn to_utc(reminder: &Reminder) -> AppResult<DateTime<Utc>> {
    Local
        .from_local_datetime(&reminder.fire_at)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "fire time {} does not exist in the local time zone",
                reminder.fire_at
            ))
        })
}
