use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use pickup_sports_lib::catalog::{find_seed_activity, seed_activities, ActivityFilter};
use pickup_sports_lib::config::AppConfig;
use pickup_sports_lib::db::Database;
use pickup_sports_lib::errors::AppResult;
use pickup_sports_lib::models::{Activity, ProfileDraft};
use pickup_sports_lib::notifications::{FixedClock, NotificationSink, Reminder, ReminderKind};
use pickup_sports_lib::store::{ActivityStore, KeyValueStore, MemoryKeyValueStore};
use pickup_sports_lib::App;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct CollectingSink {
    reminders: Mutex<Vec<Reminder>>,
}

#[async_trait]
impl NotificationSink for CollectingSink {
    async fn schedule_at(&self, reminder: &Reminder) -> AppResult<()> {
        self.reminders.lock().await.push(reminder.clone());
        Ok(())
    }
}

#[derive(Default)]
struct YieldingStore {
    inner: MemoryKeyValueStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for YieldingStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(current, Ordering::SeqCst);
        let value = self.inner.get(key).await;
        tokio::task::yield_now().await;
        value
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        tokio::task::yield_now().await;
        let result = self.inner.set(key, value).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key).await
    }
}

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .expect("valid time")
}

fn day_first(activity: &Activity) -> Activity {
    let parts = activity.date.split('-').collect::<Vec<_>>();
    Activity {
        date: format!("{}-{}-{}", parts[2], parts[1], parts[0]),
        ..activity.clone()
    }
}

#[tokio::test]
async fn joining_from_the_catalog_persists_and_reminds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database = Database::new(&dir.path().join("pickup.db")).expect("db");
    let sink = Arc::new(CollectingSink::default());
    let app = App::with_store(
        &AppConfig::default(),
        Arc::new(database),
        sink.clone(),
        Arc::new(FixedClock(at(15, 19))),
    )
    .await;

    let soccer = find_seed_activity("2").expect("seed activity");
    app.coordinator.toggle(&day_first(&soccer)).await;

    assert!(app.coordinator.is_joined("2"));
    let stored = app.store.load_all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].date, "2025-06-15");
    assert!(stored[0].joined);

    let reminders = sink.reminders.lock().await.clone();
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].kind, ReminderKind::FollowUp);
    assert_eq!(reminders[0].title, "How did it go?");
}

#[tokio::test]
async fn toggling_every_seed_twice_leaves_nothing_behind() {
    let app = App::with_store(
        &AppConfig::default(),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(CollectingSink::default()),
        Arc::new(FixedClock(at(1, 6))),
    )
    .await;

    let seed = seed_activities();
    for activity in &seed {
        app.coordinator.toggle(activity).await;
    }
    assert_eq!(app.coordinator.joined_activities().len(), seed.len());

    for activity in &seed {
        app.coordinator.toggle(activity).await;
    }
    assert!(app.coordinator.joined_activities().is_empty());
    assert!(app.store.load_all().await.is_empty());
}

#[tokio::test]
async fn concurrent_saves_of_one_id_collapse_to_one_copy() {
    let kv = Arc::new(YieldingStore::default());
    let store = ActivityStore::new(kv.clone());
    let activity = find_seed_activity("1").expect("seed activity");

    tokio::join!(store.save(activity.clone()), store.save(day_first(&activity)));
    assert_eq!(kv.peak.load(Ordering::SeqCst), 2);

    let stored = store.load_all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].date, "2025-06-14");
}

#[tokio::test]
async fn discovered_activities_report_join_state() {
    let app = App::with_store(
        &AppConfig::default(),
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(CollectingSink::default()),
        Arc::new(FixedClock(at(1, 6))),
    )
    .await;
    let seed = seed_activities();
    let filter = ActivityFilter {
        sport: Some("Padel".to_string()),
        ..ActivityFilter::default()
    };
    let padel = filter.apply(&seed);
    assert_eq!(padel.len(), 1);

    app.coordinator.toggle(padel[0]).await;
    let joined = seed
        .iter()
        .filter(|activity| app.coordinator.is_joined(&activity.id))
        .map(|activity| activity.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(joined, vec!["4"]);
}

#[tokio::test]
async fn profile_is_created_then_edited() {
    let store = ActivityStore::new(Arc::new(MemoryKeyValueStore::new()));
    let created = ProfileDraft {
        username: "sam".to_string(),
        email: "sam@example.com".to_string(),
        selected_sports: vec!["Tennis".to_string()],
        ..ProfileDraft::default()
    }
    .into_profile()
    .expect("profile");
    store.save_profile(&created).await;

    let mut edit = serde_json::Map::new();
    edit.insert("email".to_string(), serde_json::json!("sam@pickup.test"));
    store.update_profile(edit).await;

    let profile = store.load_profile().await.expect("profile");
    assert_eq!(profile["username"], serde_json::json!("sam"));
    assert_eq!(profile["email"], serde_json::json!("sam@pickup.test"));
    assert_eq!(profile["selectedSports"], serde_json::json!(["Tennis"]));
}
