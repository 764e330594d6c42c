use crate::dates::{compose_start, convert_to_calendar_format};
use crate::errors::{AppError, AppResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LATITUDE: f64 = 37.9838;
pub const DEFAULT_LONGITUDE: f64 = 23.7275;
pub const DEFAULT_MAX_PARTICIPANTS: u32 = 10;

/// Join state is a single flag in memory. On the wire it is written twice,
/// as `joined` and `isJoined`, so files written by older builds keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ActivityRecord", into = "ActivityRecord")]
pub struct Activity {
    pub id: String,
    pub name: String,
    pub description: String,
    pub sport: String,
    pub location: String,
    pub creator: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: String,
    pub time: String,
    pub max_participants: u32,
    pub joined_count: u32,
    pub distance: f64,
    pub joined: bool,
}

impl Activity {
    pub fn from_draft(draft: ActivityDraft, creator: &str) -> AppResult<Self> {
        let required = [
            ("name", &draft.name),
            ("sport", &draft.sport),
            ("location", &draft.location),
            ("date", &draft.date),
            ("time", &draft.time),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::InvalidInput(format!("{field} is required")));
        }

        let (latitude, longitude) = draft.coordinates.unwrap_or((DEFAULT_LATITUDE, DEFAULT_LONGITUDE));
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            description: draft.description,
            sport: draft.sport,
            location: draft.location,
            creator: creator.to_string(),
            latitude,
            longitude,
            date: draft.date,
            time: draft.time,
            max_participants: draft.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            joined_count: 1,
            distance: 0.0,
            joined: true,
        })
    }

    pub fn start_time(&self) -> Option<NaiveDateTime> {
        compose_start(&convert_to_calendar_format(&self.date), &self.time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub sport: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub max_participants: Option<u32>,
    pub coordinates: Option<(f64, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivityRecord {
    #[serde(default)]
    id: Option<RecordId>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "activity")]
    sport: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    creator: Option<String>,
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    max_participants: Option<u32>,
    #[serde(default)]
    joined_count: Option<u32>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    joined: Option<bool>,
    #[serde(default)]
    is_joined: Option<bool>,
}

impl TryFrom<ActivityRecord> for Activity {
    type Error = String;

    fn try_from(record: ActivityRecord) -> Result<Self, Self::Error> {
        let id = match record.id {
            Some(RecordId::Text(id)) => id,
            Some(RecordId::Number(id)) => id.to_string(),
            None => return Err("activity record has no id".to_string()),
        };
        Ok(Self {
            id,
            name: record.name.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            sport: record.sport.unwrap_or_default(),
            location: record.location.unwrap_or_default(),
            creator: record.creator.unwrap_or_default(),
            latitude: record.latitude.unwrap_or_default(),
            longitude: record.longitude.unwrap_or_default(),
            date: record.date.unwrap_or_default(),
            time: record.time.unwrap_or_default(),
            max_participants: record.max_participants.unwrap_or_default(),
            joined_count: record.joined_count.unwrap_or_default(),
            distance: record.distance.unwrap_or_default(),
            joined: record.joined.unwrap_or(false) || record.is_joined.unwrap_or(false),
        })
    }
}

impl From<Activity> for ActivityRecord {
    fn from(activity: Activity) -> Self {
        Self {
            id: Some(RecordId::Text(activity.id)),
            name: Some(activity.name),
            description: Some(activity.description),
            sport: Some(activity.sport),
            location: Some(activity.location),
            creator: Some(activity.creator),
            latitude: Some(activity.latitude),
            longitude: Some(activity.longitude),
            date: Some(activity.date),
            time: Some(activity.time),
            max_participants: Some(activity.max_participants),
            joined_count: Some(activity.joined_count),
            distance: Some(activity.distance),
            joined: Some(activity.joined),
            is_joined: Some(activity.joined),
        }
    }
}

pub type Profile = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub photo: Option<String>,
    pub selected_sports: Vec<String>,
}

impl ProfileDraft {
    pub fn into_profile(self) -> AppResult<Profile> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(AppError::Serialization(format!("profile is not an object: {other}"))),
        }
    }
}
