use crate::models::Activity;
use serde::{Deserialize, Serialize};

pub const ALL_SPORTS: &str = "All";

pub const SPORTS: [&str; 12] = [
    ALL_SPORTS,
    "Basketball",
    "Soccer",
    "Running",
    "Gym",
    "Calisthenics",
    "Padel",
    "Tennis",
    "Cycling",
    "Swimming",
    "Badminton",
    "Volleyball",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilter {
    /// Exact sport; `None` or `"All"` disables the filter.
    pub sport: Option<String>,
    pub query: Option<String>,
    pub date: Option<String>,
}

impl ActivityFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        if let Some(sport) = self.sport.as_deref().filter(|sport| *sport != ALL_SPORTS) {
            if activity.sport != sport {
                return false;
            }
        }

        if let Some(query) = self.query.as_deref().map(str::trim).filter(|query| !query.is_empty()) {
            let query = query.to_lowercase();
            if !activity.sport.to_lowercase().contains(&query) && !activity.creator.to_lowercase().contains(&query) {
                return false;
            }
        }

        match self.date.as_deref() {
            Some(date) => activity.date == date,
            None => true,
        }
    }

    pub fn apply<'a>(&self, activities: &'a [Activity]) -> Vec<&'a Activity> {
        activities.iter().filter(|activity| self.matches(activity)).collect()
    }
}

struct SeedRow {
    id: &'static str,
    sport: &'static str,
    name: &'static str,
    location: &'static str,
    creator: &'static str,
    latitude: f64,
    longitude: f64,
    date: &'static str,
    time: &'static str,
    max_participants: u32,
    joined_count: u32,
}

const SEED_ROWS: [SeedRow; 6] = [
    SeedRow {
        id: "1",
        sport: "Basketball",
        name: "Pickup 3v3",
        location: "Pedion tou Areos court",
        creator: "Nikos",
        latitude: 37.9946,
        longitude: 23.7335,
        date: "2025-06-14",
        time: "18:00",
        max_participants: 6,
        joined_count: 3,
    },
    SeedRow {
        id: "2",
        sport: "Soccer",
        name: "5-a-side",
        location: "Olympic Stadium pitch B",
        creator: "Eleni",
        latitude: 38.0361,
        longitude: 23.7873,
        date: "2025-06-15",
        time: "19:30",
        max_participants: 10,
        joined_count: 7,
    },
    SeedRow {
        id: "3",
        sport: "Running",
        name: "Sunrise 10k",
        location: "Panathenaic Stadium",
        creator: "Giorgos",
        latitude: 37.9683,
        longitude: 23.7410,
        date: "2025-06-16",
        time: "07:00",
        max_participants: 20,
        joined_count: 5,
    },
    SeedRow {
        id: "4",
        sport: "Padel",
        name: "Doubles ladder",
        location: "Glyfada Padel Club",
        creator: "Maria",
        latitude: 37.8650,
        longitude: 23.7530,
        date: "2025-06-17",
        time: "20:00",
        max_participants: 4,
        joined_count: 2,
    },
    SeedRow {
        id: "5",
        sport: "Tennis",
        name: "Friendly singles",
        location: "Athens Tennis Club",
        creator: "Kostas",
        latitude: 37.9700,
        longitude: 23.7390,
        date: "2025-06-18",
        time: "09:00",
        max_participants: 2,
        joined_count: 1,
    },
    SeedRow {
        id: "6",
        sport: "Volleyball",
        name: "Beach volleyball",
        location: "Alimos beach",
        creator: "Sofia",
        latitude: 37.9110,
        longitude: 23.7110,
        date: "2025-06-19",
        time: "17:00",
        max_participants: 8,
        joined_count: 6,
    },
];

impl SeedRow {
    fn to_activity(&self) -> Activity {
        Activity {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: String::new(),
            sport: self.sport.to_string(),
            location: self.location.to_string(),
            creator: self.creator.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            date: self.date.to_string(),
            time: self.time.to_string(),
            max_participants: self.max_participants,
            joined_count: self.joined_count,
            distance: 0.0,
            joined: false,
        }
    }
}

pub fn seed_activities() -> Vec<Activity> {
    SEED_ROWS.iter().map(SeedRow::to_activity).collect()
}

pub fn find_seed_activity(activity_id: &str) -> Option<Activity> {
    seed_activities().into_iter().find(|activity| activity.id == activity_id)
}
