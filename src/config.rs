use crate::errors::{AppError, AppResult};
use std::env;
use std::path::PathBuf;

pub const DATABASE_FILE: &str = "pickup.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub reset_on_start: bool,
    pub notification_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("pickup-data"),
            log_dir: None,
            reset_on_start: true,
            notification_queue_capacity: 64,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            data_dir: lookup("PICKUP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            log_dir: lookup("PICKUP_LOG_DIR").map(PathBuf::from),
            reset_on_start: match lookup("PICKUP_RESET_ON_START") {
                Some(raw) => parse_flag("PICKUP_RESET_ON_START", &raw)?,
                None => defaults.reset_on_start,
            },
            notification_queue_capacity: match lookup("PICKUP_NOTIFICATION_QUEUE_CAPACITY") {
                Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                    AppError::Config(format!("PICKUP_NOTIFICATION_QUEUE_CAPACITY must be a number, got {raw:?}"))
                })?,
                None => defaults.notification_queue_capacity,
            },
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| self.data_dir.join("logs"))
    }
}

fn parse_flag(key: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{key} must be a boolean, got {raw:?}"))),
    }
}
