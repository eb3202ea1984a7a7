//! Unique user tracking.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{JsonFile, StoreError};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct MetricsData {
    /// user id -> date first seen
    #[serde(default)]
    unique_users: BTreeMap<String, String>,
    /// Older files may lack it; the user count stands in.
    #[serde(default)]
    total_count: Option<u64>,
    #[serde(default)]
    daily_registrations: BTreeMap<String, u64>,
}

impl MetricsData {
    fn total(&self) -> u64 {
        self.total_count.unwrap_or(self.unique_users.len() as u64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UsageStats {
    pub total: u64,
    pub today: u64,
    /// Users first seen within the last 7 days, today included.
    pub week: u64,
    /// Users first seen within the last 30 days, today included.
    pub month: u64,
}

pub struct UsageMetrics {
    file: JsonFile<MetricsData>,
}

impl UsageMetrics {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Record `user` as seen on `today`. Returns `true` the first time a user
    /// is seen; nothing is written otherwise.
    pub fn track_unique_user(&self, user: &str, today: NaiveDate) -> Result<bool, StoreError> {
        if self.file.load().unique_users.contains_key(user) {
            return Ok(false);
        }
        let is_new = self.file.update(|data| {
            if data.unique_users.contains_key(user) {
                return false;
            }
            let key = today.format(DATE_FORMAT).to_string();
            data.unique_users.insert(user.to_string(), key.clone());
            data.total_count = Some(data.unique_users.len() as u64);
            *data.daily_registrations.entry(key).or_insert(0) += 1;
            true
        })?;
        if is_new {
            log::info!("New user {} registered", user);
        }
        Ok(is_new)
    }

    pub fn stats(&self, today: NaiveDate) -> UsageStats {
        let data = self.file.load();
        let week_start = today - Duration::days(6);
        let month_start = today - Duration::days(29);

        let mut stats = UsageStats {
            total: data.total(),
            ..UsageStats::default()
        };
        for (key, count) in &data.daily_registrations {
            let Ok(date) = NaiveDate::parse_from_str(key, DATE_FORMAT) else {
                continue;
            };
            if date == today {
                stats.today += count;
            }
            if date >= week_start {
                stats.week += count;
            }
            if date >= month_start {
                stats.month += count;
            }
        }
        stats
    }
}
