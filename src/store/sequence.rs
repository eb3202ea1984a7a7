//! Per-user, per-day document sequence numbers.
//!
//! File layout: `{ "YYYY-MM-DD": { "<user id>": <count> } }`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, TimeZone};

use super::{JsonFile, StoreError};

type Counters = BTreeMap<String, BTreeMap<String, u32>>;

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct SequenceStore {
    file: JsonFile<Counters>,
}

impl SequenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonFile::new(path),
        }
    }

    /// Increment the counter for (`date`, `user`) and return it zero-padded
    /// to two digits.
    pub fn issue_next(&self, date: NaiveDate, user: &str) -> Result<String, StoreError> {
        let next = self.file.update(|counters| {
            let count = counters
                .entry(date_key(date))
                .or_default()
                .entry(user.to_string())
                .or_insert(0);
            *count += 1;
            *count
        })?;
        log::debug!("Issued sequence {} for user {} on {}", next, user, date);
        Ok(format!("{next:02}"))
    }

    /// Set the counter for (`date`, `user`) to zero. Returns the previous value.
    pub fn reset(&self, date: NaiveDate, user: &str) -> Result<u32, StoreError> {
        let previous = self.file.update(|counters| {
            let per_day = counters.entry(date_key(date)).or_default();
            per_day.insert(user.to_string(), 0).unwrap_or(0)
        })?;
        log::info!("Reset sequence for user {} on {} (was {})", user, date, previous);
        Ok(previous)
    }

    pub fn current(&self, date: NaiveDate, user: &str) -> u32 {
        self.file
            .load()
            .get(&date_key(date))
            .and_then(|per_day| per_day.get(user))
            .copied()
            .unwrap_or(0)
    }

    /// `DD-MM-SS`: day, month and the next sequence number of `user`.
    pub fn document_number<Tz>(&self, now: &DateTime<Tz>, user: &str) -> Result<String, StoreError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let sequence = self.issue_next(now.date_naive(), user)?;
        Ok(format!("{}-{}", now.format("%d-%m"), sequence))
    }
}

/// `DD.MM.YYYY`.
pub fn document_date<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format("%d.%m.%Y").to_string()
}
