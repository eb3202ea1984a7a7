//! Helpers shared by the invoice and contract generators.

use chrono::{DateTime, FixedOffset, Utc};
use sanitize_filename::sanitize;

use crate::engine::tags::{indexed_tag, TAG_AMOUNT, TAG_CHANNEL, TAG_PERIOD, TAG_SERVICE_DATE};
use crate::engine::{Item, ReplacementMap};
use crate::numerals::normalize_service_date;

const MAX_NAME_CHARS: usize = 50;

/// Current time at the given UTC offset.
pub fn now_at(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Customer name as used inside an output file name, at most 50 characters.
///
/// ASCII quotes and guillemets are dropped for invoices and contracts alike;
/// slashes and spaces become `_`. The rest goes through the same
/// `sanitize_filename` pass the download route checks names against, so a
/// generated file can always be fetched back by its name.
pub fn safe_name_part(name: &str) -> String {
    let mapped: String = name
        .chars()
        .filter(|c| !matches!(c, '"' | '\'' | '«' | '»'))
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect();
    sanitize(mapped).chars().take(MAX_NAME_CHARS).collect()
}

/// Date of the first item's period, or `fallback` when it has none.
pub fn first_service_date(items: &[Item], fallback: &str) -> String {
    items
        .first()
        .and_then(|item| normalize_service_date(&item.period))
        .unwrap_or_else(|| fallback.to_string())
}

/// Insert the four indexed tags of the `index`-th item (1-based).
pub fn insert_item_tags(map: &mut ReplacementMap, index: usize, item: &Item, service_date: String) {
    map.insert(indexed_tag(TAG_CHANNEL, index), item.channel.clone());
    map.insert(indexed_tag(TAG_PERIOD, index), item.period.clone());
    map.insert(indexed_tag(TAG_AMOUNT, index), item.amount.clone());
    map.insert(indexed_tag(TAG_SERVICE_DATE, index), service_date);
}
