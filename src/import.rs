//! Reading exported documents back.
//!
//! An exported document is parsed line by line; the header and any line
//! that does not split into exactly eleven fields are skipped, which is how
//! titles containing the delimiter end up ignored. [`ArticleMetrics`] gives
//! a typed view of a record for loading into a database.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{StatRecord, COLUMNS};
use crate::outputs::csv::DELIMITER;

static KEY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

const READ_SUFFIX: &str = " min read";

/// Parse a serialized document into records.
pub fn parse_document(text: &str) -> Vec<StatRecord> {
    let mut records = Vec::new();
    for (number, line) in text.lines().enumerate().skip(1) {
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != COLUMNS.len() {
            warn!(line = number + 1, columns = fields.len(), "Skipping malformed line");
            continue;
        }
        records.push(StatRecord {
            medium_id: fields[0].to_string(),
            title: fields[1].to_string(),
            link: fields[2].to_string(),
            publication: fields[3].to_string(),
            minutes_to_read: fields[4].to_string(),
            views: fields[5].to_string(),
            reads: fields[6].to_string(),
            read_ratio: fields[7].to_string(),
            fans: fields[8].to_string(),
            pub_date: fields[9].to_string(),
            live_date: fields[10].to_string(),
        });
    }
    debug!(records = records.len(), "Parsed document");
    records
}

/// Typed metrics of one story. Values the platform rendered in an
/// unexpected way become `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleMetrics {
    pub id: String,
    pub title: String,
    pub link: String,
    pub publication: String,
    pub minutes: Option<u32>,
    pub views: Option<u64>,
    pub reads: Option<u64>,
    pub read_ratio: Option<f64>,
    pub fans: Option<u64>,
    pub pub_date: Option<NaiveDate>,
    pub live_date: Option<NaiveDate>,
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.trim().replace(',', "").parse().ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

impl ArticleMetrics {
    pub fn from_record(record: &StatRecord) -> Self {
        Self {
            id: record.medium_id.clone(),
            title: record.title.clone(),
            link: record.link.clone(),
            publication: record.publication.clone(),
            minutes: record
                .minutes_to_read
                .replace(READ_SUFFIX, "")
                .trim()
                .parse()
                .ok(),
            views: parse_count(&record.views),
            reads: parse_count(&record.reads),
            read_ratio: record.read_ratio.trim().trim_end_matches('%').parse().ok(),
            fans: parse_count(&record.fans),
            pub_date: parse_date(&record.pub_date),
            live_date: parse_date(&record.live_date),
        }
    }
}

/// Date embedded in an object key such as
/// `test/stats-medium-metrics-2024-03-05.csv`.
pub fn snapshot_date(key: &str) -> Option<NaiveDate> {
    KEY_DATE.find(key).and_then(|m| parse_date(m.as_str()))
}

/// Whether the object at `key` was written on `today`. Older snapshots must
/// not overwrite current per-story totals.
pub fn is_current(key: &str, today: NaiveDate) -> bool {
    snapshot_date(key) == Some(today)
}
