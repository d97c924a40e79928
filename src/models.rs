//! Data models for exported story stats.
//!
//! - [`StatRecord`]: one story's metrics as shown on the stats page
//! - [`StatsDocument`]: the ordered set of records produced by one export
//!
//! Every field is kept as the platform rendered it. Counts, ratios and the
//! reading-time label are not parsed here; see [`crate::import`] for a typed
//! view.

use serde::Serialize;

/// Sentinel publication name for stories without a publication context.
pub const NOT_IN_PUBLICATION: &str = "Not in publication";

/// Column names of the serialized document, in order.
pub const COLUMNS: [&str; 11] = [
    "mediumID",
    "title",
    "link",
    "publication",
    "mins",
    "views",
    "reads",
    "readRatio",
    "fans",
    "pubDate",
    "liveDate",
];

/// One story's metrics for one day of observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatRecord {
    /// Platform-internal story identifier.
    #[serde(rename = "mediumID")]
    pub medium_id: String,
    pub title: String,
    /// Absolute URL of the story or of its publication listing.
    pub link: String,
    /// Publication display name or [`NOT_IN_PUBLICATION`].
    pub publication: String,
    /// Reading-time label, e.g. `"4 min read"`.
    #[serde(rename = "mins")]
    pub minutes_to_read: String,
    pub views: String,
    pub reads: String,
    #[serde(rename = "readRatio")]
    pub read_ratio: String,
    pub fans: String,
    /// Publication date, `YYYY-MM-DD`.
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    /// Date the story went live, `YYYY-MM-DD`.
    #[serde(rename = "liveDate")]
    pub live_date: String,
}

impl StatRecord {
    /// Field values in column order.
    pub fn fields(&self) -> [&str; 11] {
        [
            &self.medium_id,
            &self.title,
            &self.link,
            &self.publication,
            &self.minutes_to_read,
            &self.views,
            &self.reads,
            &self.read_ratio,
            &self.fans,
            &self.pub_date,
            &self.live_date,
        ]
    }
}

/// Records in stats-table order. No deduplication is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsDocument {
    pub records: Vec<StatRecord>,
}

impl StatsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StatRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn sample_record(id: &str) -> StatRecord {
    StatRecord {
        medium_id: id.to_string(),
        title: "Serverless scraping".to_string(),
        link: format!("https://medium.com/p/{id}"),
        publication: "Google Cloud Jp".to_string(),
        minutes_to_read: "4 min read".to_string(),
        views: "1,204".to_string(),
        reads: "389".to_string(),
        read_ratio: "32".to_string(),
        fans: "17".to_string(),
        pub_date: "2023-11-14".to_string(),
        live_date: "2023-11-15".to_string(),
    }
}
