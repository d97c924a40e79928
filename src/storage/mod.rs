//! Destinations for the serialized document.
//!
//! | Sink | Module | Notes |
//! |------|--------|-------|
//! | Cloud Storage | [`gcs`] | public-read object, `text/plain`, `no-cache` |
//! | Local directory | [`local`] | same key layout, for dry runs |
//!
//! Writes overwrite any existing object under the same key; two exports on
//! the same day race and the last write wins.

use chrono::NaiveDate;

use crate::config::Destination;
use crate::error::Result;

pub mod gcs;
pub mod local;

pub use gcs::GcsUploader;
pub use local::LocalUploader;

/// Stores a finished document under a key.
pub trait Uploader {
    async fn upload(&self, key: &str, body: String) -> Result<()>;
}

/// Object key for the document exported on `date`.
///
/// `object_key("test/", 2024-03-05)` is `test/stats-medium-metrics-2024-03-05.csv`.
pub fn object_key(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix}stats-medium-metrics-{}.csv", date.format("%Y-%m-%d"))
}

/// The sink selected by configuration.
#[derive(Debug)]
pub enum Sink {
    Gcs(GcsUploader),
    Local(LocalUploader),
}

impl Sink {
    pub fn from_destination(destination: &Destination) -> Self {
        match destination {
            Destination::Gcs { bucket, access_token } => {
                Sink::Gcs(GcsUploader::new(bucket.clone(), access_token.clone()))
            }
            Destination::Local(root) => Sink::Local(LocalUploader::new(root.clone())),
        }
    }
}

impl Uploader for Sink {
    async fn upload(&self, key: &str, body: String) -> Result<()> {
        match self {
            Sink::Gcs(gcs) => gcs.upload(key, body).await,
            Sink::Local(local) => local.upload(key, body).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_for_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(object_key("test/", date), "test/stats-medium-metrics-2024-03-05.csv");
        assert_eq!(object_key("", date), "stats-medium-metrics-2024-03-05.csv");
    }

    #[tokio::test]
    async fn test_sink_dispatches_to_local() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = Sink::from_destination(&Destination::Local(tmp.path().to_path_buf()));
        sink.upload("k.csv", "body\n".into()).await.unwrap();
        assert_eq!(std::fs::read_to_string(tmp.path().join("k.csv")).unwrap(), "body\n");
    }
}
