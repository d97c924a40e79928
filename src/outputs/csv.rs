//! Pipe-delimited rendering of a [`StatsDocument`].
//!
//! The object is stored with a `.csv` name but fields are joined with `|`.
//! Field values are written verbatim: a `|` or newline inside a title is not
//! escaped and shifts the columns of that line for downstream readers.

use itertools::Itertools;

use crate::models::{StatsDocument, COLUMNS};

pub const DELIMITER: &str = "|";

/// Header line, newline included.
pub fn header() -> String {
    format!("{}\n", COLUMNS.iter().join(DELIMITER))
}

/// Render the document: header line, then one line per record.
pub fn serialize(document: &StatsDocument) -> String {
    let mut out = header();
    for record in &document.records {
        out.push_str(&record.fields().iter().join(DELIMITER));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_record;

    const HEADER: &str =
        "mediumID|title|link|publication|mins|views|reads|readRatio|fans|pubDate|liveDate\n";

    #[test]
    fn test_header_is_exact() {
        assert_eq!(header(), HEADER);
    }

    #[test]
    fn test_empty_document_is_header_only() {
        assert_eq!(serialize(&StatsDocument::new()), HEADER);
    }

    #[test]
    fn test_one_line_per_record() {
        let mut doc = StatsDocument::new();
        doc.push(sample_record("abc"));
        doc.push(sample_record("def"));
        let text = serialize(&doc);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "abc|Serverless scraping|https://medium.com/p/abc|Google Cloud Jp|4 min read|1,204|389|32|17|2023-11-14|2023-11-15"
        );
        assert!(lines[2].starts_with("def|"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_delimiter_in_title_is_not_escaped() {
        let mut record = sample_record("abc");
        record.title = "Before | After".into();
        let doc = StatsDocument { records: vec![record] };
        let text = serialize(&doc);
        let line = text.lines().nth(1).unwrap();
        assert_eq!(line.split('|').count(), 12);
    }
}
