//! Stats table extraction.
//!
//! Extraction happens in two phases:
//!
//! 1. **Reading**: [`read_row`] collects the raw values of one table row
//!    through a [`PageContext`] into [`RowFields`].
//! 2. **Resolving**: [`resolve_row`] turns those values into a
//!    [`StatRecord`]. It is a pure function and decides between the two row
//!    shapes:
//!
//! | First row link text | Row shape | `publication` | `link` |
//! |---------------------|-----------|---------------|--------|
//! | `View story` | standalone story | `Not in publication` on the profile stats page, else the hero title without ` stats` | first row link |
//! | anything else | story in a publication | that text | second row link |
//!
//! A row missing any expected element fails the whole extraction.

use tracing::{debug, info, instrument};
use url::Url;

use crate::error::{ExportError, Result};
use crate::models::{StatRecord, StatsDocument, NOT_IN_PUBLICATION};
use crate::page::PageContext;
use crate::utils::date_from_millis_str;

pub const ROW_SELECTOR: &str = ".sortableTable-row.js-statsTableRow";
pub const TITLE_LINK_SELECTOR: &str = ".sortableTable-title a";
pub const ROW_LINK_SELECTOR: &str = "a.sortableTable-link";
pub const READING_TIME_SELECTOR: &str = "span.readingTime";
pub const VALUE_SELECTOR: &str = ".sortableTable-value";
pub const HEADING_SELECTOR: &str = "h1";
pub const HERO_TITLE_SELECTOR: &str = "h1.hero-title";

pub const ID_ATTRIBUTE: &str = "data-action-value";
pub const TIMESTAMP_ATTRIBUTE: &str = "data-timestamp";

/// Row link label of a story shown outside any publication.
pub const VIEW_STORY_LABEL: &str = "View story";
/// Page heading of the profile (single author) stats page.
pub const PROFILE_STATS_HEADING: &str = "Stats";
const HERO_SUFFIX: &str = " stats";

/// An anchor inside a stats row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowLink {
    pub text: String,
    pub href: Option<String>,
}

/// Raw values of one stats row, before any interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields {
    pub medium_id: Option<String>,
    pub title: Option<String>,
    /// `a.sortableTable-link` anchors in row order.
    pub links: Vec<RowLink>,
    /// `title` attribute of the reading-time span.
    pub reading_time: Option<String>,
    /// Value cells in row order: live timestamp, views, reads, ratio, fans.
    pub values: Vec<String>,
    /// Publication timestamp in epoch milliseconds.
    pub timestamp: Option<String>,
}

/// Page-level headings consulted for standalone stories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHeadings {
    /// First `h1` of the page.
    pub heading: Option<String>,
    /// First `h1.hero-title`, e.g. `"Acme Corp stats"`.
    pub hero_title: Option<String>,
}

impl PageHeadings {
    fn is_profile_stats(&self) -> bool {
        self.heading.as_deref().map(str::trim) == Some(PROFILE_STATS_HEADING)
    }
}

/// Publication name carried by a hero title: everything before the last
/// `" stats"`, or the whole title when it has no such suffix.
pub fn publication_from_hero(hero_title: &str) -> String {
    let hero = hero_title.trim();
    match hero.rfind(HERO_SUFFIX) {
        Some(end) => hero[..end].trim_end().to_string(),
        None => hero.to_string(),
    }
}

fn required<'f>(row: usize, value: Option<&'f str>, what: &str) -> Result<&'f str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ExportError::extraction(row, format!("missing {what}")))
}

fn resolve_link(row: usize, link: Option<&RowLink>, position: &str, base: &Url) -> Result<String> {
    let link = link.ok_or_else(|| ExportError::extraction(row, format!("missing {position} row link")))?;
    let href = required(row, link.href.as_deref(), &format!("href on {position} row link"))?;
    base.join(href)
        .map(|u| u.to_string())
        .map_err(|e| ExportError::extraction(row, format!("bad link `{href}`: {e}")))
}

fn date_field(row: usize, raw: Option<&str>, what: &str) -> Result<String> {
    let raw = required(row, raw, what)?;
    date_from_millis_str(raw)
        .ok_or_else(|| ExportError::extraction(row, format!("{what} `{raw}` is not a millisecond timestamp")))
}

/// Build the record for row number `row` (zero-based, for error messages).
///
/// Relative links are resolved against `base`, the stats page URL.
pub fn resolve_row(
    row: usize,
    fields: &RowFields,
    headings: &PageHeadings,
    base: &Url,
) -> Result<StatRecord> {
    let medium_id = required(row, fields.medium_id.as_deref(), ID_ATTRIBUTE)?;
    let title = fields
        .title
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| ExportError::extraction(row, "missing title link"))?;
    let first = fields
        .links
        .first()
        .ok_or_else(|| ExportError::extraction(row, "missing row links"))?;

    let (publication, link) = if first.text.trim() == VIEW_STORY_LABEL {
        let publication = if headings.is_profile_stats() {
            NOT_IN_PUBLICATION.to_string()
        } else {
            let hero = required(row, headings.hero_title.as_deref(), HERO_TITLE_SELECTOR)?;
            publication_from_hero(hero)
        };
        (publication, resolve_link(row, Some(first), "first", base)?)
    } else {
        (
            first.text.trim().to_string(),
            resolve_link(row, fields.links.get(1), "second", base)?,
        )
    };

    let minutes_to_read = required(row, fields.reading_time.as_deref(), "reading time")?;
    if fields.values.len() < 5 {
        return Err(ExportError::extraction(
            row,
            format!("expected 5 value cells, found {}", fields.values.len()),
        ));
    }
    let value = |i: usize| fields.values[i].trim().to_string();

    Ok(StatRecord {
        medium_id: medium_id.to_string(),
        title: title.to_string(),
        link,
        publication,
        minutes_to_read: minutes_to_read.to_string(),
        views: value(1),
        reads: value(2),
        read_ratio: value(3),
        fans: value(4),
        pub_date: date_field(row, fields.timestamp.as_deref(), TIMESTAMP_ATTRIBUTE)?,
        live_date: date_field(row, Some(fields.values[0].as_str()), "live timestamp")?,
    })
}

/// Read the raw values of one row element.
pub async fn read_row<P: PageContext>(page: &P, row: &P::Element) -> Result<RowFields> {
    let medium_id = page.read_attribute(row, ID_ATTRIBUTE).await?;
    let timestamp = page.read_attribute(row, TIMESTAMP_ATTRIBUTE).await?;

    let title = match page.find_within(row, TITLE_LINK_SELECTOR).await?.first() {
        Some(anchor) => Some(page.read_text(anchor).await?),
        None => None,
    };

    let mut links = Vec::new();
    for anchor in page.find_within(row, ROW_LINK_SELECTOR).await? {
        links.push(RowLink {
            text: page.read_text(&anchor).await?,
            href: page.read_attribute(&anchor, "href").await?,
        });
    }

    let reading_time = match page.find_within(row, READING_TIME_SELECTOR).await?.first() {
        Some(span) => page.read_attribute(span, "title").await?,
        None => None,
    };

    let mut values = Vec::new();
    for cell in page.find_within(row, VALUE_SELECTOR).await? {
        values.push(page.read_text(&cell).await?);
    }

    Ok(RowFields {
        medium_id,
        title,
        links,
        reading_time,
        values,
        timestamp,
    })
}

async fn first_text<P: PageContext>(page: &P, selector: &str) -> Result<Option<String>> {
    match page.find_first(selector).await? {
        Some(element) => Ok(Some(page.read_text(&element).await?)),
        None => Ok(None),
    }
}

/// Extracts every rendered stats row into a [`StatsDocument`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Extract all rows of the loaded stats page, in table order.
    ///
    /// # Errors
    ///
    /// [`ExportError::Extraction`] for the first malformed row; no partial
    /// document is returned.
    #[instrument(level = "info", skip_all)]
    pub async fn extract<P: PageContext>(&self, page: &P) -> Result<StatsDocument> {
        let page_url = page.current_url().await?;
        let base = Url::parse(&page_url)
            .map_err(|e| ExportError::Browser(format!("page url `{page_url}`: {e}")))?;
        let headings = PageHeadings {
            heading: first_text(page, HEADING_SELECTOR).await?,
            hero_title: first_text(page, HERO_TITLE_SELECTOR).await?,
        };
        debug!(?headings, %base, "Exporting stats");

        let rows = page.find_all(ROW_SELECTOR).await?;
        let mut document = StatsDocument::new();
        for (i, row) in rows.iter().enumerate() {
            let fields = read_row(page, row).await?;
            let record = resolve_row(i, &fields, &headings, &base)?;
            debug!(row = i, id = %record.medium_id, publication = %record.publication, "Extracted row");
            document.push(record);
        }

        info!(rows = document.len(), "Extracted stats rows");
        Ok(document)
    }
}
