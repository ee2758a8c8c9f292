use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Review state of a page as reported by the queue listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Unsubmitted,
    Awaiting,
    Live,
    Rejected,
}

impl ReviewStatus {
    /// The lowercase wire token, as used in both the persisted snapshot
    /// file and the upstream listing.
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Unsubmitted => "unsubmitted",
            ReviewStatus::Awaiting => "awaiting",
            ReviewStatus::Live => "live",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = MalformedRecordError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "unsubmitted" => Ok(ReviewStatus::Unsubmitted),
            "awaiting" => Ok(ReviewStatus::Awaiting),
            "live" => Ok(ReviewStatus::Live),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(MalformedRecordError::UnknownStatus(other.to_string())),
        }
    }
}

/// One normalized entry of a fetched review-queue listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub title: String,
    pub revision: u64,
    pub status: ReviewStatus,
    pub live_revision: Option<u64>,
}

/// The unvalidated shape a source produces before normalization.
///
/// Fields carry source quirks verbatim: the revision may be prefixed `#`
/// (anchor text on the scraped listing), the status is a CSS-class-like
/// token optionally prefixed `status-`, and the live-revision column may
/// be absent entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub title: String,
    pub revision: String,
    pub status: String,
    pub live_revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedRecordError {
    #[error("record has an empty title")]
    MissingTitle,
    #[error("page {title:?}: unparseable revision {value:?}")]
    BadRevision { title: String, value: String },
    #[error("unknown review status token {0:?}")]
    UnknownStatus(String),
}

impl PageRecord {
    /// Normalizes a raw source record, failing fast on anything that
    /// cannot be represented rather than coercing it.
    pub fn from_raw(raw: RawRecord) -> Result<Self, MalformedRecordError> {
        let title = raw.title.trim();
        if title.is_empty() {
            return Err(MalformedRecordError::MissingTitle);
        }

        let revision = parse_revision(title, &raw.revision)?;
        let live_revision = match raw.live_revision.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(parse_revision(title, value)?),
        };

        let status = raw
            .status
            .trim()
            .strip_prefix("status-")
            .unwrap_or(raw.status.trim())
            .parse()?;

        Ok(Self {
            title: title.to_string(),
            revision,
            status,
            live_revision,
        })
    }
}

fn parse_revision(title: &str, value: &str) -> Result<u64, MalformedRecordError> {
    let digits = value.trim().strip_prefix('#').unwrap_or(value.trim());
    digits
        .parse()
        .map_err(|_| MalformedRecordError::BadRevision {
            title: title.to_string(),
            value: value.to_string(),
        })
}
