use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use url::Url;
use watch_logging::watch_debug;
use watcher_core::{PageRecord, RawRecord};

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Builds the shared HTTP client. The cookie store carries the login
/// session established at startup.
pub fn build_client(settings: &SourceSettings) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .cookie_store(true)
        .build()
        .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))
}

/// A source of the current review-queue listing. Implementations
/// normalize their quirks into [`PageRecord`]s and never mutate state.
#[async_trait::async_trait]
pub trait ReviewQueueSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<PageRecord>, FetchError>;
}

/// Scrapes the review-queue special page.
///
/// Expected markup, one row per page:
/// title in the first cell's anchor, revision as `#<digits>` anchor text,
/// status as a `status-<token>` class on the row, and an optional
/// live-revision cell.
pub struct HtmlQueueSource {
    client: reqwest::Client,
    queue_url: Url,
}

impl HtmlQueueSource {
    pub fn new(client: reqwest::Client, queue_url: Url) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait::async_trait]
impl ReviewQueueSource for HtmlQueueSource {
    async fn fetch(&self) -> Result<Vec<PageRecord>, FetchError> {
        let response = self
            .client
            .get(self.queue_url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status())?;

        let html = response.text().await.map_err(map_reqwest_error)?;
        let records = parse_queue_html(&html)?;
        watch_debug!(
            "Fetched {} review-queue rows from {}",
            records.len(),
            self.queue_url
        );
        Ok(records)
    }
}

fn parse_queue_html(html: &str) -> Result<Vec<PageRecord>, FetchError> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("table.review-queue tr").expect("static selector");
    let title_sel = Selector::parse("td.page a").expect("static selector");
    let revision_sel = Selector::parse("td.revision a").expect("static selector");
    let live_sel = Selector::parse("td.live-revision").expect("static selector");

    if doc.select(&row_sel).next().is_none() {
        return Err(FetchError::new(
            FailureKind::Parse,
            "no review-queue table in response",
        ));
    }

    let mut records = Vec::new();
    for row in doc.select(&row_sel) {
        let Some(title) = row.select(&title_sel).next() else {
            // Header row.
            continue;
        };
        let revision = row
            .select(&revision_sel)
            .next()
            .map(cell_text)
            .unwrap_or_default();
        let raw = RawRecord {
            title: cell_text(title),
            revision,
            status: row_status_class(row).unwrap_or_default(),
            live_revision: row.select(&live_sel).next().map(cell_text),
        };
        records.push(PageRecord::from_raw(raw)?);
    }
    Ok(records)
}

fn cell_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn row_status_class(row: ElementRef) -> Option<String> {
    row.value()
        .classes()
        .find(|class| class.starts_with("status-"))
        .map(ToOwned::to_owned)
}

/// Reads the JSON review-queue endpoint: an array of
/// `{title, revision, status, liveRevision?}` objects.
pub struct JsonQueueSource {
    client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    title: String,
    revision: u64,
    status: String,
    #[serde(rename = "liveRevision", default)]
    live_revision: Option<u64>,
}

impl JsonQueueSource {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait::async_trait]
impl ReviewQueueSource for JsonQueueSource {
    async fn fetch(&self) -> Result<Vec<PageRecord>, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response.status())?;

        let pages: Vec<ApiPage> = response
            .json()
            .await
            .map_err(|err| FetchError::new(FailureKind::Parse, err.to_string()))?;

        // Funnel through the same normalization path as the scraper so
        // both sources fail identically on bad data.
        pages
            .into_iter()
            .map(|page| {
                PageRecord::from_raw(RawRecord {
                    title: page.title,
                    revision: page.revision.to_string(),
                    status: page.status,
                    live_revision: page.live_revision.map(|rev| rev.to_string()),
                })
                .map_err(FetchError::from)
            })
            .collect()
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), FetchError> {
    if status.is_success() {
        return Ok(());
    }
    let kind = match status.as_u16() {
        401 | 403 => FailureKind::AuthExpired,
        code => FailureKind::HttpStatus(code),
    };
    Err(FetchError::new(kind, status.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
