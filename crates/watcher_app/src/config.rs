use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Which review-queue source to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Scrape the review-queue special page.
    #[default]
    Html,
    /// Read the JSON API endpoint.
    Api,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    pub username: String,
    pub password: String,
    /// Wiki name; a literal `.` carries its own language path.
    pub wiki: String,
    pub domain: String,
    #[serde(default)]
    pub language: Option<String>,
    pub interval_ms: u64,
    pub webhook_url: String,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("snapshot.json")
}

impl WatcherConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {path:?}"))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config file {path:?}"))
    }
}
