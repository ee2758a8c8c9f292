use serde_json::json;
use thiserror::Error;
use url::Url;
use watch_logging::watch_warn;
use watcher_core::{Notification, ReviewStatus};

use crate::SiteUrls;

// Discord caps a single webhook message at ten embeds.
const MAX_EMBEDS_PER_MESSAGE: usize = 10;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("network error delivering notification: {0}")]
    Network(String),
    #[error("webhook returned http status {0}")]
    HttpStatus(u16),
}

/// Delivers one poll cycle's batch of notify-worthy transitions. Failed
/// batches are reported and dropped; there is no retry backlog.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, batch: &[Notification]) -> Result<(), DeliveryError>;
}

pub struct DiscordWebhookNotifier {
    client: reqwest::Client,
    webhook_url: Url,
    site: SiteUrls,
}

impl DiscordWebhookNotifier {
    pub fn new(client: reqwest::Client, webhook_url: Url, site: SiteUrls) -> Self {
        Self {
            client,
            webhook_url,
            site,
        }
    }

    fn embed(&self, notification: &Notification) -> Option<serde_json::Value> {
        let Some((headline, color)) = headline(notification.status) else {
            // The diff engine never marks unsubmitted transitions as
            // notify-worthy.
            watch_warn!(
                "Dropping un-renderable notification for {:?} ({})",
                notification.title,
                notification.status
            );
            return None;
        };

        let title = &notification.title;
        let permalink = self.site.permalink(title, notification.revision);
        let mut description = format!("[{}]({})", title, self.site.page_url(title));
        match notification.live_revision {
            Some(live) if live != notification.revision => {
                let diff = self.site.diff_url(title, notification.revision, live);
                description.push_str(&format!("\n[Changes since the live revision]({diff})"));
            }
            _ => {
                description.push_str(&format!("\n[View this revision]({permalink})"));
            }
        }
        if notification.status == ReviewStatus::Rejected {
            let talk = self.site.talk_url(title);
            description.push_str(&format!("\n[Discuss on the talk page]({talk})"));
        }

        Some(json!({
            "title": headline,
            "color": color,
            "description": description,
            "url": permalink.as_str(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}

fn headline(status: ReviewStatus) -> Option<(&'static str, u32)> {
    match status {
        ReviewStatus::Awaiting => Some(("Revision awaiting review", 0xFFC107)),
        ReviewStatus::Live => Some(("Revision approved", 0x76BF06)),
        ReviewStatus::Rejected => Some(("Revision rejected", 0xE53935)),
        ReviewStatus::Unsubmitted => None,
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordWebhookNotifier {
    async fn deliver(&self, batch: &[Notification]) -> Result<(), DeliveryError> {
        let embeds: Vec<serde_json::Value> = batch
            .iter()
            .filter_map(|notification| self.embed(notification))
            .collect();
        if embeds.is_empty() {
            return Ok(());
        }

        for chunk in embeds.chunks(MAX_EMBEDS_PER_MESSAGE) {
            let response = self
                .client
                .post(self.webhook_url.clone())
                .json(&json!({ "embeds": chunk }))
                .send()
                .await
                .map_err(|err| DeliveryError::Network(err.to_string()))?;
            let status = response.status();
            if !status.is_success() {
                return Err(DeliveryError::HttpStatus(status.as_u16()));
            }
        }
        Ok(())
    }
}
