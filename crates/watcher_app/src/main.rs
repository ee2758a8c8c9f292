mod config;
mod logging;
mod poll;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::time::MissedTickBehavior;
use url::Url;
use watch_logging::{set_poll_cycle, watch_error, watch_info};
use watcher_engine::{
    build_client, login, DiscordWebhookNotifier, HtmlQueueSource, JsonQueueSource,
    ReviewQueueSource, SiteUrls, SnapshotStore, SourceSettings,
};

use crate::config::{SourceKind, WatcherConfig};
use crate::poll::PollContext;

// Listing page and API action for the review queue.
const QUEUE_PAGE: &str = "Special:ReviewQueue";
const QUEUE_ACTION: &str = "reviewqueue";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::initialize(logging::LogDestination::Both);

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("watcher.json"));
    let config = WatcherConfig::load(&config_path)?;

    let site = SiteUrls::resolve(&config.wiki, &config.domain, config.language.as_deref())
        .context("resolving wiki base url")?;
    let webhook_url = Url::parse(&config.webhook_url).context("parsing webhook url")?;
    let client = build_client(&SourceSettings::default()).context("building http client")?;

    // Authentication failure is fatal: the loop must not start without a
    // session.
    login(&client, &site.api_url(), &config.username, &config.password)
        .await
        .context("establishing wiki session")?;

    let source: Box<dyn ReviewQueueSource> = match config.source {
        SourceKind::Html => Box::new(HtmlQueueSource::new(
            client.clone(),
            site.page_url(QUEUE_PAGE),
        )),
        SourceKind::Api => {
            let mut endpoint = site.api_url();
            endpoint.set_query(Some(&format!("action={QUEUE_ACTION}&format=json")));
            Box::new(JsonQueueSource::new(client.clone(), endpoint))
        }
    };

    let store = SnapshotStore::new(&config.state_file);
    let snapshot = store
        .load()
        .context("loading persisted snapshot; refusing to discard history")?;
    watch_info!(
        "Watching {} every {}ms ({} known pages)",
        site.base(),
        config.interval_ms,
        snapshot.len()
    );

    let mut ctx = PollContext {
        source,
        store,
        notifier: Box::new(DiscordWebhookNotifier::new(client, webhook_url, site)),
        snapshot,
    };

    let mut interval = tokio::time::interval(Duration::from_millis(config.interval_ms));
    // A long cycle skips overdue ticks; cycles never overlap.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycle += 1;
                set_poll_cycle(cycle);
                ctx.run_cycle().await;
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    watch_error!("Failed to listen for shutdown signal: {}", err);
                }
                watch_info!("Interrupt received, shutting down after {} cycle(s)", cycle);
                break;
            }
        }
    }
    Ok(())
}
