//! Watcher engine: IO collaborators around the pure diff core.
mod notify;
mod session;
mod site;
mod source;
mod store;
mod types;

pub use notify::{DeliveryError, DiscordWebhookNotifier, Notifier};
pub use session::{login, AuthError};
pub use site::SiteUrls;
pub use source::{
    build_client, HtmlQueueSource, JsonQueueSource, ReviewQueueSource, SourceSettings,
};
pub use store::{SnapshotStore, StoreError};
pub use types::{FailureKind, FetchError};
