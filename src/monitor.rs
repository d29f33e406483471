//! Headless watcher
//!
//! Polls the shared collections on the configured interval and announces
//! feed lines and chat messages that appeared since the previous cycle.
//! The first cycle only records where things stand.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::config::AppConfig;
use crate::session::{AppState, Catalog, Session};
use crate::storage::Storage;

/// Something new worth telling the user about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub summary: String,
    pub body: String,
}

/// Highest ids seen so far
#[derive(Debug, Default)]
struct WatchState {
    baseline_taken: bool,
    last_feed_id: i64,
    last_chat_id: i64,
}

impl WatchState {
    fn check(&mut self, state: &AppState) -> Vec<Announcement> {
        let newest_feed = state.feed.iter().map(|f| f.id).max().unwrap_or(0);
        let newest_chat = state.chat.iter().map(|m| m.id).max().unwrap_or(0);

        if !self.baseline_taken {
            self.baseline_taken = true;
            self.last_feed_id = newest_feed;
            self.last_chat_id = newest_chat;
            tracing::debug!("Baseline: feed {} chat {}", newest_feed, newest_chat);
            return Vec::new();
        }

        let mut out = Vec::new();

        // Feed is stored newest first; announce in the order it happened
        let mut fresh_feed: Vec<_> = state.feed.iter().filter(|f| f.id > self.last_feed_id).collect();
        fresh_feed.sort_by_key(|f| f.id);
        for item in fresh_feed {
            out.push(Announcement {
                summary: "huddle".to_string(),
                body: item.text.clone(),
            });
        }

        for msg in state.chat.iter().filter(|m| m.id > self.last_chat_id) {
            let body = match (&msg.text, &msg.image) {
                (Some(text), _) => text.clone(),
                (None, Some(_)) => "sent an image".to_string(),
                (None, None) => String::new(),
            };
            out.push(Announcement {
                summary: format!("💬 {}", msg.author_name),
                body,
            });
        }

        self.last_feed_id = self.last_feed_id.max(newest_feed);
        self.last_chat_id = self.last_chat_id.max(newest_chat);
        out
    }
}

/// Run until interrupted
pub async fn start_watching(config: AppConfig, storage: Arc<dyn Storage>) -> Result<()> {
    let catalog = Catalog {
        weekends: config.weekends.clone(),
        cities: config.cities.clone(),
        last_place_item: config.last_place_item.clone(),
    };
    let mut session = Session::new(storage, catalog);
    let mut state = WatchState::default();
    let mut check_interval = interval(Duration::from_secs(config.poll_interval_secs));

    tracing::info!(
        "Watching {} every {}s",
        config.shared_dir().display(),
        config.poll_interval_secs
    );

    loop {
        check_interval.tick().await;
        session.refresh().await;

        for announcement in state.check(session.state()) {
            tracing::info!("{}: {}", announcement.summary, announcement.body);
            if config.notifications {
                if let Err(e) = notify(&announcement) {
                    tracing::warn!("Desktop notification failed: {}", e);
                }
            }
        }
    }
}

fn notify(announcement: &Announcement) -> Result<()> {
    notify_rust::Notification::new()
        .summary(&announcement.summary)
        .body(&announcement.body)
        .icon("mail-message-new")
        .show()?;
    Ok(())
}
