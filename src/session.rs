//! Application state and the actions that change it
//!
//! `Session` owns every piece of data the views render and is the only
//! thing that talks to storage. Each user action runs its storage calls
//! strictly one after another; across devices nothing is coordinated and the
//! last write to a key wins.
//!
//! Local changes are applied before they are written. Each shared collection
//! carries a `synced` flag that drops while a write is outstanding (or after
//! it failed) and comes back when a write is acknowledged. The flag only
//! feeds the status indicator: a refresh replaces any collection it could
//! read, so a change that never reached storage disappears on the next poll
//! while everyone else's activity keeps arriving.

use rand::Rng;
use std::sync::Arc;

use crate::chat::{self, ChatError, Draft, ANONYMOUS_REACTOR};
use crate::feed::{self, Submission};
use crate::model::{
    apply_order, ids, Category, ChatMessage, FeedItem, RankableItem, UserProfile, VoteMap, VoteRecord,
};
use crate::storage::{self, Scope, Storage, CHAT_KEY, FEED_KEY, PROFILE_KEY, VOTES_KEY};
use crate::tally::{tally, Standing};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VoteError {
    #[error("enter your name first")]
    EmptyName,
}

/// The static lists people rank
#[derive(Debug, Clone)]
pub struct Catalog {
    pub weekends: Vec<RankableItem>,
    pub cities: Vec<RankableItem>,
    pub last_place_item: Option<String>,
}

impl Catalog {
    pub fn items(&self, category: Category) -> &[RankableItem] {
        match category {
            Category::Weekends => &self.weekends,
            Category::Cities => &self.cities,
        }
    }
}

/// Whether each collection matches what was last written to storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncState {
    pub profile: bool,
    pub votes: bool,
    pub feed: bool,
    pub chat: bool,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            profile: true,
            votes: true,
            feed: true,
            chat: true,
        }
    }
}

impl SyncState {
    pub fn all_synced(&self) -> bool {
        self.profile && self.votes && self.feed && self.chat
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Last profile saved on this device
    pub profile: UserProfile,
    pub votes: VoteMap,
    pub feed: Vec<FeedItem>,
    pub chat: Vec<ChatMessage>,
    pub sync: SyncState,
    pub last_refresh_ms: Option<i64>,
}

impl AppState {
    /// Name this device votes and chats under, once it has voted
    pub fn saved_name(&self) -> Option<&str> {
        let name = self.profile.name.as_str();
        (self.profile.has_submitted && !name.is_empty()).then_some(name)
    }

    pub fn voter_photo(&self, voter: &str) -> Option<&str> {
        self.votes.get(voter)?.photo_thumbnail.as_deref()
    }

    pub fn voter_count(&self) -> usize {
        self.votes.len()
    }
}

/// A ballot as filled in on the vote screen
#[derive(Debug, Clone)]
pub struct Ballot {
    pub name: String,
    pub photo_thumbnail: Option<String>,
    pub weekends: Vec<RankableItem>,
    pub cities: Vec<RankableItem>,
}

#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub name: String,
    pub is_change: bool,
    pub feed_items: Vec<FeedItem>,
}

impl SubmitOutcome {
    pub fn confirmation(&self) -> String {
        if self.is_change {
            format!("✓ Vote updated, {}. The league sees your indecision.", self.name)
        } else {
            format!("✓ Vote recorded. The league thanks you, {}.", self.name)
        }
    }
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct Session {
    storage: Arc<dyn Storage>,
    catalog: Catalog,
    state: AppState,
}

impl Session {
    pub fn new(storage: Arc<dyn Storage>, catalog: Catalog) -> Self {
        Self {
            storage,
            catalog,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn standings(&self, category: Category) -> Vec<Standing> {
        tally(category, self.catalog.items(category), &self.state.votes)
    }

    /// Read this device's profile, reconciling stored orders with the catalog
    pub async fn load_profile(&mut self) -> Option<UserProfile> {
        let mut profile: UserProfile = storage::load(self.storage.as_ref(), PROFILE_KEY, Scope::Private).await?;
        profile.weekend_order = ids(&apply_order(&self.catalog.weekends, &profile.weekend_order));
        profile.city_order = ids(&apply_order(&self.catalog.cities, &profile.city_order));
        tracing::info!("Loaded profile for {:?}", profile.name);
        self.state.profile = profile.clone();
        Some(profile)
    }

    /// Ordered catalog items for the stored profile
    pub fn profile_order(&self, category: Category) -> Vec<RankableItem> {
        let order = match category {
            Category::Weekends => &self.state.profile.weekend_order,
            Category::Cities => &self.state.profile.city_order,
        };
        apply_order(self.catalog.items(category), order)
    }

    /// Re-read the shared collections and replace whichever ones came back
    pub async fn refresh(&mut self) {
        let store = self.storage.as_ref();
        let votes: Option<VoteMap> = storage::load(store, VOTES_KEY, Scope::Shared).await;
        let feed: Option<Vec<FeedItem>> = storage::load(store, FEED_KEY, Scope::Shared).await;
        let chat: Option<Vec<ChatMessage>> = storage::load(store, CHAT_KEY, Scope::Shared).await;

        if let Some(votes) = votes {
            self.state.votes = votes;
        }
        if let Some(feed) = feed {
            self.state.feed = feed;
        }
        if let Some(chat) = chat {
            self.state.chat = chat;
        }
        self.state.last_refresh_ms = Some(now_ms());
    }

    /// Save the profile, record the ballot, announce it in the feed, refresh
    pub async fn submit_vote<R: Rng + ?Sized>(&mut self, ballot: Ballot, rng: &mut R) -> Result<SubmitOutcome, VoteError> {
        let name = ballot.name.trim().to_string();
        if name.is_empty() {
            return Err(VoteError::EmptyName);
        }
        let is_change = self.state.profile.has_submitted;
        let now = now_ms();
        let store = Arc::clone(&self.storage);
        let store = store.as_ref();

        tracing::info!("Submitting vote for {} (change: {})", name, is_change);

        let profile = UserProfile {
            name: name.clone(),
            photo_thumbnail: ballot.photo_thumbnail.clone(),
            weekend_order: ids(&ballot.weekends),
            city_order: ids(&ballot.cities),
            has_submitted: true,
        };
        self.state.profile = profile.clone();
        self.state.sync.profile = false;
        self.state.sync.profile = storage::save(store, PROFILE_KEY, &profile, Scope::Private).await;

        let mut votes: VoteMap = storage::load(store, VOTES_KEY, Scope::Shared).await.unwrap_or_default();
        votes.insert(
            name.clone(),
            VoteRecord {
                weekends: profile.weekend_order.clone(),
                cities: profile.city_order.clone(),
                photo_thumbnail: ballot.photo_thumbnail.clone(),
                submitted_at_ms: now,
            },
        );
        self.state.votes = votes.clone();
        self.state.sync.votes = false;
        self.state.sync.votes = storage::save(store, VOTES_KEY, &votes, Scope::Shared).await;

        let mut feed: Vec<FeedItem> = storage::load(store, FEED_KEY, Scope::Shared).await.unwrap_or_default();
        let items = feed::generate(
            &Submission {
                voter: &name,
                is_change,
                weekends: &ballot.weekends,
                cities: &ballot.cities,
                last_place_item: self.catalog.last_place_item.as_deref(),
                now_ms: now,
            },
            rng,
        );
        feed::prepend(&mut feed, items.clone());
        self.state.feed = feed.clone();
        self.state.sync.feed = false;
        self.state.sync.feed = storage::save(store, FEED_KEY, &feed, Scope::Shared).await;

        self.refresh().await;

        Ok(SubmitOutcome {
            name,
            is_change,
            feed_items: items,
        })
    }

    /// Post a chat message under the saved name
    pub async fn send_chat(&mut self, draft: &Draft) -> Result<i64, ChatError> {
        if draft.is_empty() {
            return Err(ChatError::Empty);
        }
        let author = self.state.saved_name().ok_or(ChatError::NotVoted)?.to_string();
        let photo = self.state.profile.photo_thumbnail.clone();
        let store = Arc::clone(&self.storage);
        let store = store.as_ref();

        let mut log: Vec<ChatMessage> = storage::load(store, CHAT_KEY, Scope::Shared).await.unwrap_or_default();
        let id = chat::post_message(&mut log, Some(&author), photo, draft, now_ms())?;
        tracing::debug!("Posting chat message {} as {}", id, author);

        self.state.chat = log.clone();
        self.state.sync.chat = false;
        self.state.sync.chat = storage::save(store, CHAT_KEY, &log, Scope::Shared).await;

        self.refresh().await;
        Ok(id)
    }

    /// Flip this device's reaction on a message. Returns false if the message is gone.
    pub async fn toggle_reaction(&mut self, message_id: i64, emoji: &str) -> bool {
        let reactor = self.state.saved_name().unwrap_or(ANONYMOUS_REACTOR).to_string();
        let store = Arc::clone(&self.storage);
        let store = store.as_ref();

        let mut log: Vec<ChatMessage> = storage::load(store, CHAT_KEY, Scope::Shared).await.unwrap_or_default();
        if !chat::toggle_reaction(&mut log, message_id, emoji, &reactor) {
            tracing::debug!("Reaction target {} no longer exists", message_id);
            return false;
        }

        self.state.chat = log.clone();
        self.state.sync.chat = false;
        self.state.sync.chat = storage::save(store, CHAT_KEY, &log, Scope::Shared).await;

        self.refresh().await;
        true
    }
}
