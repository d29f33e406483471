use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::chat::Draft;
use crate::config::AppConfig;
use crate::media;
use crate::model::{Category, RankableItem};
use crate::ranking::RankList;
use crate::session::{Ballot, Catalog, Session};
use crate::storage::Storage;
use crate::theme::Theme;
use crate::ui;

/// How long a status line stays up
const STATUS_SECONDS: u64 = 3;
/// Vote confirmations linger a little longer
const CONFIRM_SECONDS: u64 = 5;
const MAX_NAME_LEN: usize = 40;
const MAX_CHAT_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Vote,
    Standings,
    Chat,
}

impl View {
    pub const ALL: [View; 3] = [View::Vote, View::Standings, View::Chat];

    pub fn title(&self) -> &'static str {
        match self {
            View::Vote => "Vote",
            View::Standings => "Standings",
            View::Chat => "Chat",
        }
    }

    fn next(self) -> Self {
        match self {
            View::Vote => View::Standings,
            View::Standings => View::Chat,
            View::Chat => View::Vote,
        }
    }

    fn prev(self) -> Self {
        match self {
            View::Vote => View::Chat,
            View::Standings => View::Vote,
            View::Chat => View::Standings,
        }
    }
}

/// Which part of the vote screen takes keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteFocus {
    Name,
    Weekends,
    Cities,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Avatar,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    ImagePath(ImageTarget),
}

pub struct App {
    pub view: View,
    pub popup: Popup,
    pub session: Session,
    pub config: AppConfig,
    pub theme: Theme,

    // Vote form
    pub focus: VoteFocus,
    pub name_input: String,
    pub photo: Option<String>,
    pub weekends: RankList<RankableItem>,
    pub cities: RankList<RankableItem>,

    // Chat
    pub chat_input: String,
    pub chat_image: Option<String>,
    pub selected_message: Option<usize>, // None follows the newest message

    // Standings
    pub feed_scroll: usize,

    // Image path popup
    pub path_input: String,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    status_message_time: Option<Instant>,
    status_duration: Duration,

    last_refresh: Instant,
    poll_interval: Duration,
    rng: StdRng,
}

impl App {
    pub async fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Result<Self> {
        let catalog = Catalog {
            weekends: config.weekends.clone(),
            cities: config.cities.clone(),
            last_place_item: config.last_place_item.clone(),
        };
        let mut session = Session::new(storage, catalog);
        session.load_profile().await;
        session.refresh().await;

        let mut app = Self {
            view: View::Vote,
            popup: Popup::None,
            theme: Theme::from_config(&config.theme),
            poll_interval: Duration::from_secs(config.poll_interval_secs),

            focus: VoteFocus::Name,
            name_input: String::new(),
            photo: None,
            weekends: RankList::new(config.weekends.clone()),
            cities: RankList::new(config.cities.clone()),

            chat_input: String::new(),
            chat_image: None,
            selected_message: None,

            feed_scroll: 0,
            path_input: String::new(),

            status_message: None,
            status_message_time: None,
            status_duration: Duration::from_secs(STATUS_SECONDS),

            last_refresh: Instant::now(),
            rng: StdRng::from_entropy(),

            session,
            config,
        };

        // Pre-populate the form from the saved profile
        let profile = app.session.state().profile.clone();
        if !profile.name.is_empty() {
            app.name_input = profile.name.clone();
            app.photo = profile.photo_thumbnail.clone();
            app.weekends.set_items(app.session.profile_order(Category::Weekends));
            app.cities.set_items(app.session.profile_order(Category::Cities));
            app.focus = VoteFocus::Weekends;
        }

        Ok(app)
    }

    /// Set a status message (auto-clears after 3 seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.set_status_for(msg, STATUS_SECONDS);
    }

    fn set_status_for(&mut self, msg: impl Into<String>, secs: u64) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
        self.status_duration = Duration::from_secs(secs);
    }

    pub fn has_submitted(&self) -> bool {
        self.session.state().saved_name().is_some()
    }

    /// True while keystrokes go into a text field ('q' must not quit)
    pub fn is_editing(&self) -> bool {
        match self.popup {
            Popup::ImagePath(_) => true,
            Popup::Help => false,
            Popup::None => match self.view {
                View::Vote => self.focus == VoteFocus::Name,
                View::Chat => true,
                View::Standings => false,
            },
        }
    }

    pub fn list(&self, category: Category) -> &RankList<RankableItem> {
        match category {
            Category::Weekends => &self.weekends,
            Category::Cities => &self.cities,
        }
    }

    fn focused_list(&mut self) -> Option<&mut RankList<RankableItem>> {
        match self.focus {
            VoteFocus::Weekends => Some(&mut self.weekends),
            VoteFocus::Cities => Some(&mut self.cities),
            VoteFocus::Name => None,
        }
    }

    /// Index of the message reactions apply to
    pub fn reaction_target(&self) -> Option<usize> {
        let len = self.session.state().chat.len();
        match self.selected_message {
            Some(i) if i < len => Some(i),
            _ => len.checked_sub(1),
        }
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Handle popups first
        if self.popup != Popup::None {
            return self.handle_popup_key(key).await;
        }

        // View switching works everywhere
        match key.code {
            KeyCode::F(1) => {
                self.view = View::Vote;
                return Ok(());
            }
            KeyCode::F(2) => {
                self.view = View::Standings;
                return Ok(());
            }
            KeyCode::F(3) => {
                self.view = View::Chat;
                return Ok(());
            }
            KeyCode::Char('n') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.view = self.view.next();
                return Ok(());
            }
            KeyCode::Char('p') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.view = self.view.prev();
                return Ok(());
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh().await;
                self.set_status("Refreshed");
                return Ok(());
            }
            _ => {}
        }

        match self.view {
            View::Vote => self.handle_vote_key(key).await,
            View::Standings => {
                self.handle_standings_key(key);
                Ok(())
            }
            View::Chat => self.handle_chat_key(key).await,
        }
    }

    async fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
            }
            Popup::ImagePath(target) => match key.code {
                KeyCode::Esc => {
                    self.popup = Popup::None;
                    self.path_input.clear();
                }
                KeyCode::Enter => {
                    self.popup = Popup::None;
                    let path = expand_home(self.path_input.trim());
                    self.path_input.clear();
                    self.attach_image(target, path).await;
                }
                KeyCode::Backspace => {
                    self.path_input.pop();
                }
                KeyCode::Char(c) => self.path_input.push(c),
                _ => {}
            },
            Popup::None => {}
        }
        Ok(())
    }

    async fn handle_vote_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Char('s') if ctrl => return self.submit_vote().await,
            KeyCode::Char('o') if ctrl => {
                self.popup = Popup::ImagePath(ImageTarget::Avatar);
                return Ok(());
            }
            KeyCode::Tab => {
                self.finish_drag();
                self.focus = match self.focus {
                    VoteFocus::Name => VoteFocus::Weekends,
                    VoteFocus::Weekends => VoteFocus::Cities,
                    VoteFocus::Cities => VoteFocus::Name,
                };
                return Ok(());
            }
            KeyCode::BackTab => {
                self.finish_drag();
                self.focus = match self.focus {
                    VoteFocus::Name => VoteFocus::Cities,
                    VoteFocus::Weekends => VoteFocus::Name,
                    VoteFocus::Cities => VoteFocus::Weekends,
                };
                return Ok(());
            }
            _ => {}
        }

        if self.focus == VoteFocus::Name {
            match key.code {
                KeyCode::Enter => return self.submit_vote().await,
                KeyCode::Backspace => {
                    self.name_input.pop();
                }
                KeyCode::Down => self.focus = VoteFocus::Weekends,
                KeyCode::Char(c) if !ctrl => {
                    if self.name_input.chars().count() < MAX_NAME_LEN {
                        self.name_input.push(c);
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        let dragging = self.weekends.drag().is_some() || self.cities.drag().is_some();
        match key.code {
            KeyCode::Enter if !dragging => return self.submit_vote().await,
            KeyCode::Char('?') if !dragging => {
                self.popup = Popup::Help;
                return Ok(());
            }
            _ => {}
        }

        let Some(list) = self.focused_list() else {
            return Ok(());
        };

        match key.code {
            // Explicit move buttons
            KeyCode::Up if shift => {
                let idx = list.selected;
                list.move_up(idx);
            }
            KeyCode::Down if shift => {
                let idx = list.selected;
                list.move_down(idx);
            }
            KeyCode::Char('K') => {
                let idx = list.selected;
                list.move_up(idx);
            }
            KeyCode::Char('J') => {
                let idx = list.selected;
                list.move_down(idx);
            }

            // Cursor, or drop target while dragging
            KeyCode::Up | KeyCode::Char('k') => list.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => list.select_next(),

            // Pick up / drop
            KeyCode::Char(' ') => {
                if dragging {
                    list.drop_dragged();
                } else {
                    let idx = list.selected;
                    list.begin_drag(idx);
                }
            }
            KeyCode::Enter => {
                list.drop_dragged();
            }
            KeyCode::Esc => list.cancel_drag(),
            _ => {}
        }
        Ok(())
    }

    fn handle_standings_key(&mut self, key: KeyEvent) {
        let feed_len = self.session.state().feed.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.feed_scroll = self.feed_scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.feed_scroll + 1 < feed_len {
                    self.feed_scroll += 1;
                }
            }
            KeyCode::Home | KeyCode::Char('g') => self.feed_scroll = 0,
            KeyCode::Char('?') => self.popup = Popup::Help,
            _ => {}
        }
    }

    async fn handle_chat_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            // Alt+1..9 toggles the matching reaction
            KeyCode::Char(c) if alt => {
                if let Some(digit) = c.to_digit(10).filter(|d| *d >= 1) {
                    if let Some(emoji) = self.config.reactions.get(digit as usize - 1).cloned() {
                        self.react(&emoji).await;
                    }
                }
            }
            KeyCode::Char('o') if ctrl => self.popup = Popup::ImagePath(ImageTarget::Chat),
            KeyCode::Char('x') if ctrl => {
                if self.chat_image.take().is_some() {
                    self.set_status("Image removed");
                }
            }
            KeyCode::Char(c) if !ctrl => {
                if self.chat_input.chars().count() < MAX_CHAT_LEN {
                    self.chat_input.push(c);
                }
            }
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Enter => self.send_chat().await,
            KeyCode::Up => {
                let len = self.session.state().chat.len();
                if len > 0 {
                    self.selected_message = Some(match self.selected_message {
                        Some(i) => i.saturating_sub(1),
                        None => len - 1,
                    });
                }
            }
            KeyCode::Down => {
                let len = self.session.state().chat.len();
                self.selected_message = match self.selected_message {
                    Some(i) if i + 1 < len => Some(i + 1),
                    _ => None,
                };
            }
            KeyCode::Esc => self.selected_message = None,
            _ => {}
        }
        Ok(())
    }

    /// Pointer drag on the vote screen: press picks a row up, moving the
    /// pointer moves the drop target, release drops it
    pub fn handle_mouse(&mut self, mouse: MouseEvent, screen: Rect) {
        if self.view != View::Vote || self.popup != Popup::None {
            return;
        }
        let (weekends_area, cities_area) = ui::rank_list_areas(screen);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.finish_drag();
                let hit = [(VoteFocus::Weekends, weekends_area), (VoteFocus::Cities, cities_area)]
                    .into_iter()
                    .find_map(|(focus, area)| row_at(area, mouse.column, mouse.row).map(|row| (focus, row)));
                let Some((focus, row)) = hit else {
                    return;
                };
                self.focus = focus;
                if let Some(list) = self.focused_list() {
                    if row < list.len() {
                        list.selected = row;
                        list.begin_drag(row);
                    }
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let area = match self.focus {
                    VoteFocus::Weekends => weekends_area,
                    VoteFocus::Cities => cities_area,
                    VoteFocus::Name => return,
                };
                let Some(list) = self.focused_list() else {
                    return;
                };
                if list.drag().is_none() || list.is_empty() {
                    return;
                }
                // Past either edge of the list targets the first or last row
                let row = (mouse.row.saturating_sub(area.y + 1) as usize).min(list.len() - 1);
                list.selected = row;
                list.drag_over(row);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(list) = self.focused_list() {
                    list.drop_dragged();
                }
            }
            _ => {}
        }
    }

    fn finish_drag(&mut self) {
        self.weekends.cancel_drag();
        self.cities.cancel_drag();
    }

    async fn submit_vote(&mut self) -> Result<()> {
        self.finish_drag();
        let ballot = Ballot {
            name: self.name_input.clone(),
            photo_thumbnail: self.photo.clone(),
            weekends: self.weekends.items().to_vec(),
            cities: self.cities.items().to_vec(),
        };

        match self.session.submit_vote(ballot, &mut self.rng).await {
            Ok(outcome) => {
                tracing::debug!("Vote added {} feed lines", outcome.feed_items.len());
                self.name_input = outcome.name.clone();
                self.set_status_for(outcome.confirmation(), CONFIRM_SECONDS);
                self.last_refresh = Instant::now();
            }
            Err(e) => {
                self.focus = VoteFocus::Name;
                self.set_status(e.to_string());
            }
        }
        Ok(())
    }

    async fn send_chat(&mut self) {
        let draft = Draft {
            text: self.chat_input.clone(),
            image: self.chat_image.clone(),
        };
        match self.session.send_chat(&draft).await {
            Ok(_) => {
                self.chat_input.clear();
                self.chat_image = None;
                self.selected_message = None;
                self.last_refresh = Instant::now();
            }
            Err(e) => self.set_status(e.to_string()),
        }
    }

    async fn react(&mut self, emoji: &str) {
        let Some(idx) = self.reaction_target() else {
            return;
        };
        let id = self.session.state().chat[idx].id;
        if self.session.toggle_reaction(id, emoji).await {
            self.last_refresh = Instant::now();
            // Keep pointing at the same message if the log shifted
            self.selected_message = self
                .selected_message
                .and_then(|_| self.session.state().chat.iter().position(|m| m.id == id));
        } else {
            self.set_status("That message is gone");
        }
        self.clamp_selection();
    }

    async fn attach_image(&mut self, target: ImageTarget, path: PathBuf) {
        if path.as_os_str().is_empty() {
            return;
        }
        let result = match target {
            ImageTarget::Avatar => media::load_avatar(&path).await,
            ImageTarget::Chat => media::load_chat_image(&path).await,
        };
        match result {
            Ok(data_url) => {
                tracing::info!("Attached {} ({} bytes encoded)", path.display(), data_url.len());
                match target {
                    ImageTarget::Avatar => {
                        self.photo = Some(data_url);
                        self.set_status("Photo set. Submit to share it.");
                    }
                    ImageTarget::Chat => {
                        let size = media::data_url_dimensions(&data_url)
                            .map(|(w, h)| format!(" ({}×{})", w, h))
                            .unwrap_or_default();
                        self.chat_image = Some(data_url);
                        self.set_status(format!("Image attached{}", size));
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Could not attach {}: {}", path.display(), e);
                self.set_status(format!("Image failed: {}", e));
            }
        }
    }

    async fn refresh(&mut self) {
        self.session.refresh().await;
        self.last_refresh = Instant::now();
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let chat_len = self.session.state().chat.len();
        if self.selected_message.is_some_and(|i| i >= chat_len) {
            self.selected_message = None;
        }
        let feed_len = self.session.state().feed.len();
        if self.feed_scroll >= feed_len {
            self.feed_scroll = feed_len.saturating_sub(1);
        }
    }

    pub async fn tick(&mut self) -> Result<()> {
        // Clear status message once it has been up long enough
        if let Some(time) = self.status_message_time {
            if time.elapsed() >= self.status_duration {
                self.status_message = None;
                self.status_message_time = None;
            }
        }

        // Poll the shared collections
        if self.last_refresh.elapsed() >= self.poll_interval {
            self.refresh().await;
        }

        Ok(())
    }
}

/// Row index under the pointer, inside the list's border
fn row_at(area: Rect, column: u16, row: u16) -> Option<usize> {
    let inside = column > area.x
        && column + 1 < area.x + area.width
        && row > area.y
        && row + 1 < area.y + area.height;
    inside.then(|| (row - area.y - 1) as usize)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
