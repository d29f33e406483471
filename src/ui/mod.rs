mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, ImageTarget, Popup, View, VoteFocus};
use crate::model::{Category, FeedKind};
use crate::session::now_ms;

use components::{centered_rect, plural, rank_label, score_bar, time_ago};

fn screen_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(2), // Title + tagline
            Constraint::Length(1), // View tabs
            Constraint::Min(8),    // Active view
            Constraint::Length(1), // Info line
            Constraint::Length(1), // Footer
        ])
        .split(area)
}

fn vote_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Identity
            Constraint::Min(6),    // Rankings
            Constraint::Length(3), // Submit
        ])
        .split(area)
}

fn rank_lists_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area)
}

/// Where the weekend and city lists land on a screen of `area`, borders included
pub fn rank_list_areas(area: Rect) -> (Rect, Rect) {
    let view = screen_layout(area)[2];
    let lists = rank_lists_layout(vote_layout(view)[1]);
    (lists[0], lists[1])
}

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = screen_layout(f.area());

    draw_header(f, app, chunks[0]);
    draw_tabs(f, app, chunks[1]);
    match app.view {
        View::Vote => draw_vote_view(f, app, chunks[2]),
        View::Standings => draw_standings_view(f, app, chunks[2]),
        View::Chat => draw_chat_view(f, app, chunks[2]),
    }
    draw_info_line(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f, app),
        Popup::ImagePath(target) => draw_image_popup(f, app, target),
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            app.config.title.as_str(),
            Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(app.config.tagline.as_str(), Style::default().fg(t.text_dim))),
    ])
    .alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!(" F{} {} ", i + 1, v.title())))
        .collect();
    let selected = View::ALL.iter().position(|v| *v == app.view).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(t.text_dim))
        .highlight_style(Style::default().fg(t.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .divider(Span::styled("│", Style::default().fg(t.inactive)));
    f.render_widget(tabs, area);
}

fn panel<'a>(app: &App, title: &'a str, active: bool) -> Block<'a> {
    let t = &app.theme;
    let (border, title_style) = if active {
        (t.accent, Style::default().fg(t.accent).add_modifier(Modifier::BOLD))
    } else {
        (t.inactive, Style::default().fg(t.inactive))
    };
    Block::default()
        .title(Span::styled(format!(" {} ", title), title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
}

// ── Vote ────────────────────────────────────────────────────────────────

fn draw_vote_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = vote_layout(area);

    draw_identity_box(f, app, chunks[0]);

    let lists = rank_lists_layout(chunks[1]);
    draw_rank_list(f, app, Category::Weekends, lists[0]);
    draw_rank_list(f, app, Category::Cities, lists[1]);

    draw_submit_box(f, app, chunks[2]);
}

fn draw_identity_box(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let active = app.focus == VoteFocus::Name;
    let cursor = if active { "_" } else { "" };

    let name = if app.name_input.is_empty() && !active {
        Span::styled("e.g. Tony, Big Dave, etc.", Style::default().fg(t.text_dim))
    } else {
        Span::styled(format!("{}{}", app.name_input, cursor), Style::default().fg(t.text))
    };

    let photo = match app.photo {
        Some(_) => Span::styled("  📷 photo set", Style::default().fg(t.success)),
        None => Span::styled("  📷 no photo (Ctrl+O)", Style::default().fg(t.text_dim)),
    };

    let line = Line::from(vec![
        Span::styled("Name: ", Style::default().fg(t.accent)),
        name,
        photo,
    ]);
    f.render_widget(Paragraph::new(line).block(panel(app, "Who are you?", active)), area);
}

fn draw_rank_list(f: &mut Frame, app: &App, category: Category, area: Rect) {
    let t = &app.theme;
    let active = matches!(
        (app.focus, category),
        (VoteFocus::Weekends, Category::Weekends) | (VoteFocus::Cities, Category::Cities)
    );
    let list = app.list(category);
    let drag = list.drag();

    let items: Vec<ListItem> = list
        .items()
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let is_dragged = drag.is_some_and(|d| d.from == idx);
            let is_target = drag.is_some_and(|d| d.over == idx && d.from != idx);

            let marker = if is_target { "▸" } else { " " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(t.accent)),
                Span::styled(format!("{:>3} ", rank_label(idx)), Style::default().fg(t.rank_color(idx))),
                Span::styled(item.label.as_str(), Style::default().fg(t.text).add_modifier(Modifier::BOLD)),
            ];
            if let Some(subtitle) = &item.subtitle {
                spans.push(Span::styled(format!("  {}", subtitle), Style::default().fg(t.text_dim)));
            }

            let style = if is_dragged {
                Style::default().bg(t.bg_drag)
            } else if active && idx == list.selected {
                Style::default().bg(t.bg_selected)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let title = match category {
        Category::Weekends => "Rank the Weekends",
        Category::Cities => "Rank the Cities",
    };
    let title = if drag.is_some() {
        format!("{} (dragging)", title)
    } else {
        title.to_string()
    };

    let mut state = ListState::default().with_selected(active.then_some(list.selected));
    f.render_stateful_widget(List::new(items).block(panel(app, &title, active)), area, &mut state);
}

fn draw_submit_box(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let ready = !app.name_input.trim().is_empty();
    let label = if app.has_submitted() {
        "🔄  UPDATE YOUR VOTE"
    } else {
        "🗳  SUBMIT YOUR VOTE"
    };
    let style = if ready {
        Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(t.inactive)
    };

    let line = Line::from(vec![
        Span::styled(label, style),
        Span::styled("   Ctrl+S", Style::default().fg(t.text_dim)),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if ready { t.accent } else { t.inactive }));
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center).block(block), area);
}

// ── Standings ───────────────────────────────────────────────────────────

fn draw_standings_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(4)])
        .split(chunks[0]);

    draw_leaderboards(f, app, left[0]);
    draw_voters(f, app, left[1]);
    draw_feed(f, app, chunks[1]);
}

fn draw_leaderboards(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let state = app.session.state();
    let title = format!("Standings · {}", plural(state.voter_count(), "vote"));
    let block = panel(app, &title, true);

    if state.voter_count() == 0 {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No votes yet. Be the first.", Style::default().fg(t.text_dim))),
        ])
        .alignment(Alignment::Center)
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let bar_width = (area.width as usize).saturating_sub(40).clamp(4, 20);
    let mut lines = Vec::new();
    for category in [Category::Weekends, Category::Cities] {
        lines.push(Line::from(Span::styled(
            category.title().to_uppercase(),
            Style::default().fg(t.accent_dim).add_modifier(Modifier::BOLD),
        )));
        let standings = app.session.standings(category);
        let max = standings.first().map(|s| s.score).unwrap_or(0);
        for (i, standing) in standings.iter().enumerate() {
            let rank = if i == 0 { "👑".to_string() } else { format!("#{}", i + 1) };
            let label_style = if i == 0 {
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(t.text)
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {:>3} ", rank), Style::default().fg(t.rank_color(i))),
                Span::styled(format!("{:<14}", standing.item.label), label_style),
                Span::styled(score_bar(standing.score, max, bar_width), Style::default().fg(t.rank_color(i))),
                Span::styled(format!(" {} pts", standing.score), Style::default().fg(t.text_dim)),
            ]));
        }
        lines.push(Line::from(""));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_voters(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let state = app.session.state();
    let mut spans = Vec::new();
    for (name, record) in &state.votes {
        let icon = if record.photo_thumbnail.is_some() { "📷" } else { "👤" };
        spans.push(Span::styled(format!("{} {}  ", icon, name), Style::default().fg(t.text)));
    }
    if spans.is_empty() {
        spans.push(Span::styled("Nobody yet", Style::default().fg(t.text_dim)));
    }

    let voters = Paragraph::new(Line::from(spans))
        .wrap(Wrap { trim: true })
        .block(panel(app, "Voted", false));
    f.render_widget(voters, area);
}

fn draw_feed(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let state = app.session.state();
    let now = now_ms();

    let lines: Vec<Line> = if state.feed.is_empty() {
        vec![Line::from(Span::styled("Nothing happening yet.", Style::default().fg(t.text_dim)))]
    } else {
        state
            .feed
            .iter()
            .skip(app.feed_scroll)
            .take(20)
            .flat_map(|item| {
                let (icon, color) = match item.kind {
                    FeedKind::Meme => ("🐍", t.danger),
                    FeedKind::Detail => ("📋", t.text),
                    FeedKind::Vote => ("🗳", t.text),
                };
                let avatar = if state.voter_photo(&item.voter_name).is_some() { "📷 " } else { "" };
                [
                    Line::from(vec![
                        Span::styled(format!("{} {}", icon, avatar), Style::default().fg(color)),
                        Span::styled(item.text.as_str(), Style::default().fg(color)),
                    ]),
                    Line::from(Span::styled(
                        format!("   {}", time_ago(item.time_ms, now)),
                        Style::default().fg(t.text_dim),
                    )),
                ]
            })
            .collect()
    };

    let feed = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel(app, "Feed", false));
    f.render_widget(feed, area);
}

// ── Chat ────────────────────────────────────────────────────────────────

fn draw_chat_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(area);

    draw_messages(f, app, chunks[0]);
    draw_chat_input(f, app, chunks[1]);
}

fn draw_messages(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let state = app.session.state();
    let me = state.saved_name().unwrap_or(crate::chat::ANONYMOUS_REACTOR);
    let now = now_ms();

    if state.chat.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No messages yet. Start the trash talk.",
            Style::default().fg(t.text_dim),
        ))
        .alignment(Alignment::Center)
        .block(panel(app, "Chat", true));
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .chat
        .iter()
        .map(|msg| {
            let avatar = if msg.photo_thumbnail.is_some() { "📷" } else { "👤" };
            let mut lines = vec![Line::from(vec![
                Span::styled(format!("{} ", avatar), Style::default().fg(t.text_dim)),
                Span::styled(
                    msg.author_name.as_str(),
                    Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", time_ago(msg.time_ms, now)), Style::default().fg(t.text_dim)),
            ])];

            if let Some(text) = &msg.text {
                for line in text.lines() {
                    lines.push(Line::from(Span::styled(format!("   {}", line), Style::default().fg(t.text))));
                }
            }
            if let Some(image) = &msg.image {
                lines.push(Line::from(Span::styled(
                    format!("   [🖼 image, {} KB]", image.len() / 1024),
                    Style::default().fg(t.accent_dim),
                )));
            }

            let mut reactions = vec![Span::raw("   ")];
            for (i, emoji) in app.config.reactions.iter().enumerate() {
                let count = msg.reaction_count(emoji);
                let mine = msg.has_reacted(emoji, me);
                let style = if mine {
                    Style::default().fg(t.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(t.text_dim)
                };
                let label = if count > 0 {
                    format!("{}{} {}  ", i + 1, emoji, count)
                } else {
                    format!("{}{}  ", i + 1, emoji)
                };
                reactions.push(Span::styled(label, style));
            }
            lines.push(Line::from(reactions));

            ListItem::new(lines)
        })
        .collect();

    let mut list_state = ListState::default().with_selected(app.reaction_target());
    let list = List::new(items)
        .highlight_style(Style::default().bg(t.bg_selected))
        .block(panel(app, "Chat", true));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_chat_input(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;

    let line = if !app.has_submitted() {
        Line::from(Span::styled(
            "Submit your vote first to join the chat.",
            Style::default().fg(t.text_dim),
        ))
    } else {
        let mut spans = Vec::new();
        if app.chat_image.is_some() {
            spans.push(Span::styled("[🖼 attached, Ctrl+X removes] ", Style::default().fg(t.success)));
        }
        if app.chat_input.is_empty() && app.chat_image.is_none() {
            spans.push(Span::styled("Talk your talk...", Style::default().fg(t.text_dim)));
        } else {
            spans.push(Span::styled(format!("{}_", app.chat_input), Style::default().fg(t.text)));
        }
        Line::from(spans)
    };

    f.render_widget(Paragraph::new(line).block(panel(app, "Message", app.has_submitted())), area);
}

// ── Chrome ──────────────────────────────────────────────────────────────

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let state = app.session.state();

    // Priority: status message > last refresh
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(t.accent)))
    } else if let Some(at) = state.last_refresh_ms {
        // Hollow dot while one of our writes has not landed
        let dot = if state.sync.all_synced() {
            Span::styled("● ", Style::default().fg(t.success))
        } else {
            Span::styled("○ ", Style::default().fg(t.text_dim))
        };
        Line::from(vec![
            dot,
            Span::styled(
                format!("refreshed {}", time_ago(at, now_ms())),
                Style::default().fg(t.text_dim),
            ),
        ])
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(t.text_dim)))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let t = &app.theme;
    let hints: &[(&str, &str)] = match app.view {
        View::Vote if app.focus == VoteFocus::Name => &[("Tab", "lists"), ("Enter", "submit"), ("Ctrl+O", "photo")],
        View::Vote => &[
            ("↑↓", "select"),
            ("Space", "drag/drop"),
            ("Shift+↑↓", "move"),
            ("Ctrl+S", "submit"),
            ("?", "help"),
        ],
        View::Standings => &[("↑↓", "scroll feed"), ("Ctrl+R", "refresh"), ("?", "help")],
        View::Chat => &[("Enter", "send"), ("↑↓", "select"), ("Alt+1-3", "react"), ("Ctrl+O", "image")],
    };

    let mut spans = Vec::new();
    for (key, action) in hints {
        spans.push(Span::styled(*key, Style::default().fg(t.accent)));
        spans.push(Span::styled(format!(" {}  ", action), Style::default().fg(t.text_dim)));
    }
    spans.push(Span::styled("F1-F3", Style::default().fg(t.accent)));
    spans.push(Span::styled(" views  ", Style::default().fg(t.text_dim)));
    spans.push(Span::styled("Ctrl+C", Style::default().fg(t.accent)));
    spans.push(Span::styled(" quit", Style::default().fg(t.text_dim)));

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let t = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(t.accent_dim).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), Style::default().fg(t.accent)),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("Views"),
        entry("F1 / F2 / F3", "Vote / Standings / Chat"),
        entry("Ctrl+N/P", "Next / previous view"),
        entry("Ctrl+R", "Refresh now"),
        Line::from(""),
        section("Vote"),
        entry("Tab", "Name → Weekends → Cities"),
        entry("↑/↓ j/k", "Select a row"),
        entry("Space", "Pick up row, move with ↑/↓, Space to drop"),
        entry("Esc", "Put the row back"),
        entry("Shift+↑/↓", "Move row up/down (also K/J)"),
        entry("Ctrl+O", "Set profile photo from a file"),
        entry("Ctrl+S", "Submit or update your vote"),
        Line::from(""),
        section("Chat"),
        entry("Enter", "Send message"),
        entry("↑/↓", "Select a message"),
        entry("Alt+1..3", "Toggle a reaction on it"),
        entry("Ctrl+O", "Attach an image"),
        entry("Ctrl+X", "Drop the attached image"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(t.text_dim)),
            Span::styled("?", Style::default().fg(t.accent)),
            Span::styled("/", Style::default().fg(t.text_dim)),
            Span::styled("Esc", Style::default().fg(t.accent)),
            Span::styled(" to close", Style::default().fg(t.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" huddle Help ", Style::default().fg(t.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(t.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_image_popup(f: &mut Frame, app: &App, target: ImageTarget) {
    let t = &app.theme;
    let popup_area = centered_rect(70, 20, f.area());
    f.render_widget(Clear, popup_area);

    let title = match target {
        ImageTarget::Avatar => " Profile photo (resized to 80×80) ",
        ImageTarget::Chat => " Attach image (max 400px) ",
    };

    let content = Paragraph::new(vec![
        Line::from(Span::styled("Path to an image file:", Style::default().fg(t.text_dim))),
        Line::from(Span::styled(format!("{}_", app.path_input), Style::default().fg(t.text))),
        Line::from(""),
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(t.success).add_modifier(Modifier::BOLD)),
            Span::raw(" attach   "),
            Span::styled("Esc", Style::default().fg(t.danger).add_modifier(Modifier::BOLD)),
            Span::raw(" cancel"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(title, Style::default().fg(t.accent)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.accent)),
    );
    f.render_widget(content, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::storage::MemoryStorage;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_each_view_renders() {
        let mut app = App::new(AppConfig::default(), Arc::new(MemoryStorage::new())).await.unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();

        terminal.draw(|f| draw(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("Rank the Cities"));
        assert!(text.contains("Cleveland"));

        app.view = View::Standings;
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("No votes yet"));

        app.view = View::Chat;
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Submit your vote first"));

        app.popup = Popup::Help;
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("huddle Help"));
    }

    #[tokio::test]
    async fn test_small_terminal_does_not_panic() {
        let mut app = App::new(AppConfig::default(), Arc::new(MemoryStorage::new())).await.unwrap();
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).unwrap();
        for view in View::ALL {
            app.view = view;
            terminal.draw(|f| draw(f, &app)).unwrap();
        }
    }
}
