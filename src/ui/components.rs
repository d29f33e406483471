//! Small rendering helpers shared by the three views

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// "just now", "5m ago", "3h ago", "2d ago"
pub fn time_ago(then_ms: i64, now_ms: i64) -> String {
    let d = (now_ms - then_ms).max(0);
    if d < 60_000 {
        "just now".to_string()
    } else if d < 3_600_000 {
        format!("{}m ago", d / 60_000)
    } else if d < 86_400_000 {
        format!("{}h ago", d / 3_600_000)
    } else {
        format!("{}d ago", d / 86_400_000)
    }
}

/// Crown for the leader, position number for everyone else
pub fn rank_label(idx: usize) -> String {
    if idx == 0 {
        "👑".to_string()
    } else {
        format!("{}", idx + 1)
    }
}

/// Horizontal bar scaled against the leader's score
pub fn score_bar(score: u32, max: u32, width: usize) -> String {
    if max == 0 || width == 0 {
        return String::new();
    }
    let filled = ((score as u64 * width as u64) / max as u64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled.min(width)))
}

pub fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
