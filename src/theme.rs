//! UI colors
//! Gold-on-dark palette by default, individual colors overridable from the
//! `[theme]` table in config.toml.

use ratatui::style::Color;

use crate::config::ThemeColors;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, leader highlight, own reactions
    pub accent_dim: Color,  // Second place, secondary highlights
    pub bronze: Color,      // Third place
    pub danger: Color,      // Errors, "meme" feed lines
    pub success: Color,     // Confirmations, synced marker
    pub text: Color,        // Primary text
    pub text_dim: Color,    // Subtitles, timestamps
    pub bg_selected: Color, // Selected row
    pub bg_drag: Color,     // Row being dragged
    pub inactive: Color,    // Inactive borders
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Rgb(218, 165, 32),
            accent_dim: Color::Rgb(160, 160, 160),
            bronze: Color::Rgb(176, 112, 52),
            danger: Color::Rgb(211, 95, 95),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(230, 226, 218),
            text_dim: Color::Rgb(138, 135, 127),
            bg_selected: Color::Rgb(58, 50, 38),
            bg_drag: Color::Rgb(92, 61, 26),
            inactive: Color::Rgb(89, 89, 89),
        }
    }
}

impl Theme {
    /// Build the theme, applying any valid overrides
    pub fn from_config(colors: &ThemeColors) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&colors.accent, &mut theme.accent),
            (&colors.danger, &mut theme.danger),
            (&colors.text, &mut theme.text),
            (&colors.text_dim, &mut theme.text_dim),
        ];
        for (value, slot) in overrides {
            if let Some(value) = value {
                match Self::parse_hex_color(value) {
                    Some(color) => *slot = color,
                    None => tracing::warn!("Ignoring invalid theme color {:?}", value),
                }
            }
        }

        theme
    }

    /// Color for a leaderboard / ranking position
    pub fn rank_color(&self, idx: usize) -> Color {
        match idx {
            0 => self.accent,
            1 => self.accent_dim,
            2 => self.bronze,
            _ => self.text_dim,
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#b8860b"), Some(Color::Rgb(184, 134, 11)));
        assert_eq!(Theme::parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("#12345"), None);
        assert_eq!(Theme::parse_hex_color("#gggggg"), None);
        // Multibyte input must not be sliced mid-character
        assert_eq!(Theme::parse_hex_color("a€bc"), None);
        assert_eq!(Theme::parse_hex_color("#é12"), None);
    }

    #[test]
    fn test_overrides_apply_and_bad_values_ignored() {
        let colors = ThemeColors {
            accent: Some("#010203".to_string()),
            danger: Some("nope".to_string()),
            text: None,
            text_dim: None,
        };
        let theme = Theme::from_config(&colors);
        assert_eq!(theme.accent, Color::Rgb(1, 2, 3));
        assert_eq!(theme.danger, Theme::default().danger);
    }

    #[test]
    fn test_non_ascii_override_ignored() {
        let colors = ThemeColors {
            accent: Some("a€bc".to_string()),
            danger: None,
            text: None,
            text_dim: None,
        };
        assert_eq!(Theme::from_config(&colors).accent, Theme::default().accent);
    }
}
