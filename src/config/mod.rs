use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model::RankableItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where private data and logs live (default: <data dir>/huddle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Directory every member can reach. Defaults to <data_dir>/shared,
    /// which only makes sense for a single machine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_dir: Option<PathBuf>,

    /// Seconds between shared refreshes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Desktop notifications in --watch mode
    #[serde(default)]
    pub notifications: bool,

    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_tagline")]
    pub tagline: String,

    /// City whose last-place finish gets called out in the feed ("" turns it off)
    #[serde(default = "default_last_place_item", skip_serializing_if = "Option::is_none")]
    pub last_place_item: Option<String>,

    #[serde(default = "default_reactions")]
    pub reactions: Vec<String>,

    /// Hex color overrides for the UI
    #[serde(default)]
    pub theme: ThemeColors,

    #[serde(default = "default_weekends")]
    pub weekends: Vec<RankableItem>,

    #[serde(default = "default_cities")]
    pub cities: Vec<RankableItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeColors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_title() -> String {
    "BUNNATHON 2026".to_string()
}

fn default_tagline() -> String {
    "Golf · Draft · Good Times · Bad Decisions".to_string()
}

fn default_weekends() -> Vec<RankableItem> {
    vec![
        RankableItem::new("aug14", "August 14–16").with_short("Aug 14–16"),
        RankableItem::new("aug21", "August 21–23").with_short("Aug 21–23"),
        RankableItem::new("aug28", "August 28–30").with_short("Aug 28–30"),
        RankableItem::new("sep4", "September 4–6").with_short("Sep 4–6"),
    ]
}

fn default_cities() -> Vec<RankableItem> {
    vec![
        RankableItem::new("cleveland", "Cleveland").with_subtitle("Cleveland Electric Company Hosted"),
        RankableItem::new("indianapolis", "Indianapolis").with_subtitle("Fast cars and fast women"),
        RankableItem::new("seattle", "Seattle").with_subtitle("A promised feast on draft day"),
        RankableItem::new("denver", "Denver").with_subtitle("Where Tony quit golf"),
        RankableItem::new("philadelphia", "Philadelphia").with_subtitle("Maybe, just maybe X comes"),
    ]
}

fn default_last_place_item() -> Option<String> {
    Some("denver".to_string())
}

fn default_reactions() -> Vec<String> {
    vec!["😂".to_string(), "🔥".to_string(), "🐍".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            shared_dir: None,
            poll_interval_secs: default_poll_interval(),
            notifications: false,
            title: default_title(),
            tagline: default_tagline(),
            last_place_item: default_last_place_item(),
            reactions: default_reactions(),
            theme: ThemeColors::default(),
            weekends: default_weekends(),
            cities: default_cities(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("huddle");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
            // Keep the user's broken file for them to fix
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Parse and sanity-check a config document
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;

        if config.poll_interval_secs == 0 {
            config.poll_interval_secs = default_poll_interval();
        }
        if config.weekends.is_empty() {
            config.weekends = default_weekends();
        }
        if config.cities.is_empty() {
            config.cities = default_cities();
        }
        if config.last_place_item.as_deref().is_some_and(|id| id.trim().is_empty()) {
            config.last_place_item = None;
        }
        config.reactions.retain(|r| !r.trim().is_empty());
        if config.reactions.is_empty() {
            config.reactions = default_reactions();
        }

        // Duplicate ids would break the one-entry-per-item ranking
        for (name, items) in [("weekends", &config.weekends), ("cities", &config.cities)] {
            for (i, item) in items.iter().enumerate() {
                if items[..i].iter().any(|other| other.id == item.id) {
                    anyhow::bail!("duplicate id {:?} in {}", item.id, name);
                }
            }
        }

        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("huddle")
        })
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.shared_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("shared"))
    }

    pub fn private_dir(&self) -> PathBuf {
        self.data_dir().join("private")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("huddle.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig {
            shared_dir: Some(PathBuf::from("/mnt/team/huddle")),
            notifications: true,
            ..AppConfig::default()
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized = AppConfig::parse(&serialized).unwrap();

        assert_eq!(deserialized.shared_dir, config.shared_dir);
        assert_eq!(deserialized.weekends, config.weekends);
        assert_eq!(deserialized.cities.len(), 5);
        assert_eq!(deserialized.reactions, config.reactions);
        assert!(deserialized.notifications);
    }

    #[test]
    fn test_empty_document_gets_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.weekends.len(), 4);
        assert_eq!(config.last_place_item.as_deref(), Some("denver"));
    }

    #[test]
    fn test_custom_catalog() {
        let config = AppConfig::parse(
            r#"
            poll_interval_secs = 0
            reactions = ["👍", " "]

            [[cities]]
            id = "a"
            label = "Austin"

            [[cities]]
            id = "b"
            label = "Boise"
            subtitle = "Potatoes"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.reactions, vec!["👍"]);
        assert_eq!(config.cities.len(), 2);
        assert_eq!(config.cities[1].subtitle.as_deref(), Some("Potatoes"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = AppConfig::parse(
            r#"
            [[weekends]]
            id = "x"
            label = "One"

            [[weekends]]
            id = "x"
            label = "Two"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_shared_dir_defaults_under_data_dir() {
        let config = AppConfig {
            data_dir: Some(PathBuf::from("/tmp/h")),
            ..AppConfig::default()
        };
        assert_eq!(config.shared_dir(), PathBuf::from("/tmp/h/shared"));
        assert_eq!(config.private_dir(), PathBuf::from("/tmp/h/private"));
    }
}
