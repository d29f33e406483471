use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A catalog entry that members rank (a weekend, a city).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankableItem {
    pub id: String,
    pub label: String,
    /// Compact label used in feed lines ("Aug 14–16")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

impl RankableItem {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            short: None,
            subtitle: None,
        }
    }

    pub fn with_short(mut self, short: &str) -> Self {
        self.short = Some(short.to_string());
        self
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn short_label(&self) -> &str {
        self.short.as_deref().unwrap_or(&self.label)
    }
}

/// Which ranking a list belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Weekends,
    Cities,
}

impl Category {
    pub fn title(&self) -> &'static str {
        match self {
            Category::Weekends => "Weekends",
            Category::Cities => "Cities",
        }
    }
}

/// Per-device profile, stored in the private scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_thumbnail: Option<String>,
    #[serde(default)]
    pub weekend_order: Vec<String>,
    #[serde(default)]
    pub city_order: Vec<String>,
    #[serde(default)]
    pub has_submitted: bool,
}

/// One voter's submitted rankings, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRecord {
    #[serde(default)]
    pub weekends: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_thumbnail: Option<String>,
    pub submitted_at_ms: i64,
}

impl VoteRecord {
    pub fn ranking(&self, category: Category) -> &[String] {
        match category {
            Category::Weekends => &self.weekends,
            Category::Cities => &self.cities,
        }
    }
}

/// Shared vote map, keyed by voter name. Resubmitting under the same name overwrites.
pub type VoteMap = BTreeMap<String, VoteRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Vote,
    Detail,
    Meme,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: i64,
    pub text: String,
    pub time_ms: i64,
    pub kind: FeedKind,
    pub voter_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub author_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub time_ms: i64,
    /// emoji -> names of everyone who reacted with it
    #[serde(default)]
    pub reactions: BTreeMap<String, BTreeSet<String>>,
}

impl ChatMessage {
    pub fn reaction_count(&self, emoji: &str) -> usize {
        self.reactions.get(emoji).map(|r| r.len()).unwrap_or(0)
    }

    pub fn has_reacted(&self, emoji: &str, name: &str) -> bool {
        self.reactions
            .get(emoji)
            .map(|r| r.contains(name))
            .unwrap_or(false)
    }
}

/// Reorder `items` to follow `order` (a list of ids).
///
/// Ids in `order` that the catalog no longer has are dropped, and catalog
/// items missing from `order` are appended in catalog order, so the result
/// is always a permutation of the catalog.
pub fn apply_order(items: &[RankableItem], order: &[String]) -> Vec<RankableItem> {
    let mut result: Vec<RankableItem> = Vec::with_capacity(items.len());
    for id in order {
        if result.iter().any(|i| &i.id == id) {
            continue;
        }
        if let Some(item) = items.iter().find(|i| &i.id == id) {
            result.push(item.clone());
        }
    }
    for item in items {
        if !result.iter().any(|i| i.id == item.id) {
            result.push(item.clone());
        }
    }
    result
}

pub fn ids(items: &[RankableItem]) -> Vec<String> {
    items.iter().map(|i| i.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<RankableItem> {
        vec![
            RankableItem::new("a", "A"),
            RankableItem::new("b", "B"),
            RankableItem::new("c", "C"),
        ]
    }

    #[test]
    fn test_apply_order_reconciles_with_catalog() {
        let order = vec!["c".to_string(), "gone".to_string(), "a".to_string(), "c".to_string()];
        let ordered = apply_order(&catalog(), &order);
        assert_eq!(ids(&ordered), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_apply_order_empty_keeps_catalog_order() {
        let ordered = apply_order(&catalog(), &[]);
        assert_eq!(ids(&ordered), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_profile_tolerates_missing_fields() {
        let profile: UserProfile = serde_json::from_str(r#"{"name":"Sam"}"#).unwrap();
        assert_eq!(profile.name, "Sam");
        assert!(profile.weekend_order.is_empty());
        assert!(!profile.has_submitted);
    }

    #[test]
    fn test_chat_message_reaction_helpers() {
        let mut msg = ChatMessage {
            id: 1,
            author_name: "Sam".to_string(),
            photo_thumbnail: None,
            text: Some("hi".to_string()),
            image: None,
            time_ms: 0,
            reactions: BTreeMap::new(),
        };
        msg.reactions
            .entry("🔥".to_string())
            .or_default()
            .insert("Al".to_string());

        assert_eq!(msg.reaction_count("🔥"), 1);
        assert_eq!(msg.reaction_count("😂"), 0);
        assert!(msg.has_reacted("🔥", "Al"));
        assert!(!msg.has_reacted("🔥", "Sam"));
    }
}
