//! Chat log: append-only, capped, with toggle reactions

use std::collections::BTreeMap;

use crate::model::ChatMessage;

/// Chat keeps only this many messages, oldest dropped first
pub const CHAT_CAP: usize = 100;

/// Reactor name used when the local user has not voted yet
pub const ANONYMOUS_REACTOR: &str = "Anon";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("message needs text or an image")]
    Empty,

    #[error("vote first to join the chat")]
    NotVoted,
}

/// A message as typed, before it is stamped and appended
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub image: Option<String>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none()
    }
}

/// Append a message from `author`. `author` is `None` until the user has voted.
pub fn post_message(
    log: &mut Vec<ChatMessage>,
    author: Option<&str>,
    photo_thumbnail: Option<String>,
    draft: &Draft,
    now_ms: i64,
) -> Result<i64, ChatError> {
    if draft.is_empty() {
        return Err(ChatError::Empty);
    }
    let author = author
        .filter(|a| !a.trim().is_empty())
        .ok_or(ChatError::NotVoted)?;

    // Ids double as timestamps but must stay unique within the log
    let id = log
        .iter()
        .map(|m| m.id.saturating_add(1))
        .max()
        .map_or(now_ms, |next| next.max(now_ms));

    let text = draft.text.trim();
    log.push(ChatMessage {
        id,
        author_name: author.to_string(),
        photo_thumbnail,
        text: (!text.is_empty()).then(|| text.to_string()),
        image: draft.image.clone(),
        time_ms: now_ms,
        reactions: BTreeMap::new(),
    });
    cap(log);
    Ok(id)
}

/// Flip `reactor` in the set for `emoji` on message `message_id`.
///
/// Returns false when the message is not in the log.
pub fn toggle_reaction(log: &mut [ChatMessage], message_id: i64, emoji: &str, reactor: &str) -> bool {
    let Some(msg) = log.iter_mut().find(|m| m.id == message_id) else {
        return false;
    };

    let reactors = msg.reactions.entry(emoji.to_string()).or_default();
    if !reactors.remove(reactor) {
        reactors.insert(reactor.to_string());
    }
    if reactors.is_empty() {
        msg.reactions.remove(emoji);
    }
    true
}

fn cap(log: &mut Vec<ChatMessage>) {
    if log.len() > CHAT_CAP {
        let excess = log.len() - CHAT_CAP;
        log.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Draft {
        Draft {
            text: s.to_string(),
            image: None,
        }
    }

    #[test]
    fn test_empty_message_rejected() {
        let mut log = Vec::new();
        assert_eq!(post_message(&mut log, Some("Sam"), None, &text("   "), 1), Err(ChatError::Empty));
        assert!(log.is_empty());
    }

    #[test]
    fn test_image_only_message_accepted() {
        let mut log = Vec::new();
        let draft = Draft {
            text: String::new(),
            image: Some("data:image/jpeg;base64,AAAA".to_string()),
        };
        post_message(&mut log, Some("Sam"), None, &draft, 1).unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].text.is_none());
        assert!(log[0].image.is_some());
        assert!(log[0].reactions.is_empty());
    }

    #[test]
    fn test_not_voted_rejected() {
        let mut log = Vec::new();
        assert_eq!(post_message(&mut log, None, None, &text("hi"), 1), Err(ChatError::NotVoted));
        assert_eq!(post_message(&mut log, Some(""), None, &text("hi"), 1), Err(ChatError::NotVoted));
        assert!(log.is_empty());
    }

    #[test]
    fn test_text_is_trimmed_and_ids_unique() {
        let mut log = Vec::new();
        let a = post_message(&mut log, Some("Sam"), None, &text("  hi  "), 500).unwrap();
        let b = post_message(&mut log, Some("Al"), None, &text("yo"), 500).unwrap();
        assert_eq!(log[0].text.as_deref(), Some("hi"));
        assert_eq!(a, 500);
        assert_eq!(b, 501);
    }

    #[test]
    fn test_max_stored_id_does_not_overflow() {
        let mut log: Vec<ChatMessage> = serde_json::from_str(&format!(
            r#"[{{"id":{},"authorName":"Al","text":"far future","timeMs":1}}]"#,
            i64::MAX
        ))
        .unwrap();
        let id = post_message(&mut log, Some("Sam"), None, &text("hi"), 1_000).unwrap();
        assert_eq!(id, i64::MAX);
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].text.as_deref(), Some("hi"));
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut log = Vec::new();
        for i in 1..=110 {
            post_message(&mut log, Some("Sam"), None, &text(&format!("msg {}", i)), i).unwrap();
        }
        assert_eq!(log.len(), CHAT_CAP);
        assert_eq!(log.first().unwrap().text.as_deref(), Some("msg 11"));
        assert_eq!(log.last().unwrap().text.as_deref(), Some("msg 110"));
        assert!(log.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn test_toggle_twice_restores_reactors() {
        let mut log = Vec::new();
        let id = post_message(&mut log, Some("Sam"), None, &text("hi"), 1).unwrap();
        toggle_reaction(&mut log, id, "🔥", "Al");
        let before = log[0].reactions.clone();

        assert!(toggle_reaction(&mut log, id, "🔥", "Sam"));
        assert!(log[0].has_reacted("🔥", "Sam"));
        assert_eq!(log[0].reaction_count("🔥"), 2);

        assert!(toggle_reaction(&mut log, id, "🔥", "Sam"));
        assert_eq!(log[0].reactions, before);
    }

    #[test]
    fn test_toggle_unknown_message_is_noop() {
        let mut log = Vec::new();
        post_message(&mut log, Some("Sam"), None, &text("hi"), 1).unwrap();
        assert!(!toggle_reaction(&mut log, 999, "😂", "Sam"));
        assert!(log[0].reactions.is_empty());
    }
}
