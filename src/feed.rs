//! Activity feed lines generated from vote submissions

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{FeedItem, FeedKind, RankableItem};

/// Feed keeps only this many items, newest first
pub const FEED_CAP: usize = 50;

const FIRST_VOTE_QUIPS: &[&str] = &[
    "just dropped their rankings. Bold.",
    "thinks they know something we don't.",
    "voted with supreme confidence.",
    "has entered the arena.",
    "submitted. No take-backs. (Just kidding.)",
    "has spoken. The prophecy unfolds.",
];

const CHANGED_VOTE_QUIPS: &[&str] = &[
    "just changed their mind. Shocking.",
    "is flip-flopping harder than a politician.",
    "updated their vote. Trust issues?",
    "reconsidered. Growth? Or panic?",
];

/// What the generator needs to know about one submission
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub voter: &'a str,
    pub is_change: bool,
    pub weekends: &'a [RankableItem],
    pub cities: &'a [RankableItem],
    /// City id that earns an extra line when ranked last
    pub last_place_item: Option<&'a str>,
    pub now_ms: i64,
}

/// Build the 2-3 lines announcing a submission
pub fn generate<R: Rng + ?Sized>(sub: &Submission<'_>, rng: &mut R) -> Vec<FeedItem> {
    let quips = if sub.is_change {
        CHANGED_VOTE_QUIPS
    } else {
        FIRST_VOTE_QUIPS
    };
    let quip = quips.choose(rng).copied().unwrap_or("voted.");

    let item = |offset: i64, text: String, kind: FeedKind| FeedItem {
        id: sub.now_ms + offset,
        text,
        time_ms: sub.now_ms,
        kind,
        voter_name: sub.voter.to_string(),
    };

    let mut items = vec![item(0, format!("{} {}", sub.voter, quip), FeedKind::Vote)];

    if let (Some(weekend), Some(city)) = (sub.weekends.first(), sub.cities.first()) {
        items.push(item(
            1,
            format!(
                "{} ranked {} #1 weekend, {} #1 city.",
                sub.voter,
                weekend.short_label(),
                city.label
            ),
            FeedKind::Detail,
        ));
    }

    if let (Some(target), Some(last)) = (sub.last_place_item, sub.cities.last()) {
        if last.id == target {
            items.push(item(
                2,
                format!("{} just moved {} to last. Again.", sub.voter, last.label),
                FeedKind::Meme,
            ));
        }
    }

    items
}

/// Prepend new items and cut the feed back to the most recent [`FEED_CAP`]
pub fn prepend(feed: &mut Vec<FeedItem>, new_items: Vec<FeedItem>) {
    let mut next = new_items;
    next.append(feed);
    next.truncate(FEED_CAP);
    *feed = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn weekends() -> Vec<RankableItem> {
        vec![
            RankableItem::new("aug14", "August 14–16").with_short("Aug 14–16"),
            RankableItem::new("aug21", "August 21–23").with_short("Aug 21–23"),
        ]
    }

    fn cities(last: &str) -> Vec<RankableItem> {
        let mut c = vec![
            RankableItem::new("seattle", "Seattle"),
            RankableItem::new("cleveland", "Cleveland"),
        ];
        c.push(RankableItem::new(last, &last.to_uppercase()));
        c
    }

    fn submission<'a>(weekends: &'a [RankableItem], cities: &'a [RankableItem], is_change: bool) -> Submission<'a> {
        Submission {
            voter: "Sam",
            is_change,
            weekends,
            cities,
            last_place_item: Some("denver"),
            now_ms: 1_000,
        }
    }

    #[test]
    fn test_two_lines_without_last_place_match() {
        let w = weekends();
        let c = cities("philadelphia");
        let mut rng = StdRng::seed_from_u64(7);
        let items = generate(&submission(&w, &c, false), &mut rng);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, FeedKind::Vote);
        assert!(items[0].text.starts_with("Sam "));
        assert!(FIRST_VOTE_QUIPS.iter().any(|q| items[0].text.ends_with(q)));
        assert_eq!(items[1].text, "Sam ranked Aug 14–16 #1 weekend, Seattle #1 city.");
        assert_eq!(items[1].id, 1_001);
    }

    #[test]
    fn test_last_place_line() {
        let w = weekends();
        let c = cities("denver");
        let mut rng = StdRng::seed_from_u64(7);
        let items = generate(&submission(&w, &c, true), &mut rng);

        assert_eq!(items.len(), 3);
        assert!(CHANGED_VOTE_QUIPS.iter().any(|q| items[0].text.ends_with(q)));
        assert_eq!(items[2].kind, FeedKind::Meme);
        assert_eq!(items[2].text, "Sam just moved DENVER to last. Again.");
        assert_eq!(items[2].id, 1_002);
    }

    #[test]
    fn test_feed_cap_keeps_newest_first() {
        let mut feed = Vec::new();
        for i in 0..60 {
            let item = FeedItem {
                id: i,
                text: format!("item {}", i),
                time_ms: i,
                kind: FeedKind::Vote,
                voter_name: "Sam".to_string(),
            };
            prepend(&mut feed, vec![item]);
        }

        assert_eq!(feed.len(), FEED_CAP);
        let got: Vec<i64> = feed.iter().map(|f| f.id).collect();
        let expected: Vec<i64> = (10..60).rev().collect();
        assert_eq!(got, expected);
    }
}
