//! Positional (Borda-style) tally
//!
//! A voter's list of length N gives N points to their first choice, N-1 to
//! the second, down to 1 for the last. Ids the catalog does not know are
//! ignored; catalog items nobody ranked score 0.

use serde::Serialize;
use std::collections::HashMap;

use crate::model::{Category, RankableItem, VoteMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standing {
    pub item: RankableItem,
    pub score: u32,
}

/// Leaderboard for one category, best first. Ties keep catalog order.
pub fn tally(category: Category, catalog: &[RankableItem], votes: &VoteMap) -> Vec<Standing> {
    let mut scores: HashMap<&str, u32> = catalog.iter().map(|i| (i.id.as_str(), 0)).collect();

    for record in votes.values() {
        let ranking = record.ranking(category);
        let len = ranking.len();
        for (idx, id) in ranking.iter().enumerate() {
            if let Some(score) = scores.get_mut(id.as_str()) {
                *score += (len - idx) as u32;
            }
        }
    }

    let mut standings: Vec<Standing> = catalog
        .iter()
        .map(|item| Standing {
            item: item.clone(),
            score: scores.get(item.id.as_str()).copied().unwrap_or(0),
        })
        .collect();
    // sort_by is stable
    standings.sort_by(|a, b| b.score.cmp(&a.score));
    standings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VoteRecord;

    fn catalog() -> Vec<RankableItem> {
        vec![
            RankableItem::new("A", "A"),
            RankableItem::new("B", "B"),
            RankableItem::new("C", "C"),
        ]
    }

    fn record(cities: &[&str]) -> VoteRecord {
        VoteRecord {
            weekends: Vec::new(),
            cities: cities.iter().map(|s| s.to_string()).collect(),
            photo_thumbnail: None,
            submitted_at_ms: 0,
        }
    }

    fn scores(standings: &[Standing]) -> Vec<(&str, u32)> {
        standings.iter().map(|s| (s.item.id.as_str(), s.score)).collect()
    }

    #[test]
    fn test_no_votes_keeps_catalog_order() {
        let standings = tally(Category::Cities, &catalog(), &VoteMap::new());
        assert_eq!(scores(&standings), vec![("A", 0), ("B", 0), ("C", 0)]);
    }

    #[test]
    fn test_single_voter() {
        let mut votes = VoteMap::new();
        votes.insert("Sam".to_string(), record(&["B", "A", "C"]));
        let standings = tally(Category::Cities, &catalog(), &votes);
        assert_eq!(scores(&standings), vec![("B", 3), ("A", 2), ("C", 1)]);
    }

    #[test]
    fn test_two_voters_tie_broken_by_catalog_order() {
        let mut votes = VoteMap::new();
        votes.insert("Sam".to_string(), record(&["B", "A", "C"]));
        votes.insert("Al".to_string(), record(&["A", "B", "C"]));
        let standings = tally(Category::Cities, &catalog(), &votes);
        assert_eq!(scores(&standings), vec![("A", 5), ("B", 5), ("C", 2)]);
    }

    #[test]
    fn test_total_points_and_unanimous_leader() {
        let mut votes = VoteMap::new();
        votes.insert("v1".to_string(), record(&["C", "A", "B"]));
        votes.insert("v2".to_string(), record(&["C", "B", "A"]));
        votes.insert("v3".to_string(), record(&["C", "A", "B"]));
        let standings = tally(Category::Cities, &catalog(), &votes);

        let total: u32 = standings.iter().map(|s| s.score).sum();
        assert_eq!(total, 3 * (3 + 2 + 1));
        assert_eq!(standings[0].item.id, "C");
        assert_eq!(standings[0].score, 3 * 3);
    }

    #[test]
    fn test_independent_of_voter_order() {
        let ballots = [["A", "B", "C"], ["C", "B", "A"], ["B", "C", "A"], ["B", "A", "C"]];

        let mut forward = VoteMap::new();
        for (i, b) in ballots.iter().enumerate() {
            forward.insert(format!("voter{}", i), record(b));
        }
        // Same ballots under names that sort the other way round
        let mut reversed = VoteMap::new();
        for (i, b) in ballots.iter().enumerate() {
            reversed.insert(format!("voter{}", 9 - i), record(b));
        }

        assert_eq!(
            tally(Category::Cities, &catalog(), &forward),
            tally(Category::Cities, &catalog(), &reversed)
        );
    }

    #[test]
    fn test_unknown_ids_ignored_and_categories_separate() {
        let mut votes = VoteMap::new();
        votes.insert("Sam".to_string(), record(&["Z", "C"]));
        let cities = tally(Category::Cities, &catalog(), &votes);
        assert_eq!(scores(&cities), vec![("C", 1), ("A", 0), ("B", 0)]);

        let weekends = tally(Category::Weekends, &catalog(), &votes);
        assert!(weekends.iter().all(|s| s.score == 0));
    }
}
