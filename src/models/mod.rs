use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod session;

pub use session::{AddOutcome, SelectionSession, SessionPhase, SessionSettings};

/// TMDB identifier of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub year: i32,
    /// Free-text keywords, only used for similarity
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl Item {
    pub fn new(id: u64, title: impl Into<String>, year: i32, tags: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            title: title.into(),
            year,
            tags: tags.into(),
            poster: None,
        }
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }
}

/// Inclusive range of release years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// Earliest year selectable by a user
    pub const FLOOR: i32 = 1900;
    /// Latest year selectable by a user
    pub const CEILING: i32 = 2015;

    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.min && year <= self.max
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(1990, 2010)
    }
}

/// How recommendations are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Uniform sample of unseen items
    Random,
    /// Tag similarity, best score per candidate
    #[default]
    Content,
    /// Tag similarity, scores summed across liked items
    ContentRank,
}

/// A ranked item, with its similarity score when one was computed
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        assert_eq!(format!("{}", ItemId(550)), "550");
    }

    #[test]
    fn test_item_id_serializes_as_number() {
        let json = serde_json::to_string(&ItemId(550)).unwrap();
        assert_eq!(json, "550");
    }

    #[test]
    fn test_item_deserialize_without_poster() {
        let item: Item = serde_json::from_str(
            r#"{"id": 550, "title": "Fight Club", "year": 1999, "tags": "fight club soap"}"#,
        )
        .unwrap();
        assert_eq!(item.id, ItemId(550));
        assert_eq!(item.poster, None);
    }

    #[test]
    fn test_year_range_is_inclusive() {
        let range = YearRange::new(1990, 2010);
        assert!(range.contains(1990));
        assert!(range.contains(2010));
        assert!(!range.contains(1989));
        assert!(!range.contains(2011));
    }

    #[test]
    fn test_strategy_serialization() {
        assert_eq!(
            serde_json::to_string(&Strategy::ContentRank).unwrap(),
            "\"content_rank\""
        );
        let parsed: Strategy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(parsed, Strategy::Random);
        assert_eq!(Strategy::default(), Strategy::Content);
    }

    #[test]
    fn test_recommendation_flattens_item() {
        let rec = Recommendation {
            item: Item::new(1, "Heat", 1995, "heist crime"),
            score: Some(0.5),
        };
        let value = serde_json::to_value(&rec).unwrap();
        assert_eq!(value["title"], "Heat");
        assert_eq!(value["score"], 0.5);
    }
}
