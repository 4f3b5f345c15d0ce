//! Raw posts, quality scores, and the fixed category table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News categories recognized by the lexical categorizer.
///
/// Declaration order is the explicit tie-break priority: when two
/// categories match a post equally, the one declared first wins.
/// `General` is the fallback for posts matching no keywords and is
/// never assigned by keyword count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Politics,
    Economy,
    Technology,
    Health,
    Science,
    Education,
    Sports,
    Entertainment,
    General,
}

impl Category {
    /// All keyword-backed categories, in priority order.
    pub const PRIORITY: [Category; 8] = [
        Category::Politics,
        Category::Economy,
        Category::Technology,
        Category::Health,
        Category::Science,
        Category::Education,
        Category::Sports,
        Category::Entertainment,
    ];

    /// Display name used in scripts and stored rows.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Politics => "Politics",
            Category::Economy => "Economy",
            Category::Technology => "Technology",
            Category::Health => "Health",
            Category::Science => "Science",
            Category::Education => "Education",
            Category::Sports => "Sports",
            Category::Entertainment => "Entertainment",
            Category::General => "General",
        }
    }

    /// Parse a stored category name. Unknown names map to `General`
    /// so old rows never fail a read.
    pub fn parse(name: &str) -> Category {
        match name {
            "Politics" => Category::Politics,
            "Economy" => Category::Economy,
            "Technology" => Category::Technology,
            "Health" => Category::Health,
            "Science" => Category::Science,
            "Education" => Category::Education,
            "Sports" => Category::Sports,
            "Entertainment" => Category::Entertainment,
            _ => Category::General,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A post as returned by the content source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPost {
    /// Source-assigned id, unique per post
    pub id: String,

    /// Author handle
    pub author: String,

    /// Whether the author account is verified
    #[serde(default)]
    pub verified: bool,

    /// Post body
    pub content: String,

    /// When the post was published at the source
    pub timestamp: DateTime<Utc>,

    /// Engagement count (likes + reposts)
    #[serde(default)]
    pub engagement: i64,
}

/// A stored post. Created by ingestion, never deleted by the pipeline.
#[derive(Debug, Clone)]
pub struct RawItem {
    /// Store row id
    pub id: i64,

    /// Source-assigned id (unique in the store)
    pub external_id: String,

    pub author: String,
    pub verified: bool,
    pub content: String,

    /// When the post was published at the source
    pub posted_at: DateTime<Utc>,

    pub engagement: i64,

    /// When ingestion stored this item
    pub ingested_at: DateTime<Utc>,

    /// Flipped false -> true once, when the filter stage scores the item
    pub processed: bool,
}

/// Insert shape for a raw item (no row id yet).
#[derive(Debug, Clone)]
pub struct NewRawItem {
    pub external_id: String,
    pub author: String,
    pub verified: bool,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub engagement: i64,
    pub ingested_at: DateTime<Utc>,
}

impl NewRawItem {
    /// Build an insert row from a fetched post.
    pub fn from_post(post: FetchedPost, ingested_at: DateTime<Utc>) -> Self {
        Self {
            external_id: post.id,
            author: post.author,
            verified: post.verified,
            content: post.content,
            posted_at: post.timestamp,
            engagement: post.engagement,
            ingested_at,
        }
    }
}

/// Scoring verdict for one item. Written exactly once, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityScore {
    /// Row id of the scored item
    pub item_id: i64,

    /// Whether the item passed the threshold with no penalty reasons
    pub valid: bool,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// Top-ranked category
    pub primary: Category,

    /// Up to two runner-up categories with nonzero keyword counts
    pub secondary: Vec<Category>,

    /// Penalty reasons; empty for clean items
    pub reasons: Vec<String>,
}

/// A valid item paired with its persisted primary category,
/// as handed from the filter stage to clustering.
#[derive(Debug, Clone)]
pub struct ScoredItem {
    pub item: RawItem,
    pub primary: Category,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for category in Category::PRIORITY {
            assert_eq!(Category::parse(category.name()), category);
        }
        assert_eq!(Category::parse("General"), Category::General);
    }

    #[test]
    fn test_unknown_category_falls_back() {
        assert_eq!(Category::parse("Weather"), Category::General);
    }

    #[test]
    fn test_priority_order() {
        // Politics outranks everything else in a tie
        assert!(Category::Politics < Category::Economy);
        assert!(Category::Economy < Category::Entertainment);
    }

    #[test]
    fn test_fetched_post_defaults() {
        let json = r#"{
            "id": "p1",
            "author": "newsdesk",
            "content": "hello",
            "timestamp": "2025-06-01T12:00:00Z"
        }"#;

        let post: FetchedPost = serde_json::from_str(json).unwrap();
        assert!(!post.verified);
        assert_eq!(post.engagement, 0);
    }
}
