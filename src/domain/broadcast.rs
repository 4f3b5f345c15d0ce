//! Clusters, broadcasts, and audio artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::item::{Category, RawItem};

/// A group of valid items sharing a primary category, scoped to one
/// pipeline run. Never persisted.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub category: Category,

    /// Topic label shown in logs and used as the script heading
    pub label: String,

    /// Member items, in store order
    pub items: Vec<RawItem>,

    /// Synthesized summary; starts as the placeholder and is replaced
    /// by the summarization stage when the generative call succeeds
    pub summary: String,
}

impl Cluster {
    /// Create a cluster with the placeholder summary.
    pub fn new(category: Category, items: Vec<RawItem>) -> Self {
        let summary = format!("{} updates in {}", items.len(), category);
        Self {
            category,
            label: category.name().to_string(),
            items,
            summary,
        }
    }

    /// The placeholder summary for this cluster, regardless of whether
    /// a synthesized summary has since been filled in.
    pub fn placeholder_summary(&self) -> String {
        format!("{} updates in {}", self.items.len(), self.category)
    }

    pub fn item_ids(&self) -> Vec<i64> {
        self.items.iter().map(|i| i.id).collect()
    }

    /// Unique author handles across member items.
    pub fn source_accounts(&self) -> Vec<String> {
        let mut accounts: Vec<String> = self.items.iter().map(|i| i.author.clone()).collect();
        accounts.sort();
        accounts.dedup();
        accounts
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One generated bulletin for a specific hour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: i64,

    /// Hour bucket, unique in the store; guards duplicate runs
    pub hour: DateTime<Utc>,

    /// Full bulletin text
    pub script: String,

    /// Leading summary, for listings
    pub excerpt: String,

    pub cluster_count: i64,
    pub item_count: i64,
    pub word_count: i64,

    /// Estimated spoken duration in seconds
    pub duration_secs: f64,

    /// True once an audio artifact exists for this broadcast
    pub published: bool,

    pub created_at: DateTime<Utc>,
}

/// Insert shape for a broadcast (no row id yet).
#[derive(Debug, Clone)]
pub struct NewBroadcast {
    pub hour: DateTime<Utc>,
    pub script: String,
    pub excerpt: String,
    pub cluster_count: i64,
    pub item_count: i64,
    pub word_count: i64,
    pub duration_secs: f64,
}

/// Stored audio for a broadcast, created at most once per broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub id: i64,
    pub broadcast_id: i64,

    /// Public URL in object storage
    pub url: String,

    /// Duration in seconds, reported by the synthesizer or estimated
    /// from word count
    pub duration_secs: f64,

    pub size_bytes: i64,

    /// Voice the audio was synthesized with
    pub voice: String,

    pub created_at: DateTime<Utc>,
}
