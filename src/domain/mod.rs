//! Data structures for the bulletin pipeline.

pub mod broadcast;
pub mod item;

pub use broadcast::{AudioArtifact, Broadcast, Cluster, NewBroadcast};
pub use item::{Category, FetchedPost, NewRawItem, QualityScore, RawItem, ScoredItem};
