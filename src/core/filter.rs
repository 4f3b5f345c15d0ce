//! Filter stage: score and categorize one hour of unprocessed items.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::analysis::{categorize, score_content};
use crate::domain::{QualityScore, ScoredItem};
use crate::store::{Store, StoreError};

/// Score every unprocessed item ingested in `(hour - 1h, hour]` and
/// return the valid subset.
///
/// Every score is persisted, rejects included, as the audit trail.
/// Each item is then marked processed so it is evaluated exactly once,
/// on the first run that sees it; a later run for the same hour starts
/// from an empty window. Store failures abort the run.
pub fn run(
    store: &Store,
    hour: DateTime<Utc>,
    default_threshold: f64,
) -> Result<Vec<ScoredItem>, StoreError> {
    let items = store.unprocessed_items_for_hour(hour)?;
    let candidates = items.len();

    let mut valid = Vec::new();

    for item in items {
        let categorization = categorize(&item.content);
        let threshold = store
            .threshold_for(categorization.primary)?
            .unwrap_or(default_threshold);

        let outcome = score_content(&item.content, item.verified, item.engagement, threshold);

        let score = QualityScore {
            item_id: item.id,
            valid: outcome.valid,
            confidence: outcome.confidence,
            primary: categorization.primary,
            secondary: categorization.secondary,
            reasons: outcome.reasons,
        };

        match store.insert_quality_score(&score) {
            Ok(()) => {}
            // Scores are write-once; an existing row wins
            Err(StoreError::Duplicate(_)) => {
                debug!(item_id = item.id, "score already recorded");
            }
            Err(e) => return Err(e),
        }

        store.mark_item_processed(item.id)?;

        if score.valid {
            valid.push(ScoredItem {
                item,
                primary: score.primary,
            });
        } else {
            debug!(
                item_id = score.item_id,
                confidence = score.confidence,
                reasons = ?score.reasons,
                "item rejected"
            );
        }
    }

    info!(candidates, valid = valid.len(), "filter finished");
    Ok(valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, NewRawItem};
    use chrono::TimeZone;

    fn seed(store: &Store, external_id: &str, content: &str, hour: DateTime<Utc>) -> i64 {
        store
            .insert_raw_item(&NewRawItem {
                external_id: external_id.to_string(),
                author: "desk".to_string(),
                verified: true,
                content: content.to_string(),
                posted_at: hour,
                engagement: 200,
                ingested_at: hour,
            })
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_rejects_are_persisted_and_items_marked() {
        let store = Store::open_in_memory().unwrap();
        let hour = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        let good = seed(
            &store,
            "good",
            "The president announced a new policy on education.",
            hour,
        );
        let bad = seed(&store, "bad", "ok", hour);

        let valid = run(&store, hour, 0.6).unwrap();
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].item.id, good);
        assert_eq!(valid[0].primary, Category::Politics);

        // Reject persisted with its reason
        let reject = store.quality_score(bad).unwrap().unwrap();
        assert!(!reject.valid);
        assert_eq!(reject.reasons, vec!["Too short"]);

        // Both items consumed; a second run sees nothing
        assert!(run(&store, hour, 0.6).unwrap().is_empty());
    }

    #[test]
    fn test_category_threshold_override() {
        let store = Store::open_in_memory().unwrap();
        let hour = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();

        // Unverified, zero engagement: confidence 0.8
        store
            .insert_raw_item(&NewRawItem {
                external_id: "s1".to_string(),
                author: "fan".to_string(),
                verified: false,
                content: "The championship game filled the stadium.".to_string(),
                posted_at: hour,
                engagement: 0,
                ingested_at: hour,
            })
            .unwrap();

        // A stricter Sports threshold rejects what the default accepts
        store.set_threshold(Category::Sports, 0.9).unwrap();
        let valid = run(&store, hour, 0.6).unwrap();
        assert!(valid.is_empty());
    }
}
