//! Summarization and bulletin script assembly.

use std::time::Duration;

use tracing::{info, warn};

use crate::adapters::Summarizer;
use crate::domain::Cluster;

use super::retry::{retry_with_backoff, with_timeout, RetryPolicy};

/// Fixed bulletin framing.
pub const PREAMBLE: &str =
    "Good day, and welcome to your hourly news bulletin. Here are the top stories this hour.";
pub const SIGN_OFF: &str =
    "That's all for this hour. Thank you for listening, and stay tuned for the next update.";

/// A bulletin covers at most this many clusters.
pub const MAX_CLUSTERS: usize = 5;

/// Speaking rate used to estimate audio duration from word count.
pub const WORDS_PER_MINUTE: usize = 150;

/// Prompts are bounded to this many bytes of cluster text.
const MAX_PROMPT_CONTENT_BYTES: usize = 6000;

const EXCERPT_CHARS: usize = 200;

/// Everything the orchestrator needs to persist a broadcast row.
#[derive(Debug, Clone)]
pub struct ScriptDraft {
    pub text: String,
    pub excerpt: String,
    pub cluster_count: i64,
    pub item_count: i64,
    pub word_count: i64,
    pub duration_secs: f64,
}

/// Replace placeholder summaries with synthesized ones for the clusters
/// that will make the bulletin.
///
/// A failed or malformed summarizer call leaves the placeholder in
/// place through an explicit, logged fallback; it never aborts the run.
pub async fn summarize_clusters(
    clusters: &mut [Cluster],
    summarizer: &dyn Summarizer,
    policy: &RetryPolicy,
    call_timeout: Duration,
) {
    for cluster in clusters.iter_mut().take(MAX_CLUSTERS) {
        let prompt = build_prompt(cluster);

        let result = retry_with_backoff(policy, "summarize_cluster", || {
            with_timeout(call_timeout, summarizer.summarize(&prompt))
        })
        .await;

        match result {
            Ok(summary) if !summary.trim().is_empty() => {
                cluster.summary = summary.trim().to_string();
            }
            Ok(_) => {
                warn!(
                    category = %cluster.category,
                    "summarizer returned empty text, keeping placeholder summary"
                );
                cluster.summary = cluster.placeholder_summary();
            }
            Err(e) => {
                warn!(
                    category = %cluster.category,
                    error = %e,
                    "summarizer unavailable, keeping placeholder summary"
                );
                cluster.summary = cluster.placeholder_summary();
            }
        }
    }
}

/// Build the bounded summarization prompt for one cluster.
fn build_prompt(cluster: &Cluster) -> String {
    let mut combined = String::new();
    for item in &cluster.items {
        combined.push_str(&format!("[{}] {}\n", item.author, item.content));
    }

    // Truncate on a char boundary, like any other bounded prompt
    if combined.len() > MAX_PROMPT_CONTENT_BYTES {
        let mut end = MAX_PROMPT_CONTENT_BYTES;
        while end > 0 && !combined.is_char_boundary(end) {
            end -= 1;
        }
        combined.truncate(end);
    }

    format!(
        "You are writing one item of a spoken news bulletin. Summarize the {} posts \
         below about {} into 1-2 factual sentences. Attribute claims to the posting \
         accounts where relevant. Do not speculate or add outside information.\n\n{}",
        cluster.len(),
        cluster.category,
        combined
    )
}

/// Stitch per-cluster summaries into the bulletin script.
///
/// Takes at most the top [`MAX_CLUSTERS`] clusters in the order given
/// (clustering already sorted them), so the lead story is deterministic.
pub fn assemble(clusters: &[Cluster]) -> ScriptDraft {
    let selected: Vec<&Cluster> = clusters.iter().take(MAX_CLUSTERS).collect();

    let stories = selected
        .iter()
        .enumerate()
        .map(|(i, cluster)| format!("{}. {}", i + 1, cluster.summary))
        .collect::<Vec<_>>()
        .join("\n");

    let text = format!("{PREAMBLE}\n\n{stories}\n\n{SIGN_OFF}");

    let word_count = text.split_whitespace().count();
    let duration_secs = estimate_duration_secs(word_count);

    let excerpt = selected
        .first()
        .map(|cluster| {
            let mut excerpt: String = cluster.summary.chars().take(EXCERPT_CHARS).collect();
            if cluster.summary.chars().count() > EXCERPT_CHARS {
                excerpt.push_str("...");
            }
            excerpt
        })
        .unwrap_or_default();

    let item_count: usize = selected.iter().map(|c| c.len()).sum();

    info!(
        clusters = selected.len(),
        items = item_count,
        words = word_count,
        "script assembled"
    );

    ScriptDraft {
        text,
        excerpt,
        cluster_count: selected.len() as i64,
        item_count: item_count as i64,
        word_count: word_count as i64,
        duration_secs,
    }
}

/// Spoken duration at the assumed reading rate.
pub fn estimate_duration_secs(word_count: usize) -> f64 {
    word_count as f64 / WORDS_PER_MINUTE as f64 * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, RawItem};
    use chrono::Utc;

    fn cluster(category: Category, summaries: &[&str]) -> Cluster {
        let items = summaries
            .iter()
            .enumerate()
            .map(|(i, content)| RawItem {
                id: i as i64,
                external_id: format!("ext-{i}"),
                author: format!("author-{i}"),
                verified: false,
                content: content.to_string(),
                posted_at: Utc::now(),
                engagement: 0,
                ingested_at: Utc::now(),
                processed: true,
            })
            .collect();
        Cluster::new(category, items)
    }

    #[test]
    fn test_assemble_structure() {
        let mut economy = cluster(Category::Economy, &["a", "b"]);
        economy.summary = "Markets rallied on earnings.".to_string();
        let mut politics = cluster(Category::Politics, &["c"]);
        politics.summary = "Parliament passed the budget.".to_string();

        let draft = assemble(&[economy, politics]);

        assert!(draft.text.starts_with(PREAMBLE));
        assert!(draft.text.ends_with(SIGN_OFF));
        assert!(draft.text.contains("1. Markets rallied on earnings."));
        assert!(draft.text.contains("2. Parliament passed the budget."));

        // Sections separated by blank lines
        assert_eq!(draft.text.matches("\n\n").count(), 2);

        assert_eq!(draft.cluster_count, 2);
        assert_eq!(draft.item_count, 3);
        assert_eq!(
            draft.word_count,
            draft.text.split_whitespace().count() as i64
        );
        assert_eq!(draft.excerpt, "Markets rallied on earnings.");
    }

    #[test]
    fn test_assemble_caps_at_five_clusters() {
        let clusters: Vec<Cluster> = [
            Category::Politics,
            Category::Economy,
            Category::Technology,
            Category::Health,
            Category::Science,
            Category::Education,
            Category::Sports,
        ]
        .into_iter()
        .map(|c| cluster(c, &["x"]))
        .collect();

        let draft = assemble(&clusters);
        assert_eq!(draft.cluster_count, 5);
        assert!(draft.text.contains("5. "));
        assert!(!draft.text.contains("6. "));
    }

    #[test]
    fn test_duration_estimate() {
        // 150 words per minute
        assert_eq!(estimate_duration_secs(150), 60.0);
        assert_eq!(estimate_duration_secs(75), 30.0);
    }

    #[test]
    fn test_prompt_is_bounded() {
        let long = "word ".repeat(5000);
        let c = cluster(Category::General, &[&long, &long]);
        let prompt = build_prompt(&c);
        assert!(prompt.len() < MAX_PROMPT_CONTENT_BYTES + 500);
    }
}
