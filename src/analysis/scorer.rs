//! Quality scoring for raw posts.
//!
//! Scoring is a pure function over the post body, author verification,
//! and engagement count. The confidence starts at 1.0 and moves through
//! fixed adjustments; a post is valid when its clamped confidence meets
//! the category threshold and no penalty reasons were recorded.

/// Minimum visible length (after stripping markup) for a post to score.
const MIN_VISIBLE_CHARS: usize = 15;

/// Emoji and hashtag counts above these limits invalidate a post.
const MAX_EMOJI: usize = 5;
const MAX_HASHTAGS: usize = 5;

const EMOJI_PENALTY: f64 = 0.3;
const HASHTAG_PENALTY: f64 = 0.2;
const NO_ENGAGEMENT_PENALTY: f64 = 0.2;
const HIGH_ENGAGEMENT_BONUS: f64 = 0.2;
const VERIFIED_BONUS: f64 = 0.3;

/// High engagement starts above this count.
const HIGH_ENGAGEMENT: i64 = 100;

/// Result of scoring one post. The category is decided separately by
/// the categorizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub valid: bool,

    /// Clamped to [0, 1]
    pub confidence: f64,

    /// Penalty reasons, empty for clean posts
    pub reasons: Vec<String>,
}

/// Score a post body against a confidence threshold.
pub fn score_content(
    content: &str,
    verified: bool,
    engagement: i64,
    threshold: f64,
) -> ScoreOutcome {
    let visible = strip_markup(content);

    // Short-circuit: too little real text to evaluate at all
    if visible.chars().count() < MIN_VISIBLE_CHARS {
        return ScoreOutcome {
            valid: false,
            confidence: 0.0,
            reasons: vec!["Too short".to_string()],
        };
    }

    let emoji = count_emoji(content);
    let hashtags = count_hashtags(content);

    let mut confidence = 1.0_f64;
    let mut reasons = Vec::new();

    if emoji > MAX_EMOJI {
        confidence -= EMOJI_PENALTY;
        reasons.push(format!("Too many emojis ({emoji})"));
    }

    if hashtags > MAX_HASHTAGS {
        confidence -= HASHTAG_PENALTY;
        reasons.push(format!("Too many hashtags ({hashtags})"));
    }

    // Unverified accounts with no engagement lose confidence but do
    // not pick up a rejection reason
    if engagement == 0 && !verified {
        confidence -= NO_ENGAGEMENT_PENALTY;
    }

    if engagement > HIGH_ENGAGEMENT {
        confidence += HIGH_ENGAGEMENT_BONUS;
    }

    if verified {
        confidence += VERIFIED_BONUS;
    }

    let confidence = confidence.clamp(0.0, 1.0);

    let valid = confidence >= threshold
        && emoji <= MAX_EMOJI
        && hashtags <= MAX_HASHTAGS
        && reasons.is_empty();

    ScoreOutcome {
        valid,
        confidence,
        reasons,
    }
}

/// Strip markup tokens (URLs, @mentions, `#` markers) leaving the
/// visible text used for the length check.
fn strip_markup(content: &str) -> String {
    let mut parts = Vec::new();

    for token in content.split_whitespace() {
        if token.starts_with("http://") || token.starts_with("https://") {
            continue;
        }
        if token.starts_with('@') {
            continue;
        }
        // Hashtag words stay visible, the marker does not
        let token = token.trim_start_matches('#');
        if !token.is_empty() {
            parts.push(token);
        }
    }

    parts.join(" ")
}

fn count_hashtags(content: &str) -> usize {
    content
        .split_whitespace()
        .filter(|t| t.starts_with('#') && t.len() > 1)
        .count()
}

fn count_emoji(content: &str) -> usize {
    content.chars().filter(|c| is_emoji(*c)).count()
}

/// Covers the common emoji blocks; not exhaustive, but stable.
fn is_emoji(c: char) -> bool {
    matches!(u32::from(c),
        0x1F300..=0x1F5FF   // symbols & pictographs
        | 0x1F600..=0x1F64F // emoticons
        | 0x1F680..=0x1F6FF // transport & map
        | 0x1F900..=0x1F9FF // supplemental symbols
        | 0x1FA70..=0x1FAFF // extended-A
        | 0x2600..=0x26FF   // miscellaneous symbols
        | 0x2700..=0x27BF   // dingbats
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: f64 = 0.6;

    #[test]
    fn test_short_content_rejected() {
        let outcome = score_content("hi", false, 50, THRESHOLD);
        assert!(!outcome.valid);
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.reasons, vec!["Too short"]);
    }

    #[test]
    fn test_markup_does_not_count_toward_length() {
        // Only "ok" is visible once the URL and mention are stripped
        let outcome = score_content(
            "ok https://example.com/a/very/long/link @somebody",
            true,
            500,
            THRESHOLD,
        );
        assert!(!outcome.valid);
        assert_eq!(outcome.reasons, vec!["Too short"]);
    }

    #[test]
    fn test_clean_verified_post_is_valid() {
        let outcome = score_content(
            "The central bank held interest rates steady today.",
            true,
            250,
            THRESHOLD,
        );
        assert!(outcome.valid);
        assert_eq!(outcome.confidence, 1.0);
        assert!(outcome.reasons.is_empty());
    }

    #[test]
    fn test_emoji_flood_invalid_even_above_threshold() {
        let content = "Breaking news about the economy today 🎉🎉🎉🎉🎉🎉";
        let outcome = score_content(content, true, 500, THRESHOLD);
        // Confidence 1.0 - 0.3 + 0.2 + 0.3 clamps to 1.0, but the
        // penalty reason alone invalidates the post
        assert!(!outcome.valid);
        assert_eq!(outcome.reasons.len(), 1);
        assert!(outcome.reasons[0].starts_with("Too many emojis"));
    }

    #[test]
    fn test_hashtag_flood_penalized() {
        let content = "market rally continues #a #b #c #d #e #f";
        let outcome = score_content(content, false, 10, THRESHOLD);
        assert!(!outcome.valid);
        assert!(outcome.reasons[0].starts_with("Too many hashtags"));
        assert!((outcome.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_unverified_zero_engagement_penalty() {
        let outcome = score_content(
            "A longer piece of perfectly ordinary content.",
            false,
            0,
            THRESHOLD,
        );
        assert!((outcome.confidence - 0.8).abs() < 1e-9);
        // No reason recorded, still valid at the default threshold
        assert!(outcome.valid);
    }

    #[test]
    fn test_confidence_monotonic_in_engagement_for_verified() {
        let content = "Officials confirmed the schedule for next week.";
        let mut last = 0.0_f64;
        for engagement in [0, 1, 50, 100, 101, 1000, 100_000] {
            let outcome = score_content(content, true, engagement, THRESHOLD);
            assert!(outcome.reasons.is_empty());
            assert!(outcome.confidence >= last);
            assert!(outcome.confidence <= 1.0);
            last = outcome.confidence;
        }
    }

    #[test]
    fn test_confidence_clamped_to_unit_interval() {
        let outcome = score_content(
            "Officials confirmed the schedule for next week.",
            true,
            1_000_000,
            THRESHOLD,
        );
        assert_eq!(outcome.confidence, 1.0);
    }

    #[test]
    fn test_deterministic() {
        let content = "Researchers published results from the trial.";
        let a = score_content(content, false, 42, THRESHOLD);
        let b = score_content(content, false, 42, THRESHOLD);
        assert_eq!(a, b);
    }
}
