//! Lexical categorization over a fixed keyword table.
//!
//! Categorization is substring counting, nothing statistical: the post
//! body is lower-cased and each category's keywords are counted, then
//! categories are ranked by count with ties broken by the explicit
//! priority order in [`Category::PRIORITY`].

use crate::domain::Category;

/// Keyword table, one entry per keyword-backed category, in priority
/// order. Keywords are matched as lower-case substrings.
const KEYWORDS: [(Category, &[&str]); 8] = [
    (
        Category::Politics,
        &[
            "president",
            "government",
            "election",
            "policy",
            "senate",
            "congress",
            "minister",
            "parliament",
            "vote",
            "legislation",
        ],
    ),
    (
        Category::Economy,
        &[
            "economy",
            "market",
            "inflation",
            "stocks",
            "trade deal",
            "interest rate",
            "gdp",
            "earnings",
            "recession",
            "unemployment",
        ],
    ),
    (
        Category::Technology,
        &[
            "technology",
            "software",
            "startup",
            "artificial intelligence",
            "chip",
            "internet",
            "cyber",
            "smartphone",
            "robot",
            "data center",
        ],
    ),
    (
        Category::Health,
        &[
            "health",
            "hospital",
            "vaccine",
            "disease",
            "doctor",
            "medical",
            "virus",
            "patient",
            "outbreak",
            "treatment",
        ],
    ),
    (
        Category::Science,
        &[
            "science",
            "research",
            "climate",
            "space",
            "nasa",
            "physics",
            "biology",
            "discovery",
            "telescope",
            "experiment",
        ],
    ),
    (
        Category::Education,
        &[
            "education",
            "school",
            "university",
            "student",
            "teacher",
            "curriculum",
            "tuition",
            "campus",
            "classroom",
            "scholarship",
        ],
    ),
    (
        Category::Sports,
        &[
            "game",
            "championship",
            "tournament",
            "league",
            "coach",
            "playoff",
            "olympic",
            "stadium",
            "athlete",
            "season opener",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "movie",
            "film",
            "album",
            "celebrity",
            "concert",
            "music",
            "actor",
            "festival",
            "box office",
            "premiere",
        ],
    ),
];

/// Categorizer output: one primary plus up to two secondaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorization {
    pub primary: Category,
    pub secondary: Vec<Category>,
}

/// Categorize a post body.
///
/// Falls back to [`Category::General`] when no keyword matches at all.
pub fn categorize(content: &str) -> Categorization {
    let lowered = content.to_lowercase();

    // Counts land in priority order, so a stable sort by count keeps
    // the tie-break explicit
    let mut ranked: Vec<(Category, usize)> = KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let count = keywords
                .iter()
                .map(|k| lowered.matches(k).count())
                .sum::<usize>();
            (*category, count)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let primary = match ranked.first() {
        Some((category, count)) if *count > 0 => *category,
        _ => Category::General,
    };

    let secondary: Vec<Category> = ranked
        .iter()
        .skip(1)
        .filter(|(_, count)| *count > 0)
        .take(2)
        .map(|(category, _)| *category)
        .collect();

    let secondary = if primary == Category::General {
        Vec::new()
    } else {
        secondary
    };

    Categorization { primary, secondary }
}
