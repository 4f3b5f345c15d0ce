//! Pure content analysis: quality scoring and lexical categorization.
//!
//! Nothing in this module performs I/O; both functions are deterministic
//! so the filter stage can be tested without a store or network.

pub mod categorizer;
pub mod scorer;

pub use categorizer::{categorize, Categorization};
pub use scorer::{score_content, ScoreOutcome};
