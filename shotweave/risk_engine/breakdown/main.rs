//! Script breakdown pipeline: classify, then summarize.

/// Entity recognition boundary and implementations.
pub mod classifier;
/// Injectable count padding.
pub mod padding;
/// Typed spans.
pub mod spans;
/// Span reduction and heuristics.
pub mod summarizer;

use classifier::EntityClassifier;
use summarizer::{EntitySummarizer, ScriptBreakdown};

/// Result of a breakdown together with whether it is the degraded placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownOutcome {
    /// The report.
    pub breakdown: ScriptBreakdown,
    /// True when recognition was unavailable and `breakdown` is all zero.
    pub degraded: bool,
}

/// Runs recognition over `script` and summarizes the spans.
///
/// An unavailable classifier yields the empty breakdown instead of an error.
#[must_use]
pub fn breakdown_script(
    classifier: &dyn EntityClassifier,
    summarizer: &EntitySummarizer,
    script: &str,
) -> BreakdownOutcome {
    if !classifier.is_available() {
        return BreakdownOutcome {
            breakdown: ScriptBreakdown::empty(),
            degraded: true,
        };
    }
    let spans = classifier.classify(script);
    BreakdownOutcome {
        breakdown: summarizer.summarize(&spans, script.chars().count()),
        degraded: false,
    }
}
