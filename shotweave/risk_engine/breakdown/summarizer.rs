use std::{collections::BTreeSet, sync::Arc};

use serde::{Deserialize, Serialize};

use super::{
    padding::{PaddingSource, RandomPadding},
    spans::TextSpan,
};

/// Script characters per additional shoot day.
pub const CHARS_PER_SHOOT_DAY: f64 = 5000.0;
/// Shoot days attributed to each location.
pub const DAYS_PER_LOCATION: f64 = 2.5;
/// Shoot days attributed to each character.
pub const DAYS_PER_CHARACTER: f64 = 1.0;
/// Ceiling of the complexity score.
pub const MAX_COMPLEXITY: u8 = 100;

/// Script breakdown report.
///
/// An all-zero breakdown means recognition was unavailable, not that the script is trivial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptBreakdown {
    /// Distinct locations plus padding.
    pub location_count: usize,
    /// Distinct characters plus padding.
    pub character_count: usize,
    /// Heuristic number of shoot days.
    pub estimated_shoot_days: u32,
    /// Complexity in `[0, 100]`.
    pub complexity_score: u8,
    /// Distinct recognised locations, sorted.
    pub locations: Vec<String>,
    /// Distinct recognised characters, sorted.
    pub characters: Vec<String>,
}

impl ScriptBreakdown {
    /// The degraded breakdown returned when recognition is unavailable.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// True for the degraded all-zero breakdown.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Deduplicated entity sets, before padding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySets {
    /// Location and facility texts.
    pub locations: BTreeSet<String>,
    /// Person texts.
    pub characters: BTreeSet<String>,
}

impl EntitySets {
    /// Partitions spans by kind, deduplicating on exact text.
    #[must_use]
    pub fn from_spans(spans: &[TextSpan]) -> Self {
        let mut sets = Self::default();
        for span in spans {
            if span.kind.is_location() {
                sets.locations.insert(span.text.clone());
            } else if span.kind.is_person() {
                sets.characters.insert(span.text.clone());
            }
        }
        sets
    }
}

/// Shoot-day heuristic. Halves round to even.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn estimate_shoot_days(
    location_count: usize,
    character_count: usize,
    script_length: usize,
) -> u32 {
    let length_days = script_length as f64 / CHARS_PER_SHOOT_DAY;
    let days = (location_count as f64).mul_add(
        DAYS_PER_LOCATION,
        (character_count as f64).mul_add(DAYS_PER_CHARACTER, length_days),
    );
    days.round_ties_even().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Complexity heuristic, capped at [`MAX_COMPLEXITY`].
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn complexity_score(location_count: usize, character_count: usize) -> u8 {
    let raw = 1.5 * (location_count as f64).mul_add(5.0, character_count as f64 * 3.0);
    raw.min(f64::from(MAX_COMPLEXITY)).max(0.0) as u8
}

/// Reduces classified spans to counts and heuristics.
#[derive(Clone)]
pub struct EntitySummarizer {
    padding: Arc<dyn PaddingSource>,
}

impl std::fmt::Debug for EntitySummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySummarizer").finish_non_exhaustive()
    }
}

impl Default for EntitySummarizer {
    fn default() -> Self {
        Self::new(Arc::new(RandomPadding::new()))
    }
}

impl EntitySummarizer {
    /// Creates a summarizer drawing padding from `padding`.
    #[must_use]
    pub fn new(padding: Arc<dyn PaddingSource>) -> Self {
        Self { padding }
    }

    /// Summarizes spans for a script of `script_length` characters.
    #[must_use]
    pub fn summarize(&self, spans: &[TextSpan], script_length: usize) -> ScriptBreakdown {
        let sets = EntitySets::from_spans(spans);
        let location_count = sets
            .locations
            .len()
            .saturating_add(self.padding.location_padding());
        let character_count = sets
            .characters
            .len()
            .saturating_add(self.padding.character_padding());
        ScriptBreakdown {
            location_count,
            character_count,
            estimated_shoot_days: estimate_shoot_days(location_count, character_count, script_length),
            complexity_score: complexity_score(location_count, character_count),
            locations: sets.locations.into_iter().collect(),
            characters: sets.characters.into_iter().collect(),
        }
    }
}
