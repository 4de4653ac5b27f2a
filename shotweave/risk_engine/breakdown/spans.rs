use serde::{Deserialize, Serialize};

/// Entity category assigned by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpanKind {
    /// Geographic or named place.
    Location,
    /// Built structure (studio, hospital, harbour...).
    Facility,
    /// Named person or character.
    Person,
    /// Anything else the classifier recognised.
    Other,
}

impl SpanKind {
    /// Whether spans of this kind count as shoot locations.
    #[must_use]
    pub const fn is_location(self) -> bool {
        matches!(self, Self::Location | Self::Facility)
    }

    /// Whether spans of this kind count as characters.
    #[must_use]
    pub const fn is_person(self) -> bool {
        matches!(self, Self::Person)
    }
}

/// Typed text span produced by an entity classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    /// Surface text, compared case-sensitively.
    pub text: String,
    /// Entity kind.
    pub kind: SpanKind,
}

impl TextSpan {
    /// Creates a span.
    #[must_use]
    pub fn new(text: impl Into<String>, kind: SpanKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Location span.
    #[must_use]
    pub fn location(text: impl Into<String>) -> Self {
        Self::new(text, SpanKind::Location)
    }

    /// Facility span.
    #[must_use]
    pub fn facility(text: impl Into<String>) -> Self {
        Self::new(text, SpanKind::Facility)
    }

    /// Person span.
    #[must_use]
    pub fn person(text: impl Into<String>) -> Self {
        Self::new(text, SpanKind::Person)
    }
}
