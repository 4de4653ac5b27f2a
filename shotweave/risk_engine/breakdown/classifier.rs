use std::collections::HashSet;

use anyhow::Context;
use regex::Regex;

use super::spans::{SpanKind, TextSpan};

/// Entity recognition boundary. Implementations keep no per-call mutable state.
pub trait EntityClassifier: Send + Sync {
    /// Returns typed spans in order of appearance.
    fn classify(&self, text: &str) -> Vec<TextSpan>;

    /// False when the backing model is missing; callers then produce a degraded breakdown.
    fn is_available(&self) -> bool {
        true
    }

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

/// Stand-in used when no recogniser is loaded. Always yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClassifier;

impl EntityClassifier for NullClassifier {
    fn classify(&self, _text: &str) -> Vec<TextSpan> {
        Vec::new()
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

const FACILITY_WORDS: &[&str] = &[
    "STUDIO",
    "HOSPITAL",
    "HARBOUR",
    "HARBOR",
    "TEMPLE",
    "CHURCH",
    "MOSQUE",
    "SCHOOL",
    "STATION",
    "HOTEL",
    "OFFICE",
    "FACTORY",
    "WAREHOUSE",
    "AIRPORT",
    "COURT",
    "PRISON",
    "MALL",
    "SET",
];

const NON_CHARACTER_CUES: &[&str] = &[
    "FADE IN",
    "FADE OUT",
    "FADE TO BLACK",
    "THE END",
    "CONTINUED",
    "CUT TO",
    "DISSOLVE TO",
    "INTERCUT",
    "MONTAGE",
    "END MONTAGE",
    "BACK TO SCENE",
    "SUPER",
    "TITLE",
    "LATER",
    "FLASHBACK",
    "END FLASHBACK",
];

/// Rule-based recogniser for screenplay-formatted text.
///
/// Scene headings (`INT.`/`EXT.`) yield the setting as a location, or a facility when the
/// setting names a building. All-caps cue lines yield characters. Capitalised names after
/// place prepositions in action lines ("in Kochi") yield locations.
#[derive(Debug, Clone)]
pub struct ScreenplayClassifier {
    heading: Regex,
    heading_separator: Regex,
    cue: Regex,
    place: Regex,
}

impl ScreenplayClassifier {
    /// Compiles the recognition patterns.
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            heading: Regex::new(
                r"(?i)^\s*(?:INT\.?\s*/\s*EXT\.?|EXT\.?\s*/\s*INT\.?|I/E\.?|INT\.|EXT\.)\s+(.+?)\s*$",
            )
            .context("compiling scene heading pattern")?,
            heading_separator: Regex::new(r"\s+[-–—]+\s+")
                .context("compiling heading separator pattern")?,
            cue: Regex::new(
                r"^\s*([A-Z][A-Z0-9'.\-]*(?:\s+[A-Z][A-Z0-9'.\-]*){0,3})\s*(?:\([^)]*\))?\s*$",
            )
            .context("compiling character cue pattern")?,
            place: Regex::new(
                r"\b(?:[Ii]n|[Aa]t|[Nn]ear|[Ii]nside|[Oo]utside|[Ff]rom)\s+(?:the\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
            )
            .context("compiling place pattern")?,
        })
    }

    fn heading_span(&self, line: &str) -> Option<TextSpan> {
        let captures = self.heading.captures(line)?;
        let setting = captures.get(1)?.as_str();
        let place = self
            .heading_separator
            .split(setting)
            .next()
            .unwrap_or(setting)
            .trim()
            .trim_end_matches('.');
        if place.is_empty() {
            return None;
        }
        let upper = place.to_uppercase();
        let kind = if upper
            .split_whitespace()
            .any(|word| FACILITY_WORDS.contains(&word))
        {
            SpanKind::Facility
        } else {
            SpanKind::Location
        };
        Some(TextSpan::new(title_case(place), kind))
    }

    fn cue_span(&self, line: &str) -> Option<TextSpan> {
        let captures = self.cue.captures(line)?;
        let name = captures.get(1)?.as_str().trim().trim_end_matches('.');
        if name.chars().filter(char::is_ascii_alphabetic).count() < 2
            || NON_CHARACTER_CUES.contains(&name)
        {
            return None;
        }
        Some(TextSpan::person(title_case(name)))
    }
}

impl EntityClassifier for ScreenplayClassifier {
    fn classify(&self, text: &str) -> Vec<TextSpan> {
        // (span, from an action-line preposition)
        let mut found: Vec<(TextSpan, bool)> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(span) = self.heading_span(line) {
                found.push((span, false));
                continue;
            }
            if let Some(span) = self.cue_span(line) {
                found.push((span, false));
                continue;
            }
            found.extend(
                self.place
                    .captures_iter(line)
                    .filter_map(|captures| captures.get(1))
                    .map(|place| (TextSpan::location(place.as_str()), true)),
            );
        }
        // "looks at Raj": a cued character is never a place, wherever the cue appears.
        let characters: HashSet<String> = found
            .iter()
            .filter(|(span, _)| span.kind.is_person())
            .map(|(span, _)| span.text.clone())
            .collect();
        found
            .into_iter()
            .filter(|(span, prepositional)| !(*prepositional && characters.contains(&span.text)))
            .map(|(span, _)| span)
            .collect()
    }

    fn name(&self) -> &'static str {
        "screenplay"
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
