//! Best-effort extraction of the structured sections from generated prose.
//!
//! A header is a line that starts with one of the section names and is
//! marked as a header by at least one of: a markdown `#` prefix, bold
//! markup, a trailing colon, or nothing else on the line. A section's body
//! runs to the next header or the end of the text. Missing or empty
//! sections stay `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::MAX_SECTION_CHARS;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(#{1,6}[ \t]*)?(?:\d+[.)][ \t]*)?(\*\*)?[ \t]*(recommendations?|timeline|costs?|requirements|risks)\b[ \t]*(\*\*)?[ \t]*(:)?[ \t]*(\*\*)?[ \t]*",
    )
    .expect("section header pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Recommendation,
    Timeline,
    Cost,
    Requirements,
    Risks,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Recommendation,
        Section::Timeline,
        Section::Cost,
        Section::Requirements,
        Section::Risks,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Recommendation => "Recommendation",
            Section::Timeline => "Timeline",
            Section::Cost => "Cost",
            Section::Requirements => "Requirements",
            Section::Risks => "Risks",
        }
    }

    fn from_header(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "recommendation" | "recommendations" => Some(Section::Recommendation),
            "timeline" => Some(Section::Timeline),
            "cost" | "costs" => Some(Section::Cost),
            "requirements" => Some(Section::Requirements),
            "risks" => Some(Section::Risks),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    pub recommendation: Option<String>,
    pub timeline: Option<String>,
    pub cost: Option<String>,
    pub requirements: Option<String>,
    pub risks: Option<String>,
}

impl ExtractedFields {
    pub fn get(&self, section: Section) -> Option<&str> {
        match section {
            Section::Recommendation => self.recommendation.as_deref(),
            Section::Timeline => self.timeline.as_deref(),
            Section::Cost => self.cost.as_deref(),
            Section::Requirements => self.requirements.as_deref(),
            Section::Risks => self.risks.as_deref(),
        }
    }

    fn slot(&mut self, section: Section) -> &mut Option<String> {
        match section {
            Section::Recommendation => &mut self.recommendation,
            Section::Timeline => &mut self.timeline,
            Section::Cost => &mut self.cost,
            Section::Requirements => &mut self.requirements,
            Section::Risks => &mut self.risks,
        }
    }

    pub fn found_count(&self) -> usize {
        Section::ALL
            .iter()
            .filter(|s| self.get(**s).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.found_count() == 0
    }
}

struct Header {
    section: Section,
    start: usize,
    body_start: usize,
}

fn find_headers(text: &str) -> Vec<Header> {
    HEADER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let section = Section::from_header(caps.get(3)?.as_str())?;

            let marked = caps.get(1).is_some() || caps.get(2).is_some() || caps.get(5).is_some();
            let rest_of_line = text[whole.end()..].lines().next().unwrap_or("");
            if !marked && !rest_of_line.trim().is_empty() {
                return None;
            }

            Some(Header {
                section,
                start: whole.start(),
                body_start: whole.end(),
            })
        })
        .collect()
}

/// Pulls every known section out of `text`. The first occurrence of a
/// section wins; bodies longer than the cap are cut at a char boundary.
pub fn extract_fields(text: &str) -> ExtractedFields {
    let headers = find_headers(text);
    let mut fields = ExtractedFields::default();

    for (i, header) in headers.iter().enumerate() {
        let end = headers.get(i + 1).map_or(text.len(), |next| next.start);
        let slot = fields.slot(header.section);
        if slot.is_some() {
            continue;
        }

        let body = clean_body(&text[header.body_start..end]);
        if !body.is_empty() {
            *slot = Some(truncate_chars(&body, MAX_SECTION_CHARS));
        }
    }

    fields
}

fn clean_body(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("**")
        .trim_end_matches("**")
        .trim()
        .to_string()
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}
