//! Converts raw generated text into a [`StructuredDocument`].
//!
//! The input is split into blocks on blank lines. A block whose first line
//! starts with an upper-case weekday name is a day block and its lines are
//! tagged individually; any other block becomes a single `Plain` section.
//! Output order always follows input order. Parsing never fails: empty or
//! whitespace-only input yields an empty document.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Weekday tokens that open a day block.
pub const DAY_TOKENS: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// Prefix of the focus line inside a day block.
pub const FOCUS_PREFIX: &str = "Focus:";

const BULLET_GLYPHS: [char; 3] = ['•', '-', '*'];

// `Warm-Up (10 minutes)`: a label followed by a parenthesised expression
// containing at least one digit.
const SUBHEADING_PATTERN: &str = r"^[^•*\-\s(][^()]*?\s*\([^()]*\d[^()]*\)$";

// `Pace: comfortably hard`
const LABELED_PATTERN: &str = r"^[^•*\-\s:][^:]*:\s*\S.*$";

/// Structural role of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Weekday header opening a day block.
    DayHeader,
    /// The `Focus:` line of a day block.
    FocusLine,
    /// Titled section such as `Warm-Up (10 minutes)`.
    Subheading,
    /// Bullet item or labeled detail line.
    BulletDetail,
    /// Anything else.
    Plain,
}

/// One tagged piece of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Structural role.
    pub kind: SectionKind,
    /// Trimmed source text.
    pub text: String,
    /// Header text of the enclosing day block, for lines inside one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_day: Option<String>,
}

impl Section {
    /// Creates a section outside any day block.
    pub fn new(kind: SectionKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            parent_day: None,
        }
    }

    /// Creates a section nested under `day`.
    pub fn in_day(kind: SectionKind, text: impl Into<String>, day: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            parent_day: Some(day.into()),
        }
    }
}

/// Flat, ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    sections: Vec<Section>,
}

impl StructuredDocument {
    /// Wraps a list of sections.
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Sections in source order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Consumes the document, returning its sections.
    pub fn into_sections(self) -> Vec<Section> {
        self.sections
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterates over sections.
    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    /// Header texts of every day block, in order.
    pub fn days(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .filter(|s| s.kind == SectionKind::DayHeader)
            .map(|s| s.text.as_str())
    }
}

impl<'a> IntoIterator for &'a StructuredDocument {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

/// Stateless text → document parser.
#[derive(Debug, Clone)]
pub struct ContentParser {
    subheading: Option<Regex>,
    labeled: Option<Regex>,
}

impl ContentParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self {
            subheading: compile(SUBHEADING_PATTERN),
            labeled: compile(LABELED_PATTERN),
        }
    }

    /// Parses `raw` into a document.
    pub fn parse(&self, raw: &str) -> StructuredDocument {
        let mut sections = Vec::new();

        for block in split_blocks(raw) {
            match block.first().copied().filter(|line| is_day_header(line)) {
                Some(header) => self.parse_day_block(header, &block[1..], &mut sections),
                None => sections.push(Section::new(SectionKind::Plain, block.join("\n"))),
            }
        }

        StructuredDocument::new(sections)
    }

    fn parse_day_block(&self, header: &str, lines: &[&str], out: &mut Vec<Section>) {
        out.push(Section::new(SectionKind::DayHeader, header));

        let mut focus_seen = false;
        for &line in lines {
            let kind = if !focus_seen && line.starts_with(FOCUS_PREFIX) {
                focus_seen = true;
                SectionKind::FocusLine
            } else {
                self.classify_line(line)
            };
            out.push(Section::in_day(kind, line, header));
        }
    }

    /// Tags a single non-header line of a day block.
    pub fn classify_line(&self, line: &str) -> SectionKind {
        if matches(self.subheading.as_ref(), line) {
            SectionKind::Subheading
        } else if matches(self.labeled.as_ref(), line) || line.starts_with(BULLET_GLYPHS) {
            SectionKind::BulletDetail
        } else {
            SectionKind::Plain
        }
    }
}

impl Default for ContentParser {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::error!(pattern, error = %err, "Invalid line pattern");
            None
        }
    }
}

fn matches(re: Option<&Regex>, line: &str) -> bool {
    re.is_some_and(|re| re.is_match(line))
}

fn is_day_header(line: &str) -> bool {
    DAY_TOKENS.iter().any(|day| line.starts_with(day))
}

/// Splits text into blocks of trimmed, non-empty lines.
fn split_blocks(raw: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}
