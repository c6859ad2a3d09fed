use crate::parse::ParseError;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, u32 as number},
    combinator::{map, opt},
    sequence::{delimited, preceded},
};
use serde::Serialize;
use std::fmt;

/// Marker git emits after a line that has no trailing newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Role of a line within a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Present in both revisions
    Context,
    /// Present only in the modified revision
    Add,
    /// Present only in the original revision
    Remove,
}

impl LineKind {
    /// The single-character unified diff prefix for this kind
    pub fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Add => '+',
            LineKind::Remove => '-',
        }
    }

    /// The kind for a unified diff prefix character, if it is one
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            ' ' => Some(LineKind::Context),
            '+' => Some(LineKind::Add),
            '-' => Some(LineKind::Remove),
            _ => None,
        }
    }

    /// Whether a line of this kind exists in the original revision
    pub fn in_old(self) -> bool {
        matches!(self, LineKind::Context | LineKind::Remove)
    }

    /// Whether a line of this kind exists in the modified revision
    pub fn in_new(self) -> bool {
        matches!(self, LineKind::Context | LineKind::Add)
    }
}

/// A single tagged line of a hunk.
///
/// `Display` renders the tagged form (`"+content"`, `"-content"`, `" content"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkLine {
    pub kind: LineKind,
    /// Line text without its line terminator
    pub content: String,
    /// The line is the last of its revision and lacks a trailing newline
    pub missing_newline: bool,
}

impl HunkLine {
    pub fn new(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            missing_newline: false,
        }
    }

    pub fn context(content: impl Into<String>) -> Self {
        Self::new(LineKind::Context, content)
    }

    pub fn add(content: impl Into<String>) -> Self {
        Self::new(LineKind::Add, content)
    }

    pub fn remove(content: impl Into<String>) -> Self {
        Self::new(LineKind::Remove, content)
    }

    /// Mark this line as lacking a trailing newline
    #[must_use]
    pub fn without_newline(mut self) -> Self {
        self.missing_newline = true;
        self
    }

    /// Copy of this line with a different kind, keeping its text
    #[must_use]
    pub fn with_kind(&self, kind: LineKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }

    /// Append this line to patch text, followed by the no-newline marker if needed
    pub(crate) fn write_to(&self, out: &mut String) {
        out.push(self.kind.prefix());
        out.push_str(&self.content);
        out.push('\n');
        if self.missing_newline {
            out.push_str(NO_NEWLINE_MARKER);
            out.push('\n');
        }
    }
}

impl fmt::Display for HunkLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.content)
    }
}

/// One contiguous region of difference between two texts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    /// Position among all hunks of the same diff
    pub index: usize,
    /// 1-based first line in the original text (the preceding line when `old_lines == 0`)
    pub old_start: u32,
    pub old_lines: u32,
    /// 1-based first line in the modified text (the preceding line when `new_lines == 0`)
    pub new_start: u32,
    pub new_lines: u32,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Build a hunk whose line counts are derived from its lines
    pub fn new(index: usize, old_start: u32, new_start: u32, lines: Vec<HunkLine>) -> Self {
        let (old_lines, new_lines) = count_lines(&lines);
        Self {
            index,
            old_start,
            old_lines,
            new_start,
            new_lines,
            lines,
        }
    }

    /// The `@@ -a,b +c,d @@` header line for this hunk
    pub fn header(&self) -> String {
        format_header(self.old_start, self.old_lines, self.new_start, self.new_lines)
    }

    /// Parse a hunk (header plus body lines) from unified diff text.
    ///
    /// Body parsing stops once the header's line counts are satisfied; any
    /// trailing `\ No newline at end of file` marker is still attached to the
    /// final line.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the header is malformed, a body line has an
    /// unknown prefix or the body is shorter than the header claims.
    pub fn parse(text: &str, index: usize) -> Result<Self, ParseError> {
        let mut lines = split_lines(text);
        let header = lines.next().ok_or(ParseError::EmptyHunk)?;
        let HunkRanges { old, new } = parse_header(header)?;

        let mut body: Vec<HunkLine> = Vec::new();
        let (mut old_found, mut new_found) = (0u32, 0u32);

        for line in lines {
            if line.starts_with('\\') {
                if let Some(last) = body.last_mut() {
                    last.missing_newline = true;
                }
                continue;
            }
            if old_found >= old.count && new_found >= new.count {
                break;
            }

            // Some tools strip the single space from empty context lines
            let line_kind = match line.chars().next() {
                None => Some(LineKind::Context),
                Some(prefix) => LineKind::from_prefix(prefix),
            };
            let Some(kind) = line_kind else {
                return Err(ParseError::InvalidLine {
                    line: line.to_string(),
                });
            };

            old_found += u32::from(kind.in_old());
            new_found += u32::from(kind.in_new());
            body.push(HunkLine::new(kind, line.get(1..).unwrap_or_default()));
        }

        if old_found != old.count || new_found != new.count {
            return Err(ParseError::Truncated {
                header: header.to_string(),
                old_found,
                new_found,
            });
        }

        Ok(Hunk {
            index,
            old_start: old.start,
            old_lines: old.count,
            new_start: new.start,
            new_lines: new.count,
            lines: body,
        })
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.header();
        out.push('\n');
        for line in &self.lines {
            line.write_to(&mut out);
        }
        f.write_str(&out)
    }
}

/// Count `(old, new)` lines: context counts toward both sides
pub fn count_lines(lines: &[HunkLine]) -> (u32, u32) {
    lines.iter().fold((0, 0), |(old, new), line| {
        (
            old + u32::from(line.kind.in_old()),
            new + u32::from(line.kind.in_new()),
        )
    })
}

/// Render a hunk header, always spelling out both counts
pub fn format_header(old_start: u32, old_lines: u32, new_start: u32, new_lines: u32) -> String {
    format!("@@ -{old_start},{old_lines} +{new_start},{new_lines} @@")
}

/// Start and length of one side of a hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub count: u32,
}

/// Both sides of a parsed hunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkRanges {
    pub old: LineRange,
    pub new: LineRange,
}

/// `136,0` or `137` (count defaults to 1)
fn line_range(input: &str) -> IResult<&str, LineRange> {
    map(
        (number, opt(preceded(char(','), number))),
        |(start, count): (u32, Option<u32>)| LineRange {
            start,
            count: count.unwrap_or(1),
        },
    )
    .parse(input)
}

fn hunk_header(input: &str) -> IResult<&str, HunkRanges> {
    map(
        (
            preceded(tag("@@ -"), line_range),
            delimited(tag(" +"), line_range, tag(" @@")),
        ),
        |(old, new)| HunkRanges { old, new },
    )
    .parse(input)
}

/// Parse a hunk header line, ignoring any section heading after the closing `@@`
///
/// # Errors
///
/// Returns [`ParseError::InvalidHeader`] if the line is not a hunk header.
pub fn parse_header(header: &str) -> Result<HunkRanges, ParseError> {
    hunk_header(header)
        .map(|(_, ranges)| ranges)
        .map_err(|_| ParseError::InvalidHeader {
            header: header.to_string(),
        })
}

/// Split on `\n` only so that `\r` stays part of the line content
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.split('\n').filter(move |_| !text.is_empty())
}
