//! Hunk extraction from two full-text revisions.
//!
//! [`compute_hunks`] wraps the line diff of the [`similar`] crate and turns its
//! grouped operations into [`Hunk`]s with standard unified diff numbering.

pub mod file;
pub mod hunk;

pub use file::FileDiff;
pub use hunk::{Hunk, HunkLine, LineKind};

use similar::{ChangeTag, TextDiff};

/// Context lines kept around each change, as `git diff` does by default
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Line diff algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Algorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

impl From<Algorithm> for similar::Algorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Myers => similar::Algorithm::Myers,
            Algorithm::Patience => similar::Algorithm::Patience,
            Algorithm::Lcs => similar::Algorithm::Lcs,
        }
    }
}

/// Options for [`compute_hunks_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    pub context_lines: usize,
    pub algorithm: Algorithm,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            algorithm: Algorithm::default(),
        }
    }
}

/// Compute the hunks turning `original` into `modified` with default options.
///
/// Identical inputs always yield no hunks. `file_label` only tags log output.
///
/// # Examples
///
/// ```
/// use diffstage::diff::compute_hunks;
///
/// let hunks = compute_hunks("line1\nline2\n", "line1\nline2\nline3\n", "notes.txt");
/// assert_eq!(hunks.len(), 1);
/// assert_eq!(hunks[0].lines.last().unwrap().to_string(), "+line3");
/// ```
pub fn compute_hunks(original: &str, modified: &str, file_label: &str) -> Vec<Hunk> {
    compute_hunks_with(original, modified, file_label, &DiffOptions::default())
}

/// Compute the hunks turning `original` into `modified`.
pub fn compute_hunks_with(
    original: &str,
    modified: &str,
    file_label: &str,
    options: &DiffOptions,
) -> Vec<Hunk> {
    if original == modified {
        tracing::trace!(file = file_label, "revisions identical");
        return Vec::new();
    }

    let diff = TextDiff::configure()
        .algorithm(options.algorithm.into())
        .diff_lines(original, modified);

    let hunks: Vec<Hunk> = diff
        .grouped_ops(options.context_lines)
        .iter()
        .enumerate()
        .map(|(index, ops)| {
            let lines: Vec<HunkLine> = ops
                .iter()
                .flat_map(|op| diff.iter_changes(op))
                .map(|change| {
                    let kind = match change.tag() {
                        ChangeTag::Equal => LineKind::Context,
                        ChangeTag::Insert => LineKind::Add,
                        ChangeTag::Delete => LineKind::Remove,
                    };
                    let value = change.value();
                    HunkLine {
                        kind,
                        content: value.strip_suffix('\n').unwrap_or(value).to_string(),
                        missing_newline: change.missing_newline(),
                    }
                })
                .collect();

            let (old_offset, new_offset) = ops
                .first()
                .map(|op| (op.old_range().start, op.new_range().start))
                .unwrap_or_default();
            let (old_lines, new_lines) = hunk::count_lines(&lines);

            Hunk::new(
                index,
                range_start(old_offset, old_lines),
                range_start(new_offset, new_lines),
                lines,
            )
        })
        .collect();

    tracing::debug!(file = file_label, hunks = hunks.len(), "computed hunks");
    hunks
}

/// Convert a 0-based offset into a unified diff start line.
/// Empty ranges name the line before them.
fn range_start(offset: usize, len: u32) -> u32 {
    let offset = offset as u32;
    if len == 0 { offset } else { offset + 1 }
}
