//! Line diffs split into independently stageable change groups.
//!
//! The pipeline runs in four steps:
//!
//! 1. [`compute_hunks`] diffs two full-text revisions into [`Hunk`]s.
//! 2. [`compute_change_groups`] splits each hunk at its context lines into
//!    [`ChangeGroup`]s.
//! 3. [`mark_staged_groups`] compares the working groups against the groups of
//!    an independently computed base → staged diff.
//! 4. [`generate_patch`] and [`generate_group_patch`] turn a selection back
//!    into unified diff text for `git apply --cached`.
//!
//! [`FileStaging`] runs all of them for one file.
//!
//! ```
//! use diffstage::{DiffOptions, FileStaging};
//!
//! let base = "a\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
//! let working = "A\nb\nc\nd\ne\nf\ng\nh\ni\nJ\n";
//! let staged = "A\nb\nc\nd\ne\nf\ng\nh\ni\nj\n";
//!
//! let staging = FileStaging::new("letters.txt", base, working, staged, &DiffOptions::default());
//! let flags: Vec<_> = staging.groups().iter().map(|g| g.is_staged).collect();
//! assert_eq!(flags, vec![Some(true), Some(false)]);
//!
//! let patch = staging.stage_group_patch(1).unwrap();
//! assert!(patch.contains("-j\n+J\n"));
//! ```

use error_set::error_set;
use std::path::Path;

pub mod diff;
pub mod group;
pub mod parse;
pub mod patch;
pub mod staging;

#[cfg(test)]
mod test_utils;

pub use diff::{
    Algorithm, DEFAULT_CONTEXT_LINES, DiffOptions, FileDiff, Hunk, HunkLine, LineKind,
    compute_hunks, compute_hunks_with,
};
pub use group::{ChangeGroup, compute_change_groups, split_hunk_into_groups};
pub use parse::{ParseError, parse_selection};
pub use patch::{generate_group_patch, generate_patch, generate_unstage_group_patch};
pub use staging::{FileStaging, GroupKey, StagingError, mark_staged_groups};

error_set! {
    /// Top-level error for diffstage operations
    DiffStageError := {
        #[display("Failed to read {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Failed to write output: {message}")]
        OutputFailed { message: String },
        ParseError(ParseError),
        StagingError(StagingError),
    }
}

/// Read one revision of a file from disk
///
/// # Errors
///
/// Returns [`DiffStageError::ReadFailed`] if the file cannot be read as UTF-8 text.
pub fn read_revision(path: &Path) -> Result<String, DiffStageError> {
    std::fs::read_to_string(path).map_err(|e| DiffStageError::ReadFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn read_revision_reports_path() {
        let missing = Path::new("/nonexistent/diffstage/revision.txt");
        let err = read_revision(missing).unwrap_err();
        assert!(matches!(err, DiffStageError::ReadFailed { .. }));
        assert!(err.to_string().contains("revision.txt"));
    }

    #[test]
    fn wrapped_errors_convert() {
        let err: DiffStageError = StagingError::UnknownGroup { index: 3 }.into();
        assert!(matches!(
            err,
            DiffStageError::StagingError(StagingError::UnknownGroup { index: 3 })
        ));

        let err: DiffStageError = parse_selection("x").unwrap_err().into();
        assert!(matches!(err, DiffStageError::ParseError(_)));
    }
}
