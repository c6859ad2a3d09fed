//! Splitting hunks into independently stageable change groups.
//!
//! A line diff often bundles nearby but unrelated edits into one hunk. Each
//! maximal run of `+`/`-` lines inside a hunk becomes its own [`ChangeGroup`],
//! which is the unit the staging and patch code works with.

use crate::diff::{Hunk, HunkLine, LineKind};
use serde::Serialize;
use std::ops::RangeInclusive;

/// One independently stageable change within a hunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeGroup {
    /// Position among all groups of one diff computation
    pub group_index: usize,
    /// [`Hunk::index`] of the owning hunk
    pub hunk_index: usize,
    /// First modified-text line covered (inclusive)
    pub new_start: u32,
    /// Last modified-text line covered (inclusive)
    pub new_end: u32,
    /// First index into the owning hunk's lines
    pub line_offset_start: usize,
    /// Last index into the owning hunk's lines (inclusive)
    pub line_offset_end: usize,
    /// Unset until reconciled against a staged diff
    pub is_staged: Option<bool>,
}

impl ChangeGroup {
    /// Copy of this group with its staged state set
    #[must_use]
    pub fn with_staged(self, is_staged: bool) -> Self {
        Self {
            is_staged: Some(is_staged),
            ..self
        }
    }

    /// Offsets into the owning hunk's lines covered by this group
    pub fn line_offsets(&self) -> RangeInclusive<usize> {
        self.line_offset_start..=self.line_offset_end
    }

    /// The hunk lines this group spans, or nothing if `hunk` is not its owner
    pub fn lines<'h>(&self, hunk: &'h Hunk) -> &'h [HunkLine] {
        hunk.lines.get(self.line_offsets()).unwrap_or_default()
    }
}

/// A run of non-context lines being collected
struct PendingRun {
    offset_start: usize,
    offset_end: usize,
    candidate_start: u32,
    last_plus_line: Option<u32>,
}

impl PendingRun {
    fn finish(self, group_index: usize, hunk_index: usize) -> ChangeGroup {
        let (new_start, new_end) = match self.last_plus_line {
            Some(last) => (self.candidate_start, last),
            None => {
                // Pure deletion: anchor on the line before the removed content
                let anchor = self.candidate_start.saturating_sub(1).max(1);
                (anchor, anchor)
            }
        };

        ChangeGroup {
            group_index,
            hunk_index,
            new_start,
            new_end,
            line_offset_start: self.offset_start,
            line_offset_end: self.offset_end,
            is_staged: None,
        }
    }
}

/// Split one hunk into its change groups, numbering them from `start_group_index`
pub fn split_hunk_into_groups(hunk: &Hunk, start_group_index: usize) -> Vec<ChangeGroup> {
    let mut groups = Vec::new();
    let mut run: Option<PendingRun> = None;
    // A pure-deletion hunk's header names the line before the deletion
    let mut modified_line = if hunk.new_lines == 0 && hunk.new_start > 0 {
        hunk.new_start + 1
    } else {
        hunk.new_start
    };

    for (offset, line) in hunk.lines.iter().enumerate() {
        if line.kind == LineKind::Context {
            if let Some(pending) = run.take() {
                groups.push(pending.finish(start_group_index + groups.len(), hunk.index));
            }
            modified_line += 1;
            continue;
        }

        let pending = run.get_or_insert(PendingRun {
            offset_start: offset,
            offset_end: offset,
            candidate_start: modified_line,
            last_plus_line: None,
        });
        pending.offset_end = offset;

        if line.kind == LineKind::Add {
            pending.last_plus_line = Some(modified_line);
            modified_line += 1;
        }
    }

    if let Some(pending) = run {
        groups.push(pending.finish(start_group_index + groups.len(), hunk.index));
    }

    groups
}

/// Split every hunk, numbering groups globally in ascending order
pub fn compute_change_groups(hunks: &[Hunk]) -> Vec<ChangeGroup> {
    let groups = hunks.iter().fold(Vec::new(), |mut groups, hunk| {
        let next_index = groups.len();
        groups.extend(split_hunk_into_groups(hunk, next_index));
        groups
    });

    tracing::debug!(hunks = hunks.len(), groups = groups.len(), "split hunks into groups");
    groups
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diff::{DiffOptions, compute_hunks, compute_hunks_with};
    use similar_asserts::assert_eq;

    fn hunk(new_start: u32, lines: Vec<HunkLine>) -> Hunk {
        Hunk::new(0, new_start, new_start, lines)
    }

    fn numbered_text(count: usize) -> String {
        (1..=count).map(|i| format!("line{i}\n")).collect()
    }

    #[test]
    fn single_line_replacement_is_one_group() {
        let hunk = hunk(
            4,
            vec![
                HunkLine::context("x"),
                HunkLine::remove("a"),
                HunkLine::add("b"),
                HunkLine::context("y"),
            ],
        );

        let groups = split_hunk_into_groups(&hunk, 0);
        assert_eq!(
            groups,
            vec![ChangeGroup {
                group_index: 0,
                hunk_index: 0,
                new_start: 5,
                new_end: 5,
                line_offset_start: 1,
                line_offset_end: 2,
                is_staged: None,
            }]
        );
    }

    #[test]
    fn pure_addition_spans_all_added_lines() {
        let hunk = hunk(
            10,
            vec![
                HunkLine::context("a"),
                HunkLine::add("one"),
                HunkLine::add("two"),
                HunkLine::add("three"),
                HunkLine::context("b"),
            ],
        );

        let groups = split_hunk_into_groups(&hunk, 0);
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].new_start, groups[0].new_end), (11, 13));
        assert_eq!(groups[0].line_offsets(), 1..=3);
    }

    #[test]
    fn pure_deletion_anchors_on_previous_line() {
        let hunk = hunk(
            7,
            vec![
                HunkLine::context("a"),
                HunkLine::context("b"),
                HunkLine::remove("gone"),
                HunkLine::remove("also gone"),
                HunkLine::context("c"),
            ],
        );

        let groups = split_hunk_into_groups(&hunk, 0);
        assert_eq!(groups.len(), 1);
        // Deletion point is line 9 of the modified text; anchor is line 8
        assert_eq!((groups[0].new_start, groups[0].new_end), (8, 8));
        assert_eq!(groups[0].line_offsets(), 2..=3);
    }

    #[test]
    fn deletion_at_file_start_anchors_on_line_one() {
        let hunk = hunk(1, vec![HunkLine::remove("first"), HunkLine::context("second")]);

        let groups = split_hunk_into_groups(&hunk, 0);
        assert_eq!((groups[0].new_start, groups[0].new_end), (1, 1));
    }

    #[test]
    fn deleting_everything_anchors_on_line_one() {
        let hunks = compute_hunks("a\nb\n", "", "f");
        let groups = compute_change_groups(&hunks);
        assert_eq!(groups.len(), 1);
        assert_eq!((groups[0].new_start, groups[0].new_end), (1, 1));
    }

    #[test]
    fn deletion_anchor_is_independent_of_context() {
        let original = numbered_text(10);
        let modified = original.replace("line5\n", "");

        for context_lines in [0, 1, 3] {
            let options = DiffOptions {
                context_lines,
                ..DiffOptions::default()
            };
            let hunks = compute_hunks_with(&original, &modified, "f", &options);
            let groups = compute_change_groups(&hunks);
            assert_eq!(groups.len(), 1);
            assert_eq!((groups[0].new_start, groups[0].new_end), (4, 4));
        }
    }

    #[test]
    fn zero_context_deletion_at_file_start_anchors_on_line_one() {
        let options = DiffOptions {
            context_lines: 0,
            ..DiffOptions::default()
        };
        let hunks = compute_hunks_with("a\nb\nc\n", "b\nc\n", "f", &options);
        assert_eq!(hunks[0].header(), "@@ -1,1 +0,0 @@");
        let groups = compute_change_groups(&hunks);
        assert_eq!((groups[0].new_start, groups[0].new_end), (1, 1));
    }

    #[test]
    fn context_separated_runs_become_separate_groups() {
        let hunk = hunk(
            1,
            vec![
                HunkLine::context("a"),
                HunkLine::remove("b"),
                HunkLine::add("B"),
                HunkLine::context("c"),
                HunkLine::remove("d"),
                HunkLine::context("e"),
                HunkLine::add("f"),
            ],
        );

        let groups = split_hunk_into_groups(&hunk, 5);
        assert_eq!(groups.len(), 3);
        assert_eq!(
            groups.iter().map(|g| g.group_index).collect::<Vec<_>>(),
            vec![5, 6, 7]
        );
        assert_eq!(groups[0].line_offsets(), 1..=2);
        assert_eq!((groups[0].new_start, groups[0].new_end), (2, 2));
        // "d" was removed after modified line 3 ("c")
        assert_eq!(groups[1].line_offsets(), 4..=4);
        assert_eq!((groups[1].new_start, groups[1].new_end), (3, 3));
        assert_eq!(groups[2].line_offsets(), 6..=6);
        assert_eq!((groups[2].new_start, groups[2].new_end), (5, 5));
    }

    #[test]
    fn deletion_groups_anchor_on_preceding_modified_line() {
        let hunk = hunk(
            1,
            vec![
                HunkLine::context("a"),
                HunkLine::remove("b"),
                HunkLine::context("c"),
                HunkLine::remove("d"),
                HunkLine::context("e"),
            ],
        );

        let groups = split_hunk_into_groups(&hunk, 0);
        assert_eq!((groups[0].new_start, groups[0].new_end), (1, 1));
        assert_eq!((groups[1].new_start, groups[1].new_end), (2, 2));
    }

    #[test]
    fn replacement_in_small_file_is_one_group() {
        let hunks = compute_hunks("line1\noriginal\nline3\n", "line1\nmodified\nline3\n", "f");
        let groups = compute_change_groups(&hunks);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines(&hunks[0]).len(), 2);
        assert_eq!((groups[0].new_start, groups[0].new_end), (2, 2));
    }

    #[test]
    fn groups_are_numbered_across_hunks() {
        let original = numbered_text(20);
        let modified = original
            .replace("line2\n", "second\n")
            .replace("line18\n", "eighteenth\n");

        let hunks = compute_hunks(&original, &modified, "f");
        let groups = compute_change_groups(&hunks);
        assert_eq!(hunks.len(), 2);
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].group_index, groups[0].hunk_index), (0, 0));
        assert_eq!((groups[1].group_index, groups[1].hunk_index), (1, 1));
        assert_eq!((groups[0].new_start, groups[0].new_end), (2, 2));
        assert_eq!((groups[1].new_start, groups[1].new_end), (18, 18));
    }

    #[test]
    fn lines_of_foreign_hunk_are_empty() {
        let group = ChangeGroup {
            group_index: 0,
            hunk_index: 0,
            new_start: 1,
            new_end: 1,
            line_offset_start: 10,
            line_offset_end: 12,
            is_staged: None,
        };
        let small = hunk(1, vec![HunkLine::add("only")]);
        assert!(group.lines(&small).is_empty());
    }

    #[test]
    fn with_staged_sets_state() {
        let hunk = hunk(1, vec![HunkLine::add("x")]);
        let group = split_hunk_into_groups(&hunk, 0).remove(0);
        assert_eq!(group.is_staged, None);
        assert_eq!(group.with_staged(true).is_staged, Some(true));
    }
}
