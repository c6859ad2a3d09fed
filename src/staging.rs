//! Reconciling working-tree change groups against a staged diff.
//!
//! The working diff (base → working) and the staged diff (base → staged) are
//! computed independently, so modified-text line numbers cannot be compared
//! between them once any staged change shifts the file. Groups are instead
//! matched on a [`GroupKey`]: the group's position in the *base* text plus the
//! exact tagged lines it contains.

use crate::diff::{DiffOptions, Hunk, compute_hunks_with};
use crate::group::{ChangeGroup, compute_change_groups};
use crate::patch;
use error_set::error_set;
use std::collections::HashSet;

error_set! {
    /// Errors from selecting groups or hunks of a [`FileStaging`]
    StagingError := {
        #[display("No change group with index {index}")]
        UnknownGroup { index: usize },
    }
}

/// Structural identity of a change group, comparable across diffs of the same base
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    /// Base-text line at which the group starts
    pub old_anchor: u32,
    /// The group's tagged lines joined with `\n`
    pub text: String,
}

impl GroupKey {
    /// Key for `group`, looked up in the hunk set it was derived from.
    ///
    /// Returns `None` if no hunk in `hunks` has the group's `hunk_index`.
    pub fn for_group(group: &ChangeGroup, hunks: &[Hunk]) -> Option<Self> {
        let hunk = hunks.iter().find(|hunk| hunk.index == group.hunk_index)?;

        let lines_before = hunk
            .lines
            .iter()
            .take(group.line_offset_start)
            .filter(|line| line.kind.in_old())
            .count();
        let old_anchor = hunk.old_start + lines_before as u32;

        let text = group
            .lines(hunk)
            .iter()
            .map(|line| {
                if line.missing_newline {
                    format!("{line}\n{}", crate::diff::hunk::NO_NEWLINE_MARKER)
                } else {
                    line.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        Some(Self { old_anchor, text })
    }
}

/// Mark each working group as staged iff an identical change at the same base
/// position exists among the staged groups.
///
/// `groups` must come from `hunks` and `staged_groups` from `staged_hunks`.
/// The inputs are left untouched; a new annotated sequence is returned.
pub fn mark_staged_groups(
    groups: &[ChangeGroup],
    staged_groups: &[ChangeGroup],
    hunks: &[Hunk],
    staged_hunks: &[Hunk],
) -> Vec<ChangeGroup> {
    let staged_keys: HashSet<GroupKey> = staged_groups
        .iter()
        .filter_map(|group| GroupKey::for_group(group, staged_hunks))
        .collect();

    let marked: Vec<ChangeGroup> = groups
        .iter()
        .map(|group| {
            let is_staged = GroupKey::for_group(group, hunks)
                .is_some_and(|key| staged_keys.contains(&key));
            group.clone().with_staged(is_staged)
        })
        .collect();

    tracing::debug!(
        groups = marked.len(),
        staged = marked.iter().filter(|g| g.is_staged == Some(true)).count(),
        "reconciled change groups"
    );
    marked
}

/// Both diff pipelines for one file, reconciled.
///
/// Runs base → working and base → staged, splits both into groups, marks the
/// working groups already present in the staged revision and builds the patch
/// text for staging or unstaging a single group.
#[derive(Debug, Clone)]
pub struct FileStaging {
    path: String,
    hunks: Vec<Hunk>,
    groups: Vec<ChangeGroup>,
    staged_hunks: Vec<Hunk>,
    staged_groups: Vec<ChangeGroup>,
}

impl FileStaging {
    /// Diff `base` against `working` and `staged`, then reconcile the two
    pub fn new(
        path: impl Into<String>,
        base: &str,
        working: &str,
        staged: &str,
        options: &DiffOptions,
    ) -> Self {
        let path = path.into();

        let hunks = compute_hunks_with(base, working, &path, options);
        let staged_hunks = compute_hunks_with(base, staged, &path, options);
        let staged_groups = compute_change_groups(&staged_hunks);
        let groups = mark_staged_groups(
            &compute_change_groups(&hunks),
            &staged_groups,
            &hunks,
            &staged_hunks,
        );

        Self {
            path,
            hunks,
            groups,
            staged_hunks,
            staged_groups,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hunks of the base → working diff
    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Working groups, each with `is_staged` set
    pub fn groups(&self) -> &[ChangeGroup] {
        &self.groups
    }

    /// Hunks of the base → staged diff
    pub fn staged_hunks(&self) -> &[Hunk] {
        &self.staged_hunks
    }

    /// Groups of the base → staged diff
    pub fn staged_groups(&self) -> &[ChangeGroup] {
        &self.staged_groups
    }

    /// Working groups not yet reflected in the staged revision
    pub fn unstaged_groups(&self) -> impl Iterator<Item = &ChangeGroup> {
        self.groups
            .iter()
            .filter(|group| group.is_staged == Some(false))
    }

    /// Patch that stages exactly one working group when applied to the base
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::UnknownGroup`] if no working group has that index.
    pub fn stage_group_patch(&self, group_index: usize) -> Result<String, StagingError> {
        let (hunk, group) = find_group(&self.groups, &self.hunks, group_index)?;
        Ok(patch::generate_group_patch(&self.path, hunk, group))
    }

    /// Patch that removes exactly one staged group from the staged revision
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::UnknownGroup`] if no staged group has that index.
    pub fn unstage_group_patch(&self, staged_group_index: usize) -> Result<String, StagingError> {
        let (hunk, group) = find_group(&self.staged_groups, &self.staged_hunks, staged_group_index)?;
        Ok(patch::generate_unstage_group_patch(&self.path, hunk, group))
    }

    /// Patch with the selected working hunks, empty if none match
    pub fn stage_hunks_patch(&self, hunk_indices: &[usize]) -> String {
        patch::generate_patch(&self.path, &self.hunks, hunk_indices)
    }
}

fn find_group<'a>(
    groups: &'a [ChangeGroup],
    hunks: &'a [Hunk],
    index: usize,
) -> Result<(&'a Hunk, &'a ChangeGroup), StagingError> {
    groups
        .iter()
        .find(|group| group.group_index == index)
        .and_then(|group| {
            hunks
                .iter()
                .find(|hunk| hunk.index == group.hunk_index)
                .map(|hunk| (hunk, group))
        })
        .ok_or(StagingError::UnknownGroup { index })
}
