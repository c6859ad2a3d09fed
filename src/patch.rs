use crate::diff::{Hunk, HunkLine, LineKind};
use crate::group::ChangeGroup;

/// Build a patch containing the hunks whose index is in `selected_indices`.
///
/// Hunks are emitted in their own ascending order, not selection order.
/// Indices matching no hunk are ignored; if nothing matches the result is the
/// empty string, meaning there is nothing to apply.
pub fn generate_patch(file_path: &str, hunks: &[Hunk], selected_indices: &[usize]) -> String {
    let mut selected: Vec<&Hunk> = hunks
        .iter()
        .filter(|hunk| selected_indices.contains(&hunk.index))
        .collect();
    if selected.is_empty() {
        return String::new();
    }
    selected.sort_by_key(|hunk| hunk.index);

    tracing::trace!(file = file_path, hunks = selected.len(), "generated hunk patch");
    render(file_path, selected)
}

/// Build a patch that applies only `group` out of its owning `hunk`.
///
/// Outside the group, removals turn back into context and additions are
/// dropped, so the remaining text matches the base revision. The hunk keeps
/// `hunk.old_start` as both start lines.
pub fn generate_group_patch(file_path: &str, hunk: &Hunk, group: &ChangeGroup) -> String {
    let lines = neutralize(hunk, group, |line| match line.kind {
        LineKind::Remove => Some(line.with_kind(LineKind::Context)),
        LineKind::Add => None,
        LineKind::Context => Some(line.clone()),
    });

    let patch_hunk = Hunk::new(hunk.index, hunk.old_start, hunk.old_start, lines);
    render(file_path, [&patch_hunk])
}

/// Build a patch that takes `group` back out of the revision it was staged into.
///
/// `hunk` and `group` come from the base → staged diff. The patch is expressed
/// against the staged text: outside the group, additions become context and
/// removals are dropped; inside it, the staged additions are removed and the
/// base lines restored. The hunk keeps `hunk.new_start` as both start lines.
pub fn generate_unstage_group_patch(file_path: &str, hunk: &Hunk, group: &ChangeGroup) -> String {
    let mut lines = Vec::with_capacity(hunk.lines.len());
    for (offset, line) in hunk.lines.iter().enumerate() {
        if group.line_offsets().contains(&offset) {
            if offset == group.line_offset_start {
                lines.extend(invert_group(group.lines(hunk)));
            }
            continue;
        }
        match line.kind {
            LineKind::Add => lines.push(line.with_kind(LineKind::Context)),
            LineKind::Remove => {}
            LineKind::Context => lines.push(line.clone()),
        }
    }

    let patch_hunk = Hunk::new(hunk.index, hunk.new_start, hunk.new_start, lines);
    render(file_path, [&patch_hunk])
}

/// Keep the group's lines verbatim and map every other line through `outside`
fn neutralize(
    hunk: &Hunk,
    group: &ChangeGroup,
    outside: impl Fn(&HunkLine) -> Option<HunkLine>,
) -> Vec<HunkLine> {
    hunk.lines
        .iter()
        .enumerate()
        .filter_map(|(offset, line)| {
            if group.line_offsets().contains(&offset) {
                Some(line.clone())
            } else {
                outside(line)
            }
        })
        .collect()
}

/// Swap additions and removals, removals first
fn invert_group(lines: &[HunkLine]) -> impl Iterator<Item = HunkLine> + '_ {
    let added = lines
        .iter()
        .filter(|line| line.kind == LineKind::Add)
        .map(|line| line.with_kind(LineKind::Remove));
    let removed = lines
        .iter()
        .filter(|line| line.kind == LineKind::Remove)
        .map(|line| line.with_kind(LineKind::Add));
    added.chain(removed)
}

/// Render file headers followed by each hunk's header and lines
pub(crate) fn render<'h>(file_path: &str, hunks: impl IntoIterator<Item = &'h Hunk>) -> String {
    let mut patch = String::new();

    patch.push_str(&format!("--- a/{file_path}\n"));
    patch.push_str(&format!("+++ b/{file_path}\n"));

    for hunk in hunks {
        patch.push_str(&hunk.header());
        patch.push('\n');
        for line in &hunk.lines {
            line.write_to(&mut patch);
        }
    }

    patch
}
