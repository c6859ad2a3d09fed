//! Shared helpers for unit and property tests.

use crate::diff::{Hunk, LineKind};
use proptest::prelude::*;

/// Small line alphabet so that generated revisions share lines
pub fn arb_text() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d", ""]), 0..16),
        any::<bool>(),
    )
        .prop_map(|(lines, trailing_newline)| {
            let mut text = lines.join("\n");
            if trailing_newline && !lines.is_empty() {
                text.push('\n');
            }
            text
        })
}

/// Apply parsed hunks to `text` the way `git apply` would, without checking context
pub fn apply_hunks(text: &str, hunks: &[Hunk]) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::new();
    let mut cursor = 0;

    for hunk in hunks {
        let start = if hunk.old_lines == 0 {
            hunk.old_start
        } else {
            hunk.old_start - 1
        } as usize;
        for line in &lines[cursor..start] {
            out.push_str(line);
        }
        cursor = start;

        for line in &hunk.lines {
            match line.kind {
                LineKind::Context => {
                    out.push_str(lines[cursor]);
                    cursor += 1;
                }
                LineKind::Remove => cursor += 1,
                LineKind::Add => {
                    out.push_str(&line.content);
                    if !line.missing_newline {
                        out.push('\n');
                    }
                }
            }
        }
    }

    for line in &lines[cursor..] {
        out.push_str(line);
    }
    out
}
