//! Parsing for the index selection syntax and shared parse errors.
//!
//! Selections pick hunks (or groups) by their zero-based index:
//!
//! - `N` - a single index
//! - `N..M` - an inclusive range
//! - `A,B..C,D` - any comma-separated mix of the above
//!
//! # Examples
//!
//! ```
//! use diffstage::parse::parse_selection;
//!
//! assert_eq!(parse_selection("2").unwrap(), vec![2]);
//! assert_eq!(parse_selection("0,3..5").unwrap(), vec![0, 3, 4, 5]);
//! assert_eq!(parse_selection("4, 1").unwrap(), vec![1, 4]);
//! ```

use error_set::error_set;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, space0, u32 as number},
    combinator::{all_consuming, map},
    multi::separated_list1,
    sequence::{delimited, separated_pair},
};
use std::collections::BTreeSet;

error_set! {
    /// Errors from parsing unified diff text or index selections
    ParseError := {
        /// Hunk text contained no header line
        #[display("Empty hunk text")]
        EmptyHunk,
        /// Hunk header is not of the form `@@ -a,b +c,d @@`
        #[display("Invalid hunk header '{header}'")]
        InvalidHeader { header: String },
        /// Body line does not start with ' ', '+' or '-'
        #[display("Invalid hunk line '{line}'")]
        InvalidLine { line: String },
        /// Hunk body ended before the header's line counts were reached
        #[display("Hunk '{header}' is truncated: found {old_found} old and {new_found} new lines")]
        Truncated {
            header: String,
            old_found: u32,
            new_found: u32,
        },
        /// No `+++ b/` or `--- a/` path header in a file diff
        #[display("Could not find file path in diff")]
        MissingPath,
        /// Selection string is not a valid list of indices
        #[display("Invalid selection '{input}'")]
        InvalidSelection { input: String },
        /// Range has start greater than end
        #[display("Invalid range {start}..{end}: start must be <= end")]
        InvalidRange { start: usize, end: usize },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SelectionItem {
    Single(usize),
    Range(usize, usize),
}

fn index(input: &str) -> IResult<&str, usize> {
    map(number, |n: u32| n as usize).parse(input)
}

fn selection_item(input: &str) -> IResult<&str, SelectionItem> {
    delimited(
        space0,
        alt((
            map(separated_pair(index, tag(".."), index), |(start, end)| {
                SelectionItem::Range(start, end)
            }),
            map(index, SelectionItem::Single),
        )),
        space0,
    )
    .parse(input)
}

fn selection(input: &str) -> IResult<&str, Vec<SelectionItem>> {
    all_consuming(separated_list1(char(','), selection_item)).parse(input)
}

/// Parse a selection string into a sorted, de-duplicated list of indices.
///
/// # Errors
///
/// Returns [`ParseError::InvalidSelection`] for malformed input and
/// [`ParseError::InvalidRange`] for a range whose start exceeds its end.
pub fn parse_selection(input: &str) -> Result<Vec<usize>, ParseError> {
    let (_, items) = selection(input.trim()).map_err(|_| ParseError::InvalidSelection {
        input: input.to_string(),
    })?;

    let mut indices = BTreeSet::new();
    for item in items {
        match item {
            SelectionItem::Single(n) => {
                indices.insert(n);
            }
            SelectionItem::Range(start, end) if start > end => {
                return Err(ParseError::InvalidRange { start, end });
            }
            SelectionItem::Range(start, end) => indices.extend(start..=end),
        }
    }

    Ok(indices.into_iter().collect())
}
