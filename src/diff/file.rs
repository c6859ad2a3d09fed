use super::hunk::Hunk;
use crate::parse::ParseError;
use std::fmt;

/// A complete diff for a single file.
///
/// Contains all hunks for one file, as read back from `git diff` output or
/// from patch text produced by [`crate::patch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// File path (from the `+++ b/path` header, or `--- a/path` for deletions)
    pub path: String,
    /// All hunks for this file, indexed in order of appearance
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Parse a single-file unified diff.
    ///
    /// Lines before the first `@@` header (`diff --git`, `index`, mode lines)
    /// are only consulted for the path.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingPath`] if no path header is present, or the
    /// error of the first hunk that fails to parse.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let header_lines = || text.lines().take_while(|line| !line.starts_with("@@ "));
        let path = header_lines()
            .find_map(|line| line.strip_prefix("+++ b/"))
            .or_else(|| header_lines().find_map(|line| line.strip_prefix("--- a/")))
            .filter(|path| !path.is_empty())
            .ok_or(ParseError::MissingPath)?
            .to_string();

        let mut sections: Vec<String> = Vec::new();
        for line in text.split_inclusive('\n') {
            if line.starts_with("@@ ") {
                sections.push(String::new());
            }
            if let Some(section) = sections.last_mut() {
                section.push_str(line);
            }
        }

        let hunks = sections
            .iter()
            .enumerate()
            .map(|(index, section)| Hunk::parse(section, index))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::trace!(path = %path, hunks = hunks.len(), "parsed file diff");
        Ok(FileDiff { path, hunks })
    }

}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::patch::render(&self.path, &self.hunks))
    }
}
