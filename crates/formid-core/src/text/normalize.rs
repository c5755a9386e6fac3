//! Text cleanup into ordered, non-empty lines.

use std::ops::Deref;

/// Ordered, trimmed, non-empty lines of a page.
///
/// Line order follows the source text; adjacency matters to the name
/// heuristics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedLines(Vec<String>);

impl NormalizedLines {
    /// Lines joined with `\n`.
    pub fn joined(&self) -> String {
        self.0.join("\n")
    }
}

impl Deref for NormalizedLines {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn is_kept(c: char) -> bool {
    matches!(c, ' '..='~' | '\t' | '\n' | '\r')
}

/// Drop every character outside printable ASCII, tab, LF and CR.
pub fn clean(raw: &str) -> String {
    raw.chars().filter(|c| is_kept(*c)).collect()
}

/// Clean `raw` and split it into trimmed, non-empty lines.
pub fn normalize(raw: &str) -> NormalizedLines {
    let lines = clean(raw)
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    NormalizedLines(lines)
}
