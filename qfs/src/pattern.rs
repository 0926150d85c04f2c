use serde::{Deserialize, Serialize};

use crate::errors::{Result, SearchError};

/// How sub-pattern texts are interpreted against a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Case-insensitive substring containment.
    Literal,
    /// Case-insensitive full-name regular expression match.
    Regex,
}

/// Logical composition of the sub-patterns into one match decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Single,
    And,
    Or,
}

/// A parsed search expression: one or more sub-patterns, how to interpret
/// them, and how to combine them. Built once from raw user input and shared
/// read-only by every traversal worker.
///
/// Expression syntax:
/// - `report` — single literal
/// - `report&&2024` — all literals must appear in the name
/// - `jpg||png` — any literal may appear in the name
/// - `/back.*\.tar/` — regular expression, must match the whole name
///
/// `&&` and `||` cannot be mixed in one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    pub patterns: Vec<String>,
    pub kind: PatternKind,
    pub mode: MatchMode,
}

impl PatternSpec {
    /// Parses a combined search expression.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SearchError::EmptyPattern);
        }

        let (kind, body) = if trimmed.len() >= 2
            && trimmed.starts_with('/')
            && trimmed.ends_with('/')
        {
            (PatternKind::Regex, &trimmed[1..trimmed.len() - 1])
        } else {
            (PatternKind::Literal, trimmed)
        };

        let has_and = body.contains("&&");
        let has_or = body.contains("||");

        let (mode, parts): (MatchMode, Vec<&str>) = match (has_and, has_or) {
            (true, true) => return Err(SearchError::ambiguous_operators(trimmed)),
            (true, false) => (MatchMode::And, body.split("&&").collect()),
            (false, true) => (MatchMode::Or, body.split("||").collect()),
            (false, false) => (MatchMode::Single, vec![body]),
        };

        let patterns: Vec<String> = parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        if patterns.is_empty() {
            return Err(SearchError::EmptyPattern);
        }

        Ok(Self {
            patterns,
            kind,
            mode,
        })
    }

    /// Builds a spec from independently supplied tokens (e.g. several
    /// positional CLI arguments). Each non-empty token becomes one literal
    /// sub-pattern and the tokens are OR-combined; this path never produces
    /// a regex spec.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        let patterns: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        match patterns.len() {
            0 => Err(SearchError::EmptyPattern),
            1 => Ok(Self {
                patterns,
                kind: PatternKind::Literal,
                mode: MatchMode::Single,
            }),
            _ => Ok(Self {
                patterns,
                kind: PatternKind::Literal,
                mode: MatchMode::Or,
            }),
        }
    }
}
