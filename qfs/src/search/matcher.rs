use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use tracing::warn;

use crate::pattern::{MatchMode, PatternKind, PatternSpec};

static PATTERN_CACHE: Lazy<DashMap<String, MatchStrategy>> = Lazy::new(DashMap::new);

/// Compiled form of one sub-pattern.
#[derive(Debug, Clone)]
enum MatchStrategy {
    /// Lowercased literal, checked by substring containment.
    Literal(String),
    /// Case-insensitive regex anchored to the whole file name.
    Regex(Arc<Regex>),
    /// A sub-pattern whose regex failed to compile. Warned about once at
    /// compile time, matches nothing thereafter.
    NeverMatches,
}

/// Evaluates file names against a compiled pattern specification.
///
/// Construction never fails: a malformed regex sub-pattern degrades to a
/// non-matching strategy so the rest of the search proceeds. Matching is a
/// pure predicate and safe to share across workers.
#[derive(Debug, Clone)]
pub struct FilenameMatcher {
    strategies: Vec<MatchStrategy>,
    mode: MatchMode,
}

impl FilenameMatcher {
    pub fn new(spec: &PatternSpec) -> Self {
        let strategies = spec
            .patterns
            .iter()
            .map(|p| compile(p, spec.kind))
            .collect();
        Self {
            strategies,
            mode: spec.mode,
        }
    }

    /// Returns true if `file_name` satisfies the pattern specification.
    /// AND stops at the first failing sub-pattern, OR at the first success.
    pub fn is_match(&self, file_name: &str) -> bool {
        let lowered = self
            .strategies
            .iter()
            .any(|s| matches!(s, MatchStrategy::Literal(_)))
            .then(|| file_name.to_lowercase());
        let eval = |s: &MatchStrategy| match s {
            MatchStrategy::Literal(pat) => lowered
                .as_deref()
                .is_some_and(|name| name.contains(pat.as_str())),
            MatchStrategy::Regex(re) => re.is_match(file_name),
            MatchStrategy::NeverMatches => false,
        };

        match self.mode {
            MatchMode::Single => self.strategies.first().map(eval).unwrap_or(false),
            MatchMode::And => self.strategies.iter().all(eval),
            MatchMode::Or => self.strategies.iter().any(eval),
        }
    }
}

fn compile(pattern: &str, kind: PatternKind) -> MatchStrategy {
    let key = match kind {
        PatternKind::Literal => format!("lit:{pattern}"),
        PatternKind::Regex => format!("re:{pattern}"),
    };
    if let Some(entry) = PATTERN_CACHE.get(&key) {
        return entry.clone();
    }

    let strategy = match kind {
        PatternKind::Literal => MatchStrategy::Literal(pattern.to_lowercase()),
        // Anchor so the whole name must match, not merely contain a match.
        PatternKind::Regex => match RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => MatchStrategy::Regex(Arc::new(re)),
            Err(err) => {
                warn!("invalid regex sub-pattern '{pattern}', treating as non-matching: {err}");
                MatchStrategy::NeverMatches
            }
        },
    };
    PATTERN_CACHE.insert(key, strategy.clone());
    strategy
}
