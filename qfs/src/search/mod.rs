//! Concurrent file name search.
//!
//! [`matcher`] turns a parsed [`PatternSpec`](crate::pattern::PatternSpec)
//! into a compiled predicate over file names; [`engine`] walks the directory
//! tree with a bounded number of worker threads and aggregates matches into
//! one sorted result set.

pub mod engine;
pub mod matcher;

pub use engine::{search, MatchSink};
pub use matcher::FilenameMatcher;
