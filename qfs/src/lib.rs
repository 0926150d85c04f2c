pub mod config;
pub mod errors;
pub mod pattern;
pub mod results;
pub mod search;

pub use config::SearchConfig;
pub use errors::{Result, SearchError};
pub use pattern::{MatchMode, PatternKind, PatternSpec};
pub use results::{SearchMatch, SearchResults};
pub use search::{search, FilenameMatcher};
