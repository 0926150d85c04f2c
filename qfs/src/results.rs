use std::fmt;
use std::path::PathBuf;

/// A single matched file: its bare name and its absolute path.
///
/// Ownership moves into the shared result set the moment a worker produces
/// one; workers never hold on to matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub file_name: String,
    pub path: PathBuf,
}

impl fmt::Display for SearchMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Found {} at: {}", self.file_name, self.path.display())
    }
}

/// The complete outcome of one search invocation, sorted by absolute path.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub matches: Vec<SearchMatch>,
}

impl SearchResults {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Imposes the final total order. Paths are unique within one traversal,
    /// so ties are impossible.
    pub fn sort_by_path(&mut self) {
        self.matches.sort_unstable_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchMatch> {
        self.matches.iter()
    }
}

impl IntoIterator for SearchResults {
    type Item = SearchMatch;
    type IntoIter = std::vec::IntoIter<SearchMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let m = SearchMatch {
            file_name: "notes.txt".to_string(),
            path: PathBuf::from("/home/user/notes.txt"),
        };
        assert_eq!(m.to_string(), "Found notes.txt at: /home/user/notes.txt");
    }

    #[test]
    fn test_sort_by_path() {
        let mut results = SearchResults::new();
        for p in ["/b/file.txt", "/a/z.txt", "/a/b.txt"] {
            let path = PathBuf::from(p);
            results.matches.push(SearchMatch {
                file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
                path,
            });
        }
        results.sort_by_path();

        let sorted: Vec<_> = results.iter().map(|m| m.path.clone()).collect();
        assert_eq!(
            sorted,
            vec![
                PathBuf::from("/a/b.txt"),
                PathBuf::from("/a/z.txt"),
                PathBuf::from("/b/file.txt"),
            ]
        );
    }

    #[test]
    fn test_empty_results() {
        let results = SearchResults::new();
        assert!(results.is_empty());
        assert_eq!(results.len(), 0);
    }
}
