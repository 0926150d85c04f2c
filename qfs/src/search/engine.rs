use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use tracing::{debug, info};

use super::matcher::FilenameMatcher;
use crate::errors::{Result, SearchError};
use crate::pattern::PatternSpec;
use crate::results::{SearchMatch, SearchResults};

/// Callback invoked once per match, as the match is found. Called from
/// worker threads concurrently; never called while the result lock is held.
pub type MatchSink = Arc<dyn Fn(&SearchMatch) + Send + Sync>;

/// Admission control for spawned traversal workers, doubling as the
/// completion barrier the root waits on.
///
/// The check and the increment happen under one lock, so the budget is a
/// hard cap: at most `max` spawned workers exist at any instant. Directories
/// encountered once the budget is exhausted are descended into inline on the
/// current thread instead.
struct WorkerBudget {
    max: usize,
    active: Mutex<usize>,
    idle: Condvar,
}

impl WorkerBudget {
    fn new(max: usize) -> Self {
        Self {
            max,
            active: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    /// Reserves one worker slot if any is free.
    fn try_reserve(&self) -> bool {
        let mut active = self.active.lock().unwrap();
        if *active < self.max {
            *active += 1;
            true
        } else {
            false
        }
    }

    /// Returns a slot and wakes the barrier waiter. The notify happens under
    /// the same lock that guards the counter, so the final decrement cannot
    /// race past a concurrent `wait_idle`.
    fn release(&self) {
        let mut active = self.active.lock().unwrap();
        *active -= 1;
        if *active == 0 {
            self.idle.notify_all();
        }
    }

    /// Blocks until every reserved slot has been released.
    fn wait_idle(&self) {
        let mut active = self.active.lock().unwrap();
        while *active > 0 {
            active = self.idle.wait(active).unwrap();
        }
    }
}

/// Per-invocation shared state: the compiled matcher, the growing result
/// set, the worker budget, and the optional live-emission sink. One value
/// per `search` call; nothing survives between invocations.
struct SearchContext {
    matcher: FilenameMatcher,
    results: Mutex<Vec<SearchMatch>>,
    budget: WorkerBudget,
    sink: Option<MatchSink>,
}

/// Recursively searches `root` for file names matching `spec`, fanning the
/// traversal out over at most `max_threads` additional worker threads.
///
/// Blocks until the whole tree has been explored, then returns the matches
/// sorted by absolute path. Unreadable entries and subtrees are skipped
/// silently; the only fatal condition is a `root` that does not exist or is
/// not a directory.
pub fn search(
    root: &Path,
    spec: &PatternSpec,
    max_threads: NonZeroUsize,
    sink: Option<MatchSink>,
) -> Result<SearchResults> {
    if !root.is_dir() {
        return Err(SearchError::invalid_root(root));
    }
    // Canonicalize up front so every recorded match carries an absolute path.
    let root = root
        .canonicalize()
        .map_err(|_| SearchError::invalid_root(root))?;

    info!(
        "searching {} with up to {} worker threads",
        root.display(),
        max_threads
    );

    let ctx = Arc::new(SearchContext {
        matcher: FilenameMatcher::new(spec),
        results: Mutex::new(Vec::new()),
        budget: WorkerBudget::new(max_threads.get()),
        sink,
    });

    visit_dir(&ctx, &root);
    ctx.budget.wait_idle();

    // The barrier guarantees no worker is left to append; the set is ours.
    let matches = std::mem::take(&mut *ctx.results.lock().unwrap());
    let mut results = SearchResults { matches };
    results.sort_by_path();

    info!("search complete, {} matches", results.len());
    Ok(results)
}

/// Examines every entry directly inside `dir`: files are matched and
/// recorded, subdirectories are descended into via the spawn decision.
/// Any filesystem error here skips the affected entry or the whole listing,
/// never the rest of the tree.
fn visit_dir(ctx: &Arc<SearchContext>, dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skipping unreadable directory {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(_) => continue,
        };

        if file_type.is_dir() {
            descend(ctx, entry.path());
        } else if file_type.is_file() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if ctx.matcher.is_match(&name) {
                let found = SearchMatch {
                    file_name: name.into_owned(),
                    path: entry.path(),
                };
                ctx.results.lock().unwrap().push(found.clone());
                // Emitted after the result lock is released.
                if let Some(sink) = &ctx.sink {
                    sink(&found);
                }
            }
        }
        // Symlinks and other special entries are left alone.
    }
}

/// The spawn decision: recurse on a fresh worker thread while the budget
/// allows it, inline on the current thread otherwise.
fn descend(ctx: &Arc<SearchContext>, dir: PathBuf) {
    if !ctx.budget.try_reserve() {
        visit_dir(ctx, &dir);
        return;
    }

    let worker_ctx = Arc::clone(ctx);
    let worker_dir = dir.clone();
    let spawned = thread::Builder::new()
        .name("qfs-worker".to_string())
        .spawn(move || {
            visit_dir(&worker_ctx, &worker_dir);
            worker_ctx.budget.release();
        });

    if let Err(err) = spawned {
        // Treat spawn failure like an exhausted budget.
        debug!("could not spawn worker thread, descending inline: {}", err);
        ctx.budget.release();
        visit_dir(ctx, &dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn threads(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn build_tree(dir: &Path) {
        File::create(dir.join("a.txt")).unwrap();
        File::create(dir.join("skip.log")).unwrap();
        fs::create_dir(dir.join("d1")).unwrap();
        File::create(dir.join("d1").join("b.txt")).unwrap();
        fs::create_dir_all(dir.join("d1").join("nested")).unwrap();
        File::create(dir.join("d1").join("nested").join("c.TXT")).unwrap();
    }

    #[test]
    fn test_finds_all_matches_single_threaded() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let spec = PatternSpec::parse(".txt").unwrap();
        let results = search(dir.path(), &spec, threads(1), None).unwrap();

        let names: Vec<_> = results.iter().map(|m| m.file_name.clone()).collect();
        assert_eq!(results.len(), 3);
        assert!(names.contains(&"a.txt".to_string()));
        assert!(names.contains(&"b.txt".to_string()));
        assert!(names.contains(&"c.TXT".to_string()));
    }

    #[test]
    fn test_thread_count_does_not_change_results() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let spec = PatternSpec::parse(".txt").unwrap();
        let serial = search(dir.path(), &spec, threads(1), None).unwrap();
        let parallel = search(dir.path(), &spec, threads(8), None).unwrap();

        assert_eq!(serial.matches, parallel.matches);
    }

    #[test]
    fn test_results_sorted_by_path() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let spec = PatternSpec::parse(".txt").unwrap();
        let results = search(dir.path(), &spec, threads(4), None).unwrap();

        let paths: Vec<_> = results.iter().map(|m| m.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_matches_carry_absolute_paths() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let spec = PatternSpec::parse("a.txt").unwrap();
        let results = search(dir.path(), &spec, threads(2), None).unwrap();

        assert_eq!(results.len(), 1);
        assert!(results.matches[0].path.is_absolute());
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let spec = PatternSpec::parse("no-such-name").unwrap();
        let results = search(dir.path(), &spec, threads(4), None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_invalid_root_rejected() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing");

        let spec = PatternSpec::parse("x").unwrap();
        let err = search(&missing, &spec, threads(1), None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidRoot(_)));
    }

    #[test]
    fn test_file_as_root_rejected() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        File::create(&file).unwrap();

        let spec = PatternSpec::parse("x").unwrap();
        let err = search(&file, &spec, threads(1), None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidRoot(_)));
    }

    #[test]
    fn test_sink_emits_each_match_once() {
        let dir = tempdir().unwrap();
        build_tree(dir.path());

        let emitted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&emitted);
        let sink: MatchSink = Arc::new(move |_m| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let spec = PatternSpec::parse(".txt").unwrap();
        let results = search(dir.path(), &spec, threads(8), Some(sink)).unwrap();

        assert_eq!(emitted.load(Ordering::SeqCst), results.len());
    }

    #[test]
    fn test_deep_tree_with_small_budget_terminates() {
        let dir = tempdir().unwrap();
        let mut path = dir.path().to_path_buf();
        for level in 0..20 {
            path.push(format!("level{level}"));
            fs::create_dir(&path).unwrap();
            File::create(path.join("leaf.txt")).unwrap();
        }

        let spec = PatternSpec::parse("leaf").unwrap();
        let results = search(dir.path(), &spec, threads(2), None).unwrap();
        assert_eq!(results.len(), 20);
    }
}
