//! Path-keyed memoization of parsed KeyValues documents.
//!
//! Every document the resolver touches goes through a [`DocumentCache`], so
//! a given file is read and parsed at most once between invalidations.
//! Failed loads are cached too: probing fifty libraries for a manifest that
//! does not exist should hit the disk fifty times on the first scan, not on
//! every scan.

use crate::keyvalues::{Document, ParseError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

/// Why a document could not be loaded.
///
/// `NotFound` is an expected outcome when scanning candidate libraries and
/// is never logged as an error; the other variants indicate a file that was
/// found but could not be used.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("file not found: {0}")]
    NotFound(Utf8PathBuf),

    #[error("failed to read {path}: {message}")]
    Io { path: Utf8PathBuf, message: String },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: ParseError,
    },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

type Outcome = Result<Arc<Document>, LoadError>;

/// Memoizes load outcomes per absolute file path.
///
/// Each path gets a single slot that is written exactly once: concurrent
/// callers racing on an uncached path block on the one in-flight load and
/// share its outcome, so no path is ever read or parsed twice between
/// invalidations. Successful loads hand out the same shared immutable
/// document to every caller.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<Utf8PathBuf, Arc<OnceLock<Outcome>>>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached outcome for `path`, running `loader` on first access.
    ///
    /// `loader` is responsible for the actual disk read and parse; it runs
    /// at most once per path until [`invalidate_all`](Self::invalidate_all).
    pub fn get_or_load<F>(&self, path: &Utf8Path, loader: F) -> Outcome
    where
        F: FnOnce() -> Result<Document, LoadError>,
    {
        let slot = {
            let mut entries = self.entries.lock().unwrap();
            if let Some(slot) = entries.get(path) {
                Arc::clone(slot)
            } else {
                let slot = Arc::new(OnceLock::new());
                entries.insert(path.to_owned(), Arc::clone(&slot));
                slot
            }
        };

        // The map lock is already released; a slow load only blocks callers
        // asking for this same path.
        slot.get_or_init(|| {
            tracing::debug!("loading document: {}", path);
            loader().map(Arc::new)
        })
        .clone()
    }

    /// Drop every entry. The next access per path reloads from disk.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.lock().unwrap();
        let dropped = entries.len();
        entries.clear();
        tracing::debug!("document cache invalidated ({} entries dropped)", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyvalues::parse;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    fn demo_document() -> Document {
        parse("\"AppState\" { \"appid\" \"42\" }").unwrap()
    }

    #[test]
    fn test_second_access_does_not_rerun_loader() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let path = Utf8Path::new("/steam/steamapps/appmanifest_42.acf");

        for _ in 0..3 {
            let doc = cache
                .get_or_load(path, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(demo_document())
                })
                .unwrap();
            assert_eq!(doc.top().unwrap().get_value("appid"), Some("42"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_distinct_paths_load_separately() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);

        for path in ["/a/x.vdf", "/b/x.vdf"] {
            cache
                .get_or_load(Utf8Path::new(path), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(demo_document())
                })
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_cached_too() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let path = Utf8Path::new("/steam/steamapps/appmanifest_7.acf");

        for _ in 0..2 {
            let err = cache
                .get_or_load(path, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(LoadError::NotFound(path.to_owned()))
                })
                .unwrap_err();
            assert!(err.is_not_found());
        }

        // The negative outcome was replayed without re-running the loader
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_all_forces_reload() {
        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let path = Utf8Path::new("/steam/steamapps/libraryfolders.vdf");
        let load = || {
            cache.get_or_load(path, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(demo_document())
            })
        };

        load().unwrap();
        load().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate_all();
        assert!(cache.is_empty());

        load().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_requests_share_one_load() {
        const THREADS: usize = 8;

        let cache = DocumentCache::new();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);
        let path = Utf8Path::new("/steam/steamapps/appmanifest_42.acf");

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    barrier.wait();
                    let doc = cache
                        .get_or_load(path, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Widen the race window so waiters actually block
                            std::thread::sleep(std::time::Duration::from_millis(20));
                            Ok(demo_document())
                        })
                        .unwrap();
                    assert_eq!(doc.top().unwrap().get_value("appid"), Some("42"));
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
