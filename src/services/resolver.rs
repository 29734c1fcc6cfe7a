//! Library folder and app manifest resolution.
//!
//! A [`LibraryResolver`] translates a Steam installation root into library
//! paths and per-application install locations. It owns its own
//! [`DocumentCache`] and a [`FileSystem`] handle, so isolated instances in
//! tests never share state, and every document it touches is read and
//! parsed at most once between cache invalidations.
//!
//! Where the installation root comes from is someone else's problem: the
//! registry on Windows, `~/.steam` conventions on Linux, or a user setting.
//! The resolver only ever consumes the root it was handed.

use crate::fs::{FileSystem, RealFs};
use crate::keyvalues::{Document, parse};
use crate::models::InstalledApp;
use crate::services::cache::{DocumentCache, LoadError};
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by app and property resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no Steam library contains app {app_id}")]
    LibraryNotFound { app_id: u32 },

    #[error("property \"{property}\" missing or empty in manifest for app {app_id}")]
    PropertyNotFound { app_id: u32, property: String },

    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Resolves Steam libraries and app manifests under one installation root.
pub struct LibraryResolver {
    install_root: Utf8PathBuf,
    fs: Arc<dyn FileSystem>,
    cache: DocumentCache,

    /// Matches `appmanifest_<app_id>.acf` filenames when enumerating apps
    manifest_pattern: Regex,
}

impl LibraryResolver {
    /// Create a resolver over the real filesystem.
    pub fn new(install_root: impl Into<Utf8PathBuf>) -> Self {
        Self::with_fs(install_root, Arc::new(RealFs))
    }

    /// Create a resolver over an injected filesystem (used by tests).
    pub fn with_fs(install_root: impl Into<Utf8PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            install_root: install_root.into(),
            fs,
            cache: DocumentCache::new(),
            manifest_pattern: Regex::new(r"^appmanifest_(\d+)\.acf$")
                .expect("Invalid manifest filename regex"),
        }
    }

    pub fn install_root(&self) -> &Utf8Path {
        &self.install_root
    }

    /// Load a document through the cache, recording failures too.
    fn load_document(&self, path: &Utf8Path) -> Result<Arc<Document>, LoadError> {
        self.cache.get_or_load(path, || {
            if !self.fs.file_exists(path) {
                return Err(LoadError::NotFound(path.to_owned()));
            }
            let text = self.fs.read_to_string(path).map_err(|err| LoadError::Io {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
            parse(&text).map_err(|err| LoadError::Parse {
                path: path.to_owned(),
                source: err,
            })
        })
    }

    /// The parsed `steamapps/libraryfolders.vdf`, or `None` when the file
    /// does not exist. Parse failures propagate: a Steam install with a
    /// corrupt library index has no usable library list.
    pub fn library_folders_document(&self) -> Result<Option<Arc<Document>>, LoadError> {
        let path = self
            .install_root
            .join("steamapps")
            .join("libraryfolders.vdf");
        match self.load_document(&path) {
            Ok(doc) => Ok(Some(doc)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Library roots in document order.
    ///
    /// Each top-level child of the library-folders document contributes its
    /// `path` property, canonicalized at the OS level where possible; a
    /// library that cannot be canonicalized (an unplugged drive, say) keeps
    /// its recorded path. Children without a `path` property are skipped.
    pub fn library_paths(&self) -> Result<Vec<Utf8PathBuf>, LoadError> {
        let Some(doc) = self.library_folders_document()? else {
            return Ok(Vec::new());
        };
        let Some(folders) = doc.top() else {
            return Ok(Vec::new());
        };

        let mut paths = Vec::new();
        for entry in folders.children() {
            let Some(raw) = entry.get_value("path") else {
                tracing::debug!("library entry \"{}\" has no path property", entry.name());
                continue;
            };
            let raw = Utf8PathBuf::from(raw);
            let resolved = self.fs.canonicalize(&raw).unwrap_or(raw);
            paths.push(resolved);
        }
        Ok(paths)
    }

    /// First library whose `steamapps` directory holds a manifest for
    /// `app_id`. Order is significant: the client checks libraries in the
    /// order they are listed, so the first match wins.
    pub fn find_library_for_app(&self, app_id: u32) -> Result<Option<Utf8PathBuf>, LoadError> {
        for library in self.library_paths()? {
            if self.fs.file_exists(&manifest_path(&library, app_id)) {
                tracing::debug!("app {} found in library {}", app_id, library);
                return Ok(Some(library));
            }
        }
        Ok(None)
    }

    /// The manifest document for `app_id` from the first library that can
    /// supply one.
    ///
    /// A manifest that exists but cannot be read or parsed is logged and
    /// skipped; one corrupt copy must not hide a healthy copy in a later
    /// library. Returns `None` when no library has a usable manifest.
    pub fn app_manifest(&self, app_id: u32) -> Result<Option<Arc<Document>>, LoadError> {
        for library in self.library_paths()? {
            let path = manifest_path(&library, app_id);
            match self.load_document(&path) {
                Ok(doc) => return Ok(Some(doc)),
                Err(err) if err.is_not_found() => {}
                Err(err) => {
                    tracing::warn!("skipping manifest for app {} in {}: {}", app_id, library, err);
                }
            }
        }
        Ok(None)
    }

    /// A required leaf property from the app's manifest.
    ///
    /// Missing manifest, missing property and present-but-empty property
    /// all resolve to [`ResolveError::PropertyNotFound`]: callers treat
    /// fields like `installdir` as mandatory, and an empty segment in a
    /// composed path is worse than a hard error.
    pub fn manifest_property(&self, app_id: u32, property: &str) -> Result<String, ResolveError> {
        let not_found = || ResolveError::PropertyNotFound {
            app_id,
            property: property.to_string(),
        };

        let manifest = self.app_manifest(app_id)?.ok_or_else(not_found)?;
        let state = manifest.top().ok_or_else(not_found)?;
        state
            .get_value(property)
            .map(str::to_owned)
            .ok_or_else(not_found)
    }

    /// Absolute install directory for `app_id`:
    /// `<library>/steamapps/common/<installdir>`.
    pub fn app_install_path(&self, app_id: u32) -> Result<Utf8PathBuf, ResolveError> {
        let library = self
            .find_library_for_app(app_id)?
            .ok_or(ResolveError::LibraryNotFound { app_id })?;
        let install_dir = self.manifest_property(app_id, "installdir")?;
        Ok(library.join("steamapps").join("common").join(install_dir))
    }

    /// Every app with a manifest in any library, in library order.
    ///
    /// Scans each library's `steamapps` directory for
    /// `appmanifest_<app_id>.acf` files. Unreadable or corrupt manifests
    /// are logged and skipped, as in [`app_manifest`](Self::app_manifest).
    pub fn installed_apps(&self) -> Result<Vec<InstalledApp>, LoadError> {
        let mut apps = Vec::new();
        for library in self.library_paths()? {
            let steamapps = library.join("steamapps");
            let entries = match self.fs.list_dir(&steamapps) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::debug!("cannot list {}: {}", steamapps, err);
                    continue;
                }
            };

            for entry in entries {
                let Some(file_name) = entry.file_name() else {
                    continue;
                };
                let Some(captures) = self.manifest_pattern.captures(file_name) else {
                    continue;
                };
                let Ok(app_id) = captures[1].parse::<u32>() else {
                    continue;
                };

                match self.load_document(&entry) {
                    Ok(doc) => {
                        let state = doc.top();
                        apps.push(InstalledApp {
                            app_id,
                            name: state
                                .and_then(|s| s.get_value("name"))
                                .map(str::to_owned),
                            install_dir: state
                                .and_then(|s| s.get_value("installdir"))
                                .map(str::to_owned),
                            library: library.clone(),
                        });
                    }
                    Err(err) => {
                        tracing::warn!("skipping manifest {}: {}", entry, err);
                    }
                }
            }
        }
        Ok(apps)
    }

    /// Clear the document cache. The next query per file re-reads disk.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

fn manifest_path(library: &Utf8Path, app_id: u32) -> Utf8PathBuf {
    library
        .join("steamapps")
        .join(format!("appmanifest_{}.acf", app_id))
}
