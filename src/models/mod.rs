//! Data models shared by the resolver services.

use camino::Utf8PathBuf;

/// Summary of one application discovered in a Steam library.
///
/// Built from an `appmanifest_<app_id>.acf` file; `name` and `install_dir`
/// are `None` when the manifest omits them or records them empty, which
/// happens for partially downloaded or half-uninstalled apps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApp {
    pub app_id: u32,
    pub name: Option<String>,
    pub install_dir: Option<String>,
    /// Root of the library the manifest was found in.
    pub library: Utf8PathBuf,
}

impl InstalledApp {
    /// Absolute install directory, when the manifest records one.
    pub fn install_path(&self) -> Option<Utf8PathBuf> {
        self.install_dir
            .as_deref()
            .map(|dir| self.library.join("steamapps").join("common").join(dir))
    }
}
