//! Filesystem access behind a trait.
//!
//! The resolver only ever needs four operations: existence checks, whole
//! file reads, path canonicalization and directory listings. Keeping them
//! on a trait lets tests fabricate filesystems (missing files, unreadable
//! files, corrupt content) without touching disk.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

pub trait FileSystem: Send + Sync {
    fn file_exists(&self, path: &Utf8Path) -> bool;

    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String>;

    /// Resolve `.`/`..` components and symlinks to an absolute path.
    fn canonicalize(&self, path: &Utf8Path) -> io::Result<Utf8PathBuf>;

    /// Entries of a directory, sorted for stable iteration order.
    fn list_dir(&self, path: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>>;
}

/// Production implementation over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn file_exists(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Utf8Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Utf8Path) -> io::Result<Utf8PathBuf> {
        path.canonicalize_utf8()
    }

    fn list_dir(&self, path: &Utf8Path) -> io::Result<Vec<Utf8PathBuf>> {
        let mut entries = Vec::new();
        for entry in path.read_dir_utf8()? {
            entries.push(entry?.into_path());
        }
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_reads_and_lists() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        let file = dir.join("b.txt");
        let mut handle = fs::File::create(&file).unwrap();
        writeln!(handle, "hello").unwrap();
        fs::File::create(dir.join("a.txt")).unwrap();

        let real = RealFs;
        assert!(real.file_exists(&file));
        assert!(!real.file_exists(&dir.join("absent.txt")));
        assert_eq!(real.read_to_string(&file).unwrap(), "hello\n");

        let names: Vec<_> = real
            .list_dir(&dir)
            .unwrap()
            .into_iter()
            .filter_map(|p| p.file_name().map(str::to_owned))
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
