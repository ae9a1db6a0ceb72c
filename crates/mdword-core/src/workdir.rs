//! Working directory for generated artifacts.
//!
//! Rendered diagram images and compiled documents land in one flat
//! directory. Artifact names are `<prefix>_<timestamp>_<8 hex chars>.<ext>`,
//! unique across concurrent conversions, and are served back by name.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use uuid::Uuid;

/// Flat directory holding generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    /// Wrap `root` without touching the filesystem.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if missing.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn ensure(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Fresh artifact path `<root>/<prefix>_<timestamp>_<hex8>.<ext>`.
    #[must_use]
    pub fn unique_path(&self, prefix: &str, ext: &str) -> PathBuf {
        self.root.join(unique_name(prefix, ext))
    }

    /// Path of an existing artifact by file name.
    ///
    /// Returns `None` for names that would escape the directory (separators,
    /// `..`) and for names that do not refer to a regular file.
    #[must_use]
    pub fn resolve_existing(&self, name: &str) -> Option<PathBuf> {
        if !is_plain_file_name(name) {
            return None;
        }
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }
}

/// Artifact file name `<prefix>_<YYYYmmdd_HHMMSS>_<hex8>.<ext>`.
#[must_use]
pub fn unique_name(prefix: &str, ext: &str) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{timestamp}_{}.{ext}", &id[..8])
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\', '\0'])
        && name != "."
        && !name.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_unique_name_shape() {
        let name = unique_name("output", "docx");
        let parts: Vec<_> = name.trim_end_matches(".docx").split('_').collect();

        assert!(name.starts_with("output_"));
        assert!(name.ends_with(".docx"));
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_unique_names_differ() {
        assert_ne!(unique_name("mermaid", "png"), unique_name("mermaid", "png"));
    }

    #[test]
    fn test_ensure_creates_nested_dirs() {
        let temp = TempDir::new().unwrap();
        let work = WorkDir::new(temp.path().join("a/b/work"));

        work.ensure().unwrap();

        assert!(work.path().is_dir());
        assert!(work.unique_path("output", "docx").starts_with(work.path()));
    }

    #[test]
    fn test_resolve_existing() {
        let temp = TempDir::new().unwrap();
        let work = WorkDir::new(temp.path());
        std::fs::write(temp.path().join("output_x.docx"), b"PK").unwrap();

        assert_eq!(
            work.resolve_existing("output_x.docx"),
            Some(temp.path().join("output_x.docx"))
        );
        assert_eq!(work.resolve_existing("missing.docx"), None);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let work = WorkDir::new(temp.path().join("work"));
        work.ensure().unwrap();
        std::fs::write(temp.path().join("secret.txt"), b"x").unwrap();

        assert_eq!(work.resolve_existing("../secret.txt"), None);
        assert_eq!(work.resolve_existing("..\\secret.txt"), None);
        assert_eq!(work.resolve_existing(".."), None);
        assert_eq!(work.resolve_existing(""), None);
    }

    #[test]
    fn test_resolve_rejects_directories() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        assert_eq!(WorkDir::new(temp.path()).resolve_existing("sub"), None);
    }
}
