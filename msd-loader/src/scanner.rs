//! Track file discovery
//!
//! Walks the dataset tree top-down and hands out one [`DirectoryBatch`] per
//! directory, so that every file of a directory is processed before the walk
//! moves on. Directories come in file-name order, as do the files within.

use msd_common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// All regular files directly inside one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryBatch {
    /// Absolute directory path
    pub dir: PathBuf,
    /// Files in the directory, sorted by name
    pub files: Vec<PathBuf>,
}

/// Dataset directory scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Start a walk of `root`
    ///
    /// Fails straight away if `root` does not exist or is not a directory;
    /// errors met during the walk are yielded by the iterator.
    pub fn directories(&self, root: &Path) -> Result<Directories> {
        let root = root
            .canonicalize()
            .map_err(|e| Error::traversal(root, format!("path not found: {}", e)))?;

        if !root.is_dir() {
            return Err(Error::traversal(&root, "not a directory"));
        }

        // Symlinked directories are not followed, so a link cycle cannot loop
        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_type().is_dir());

        Ok(Directories {
            walker: Box::new(walker),
        })
    }
}

/// Iterator over the directories of a walk
pub struct Directories {
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>,
}

impl Iterator for Directories {
    type Item = Result<DirectoryBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.walker.next()? {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                return Some(Err(Error::traversal(path, e)));
            }
        };

        let dir = entry.into_path();
        Some(list_files(&dir).map(|files| DirectoryBatch { dir, files }))
    }
}

/// Regular files of one directory (symlinks to files included)
///
/// A dangling symlink is kept; opening it later reports the problem.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| Error::traversal(dir, e))? {
        let entry = entry.map_err(|e| Error::traversal(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::traversal(entry.path(), e))?;

        let is_file = if file_type.is_symlink() {
            !entry.path().is_dir()
        } else {
            file_type.is_file()
        };

        if is_file {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
