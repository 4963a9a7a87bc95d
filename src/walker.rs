use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::FileError;

/// One item produced by the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    /// A regular file (or a symlink resolving to one) ready to be hashed.
    File(PathBuf),
    /// An entry that could not be listed or inspected.
    Failed(FileError),
}

/// Lazily walks everything below `root`, yielding regular files in a stable
/// (file-name sorted) order.
///
/// Directories, special files and dangling symlinks are filtered out without
/// being reported. Symlinked directories are only descended into when
/// `follow_links` is set.
pub fn walk(root: &Path, follow_links: bool) -> impl Iterator<Item = Discovered> + Send + 'static {
    let root = root.to_path_buf();
    WalkDir::new(&root)
        .follow_links(follow_links)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => classify(entry).map(Discovered::File),
            Err(e) => {
                let err = FileError::from_walk(&root, e);
                debug!("Failed to read directory entry: {}", err);
                Some(Discovered::Failed(err))
            }
        })
}

fn classify(entry: DirEntry) -> Option<PathBuf> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Some(entry.into_path());
    }
    if file_type.is_symlink() {
        // Not following links: resolve the target to decide whether it is a file.
        return match fs::metadata(entry.path()) {
            Ok(meta) if meta.is_file() => Some(entry.into_path()),
            Ok(_) => None,
            Err(e) => {
                trace!("Skipping dangling symlink '{}': {}", entry.path().display(), e);
                None
            }
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn files(root: &Path) -> Vec<PathBuf> {
        walk(root, false)
            .filter_map(|d| match d {
                Discovered::File(p) => Some(p.strip_prefix(root).unwrap().to_path_buf()),
                Discovered::Failed(_) => None,
            })
            .collect()
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(walk(dir.path(), false).next().is_none());
    }

    #[test]
    fn yields_nested_files_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        fs::write(dir.path().join("sub/deeper/c.txt"), "c").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        assert_eq!(
            files(dir.path()),
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("sub/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn walk_is_restartable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("x"), "x").unwrap();
        fs::write(dir.path().join("y"), "y").unwrap();
        assert_eq!(files(dir.path()), files(dir.path()));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_resolve_to_files_and_dangling_ones_are_skipped() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("real.txt"), "data").unwrap();
        symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("dangling")).unwrap();

        assert_eq!(
            files(dir.path()),
            vec![PathBuf::from("link.txt"), PathBuf::from("real.txt")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn special_files_are_filtered_silently() {
        use std::process::Command;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.txt"), "data").unwrap();
        let fifo = dir.path().join("pipe");
        let status = Command::new("mkfifo").arg(&fifo).status().unwrap();
        assert!(status.success());

        let discovered: Vec<Discovered> = walk(dir.path(), false).collect();
        assert_eq!(
            discovered,
            vec![Discovered::File(dir.path().join("plain.txt"))]
        );
    }
}
