use std::collections::HashMap;
use std::path::{Path, PathBuf};

use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::{info, warn};
use serde::{Serialize, Serializer};

use crate::hasher::FileHash;
use crate::scanner::ScanOutcome;

/// Working map from digest to the paths sharing it, built during one scan.
///
/// Keys keep the order in which each digest was first seen and every path
/// list keeps discovery order. Every key has at least one path.
#[derive(Debug, Default)]
pub struct HashIndex {
    positions: HashMap<FileHash, usize>,
    entries: Vec<(FileHash, Vec<PathBuf>)>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: FileHash, path: PathBuf) {
        match self.positions.get(&hash) {
            Some(&pos) => self.entries[pos].1.push(path),
            None => {
                self.positions.insert(hash, self.entries.len());
                self.entries.push((hash, vec![path]));
            }
        }
    }

    pub fn get(&self, hash: &FileHash) -> Option<&[PathBuf]> {
        self.positions
            .get(hash)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    /// Number of distinct digests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_duplicate_groups(self) -> DuplicateGroups {
        let groups = self
            .entries
            .into_iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(hash, paths)| DuplicateGroup { hash, paths })
            .collect();
        DuplicateGroups { groups }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub hash: FileHash,
    #[serde(serialize_with = "serialize_paths_lossy")]
    pub paths: Vec<PathBuf>,
}

/// Paths as text; bytes that are not valid UTF-8 become U+FFFD, the same way
/// they are rendered on the console.
pub(crate) fn serialize_path_lossy<S: Serializer>(path: &Path, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_string_lossy())
}

fn serialize_paths_lossy<S: Serializer>(paths: &[PathBuf], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
}

/// Digests shared by two or more files, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DuplicateGroups {
    groups: Vec<DuplicateGroup>,
}

impl DuplicateGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.groups.iter()
    }

    pub fn get(&self, hash: &FileHash) -> Option<&DuplicateGroup> {
        self.groups.iter().find(|g| &g.hash == hash)
    }

    /// Files that could be removed while keeping one copy of each group.
    pub fn duplicate_file_count(&self) -> usize {
        self.groups.iter().map(|g| g.paths.len() - 1).sum()
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

pub fn print_results(outcome: &ScanOutcome, base_path: &Path) {
    let stats = &outcome.stats;
    info!(
        "Hashed {} files ({}), {} unique hashes, {} failed",
        HumanCount(stats.files_hashed),
        HumanBytes(stats.bytes_hashed),
        HumanCount(stats.unique_hashes as u64),
        HumanCount(outcome.failures.len() as u64)
    );

    for failure in &outcome.failures {
        eprintln!(
            "{} {}: {}",
            "Error processing file".red(),
            failure.path.display(),
            failure.reason
        );
    }

    let duplicates = &outcome.groups;
    if duplicates.is_empty() {
        println!("{}", "No duplicate files found.".green());
        return;
    }

    warn!(
        "Found {} duplicate files in {} groups",
        HumanCount(duplicates.duplicate_file_count() as u64),
        HumanCount(duplicates.len() as u64)
    );
    for group in duplicates {
        println!("{} ({} files):", group.hash.to_string().yellow(), group.paths.len());
        for path in &group.paths {
            let relative_path = path.strip_prefix(base_path).unwrap_or(path);
            println!("  {}", relative_path.display());
        }
    }
}
