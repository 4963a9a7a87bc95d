use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::duplicates::{DuplicateGroups, HashIndex};
use crate::error::{FileError, ScanError};
use crate::hasher::{self, DEFAULT_CHUNK_SIZE, FileHash};
use crate::signal::CancelToken;
use crate::walker::{self, Discovered};

/// A file that was read and digested successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedFile {
    pub path: PathBuf,
    pub hash: FileHash,
    pub bytes: u64,
}

/// Per-file result threaded through the traversal.
pub type FileOutcome = Result<HashedFile, FileError>;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Hashing workers. `1` hashes on the walking thread.
    pub threads: usize,
    pub chunk_size: usize,
    pub follow_links: bool,
    pub cancel: Option<CancelToken>,
    pub progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            follow_links: false,
            cancel: None,
            progress: false,
        }
    }
}

impl ScanOptions {
    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_hashed: u64,
    pub bytes_hashed: u64,
    pub failed: u64,
    pub unique_hashes: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Everything one scan produces: the duplicate groups plus the files that
/// could not be examined.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub groups: DuplicateGroups,
    pub failures: Vec<FileError>,
    pub stats: ScanStats,
}

/// Scans `root` sequentially with default options.
pub fn scan(root: &Path) -> Result<ScanOutcome, ScanError> {
    scan_with_options(root, &ScanOptions::default())
}

pub fn scan_with_options(root: &Path, options: &ScanOptions) -> Result<ScanOutcome, ScanError> {
    check_root(root)?;
    let start = Instant::now();
    info!("Scanning {}", root.display());

    let pb = progress_bar(options.progress);
    let mut state = ScanState::default();

    if options.threads > 1 {
        scan_parallel(root, options, &mut state, &pb)?;
    } else {
        scan_sequential(root, options, &mut state, &pb)?;
    }
    pb.finish_and_clear();

    let ScanState { index, failures, mut stats } = state;
    stats.unique_hashes = index.len();
    stats.failed = failures.len() as u64;
    stats.elapsed = start.elapsed();
    let groups = index.into_duplicate_groups();

    info!(
        "Scan complete: {} files ({}) hashed, {} duplicate groups, {} failures",
        HumanCount(stats.files_hashed),
        HumanBytes(stats.bytes_hashed),
        HumanCount(groups.len() as u64),
        HumanCount(stats.failed)
    );

    Ok(ScanOutcome { groups, failures, stats })
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::RootNotFound(root.to_path_buf()),
        _ => ScanError::RootInaccessible {
            path: root.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| ScanError::RootInaccessible {
        path: root.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Locally owned state for one scan; the index is the only thing written to.
#[derive(Default)]
struct ScanState {
    index: HashIndex,
    failures: Vec<FileError>,
    stats: ScanStats,
}

impl ScanState {
    fn apply(&mut self, outcome: FileOutcome) {
        match outcome {
            Ok(HashedFile { path, hash, bytes }) => {
                self.stats.files_hashed += 1;
                self.stats.bytes_hashed += bytes;
                self.index.insert(hash, path);
            }
            Err(err) => {
                debug!("Failed to hash {}", err);
                self.failures.push(err);
            }
        }
    }
}

fn process(discovered: Discovered, chunk_size: usize) -> FileOutcome {
    match discovered {
        Discovered::File(path) => {
            let (hash, bytes) = hasher::hash_file_counted(&path, chunk_size)?;
            Ok(HashedFile { path, hash, bytes })
        }
        Discovered::Failed(err) => Err(err),
    }
}

fn scan_sequential(
    root: &Path,
    options: &ScanOptions,
    state: &mut ScanState,
    pb: &ProgressBar,
) -> Result<(), ScanError> {
    for discovered in walker::walk(root, options.follow_links) {
        if options.is_cancelled() {
            return Err(ScanError::Cancelled);
        }
        state.apply(process(discovered, options.chunk_size));
        pb.inc(1);
    }
    Ok(())
}

/// Single walking producer feeding a bounded queue drained by a fixed pool of
/// hashing workers. Results carry their discovery sequence number and are
/// applied to the index in that order, so the outcome matches the
/// sequential scan exactly.
fn scan_parallel(
    root: &Path,
    options: &ScanOptions,
    state: &mut ScanState,
    pb: &ProgressBar,
) -> Result<(), ScanError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads)
        .thread_name(|i| format!("hasher-{i}"))
        .build()?;
    debug!("Hashing with {} worker threads", options.threads);

    let (tx, rx) = mpsc::sync_channel::<(usize, Discovered)>(options.threads * 4);
    let walk = walker::walk(root, options.follow_links);
    let producer_cancel = options.cancel.clone();

    let mut results: Vec<(usize, FileOutcome)> = thread::scope(|s| {
        s.spawn(move || {
            for item in walk.enumerate() {
                if producer_cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                    break;
                }
                // Receiver gone means the workers bailed out.
                if tx.send(item).is_err() {
                    break;
                }
            }
        });

        pool.install(|| {
            rx.into_iter()
                .par_bridge()
                .filter_map(|(seq, discovered)| {
                    if options.is_cancelled() {
                        return None;
                    }
                    let outcome = process(discovered, options.chunk_size);
                    pb.inc(1);
                    Some((seq, outcome))
                })
                .collect()
        })
    });

    if options.is_cancelled() {
        return Err(ScanError::Cancelled);
    }

    results.sort_unstable_by_key(|(seq, _)| *seq);
    for (_, outcome) in results {
        state.apply(outcome);
    }
    Ok(())
}

fn progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} files scanned") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::hash_bytes;
    use pretty_assertions::assert_eq;

    fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn missing_root_is_a_precondition_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = tree(&[("a.txt", "hello")]);
        let err = scan(&dir.path().join("a.txt")).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn stats_count_hashed_files_and_bytes() {
        let dir = tree(&[("a.txt", "hello"), ("b.txt", "hello"), ("c.txt", "world")]);
        let outcome = scan(dir.path()).unwrap();
        assert_eq!(outcome.stats.files_hashed, 3);
        assert_eq!(outcome.stats.bytes_hashed, 15);
        assert_eq!(outcome.stats.unique_hashes, 2);
        assert_eq!(outcome.stats.failed, 0);
        assert_eq!(outcome.groups.len(), 1);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut files = Vec::new();
        let names: Vec<String> = (0..40).map(|i| format!("d{}/f{:02}.bin", i % 5, i)).collect();
        let contents: Vec<String> = (0..40).map(|i| format!("content-{}", i % 7)).collect();
        for (name, content) in names.iter().zip(&contents) {
            files.push((name.as_str(), content.as_str()));
        }
        let dir = tree(&files);

        let sequential = scan(dir.path()).unwrap();
        let parallel = scan_with_options(
            dir.path(),
            &ScanOptions { threads: 4, ..ScanOptions::default() },
        )
        .unwrap();

        assert_eq!(sequential.groups, parallel.groups);
        assert_eq!(sequential.groups.len(), 7);
        assert_eq!(parallel.stats.files_hashed, 40);
    }

    #[test]
    fn cancelled_scan_returns_error() {
        let dir = tree(&[("a.txt", "hello")]);
        let token = CancelToken::new();
        token.cancel();
        for threads in [1, 2] {
            let options = ScanOptions {
                threads,
                cancel: Some(token.clone()),
                ..ScanOptions::default()
            };
            let err = scan_with_options(dir.path(), &options).unwrap_err();
            assert!(matches!(err, ScanError::Cancelled));
        }
    }

    #[test]
    fn small_chunks_give_same_groups() {
        let dir = tree(&[("a", "the same bytes"), ("b", "the same bytes")]);
        let options = ScanOptions { chunk_size: 3, ..ScanOptions::default() };
        let outcome = scan_with_options(dir.path(), &options).unwrap();
        assert!(outcome.groups.get(&hash_bytes(b"the same bytes")).is_some());
    }
}
