pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod hasher;
pub mod report;
pub mod scanner;
pub mod signal;
pub mod utils;
pub mod walker;

pub use cli::Cli;
pub use config::{Config, Settings};
pub use duplicates::{DuplicateGroup, DuplicateGroups, HashIndex, print_results};
pub use error::{FileError, ScanError};
pub use hasher::{FileHash, hash_file, hash_file_with_chunk_size, hash_reader};
pub use scanner::{FileOutcome, HashedFile, ScanOptions, ScanOutcome, ScanStats, scan, scan_with_options};
pub use signal::CancelToken;
pub use utils::format_human_elapsed;
