use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dupfinder", version)]
#[command(about = "Find files with identical content under a directory")]
pub struct Cli {
    /// Directory to scan for duplicates
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Number of parallel hashing threads (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Read size in bytes used while hashing
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Directory the report file is written to (default: current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Descend into symlinked directories
    #[arg(long)]
    pub follow_links: bool,

    /// Print the scan result as JSON instead of writing a report file
    #[arg(long)]
    pub json: bool,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Configuration file (default: ./dupfinder.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}
