//! CLI argument definitions for the exam-archive binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Cache backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheKind {
    /// Redis server (default, production)
    Redis,
    /// Process-local cache; state is lost when the command exits
    Memory,
}

/// Output format flag
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum Format {
    /// Aligned tables and plain lines
    #[default]
    Human,
    /// One JSON document per command
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Human => OutputFormat::Human,
            Format::Json => OutputFormat::Json,
        }
    }
}

/// Exam archive operator tool
#[derive(Parser, Debug)]
#[command(name = "exam-archive")]
#[command(about = "Manage per-user exam archives and their session cache")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Human)]
    pub output: Format,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings shared by every command. Flags override the config file.
#[derive(clap::Args, Debug, Clone)]
pub struct EngineArgs {
    /// JSON config file
    #[arg(long, global = true, env = "EXAM_ARCHIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding one archive per user
    #[arg(short = 'D', long, global = true, env = "EXAM_ARCHIVE_ROOT")]
    pub archive_root: Option<PathBuf>,

    /// Namespace root of cache keys
    #[arg(long, global = true, env = "EXAM_ARCHIVE_KEY_ROOT")]
    pub key_root: Option<String>,

    /// Image seeded into new archives
    #[arg(long, global = true, env = "EXAM_ARCHIVE_DEFAULT_AVATAR")]
    pub default_avatar: Option<PathBuf>,

    /// Number of questions in the catalog
    #[arg(long, global = true, default_value_t = 0, env = "EXAM_ARCHIVE_QUESTIONS")]
    pub questions: u64,

    /// Cache backend to use
    #[arg(long, global = true, value_enum, default_value_t = CacheKind::Redis, env = "EXAM_ARCHIVE_CACHE")]
    pub cache: CacheKind,

    /// Redis connection URL
    #[arg(
        long,
        global = true,
        default_value = "redis://127.0.0.1:6379",
        env = "EXAM_ARCHIVE_REDIS_URL"
    )]
    pub redis_url: String,

    /// Bound on a single cache round-trip, in seconds
    #[arg(long, global = true, env = "EXAM_ARCHIVE_CACHE_TIMEOUT")]
    pub cache_timeout: Option<u64>,

    /// Bound on a single file operation, in seconds
    #[arg(long, global = true, env = "EXAM_ARCHIVE_FILE_TIMEOUT")]
    pub file_timeout: Option<u64>,

    /// Bound on a whole flow, in seconds
    #[arg(long, global = true, env = "EXAM_ARCHIVE_FLOW_TIMEOUT")]
    pub flow_timeout: Option<u64>,

    /// Lifetime of issued verification codes, in seconds
    #[arg(long, global = true, env = "EXAM_ARCHIVE_CODE_TTL")]
    pub code_ttl: Option<u64>,

    /// Concurrent blocking filesystem jobs
    #[arg(long, global = true, env = "EXAM_ARCHIVE_BLOCKING_WORKERS")]
    pub blocking_workers: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the archive of a newly registered user
    Provision(UserArgs),
    /// Load a user's archive into the cache, optionally checking a verification code first
    Login(LoginArgs),
    /// Write a user's cached counters back to the archive and evict the cache
    Logout(UserArgs),
    /// Move a user's archive to a new username
    Rename(RenameArgs),
    /// Delete a user's archive and cache state
    Delete(UserArgs),
    /// Issue a verification code and print it
    IssueCode(UserArgs),
    /// Show a user's cached counters
    Counters(UserArgs),
    /// List users with cache state
    Users,
    /// Check the cache and archive root
    Health,
}

#[derive(clap::Args, Debug)]
pub struct UserArgs {
    /// Username
    pub user: String,
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// Username
    pub user: String,

    /// Verification code to consume before loading
    #[arg(long)]
    pub code: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RenameArgs {
    /// Current username
    pub old: String,
    /// New username
    pub new: String,
}
