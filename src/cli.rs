use clap::{Args, Parser, Subcommand};
use plexsync_common::resolution::DEFAULT_HD_THRESHOLD;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plexsync")]
#[command(author, version, about = "Administrative jobs for Plex Media Server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Ignore TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find SD videos in a library
    ScanSd(ScanArgs),

    /// Copy per-user library access between servers by library name
    SyncShares(ShareArgs),

    /// Migrate playlists, collections, and metadata between servers
    Migrate(MigrateArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Library name, for example "Movies" or "TV Shows"
    pub library: String,

    /// Server URL (defaults to PLEX_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Server token (defaults to PLEX_API_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Items with a max height below this are SD
    #[arg(long, default_value_t = DEFAULT_HD_THRESHOLD)]
    pub threshold: u32,

    /// Write results as CSV
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Only print file paths, one per line; with --csv, write a single `path` column
    #[arg(long)]
    pub paths_only: bool,

    /// Delete each SD file after confirmation
    #[arg(long)]
    pub delete: bool,

    /// Delete SD files without prompting
    #[arg(long)]
    pub delete_no_confirm: bool,
}

impl ScanArgs {
    pub fn deletes(&self) -> bool {
        self.delete || self.delete_no_confirm
    }

    /// Flows whose stdout is meant for machines or prompts.
    pub fn is_quiet(&self) -> bool {
        self.paths_only || self.deletes()
    }
}

#[derive(Args, Debug)]
pub struct ShareArgs {
    /// Source server name (defaults to PLEX_SERVER_SOURCE, then "noodle")
    #[arg(long)]
    pub source: Option<String>,

    /// Destination server name (defaults to PLEX_SERVER_DEST, then "doodoo")
    #[arg(long)]
    pub dest: Option<String>,

    /// Apply changes; without this the run is a dry run
    #[arg(long)]
    pub apply: bool,

    /// Limit to a username, title, or email (repeatable)
    #[arg(long = "only-user")]
    pub only_user: Vec<String>,

    /// Verification code for accounts with two-factor auth
    #[arg(long)]
    pub mfa_code: Option<String>,

    /// Never prompt, including for verification codes
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Source server URL (defaults to SRC_PLEX_URL)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Source server token (defaults to SRC_PLEX_TOKEN)
    #[arg(long)]
    pub source_token: Option<String>,

    /// Destination server URL (defaults to DEST_PLEX_URL, then PLEX_URL)
    #[arg(long)]
    pub dest_url: Option<String>,

    /// Destination server token (defaults to DEST_PLEX_TOKEN, then PLEX_TOKEN)
    #[arg(long)]
    pub dest_token: Option<String>,

    /// Only migrate playlists whose names match this regex
    #[arg(long)]
    pub include: Option<String>,

    /// Skip playlists whose names match this regex
    #[arg(long)]
    pub exclude: Option<String>,

    /// Copy smart playlists as static lists of their current items
    #[arg(long)]
    pub materialize_smart: bool,

    /// Destination playlist name; `{name}` is the source name
    #[arg(long, default_value = "{name}")]
    pub rename_template: String,

    /// Also migrate collections
    #[arg(long)]
    pub collections: bool,

    /// Skip playlists
    #[arg(long)]
    pub no_playlists: bool,

    /// Only migrate collections whose names match this regex
    #[arg(long)]
    pub collection_include: Option<String>,

    /// Skip collections whose names match this regex
    #[arg(long)]
    pub collection_exclude: Option<String>,

    /// Destination collection name; `{name}` is the source name
    #[arg(long, default_value = "{name}")]
    pub collection_rename_template: String,

    /// Sync metadata fields to matched destination items
    #[arg(long)]
    pub sync_metadata: bool,

    /// Comma-separated fields to sync
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Also copy poster and background art
    #[arg(long)]
    pub artwork: bool,

    /// Lock edited fields against agent refreshes
    #[arg(long)]
    pub lock_fields: bool,

    /// Only sync items whose titles match this regex
    #[arg(long)]
    pub meta_include: Option<String>,

    /// Skip items whose titles match this regex
    #[arg(long)]
    pub meta_exclude: Option<String>,

    /// Replace existing playlists and clear collections before re-adding
    #[arg(long)]
    pub replace: bool,

    /// Items per add-to-playlist call
    #[arg(long, value_parser = parse_batch_size)]
    pub batch_size: Option<usize>,

    /// Show what would change without writing
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_batch_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
