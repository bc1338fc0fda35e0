use clap::{Parser, Subcommand, ValueEnum};
use once_cell::sync::Lazy;
use std::path::PathBuf;

static VERSION: Lazy<String> = Lazy::new(|| {
    let version = env!("CARGO_PKG_VERSION");
    let hash = env!("GIT_HASH");
    if env!("IS_RELEASE") == "true" || hash.is_empty() {
        version.to_string()
    } else {
        format!("{}@{} {}", version, hash, env!("GIT_COMMIT_DATE"))
    }
});

/// "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" otherwise.
fn get_version() -> &'static str {
    VERSION.as_str()
}

#[derive(Parser, Debug)]
#[command(name = "binder", bin_name = "binder", version = get_version())]
#[command(about = "A virtual trading-card binder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Profile to act as (default: the default profile)
    #[arg(short, long, global = true, help_heading = "Session")]
    pub user: Option<String>,

    /// Password of --user
    #[arg(long, global = true, help_heading = "Session")]
    pub password: Option<String>,

    /// Binder to act on (default: the profile's first binder)
    #[arg(short, long, global = true, help_heading = "Session")]
    pub binder: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Name,
    Number,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    Dark,
    Light,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a page of the binder
    #[command(alias = "ls", display_order = 1)]
    Show {
        /// Page number (1-based)
        page: Option<usize>,

        /// Only show cards matching a name or #number
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Load a set from the catalog and add all of its cards
    #[command(display_order = 2)]
    AddSet {
        /// Set name (or part of it)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,

        /// Add past the binder's capacity without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Search the catalog by name and add the first hit
    #[command(display_order = 3)]
    Add {
        /// Card name (or part of it)
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,

        /// Add past the binder's capacity without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Empty a slot
    #[command(alias = "rm", display_order = 4)]
    Remove {
        /// Slot number (1-based)
        pos: usize,
    },

    /// Swap the contents of two slots
    #[command(alias = "mv", display_order = 5)]
    Move {
        /// Slot number to move from
        from: usize,
        /// Slot number to move to
        to: usize,
    },

    /// Move a card to the first free slot of a page
    #[command(display_order = 6)]
    MoveToPage {
        /// Slot number to move from
        from: usize,
        /// Target page (1-based)
        page: usize,
    },

    /// Remove every card from the binder (keeps the layout)
    #[command(display_order = 7)]
    Clear,

    /// Sort the binder and drop empty slots
    #[command(display_order = 8)]
    Sort {
        #[arg(value_enum)]
        by: SortKey,
    },

    /// Set the binder grid: rows, columns and pages
    #[command(display_order = 9)]
    Layout {
        rows: String,
        cols: String,
        pages: String,
    },

    /// Manage binders
    #[command(display_order = 10)]
    Binder {
        #[command(subcommand)]
        action: BinderCommands,
    },

    /// Manage profiles
    #[command(display_order = 11)]
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// Set the colour theme of the profile
    #[command(display_order = 12)]
    Theme {
        #[arg(value_enum)]
        mode: ThemeMode,
    },

    /// Search the catalog by card name
    #[command(display_order = 20)]
    Search {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,

        /// Narrow the results by name or #number
        #[arg(short, long)]
        filter: Option<String>,

        /// Results page (1-based)
        #[arg(short, long)]
        page: Option<usize>,
    },

    /// How much of a set this binder holds
    #[command(display_order = 21)]
    Progress {
        #[arg(required = true, num_args = 1..)]
        set: Vec<String>,
    },

    /// Print a marketplace link for the card in a slot
    #[command(display_order = 22)]
    Buy {
        /// Slot number (1-based)
        pos: usize,
    },

    /// Save the card image of a slot to a file
    #[command(display_order = 23)]
    Image {
        /// Slot number (1-based)
        pos: usize,

        /// Output file (format from extension)
        out: PathBuf,

        /// Width in pixels; height is width x 1.4
        #[arg(long, default_value_t = 250)]
        width: u32,
    },

    /// Inspect or trim the image cache
    #[command(display_order = 30)]
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Get or set configuration
    #[command(display_order = 31)]
    Config {
        /// Configuration key (e.g., cache-max-files)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BinderCommands {
    /// List the profile's binders
    List,
    /// Create an empty binder
    Create { name: String },
    /// Delete a binder (not the last one)
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Create a profile with one empty binder
    Create { name: String, password: String },
    /// Check a profile's password and list its binders
    Login { name: String, password: String },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached images, most recently used first
    List,
    /// Delete the least recently used images past the limit
    Sweep,
}
