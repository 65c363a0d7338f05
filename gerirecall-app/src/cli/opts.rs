use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(name = "gerirecall", version, about = "Spaced-repetition flashcards for geriatric medicine")]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the card store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Storage key (file name of the store)
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Fail instead of continuing when the store cannot be written
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Add (or replace) a card
    Add(AddArgs),
    /// Record one review of a card
    Review(ReviewArgs),
    /// Interactive study loop over due cards
    Study(StudyArgs),
    /// List due cards, most overdue first
    Due {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List never-reviewed cards, oldest first
    New {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// List cards, optionally filtered
    List(ListArgs),
    /// Show one card and its review history
    Show { id: String },
    /// Restore a card's default schedule
    Reset { id: String },
    /// Delete a card and its history
    Rm { id: String },
    /// Collection statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show or change scheduler settings
    Settings(SettingsArgs),
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
    /// Launch the HTTP API
    Serve {
        /// Bind address (host:port), overrides the config
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Args, Clone)]
pub struct AddArgs {
    /// Card id; a UUID is generated when omitted
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub front: String,
    #[arg(long)]
    pub back: String,
    #[arg(long, default_value = "general")]
    pub category: String,
    #[arg(long, default_value = "medium")]
    pub difficulty: String,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewArgs {
    pub id: String,
    /// Recall quality, 0-5
    #[arg(allow_negative_numbers = true)]
    pub performance: i64,
    /// Seconds spent on the card
    #[arg(long, default_value_t = 0)]
    pub seconds: u64,
}

#[derive(Debug, Args, Clone)]
pub struct StudyArgs {
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
    /// Also study never-reviewed cards that are not yet due
    #[arg(long)]
    pub include_new: bool,
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub difficulty: Option<String>,
    /// Case-insensitive text search
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SettingsArgs {
    #[arg(long)]
    pub new_card_interval: Option<u32>,
    #[arg(long)]
    pub max_interval: Option<u32>,
    #[arg(long)]
    pub min_ease_factor: Option<f64>,
    #[arg(long)]
    pub default_ease_factor: Option<f64>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    /// Replace everything with a JSON export
    Json { path: PathBuf },
    /// Add cards from CSV (id,front,back,category,difficulty)
    Csv { path: PathBuf },
}
