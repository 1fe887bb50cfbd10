use clap::{Args, Parser, Subcommand, ValueEnum};
use noteforge_core::{DifficultyChoice, ReforgeAction};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DifficultyArg {
    Easy,
    Medium,
    Hard,
    All,
}

impl From<DifficultyArg> for DifficultyChoice {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Easy => DifficultyChoice::Easy,
            DifficultyArg::Medium => DifficultyChoice::Medium,
            DifficultyArg::Hard => DifficultyChoice::Hard,
            DifficultyArg::All => DifficultyChoice::All,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Regenerate,
    AddMore,
}

impl From<ActionArg> for ReforgeAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Regenerate => ReforgeAction::Regenerate,
            ActionArg::AddMore => ReforgeAction::AddMore,
        }
    }
}

#[derive(Debug, Parser, Clone)]
#[command(name = "noteforge", version, about = "NoteForge notes and AI flashcards (CLI/TUI/API)")]
pub struct Cli {
    /// Storage backend (applies to CLI/TUI/API)
    #[arg(long, value_enum, default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// SQLite DB path when --store sqlite (defaults to app data dir)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Settings file (defaults to app data dir)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model name, overrides the saved setting
    #[arg(long, env = "NOTEFORGE_MODEL")]
    pub model: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Note operations
    #[command(subcommand)]
    Note(NoteCmd),
    /// Generate a flashcard set from a note
    Generate(GenerateCmd),
    /// Regenerate or extend an existing set
    Reforge(ReforgeCmd),
    /// Flashcard set operations
    #[command(subcommand)]
    Set(SetCmd),
    /// Step through a set's cards
    Study { set: String },
    /// Saved generation preferences
    #[command(subcommand)]
    Settings(SettingsCmd),
    /// Totals across notes, sets and generation requests
    Dashboard,
    /// Launch Terminal UI
    Tui,
    /// Launch Axum HTTP API
    Api(ApiCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum NoteCmd {
    Add(NoteAdd),
    List {
        /// Match title or content
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    Show { note: String },
    Edit(NoteEdit),
    Rm { note: String },
}

#[derive(Debug, Args, Clone)]
pub struct NoteAdd {
    #[arg(long)]
    pub title: String,
    /// Note body; read from --file when omitted
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, conflicts_with = "content")]
    pub file: Option<PathBuf>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct NoteEdit {
    pub note: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, conflicts_with = "content")]
    pub file: Option<PathBuf>,
    #[arg(long = "add-tag")]
    pub add_tags: Vec<String>,
    #[arg(long = "rm-tag")]
    pub rm_tags: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateCmd {
    pub note: String,
    /// Number of cards (1-30); saved setting when omitted
    #[arg(long)]
    pub count: Option<u32>,
    #[arg(long, value_enum)]
    pub difficulty: Option<DifficultyArg>,
    /// Extra instructions passed to the generator
    #[arg(long)]
    pub instructions: Option<String>,
    /// Show the cards and ask before saving
    #[arg(long)]
    pub preview: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ReforgeCmd {
    pub set: String,
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,
    /// Number of cards (1-50); saved setting when omitted
    #[arg(long)]
    pub count: Option<u32>,
    #[arg(long, value_enum)]
    pub difficulty: Option<DifficultyArg>,
    /// Generate from this excerpt instead of the whole note
    #[arg(long)]
    pub section: Option<String>,
    #[arg(long)]
    pub preview: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SetCmd {
    List {
        #[arg(long)]
        query: Option<String>,
    },
    Show { set: String },
    Progress { set: String },
    Rm { set: String },
    Share { set: String },
    Unshare { set: String },
}

#[derive(Debug, Subcommand, Clone)]
pub enum SettingsCmd {
    Show,
    SetGeneration(GenerationSettingsArgs),
    SetReforge(ReforgeSettingsArgs),
    Reset,
}

#[derive(Debug, Args, Clone)]
pub struct GenerationSettingsArgs {
    #[arg(long)]
    pub count: Option<u32>,
    #[arg(long, value_enum)]
    pub difficulty: Option<DifficultyArg>,
    #[arg(long)]
    pub prompt: Option<String>,
    #[arg(long)]
    pub preview: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ReforgeSettingsArgs {
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,
    #[arg(long)]
    pub count: Option<u32>,
    #[arg(long, value_enum)]
    pub difficulty: Option<DifficultyArg>,
    #[arg(long)]
    pub use_selected_section: Option<bool>,
    #[arg(long)]
    pub preview: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct ApiCmd {
    /// Bind address (host:port)
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub addr: String,
}
