use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "slate", about = concat!("slate v", env!("CARGO_PKG_VERSION"), " - todo.txt tasks with projects and areas"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .slate/ store in the current directory
    Init(InitArgs),
    /// Add a todo from a todo.txt line
    Add(AddArgs),
    /// List todos in display order
    List(ViewArgs),
    /// Show todo details
    Show(IdArg),
    /// Toggle a todo between open and completed
    Done(IdArg),
    /// Replace a todo with a re-typed todo.txt line
    Edit(EditArgs),
    /// Change individual fields of a todo
    Set(SetArgs),
    /// Delete a todo
    Rm(IdArg),
    /// Manage projects (+Name)
    Project(LookupCmd),
    /// Manage areas (@name)
    Area(LookupCmd),
    /// Count todos in a view
    Stats(ViewArgs),
    /// Print all todos as a todo.txt file
    Export,
    /// Add every line of a todo.txt file
    Import(ImportArgs),
    /// Show what the input line could complete at the cursor
    Suggest(SuggestArgs),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Default view for `slate list` (all, active, completed)
    #[arg(long)]
    pub default_filter: Option<String>,
    /// Rewrite config.toml even if .slate/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ViewArgs {
    /// Only open todos
    #[arg(long, conflicts_with_all = ["completed", "all"])]
    pub active: bool,
    /// Only completed todos
    #[arg(long, conflicts_with = "all")]
    pub completed: bool,
    /// Every todo (overrides the configured default)
    #[arg(long)]
    pub all: bool,
    /// Only todos in this project (exact name)
    #[arg(long)]
    pub project: Option<String>,
    /// Only todos in this area (exact name)
    #[arg(long)]
    pub area: Option<String>,
    /// Case-insensitive regex matched against descriptions
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct IdArg {
    /// Todo ID or unique ID prefix
    pub id: String,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// Input line
    pub text: String,
    /// Cursor byte offset (default: end of line)
    #[arg(long)]
    pub cursor: Option<usize>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// todo.txt line, e.g. "(A) Call Mom +Family @phone due:2024-05-01"
    pub text: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Todo ID or unique ID prefix
    pub id: String,
    /// Replacement todo.txt line
    pub text: String,
}

#[derive(Args)]
pub struct SetArgs {
    /// Todo ID or unique ID prefix
    pub id: String,
    #[arg(long)]
    pub description: Option<String>,
    /// A, B, C, or D
    #[arg(long, conflicts_with = "no_priority")]
    pub priority: Option<String>,
    #[arg(long)]
    pub no_priority: bool,
    /// Project name (created if new)
    #[arg(long, conflicts_with = "no_project")]
    pub project: Option<String>,
    #[arg(long)]
    pub no_project: bool,
    /// Area name (created if new)
    #[arg(long, conflicts_with = "no_area")]
    pub area: Option<String>,
    #[arg(long)]
    pub no_area: bool,
    /// Due date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "no_due")]
    pub due: Option<String>,
    #[arg(long)]
    pub no_due: bool,
    /// Mark completed (true) or open (false)
    #[arg(long)]
    pub completed: Option<bool>,
    /// Completion date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "no_completion_date")]
    pub completion_date: Option<String>,
    #[arg(long)]
    pub no_completion_date: bool,
    /// Set a metadata entry; an empty value removes it (repeatable)
    #[arg(long = "meta", value_name = "KEY=VALUE", action = clap::ArgAction::Append)]
    pub meta: Vec<String>,
    /// Remove all metadata
    #[arg(long, conflicts_with = "meta")]
    pub no_meta: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// todo.txt file to import
    pub file: String,
}

// ---------------------------------------------------------------------------
// Project / area management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LookupCmd {
    #[command(subcommand)]
    pub action: LookupAction,
}

#[derive(Subcommand)]
pub enum LookupAction {
    /// List all names
    List,
    /// Create a name
    Add(LookupNameArg),
    /// Rename, updating every todo that uses the old name
    Rename(LookupRenameArgs),
    /// Delete, detaching it from its todos
    Rm(LookupNameArg),
}

#[derive(Args)]
pub struct LookupNameArg {
    pub name: String,
}

#[derive(Args)]
pub struct LookupRenameArgs {
    pub old: String,
    pub new: String,
}
