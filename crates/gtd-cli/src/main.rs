//! gtd - Getting Things Done from the terminal
//!
//! Works on the same `.gtd/` store as the API server.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gtd")]
#[command(about = "Capture, organize and review your GTD lists")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new gtd store in the current directory
    Init {
        /// Skip the sample project and items
        #[arg(long)]
        empty: bool,
    },

    /// Capture a new item (into the inbox unless a status is given)
    Add {
        /// Item title
        title: String,

        #[command(flatten)]
        fields: ItemFields,
    },

    /// List items
    List {
        /// Filter by status (inbox, next, waiting, someday, reference, projects, done, trash)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by context tag
        #[arg(short, long)]
        context: Option<String>,

        /// Group by first context
        #[arg(short, long)]
        group: bool,

        /// Include done and trashed items
        #[arg(short, long)]
        all: bool,
    },

    /// Show item details
    Show {
        /// Item ID
        id: u64,
    },

    /// Update an item
    Update {
        /// Item ID
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: ItemFields,

        /// Detach from its project
        #[arg(long, conflicts_with = "project")]
        no_project: bool,

        /// Clear the due date
        #[arg(long, conflicts_with = "due")]
        no_due: bool,
    },

    /// Mark an item done
    Done {
        /// Item ID
        id: u64,
    },

    /// Delete an item
    Rm {
        /// Item ID
        id: u64,
    },

    /// Move an item to another project
    Move {
        /// Item ID
        id: u64,

        /// Destination project ID
        #[arg(short, long, required_unless_present = "none")]
        project: Option<u64>,

        /// Take the item out of any project
        #[arg(long, conflicts_with = "project")]
        none: bool,
    },

    /// Move a project item to a new position
    Reorder {
        /// Project ID
        project: u64,

        /// Item ID
        id: u64,

        /// New zero-based index
        index: usize,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Show what can be done now: project next actions and standalone actions
    Next {
        /// Only actions with this context
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Weekly review summary
    Review,

    /// Show dated items
    Calendar {
        /// Only items due within this many days (overdue included)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Replace all data with an export file
    Import {
        /// Path to an export file
        path: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

/// Optional item fields shared by `add` and `update`
#[derive(Args, Default)]
pub struct ItemFields {
    /// Status (list) to file the item under
    #[arg(short, long)]
    pub status: Option<String>,

    /// Project ID
    #[arg(short, long)]
    pub project: Option<u64>,

    /// Context tags, e.g. -c @home -c @calls
    #[arg(short, long = "context")]
    pub contexts: Vec<String>,

    /// Notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Time estimate, e.g. "30m"
    #[arg(short, long)]
    pub estimate: Option<String>,

    /// Energy level (low, medium, high)
    #[arg(long)]
    pub energy: Option<String>,

    /// Start time, e.g. "09:30"
    #[arg(long)]
    pub start: Option<String>,

    /// Due date or date-time
    #[arg(short, long)]
    pub due: Option<String>,

    /// Position within the project
    #[arg(long)]
    pub position: Option<i64>,
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a project
    Add {
        /// Project name
        name: String,

        /// Desired outcome
        #[arg(short, long)]
        outcome: Option<String>,
    },

    /// List projects with their next actions
    List {
        /// Include completed and archived projects
        #[arg(short, long)]
        all: bool,
    },

    /// Show a project and its items in order
    Show {
        /// Project ID
        id: u64,
    },

    /// Update a project
    Update {
        /// Project ID
        id: u64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New outcome
        #[arg(short, long)]
        outcome: Option<String>,

        /// New status (active, completed, archived)
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Delete a project; its open items go back to the inbox
    Rm {
        /// Project ID
        id: u64,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset to default configuration
    Reset,
    /// Print the config file path
    Path,
    /// Get a specific config value
    Get {
        /// Config key (e.g., "server.port", "display.colors")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { empty } => commands::init(empty),
        Commands::Add { title, fields } => commands::add(title, fields, cli.json),
        Commands::List {
            status,
            context,
            group,
            all,
        } => commands::list(status, context, group, all, cli.json),
        Commands::Show { id } => commands::show(id, cli.json),
        Commands::Update {
            id,
            title,
            fields,
            no_project,
            no_due,
        } => commands::update(id, title, fields, no_project, no_due, cli.json),
        Commands::Done { id } => commands::done(id, cli.json),
        Commands::Rm { id } => commands::remove(id),
        Commands::Move { id, project, none } => {
            commands::move_item(id, if none { None } else { project }, cli.json)
        }
        Commands::Reorder { project, id, index } => commands::reorder(project, id, index, cli.json),
        Commands::Project { command } => match command {
            ProjectCommands::Add { name, outcome } => {
                commands::project_add(name, outcome, cli.json)
            }
            ProjectCommands::List { all } => commands::project_list(all, cli.json),
            ProjectCommands::Show { id } => commands::project_show(id, cli.json),
            ProjectCommands::Update {
                id,
                name,
                outcome,
                status,
            } => commands::project_update(id, name, outcome, status, cli.json),
            ProjectCommands::Rm { id } => commands::project_remove(id, cli.json),
        },
        Commands::Next { context } => commands::next(context, cli.json),
        Commands::Review => commands::review(cli.json),
        Commands::Calendar { days } => commands::calendar(days, cli.json),
        Commands::Export { output } => commands::export(output),
        Commands::Import { path, yes } => commands::import(&path, yes, cli.json),
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(cli.json),
            Some(ConfigCommands::Reset) => commands::config_reset(),
            Some(ConfigCommands::Path) => commands::config_path(),
            Some(ConfigCommands::Get { key }) => commands::config_get(&key, cli.json),
            Some(ConfigCommands::Set { key, value }) => commands::config_set(&key, &value),
        },
    }
}
