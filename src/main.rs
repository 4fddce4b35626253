use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use tasktrack::{Config, ImportError, State, Task, TaskStore, transfer};

#[derive(Parser)]
#[command(name = "tasktrack")]
#[command(about = "TaskTrack - create, list, edit, search and delete tasks")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the task database (overrides the config file)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tasks
    List,

    /// Add a new task
    Add {
        task: String,
        body: String,
        /// Mark the task as completed
        #[arg(long)]
        completed: bool,
    },

    /// Show one task
    Show { id: i64 },

    /// Edit a task; fields not given keep their current value
    Edit {
        id: i64,
        #[arg(long)]
        task: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// pending or completed
        #[arg(long)]
        state: Option<State>,
    },

    /// Search by status ("pending"/"completed") or by text in task and body
    Search { query: String },

    /// Delete a task
    Delete { id: i64 },

    /// Export all tasks to a JSON file
    Export {
        #[arg(default_value = "tasks.json")]
        path: PathBuf,
    },

    /// Import tasks from a JSON file
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database = db;
    }

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level()?
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let store = TaskStore::open(&config.database)?;

    match cli.command {
        Commands::List => {
            println!("{}", "Tasks List".bold());
            print_tasks(&store.list_all()?);
        }
        Commands::Add { task, body, completed } => {
            require_fields(&task, &body)?;
            let created = store.create(&task, &body, completed)?;
            println!("{} (ID {})", "Task added successfully!".green(), created.id);
        }
        Commands::Show { id } => match store.get_by_id(id)? {
            Some(task) => print_tasks(&[task]),
            None => return Err(eyre!("Task not found with ID: {}", id)),
        },
        Commands::Edit { id, task, body, state } => {
            let current = store
                .get_by_id(id)?
                .ok_or_else(|| eyre!("Task not found with ID: {}", id))?;

            let task = task.unwrap_or(current.task);
            let body = body.unwrap_or(current.body);
            let state = state.map(bool::from).unwrap_or(current.state);
            require_fields(&task, &body)?;

            store.update(id, &task, &body, state)?;
            println!("{}", "Task updated successfully!".green());
        }
        Commands::Search { query } => {
            let tasks = store.search(&query)?;
            if tasks.is_empty() {
                println!("{}", "No tasks found matching your search.".yellow());
            } else {
                println!("{}", "Search Results".bold());
                print_tasks(&tasks);
            }
        }
        Commands::Delete { id } => {
            if store.delete(id)? {
                println!("{}", format!("Task with ID {} has been deleted successfully.", id).green());
            } else {
                println!("{}", format!("No task found with ID {}.", id).yellow());
            }
        }
        Commands::Export { path } => {
            let count = transfer::write_export(&store, &path)?;
            if count == 0 {
                println!("{}", "No tasks available to export.".yellow());
            } else {
                println!("Exported {} tasks to {}", count, path.display());
            }
        }
        Commands::Import { path } => {
            let count = transfer::import_file(&store, &path).map_err(describe_import_error)?;
            println!(
                "{} ({} tasks)",
                "Tasks successfully imported into the database.".green(),
                count
            );
        }
    }

    Ok(())
}

fn describe_import_error(err: eyre::Report) -> eyre::Report {
    match err.downcast_ref::<ImportError>() {
        Some(ImportError::InvalidJson(_)) => eyre!("Error: The file is not a valid JSON."),
        Some(ImportError::NotAnArray) => eyre!("The JSON file must contain a list of tasks."),
        _ => err.wrap_err("An error occurred"),
    }
}

fn require_fields(task: &str, body: &str) -> Result<()> {
    if task.is_empty() || body.is_empty() {
        return Err(eyre!("Please fill in both the Task and Body fields."));
    }
    Ok(())
}

fn print_tasks(tasks: &[Task]) {
    let task_width = column_width("Task", tasks.iter().map(|t| t.task.as_str()));
    let body_width = column_width("Body", tasks.iter().map(|t| t.body.as_str()));

    println!(
        "{:>5}  {:<task_width$}  {:<body_width$}  {}",
        "ID".bold(),
        "Task".bold(),
        "Body".bold(),
        "State".bold()
    );
    for task in tasks {
        let state = match task.status() {
            State::Pending => State::Pending.as_str().yellow(),
            State::Completed => State::Completed.as_str().green(),
        };
        println!(
            "{:>5}  {:<task_width$}  {:<body_width$}  {}",
            task.id, task.task, task.body, state
        );
    }
}

fn column_width<'a>(header: &str, values: impl Iterator<Item = &'a str>) -> usize {
    values.map(|v| v.chars().count()).chain([header.len()]).max().unwrap_or(0)
}
