use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::{
    domain::{Task, TaskId},
    protocol::TaskDraft,
};
use storage::Storage;
use task_client::{
    theme::{ThemeApplier, ThemeController, ThemeMode},
    DurablePreferenceStore, TaskStoreClient,
};
use tracing::info;

mod config;

use config::{load_settings, validate_server_url};

#[derive(Parser, Debug)]
#[command(name = "taskhub", about = "Task tracking client for the taskhub API")]
struct Args {
    /// Base URL of the remote task API.
    #[arg(long)]
    server_url: Option<String>,
    /// sqlite URL for the local preference store.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the visible task list.
    Show,
    /// Create a new task.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    /// Update the title and description of a task.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
    },
    /// Mark a task as done.
    Complete {
        #[arg(long)]
        id: i64,
    },
    /// Delete a task.
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Toggle between the light and dark theme.
    Theme,
}

struct ConsoleThemeApplier;

impl ThemeApplier for ConsoleThemeApplier {
    fn apply(&self, mode: ThemeMode) {
        println!("theme: {}", mode.as_str());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if let Some(database_url) = args.database_url {
        settings.database_url = database_url;
    }
    let server_url = validate_server_url(&settings.server_url)?;
    info!(server_url = %server_url, "starting taskhub client");

    let storage = Storage::new(&settings.database_url).await?;
    let theme = ThemeController::new_with_applier(
        Arc::new(DurablePreferenceStore::new(storage)),
        Arc::new(ConsoleThemeApplier),
    );
    theme.initialize().await;

    match args.command {
        Command::Theme => {
            theme.toggle().await;
        }
        Command::Show => {
            let tasks = task_store(&server_url).await;
            print_tasks(&tasks.visible_tasks().await);
        }
        Command::Create { title, description } => {
            let draft = TaskDraft::new(
                non_blank("title", &title)?,
                non_blank("description", &description)?,
            );
            let tasks = task_store(&server_url).await;
            match tasks.create(draft).await {
                Ok(created) => println!("created task {}", created.id.0),
                Err(err) => eprintln!("create failed: {err}"),
            }
        }
        Command::Update {
            id,
            title,
            description,
        } => {
            let task = Task {
                id: TaskId(id),
                title: non_blank("title", &title)?,
                description: non_blank("description", &description)?,
                completed: false,
            };
            let tasks = task_store(&server_url).await;
            match tasks.update(task).await {
                Ok(updated) => println!("updated task {}", updated.id.0),
                Err(err) => eprintln!("update failed: {err}"),
            }
        }
        Command::Complete { id } => {
            let tasks = task_store(&server_url).await;
            match tasks.complete(TaskId(id)).await {
                Ok(()) => println!("completed task {id}"),
                Err(err) => eprintln!("complete failed: {err}"),
            }
        }
        Command::Delete { id } => {
            let tasks = task_store(&server_url).await;
            match tasks.delete(TaskId(id)).await {
                Ok(()) => println!("deleted task {id}"),
                Err(err) => eprintln!("delete failed: {err}"),
            }
        }
    }

    Ok(())
}

/// Builds the task controller and performs its one startup load.
async fn task_store(server_url: &str) -> TaskStoreClient {
    let tasks = TaskStoreClient::new(server_url);
    tasks.load().await;
    tasks
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("no visible tasks");
        return;
    }
    for task in tasks {
        println!("[{}] {}: {}", task.id.0, task.title, task.description);
    }
}

/// The form-collaborator contract: drafts reach the core pre-trimmed and
/// non-empty.
fn non_blank(label: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{label} must not be blank");
    }
    Ok(trimmed.to_string())
}
