//! Todo Sync command line client
//!
//! Drives the client state cache against a running API server.
//!
//! ## Usage
//!
//! ```bash
//! todo-sync-cli list --filter pending
//! todo-sync-cli add "Buy milk" --due 2025-01-01
//! todo-sync-cli toggle 0190c6b2-...
//! todo-sync-cli remove 0190c6b2-...
//! todo-sync-cli import-samples
//! ```

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use todo_sync::client::{
    ClientState, DEFAULT_BASE_URL, FilterMode, HttpTodoApi, TodoStore, TodoStoreHandle,
};
use todo_sync::domain::{Timestamp, TodoId};

#[derive(Parser)]
#[command(name = "todo-sync-cli")]
#[command(about = "Command line client for the todo-sync API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the todo API
    #[arg(long, env = "TODO_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Transport timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Show todos
    List {
        /// Which todos to show: all, completed or pending
        #[arg(short, long, default_value = "all")]
        filter: FilterMode,
    },

    /// Create a todo
    Add {
        /// Label of the todo
        #[arg(value_name = "TITLE")]
        title: String,

        /// Due date, YYYY-MM-DD or RFC 3339
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },

    /// Flip the completed flag of a todo
    Toggle {
        /// Todo id
        #[arg(value_name = "ID")]
        id: TodoId,
    },

    /// Delete a todo
    Remove {
        /// Todo id
        #[arg(value_name = "ID")]
        id: TodoId,
    },

    /// Insert the two sample store records
    ImportSamples,
}

fn sample_store_records() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({
            "title": "Store A",
            "month": "06-2024",
            "description": "Total Revenue: 230.00",
            "AveragePrice": "15.00"
        }),
        serde_json::json!({
            "title": "Store B",
            "month": "06-2024",
            "description": "Total Revenue: 150.00",
            "AveragePrice": "12.05"
        }),
    ]
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let api = match HttpTodoApi::new(&cli.base_url, Duration::from_secs(cli.timeout_secs)) {
        Ok(api) => api,
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    };

    let (store, _task) = TodoStore::spawn(Arc::new(api));

    match run(&store, cli.command).await {
        Ok(state) if state.error.is_none() => print_state(&state),
        Ok(state) => {
            eprintln!("Error: {}", state.error.unwrap_or_default());
            process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {error}");
            process::exit(1);
        }
    }
}

async fn run(
    store: &TodoStoreHandle,
    command: Commands,
) -> Result<ClientState, todo_sync::client::ClientError> {
    let state = store.refresh().await?;
    if state.error.is_some() {
        return Ok(state);
    }

    match command {
        Commands::List { filter } => store.set_filter(filter).await,
        Commands::Add { title, due } => store.add(title, due).await,
        Commands::Toggle { id } => store.toggle(id).await,
        Commands::Remove { id } => store.remove(id).await,
        Commands::ImportSamples => store.import_records(sample_store_records()).await,
    }
}

fn print_state(state: &ClientState) {
    let visible = state.visible();
    if visible.is_empty() {
        println!("No todos ({} filter)", state.filter);
        return;
    }

    let now = Timestamp::now();
    for entry in visible {
        let marker = if entry.todo.completed { "x" } else { " " };
        let overdue = if entry.is_overdue(now) { "  OVERDUE" } else { "" };
        println!(
            "[{marker}] {}  (created {}, due {}){overdue}  {}",
            entry.todo.title, entry.created_label, entry.due_label, entry.todo.id
        );
    }
}
