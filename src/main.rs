//! todo-api - Minimal JSON to-do list service backed by an embedded document store

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_api::api::{self, AppState};
use todo_api::config::Config;
use todo_api::server;
use todo_api::store::{DocumentStore, TodoStore};
use todo_api::types::Todo;

#[derive(Parser)]
#[command(name = "todo-api")]
#[command(about = "Minimal JSON to-do list service backed by an embedded document store")]
#[command(version)]
struct Cli {
    /// Path to a config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print stored todos
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment
    let _ = dotenvy::dotenv();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("todo_api={},tower_http=debug", log_level).into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(cli.config.as_deref())?;

    // Connection failure is fatal
    let store = DocumentStore::open(&config.store.path)?;
    let todos = store.collection(&config.store.database, &config.store.collection);
    tracing::info!(
        "Opened {}/{} at {}",
        todos.database(),
        todos.name(),
        config.store.path.display()
    );

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = AppState::new(Arc::new(todos));
            let router = api::create_router(state, config.server.request_timeout());

            let addr = config.listen_addr();
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on {}", addr);

            println!("todo-api running at http://localhost:{}", config.server.port);
            println!("  UI:       http://localhost:{}/", config.server.port);
            println!("  API:      http://localhost:{}/todo/", config.server.port);
            println!("  API Docs: http://localhost:{}/api/docs", config.server.port);
            println!("  Health:   http://localhost:{}/health", config.server.port);

            let shutdown = CancellationToken::new();
            tokio::spawn(server::cancel_on_signal(shutdown.clone()));

            server::run(listener, router, shutdown, config.server.shutdown_timeout()).await?;
        }

        Commands::List => {
            let items: Vec<Todo> = todos
                .find_all()
                .await?
                .into_iter()
                .map(Todo::from)
                .collect();

            if items.is_empty() {
                println!("No todos found");
            } else {
                for todo in items {
                    let mark = if todo.completed { "x" } else { " " };
                    println!(
                        "[{}] {} ({}, {})",
                        mark,
                        todo.title,
                        todo.id,
                        todo.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
    }

    Ok(())
}
