use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{SessionController, SessionError, UploadOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod repl;

use config::{load_settings, Overrides};

#[derive(Parser, Debug)]
#[command(name = "pdfchat", about = "Ask questions about a PDF indexed by the chat backend")]
struct Cli {
    /// Backend origin, e.g. http://localhost:8000
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    log_filter: Option<String>,
    /// Preselect a PDF for the interactive session
    #[arg(long)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the backend is reachable
    Check,
    Status,
    Upload {
        path: PathBuf,
    },
    Ask {
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&Overrides {
        config_path: cli.config.clone(),
        api_base: cli.api_base.clone(),
        log_filter: cli.log_filter.clone(),
    })?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let api_url = settings.api_url()?;
    info!(api_base = %api_url, "starting pdfchat session");
    let controller = SessionController::with_http(api_url);

    match cli.command {
        None => {
            if let Some(path) = &cli.file {
                controller.select_file_path(path).await?;
            }
            repl::run(controller).await
        }
        Some(Command::Check) => {
            let health = controller.backend().health().await?;
            println!("{}: {}", health.service, health.status);
            Ok(())
        }
        Some(Command::Status) => {
            controller.refresh_status().await?;
            println!("{}", render::status_line(&controller.snapshot()));
            Ok(())
        }
        Some(Command::Upload { path }) => upload_once(&controller, path).await,
        Some(Command::Ask { question }) => ask_once(&controller, &question).await,
    }
}

async fn upload_once(controller: &SessionController, path: PathBuf) -> Result<()> {
    controller.select_file_path(&path).await?;
    match controller.upload_selected().await {
        Ok(UploadOutcome::Uploaded { message, .. }) => {
            println!("{message}");
            println!("{}", render::status_line(&controller.snapshot()));
            Ok(())
        }
        Ok(UploadOutcome::AlreadyPending) => bail!("an upload is already in progress"),
        Err(SessionError::Request(_)) => {
            let message = controller.snapshot().last_error.unwrap_or_default();
            bail!("upload failed: {message}")
        }
        Err(err) => Err(err.into()),
    }
}

async fn ask_once(controller: &SessionController, question: &str) -> Result<()> {
    let result = controller.submit_query(question).await;
    if let Some(answer) = render::answer_block(&controller.snapshot()) {
        println!("{answer}");
    }
    result?;
    Ok(())
}
