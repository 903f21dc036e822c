mod app;
mod blog_post;
mod config;
mod error;
mod generation;
mod post_store;
mod ui;

use app::App;
use blog_post::BlogPost;
use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use config::{Cli, Config};
use error::GenerationError;
use generation::{generate_post, GeminiClient, PostGenerator};
use post_store::PostStore;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use ui::UI;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::from_cli(Cli::parse());
    let _log_guard = init_logging(&config.log_file)?;

    // A missing key must stop us before the terminal is taken over.
    let client = GeminiClient::from_config(&config)
        .wrap_err("Set GEMINI_API_KEY (or API_KEY) to generate posts")?;
    let generator: Arc<dyn PostGenerator> = Arc::new(client);

    let store = PostStore::load(&config.store_path, config.empty_store);
    info!(posts = store.len(), model = %config.model, "starting blog generator");

    let mut app = App::new(store);
    let mut ui = UI::new()?;
    run(&mut ui, &mut app, generator).await
}

async fn run(ui: &mut UI, app: &mut App, generator: Arc<dyn PostGenerator>) -> Result<()> {
    let mut pending: Option<JoinHandle<Result<BlogPost, GenerationError>>> = None;

    while !app.should_quit {
        ui.display(app)?;

        if pending.as_ref().is_some_and(|handle| handle.is_finished()) {
            if let Some(handle) = pending.take() {
                let result = handle.await.unwrap_or_else(|e| {
                    Err(GenerationError::Transport(format!(
                        "generation task failed: {}",
                        e
                    )))
                });
                app.complete_generation(result);
            }
        }

        if let Some(action) = ui.next_action(app)? {
            if let Some(job) = app.apply(action) {
                let generator = Arc::clone(&generator);
                pending = Some(tokio::spawn(async move {
                    generate_post(generator.as_ref(), &job.topic, job.tone).await
                }));
            }
        }
    }

    info!("quitting");
    Ok(())
}

fn init_logging(log_file: &Path) -> Result<WorkerGuard> {
    let file_name = log_file
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", log_file.display()))?;
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
