mod app;
mod chat;
mod config;
mod feed;
mod media;
mod model;
mod monitor;
mod ranking;
mod session;
mod storage;
mod tally;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use config::AppConfig;
use model::Category;
use session::{Catalog, Session};
use storage::{FileStorage, Storage};

#[derive(Parser, Debug)]
#[command(name = "huddle")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Rank the weekends, rank the cities, talk trash about both")]
struct Args {
    /// Directory holding the shared votes, feed and chat (e.g. a synced folder)
    #[arg(long)]
    shared_dir: Option<PathBuf>,

    /// Directory for this device's profile and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print current standings and the feed as JSON
    #[arg(short, long)]
    standings: bool,

    /// Watch for new feed lines and chat messages (desktop notifications)
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(dir) = args.shared_dir {
        config.shared_dir = Some(dir);
    }
    if let Some(dir) = args.data_dir {
        config.data_dir = Some(dir);
    }

    let tui = !args.standings && !args.watch;
    init_logging(&config, tui);

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.shared_dir(), config.private_dir()));

    // Handle CLI-only commands
    if args.standings {
        return print_standings(config, storage).await;
    }

    if args.watch {
        return monitor::start_watching(config, storage).await;
    }

    // Run TUI
    run_tui(config, storage).await
}

/// The alternate screen owns stdout, so the TUI logs to a file
fn init_logging(config: &AppConfig, tui: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    if tui {
        let fallback = std::env::temp_dir().join("huddle.log");
        match open_log_file(&config.log_path(), &fallback) {
            Some((path, file)) => {
                tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                    .with(filter)
                    .init();
                if path != config.log_path() {
                    tracing::warn!("Could not open {}, logging here instead", config.log_path().display());
                }
            }
            None => {
                // Still before the alternate screen, so this reaches the user
                eprintln!(
                    "huddle: cannot open {} or {}, logs go to stderr",
                    config.log_path().display(),
                    fallback.display()
                );
                tracing_subscriber::registry()
                    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }
        return;
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Open the first of `paths` that can be appended to
fn open_log_file(primary: &Path, fallback: &Path) -> Option<(PathBuf, File)> {
    [primary, fallback].into_iter().find_map(|path| {
        let opened = path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| OpenOptions::new().create(true).append(true).open(path));
        opened.ok().map(|file| (path.to_path_buf(), file))
    })
}

async fn print_standings(config: AppConfig, storage: Arc<dyn Storage>) -> Result<()> {
    let catalog = Catalog {
        weekends: config.weekends.clone(),
        cities: config.cities.clone(),
        last_place_item: config.last_place_item.clone(),
    };
    let mut session = Session::new(storage, catalog);
    session.refresh().await;
    let state = session.state();

    let output = serde_json::json!({
        "title": config.title,
        "voters": state.votes.keys().collect::<Vec<_>>(),
        "weekends": session.standings(Category::Weekends),
        "cities": session.standings(Category::Cities),
        "feed": state.feed,
        "chatMessages": state.chat.len(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_tui(config: AppConfig, storage: Arc<dyn Storage>) -> Result<()> {
    // Create app state before touching the terminal so load errors print normally
    let mut app = App::new(config, storage).await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    app.handle_mouse(mouse, Rect::new(0, 0, size.width, size.height));
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let idle = app.popup == Popup::None && !app.is_editing();
                    match key.code {
                        KeyCode::Char('q') if idle => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key).await {
                                tracing::error!("Key handling failed: {}", e);
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // Periodic refresh
        if let Err(e) = app.tick().await {
            tracing::warn!("Tick failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_prefers_primary() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("data/huddle.log");
        let fallback = dir.path().join("tmp/huddle.log");

        let (path, _) = open_log_file(&primary, &fallback).unwrap();
        assert_eq!(path, primary);
        assert!(primary.exists());
    }

    #[test]
    fn test_log_file_falls_back_when_primary_unusable() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the log directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let primary = blocker.join("huddle.log");
        let fallback = dir.path().join("huddle.log");

        let (path, _) = open_log_file(&primary, &fallback).unwrap();
        assert_eq!(path, fallback);

        let nowhere = blocker.join("also/huddle.log");
        assert!(open_log_file(&primary, &nowhere).is_none());
    }
}
