//! FinLab console - binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The binary bridges [`finlab_engine`] (application state) and [`finlab_tui`]
//! (rendering), providing RAII-based terminal management with guaranteed cleanup.
//!
//! ```text
//! main() -> FinlabConfig::load() -> Settings -> App::new() -> TerminalSession::new() -> run_app()
//! ```
//!
//! # Event Loop
//!
//! A fixed 8ms (~120 FPS) render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`finlab_tui::InputPump`])
//! 3. Advance application state (`app.tick()`)
//! 4. Render frame

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, Write, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use finlab_engine::{App, FinlabConfig};
use finlab_tui::{InputPump, draw, handle_events};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // If we can't open a log file, prefer "no logs" over corrupting the TUI
    // by writing to stdout/stderr.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, std::fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.finlab/logs/finlab.log
    if let Some(config_path) = FinlabConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("finlab.log"));
    }

    // Fallback: ./.finlab/logs/finlab.log
    candidates.push(PathBuf::from(".finlab").join("logs").join("finlab.log"));

    candidates
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Raw mode, bracketed paste and the alternate screen are restored on drop,
/// so the terminal stays usable after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = FinlabConfig::load()
        .context("failed to load ~/.finlab/config.toml")?
        .unwrap_or_default();
    let settings = config.resolve().context("invalid configuration")?;
    let mut app = App::new(settings).context("failed to set up backend client")?;

    let run_result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };

    app.shutdown();
    if let Err(err) = run_result {
        tracing::error!("Exiting after error: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

const FRAME_DURATION: Duration = Duration::from_millis(8);

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend + Write,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.tick();

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
