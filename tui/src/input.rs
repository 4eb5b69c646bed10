//! Input handling for the FinLab TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

use finlab_engine::App;
use finlab_engine::ui::{DraftInput, Screen};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads crossterm events on a blocking thread and hands them to the UI loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so a backpressured send on the input thread returns.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued terminal events into `app`. Returns `true` when the app should exit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => {
                tracing::warn!("Terminal input failed: {msg}");
                return Err(anyhow!("input error: {msg}"));
            }
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

/// Apply one terminal event. Returns `true` when the app should exit.
pub fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }
            if !handle_global_key(app, key) {
                match app.screen() {
                    Screen::Login => handle_login_key(app, key),
                    Screen::Accounts => handle_lookup_key(app, key),
                    Screen::Results => handle_results_key(app, key),
                }
            }
        }
        Event::Paste(text) => {
            if let Some(draft) = active_draft(app) {
                draft.enter_text(&text);
            }
        }
        _ => {}
    }
    app.should_quit()
}

/// Keys that mean the same thing on every screen.
fn handle_global_key(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c' | 'q') if ctrl => app.request_quit(),
        KeyCode::Char('l') if ctrl => app.logout(),
        KeyCode::Tab | KeyCode::BackTab => app.next_screen(),
        _ => return false,
    }
    true
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Enter {
        app.submit_login();
        return;
    }
    if let Some(draft) = app.login_draft_mut() {
        edit_draft(draft, key);
    }
}

fn handle_lookup_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => app.submit_lookup(),
        KeyCode::Char('x') if ctrl => app.clear_history(),
        _ => edit_draft(app.lookup_draft_mut(), key),
    }
}

fn handle_results_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.select_prev_result(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_result(),
        KeyCode::Enter => app.view_selected_details(),
        KeyCode::Esc => app.close_details(),
        KeyCode::Char('r') | KeyCode::F(5) => app.reload_results(),
        KeyCode::Char('q') => app.request_quit(),
        _ => {}
    }
}

fn edit_draft(draft: &mut DraftInput, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => draft.delete_word_backwards(),
        KeyCode::Char('u') if ctrl => draft.clear(),
        KeyCode::Char('a') if ctrl => draft.move_cursor_home(),
        KeyCode::Char('e') if ctrl => draft.move_cursor_end(),
        KeyCode::Char(c) if !ctrl => draft.enter_char(c),
        KeyCode::Backspace => draft.delete_char(),
        KeyCode::Delete => draft.delete_char_forward(),
        KeyCode::Left => draft.move_cursor_left(),
        KeyCode::Right => draft.move_cursor_right(),
        KeyCode::Home => draft.move_cursor_home(),
        KeyCode::End => draft.move_cursor_end(),
        _ => {}
    }
}

fn active_draft(app: &mut App) -> Option<&mut DraftInput> {
    match app.screen() {
        Screen::Login => app.login_draft_mut(),
        Screen::Accounts => Some(app.lookup_draft_mut()),
        Screen::Results => None,
    }
}
