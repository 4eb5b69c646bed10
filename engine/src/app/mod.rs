//! The application state machine.
//!
//! `App` owns one view per [`Screen`], the session [`TokenStore`], and the
//! backend services. Every network call runs in a spawned task; `tick()`
//! drains session signals, collects finished tasks, and enforces the route
//! guard. Nothing here touches the terminal.

mod login;
mod lookup;
mod results;


use tokio::sync::mpsc;

use finlab_client::{
    AccountService, ApiError, AuthPipeline, AuthService, Backend, BackendConfigError, ListenerId,
    Navigation, ResultsService, TokenStore,
};

pub use login::LoginView;
pub use lookup::{LookupRecord, LookupView};
pub use results::ResultsView;

use crate::config::Settings;
use crate::task::{Pending, poll_slot};
use crate::ui::{Screen, StatusLine, UiOptions};

const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

pub struct App {
    screen: Screen,
    tokens: TokenStore,
    auth: AuthService,
    accounts: AccountService,
    results_service: ResultsService,
    /// 401 responses anywhere arrive here as [`Navigation::Login`].
    navigation_rx: mpsc::UnboundedReceiver<Navigation>,
    /// Forwarded clear notifications from the token store.
    cleared_rx: mpsc::UnboundedReceiver<()>,
    clear_listener: Option<ListenerId>,
    backend_label: String,
    login: LoginView,
    lookup: LookupView,
    results: ResultsView,
    logout: Option<Pending<Result<(), ApiError>>>,
    status: Option<StatusLine>,
    ui_options: UiOptions,
    tick_count: usize,
    should_quit: bool,
}

impl App {
    /// Build the services and wire the token store's clear notifications and
    /// the pipeline's navigation signal into channels drained by [`tick`](Self::tick).
    pub fn new(settings: Settings) -> Result<Self, BackendConfigError> {
        let tokens = TokenStore::new();

        let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();
        let (cleared_tx, cleared_rx) = mpsc::unbounded_channel();
        let clear_listener = tokens.on_clear(move || {
            // Receiver is gone only after App is dropped.
            let _ = cleared_tx.send(());
        });

        let backend_label = settings.backend.base_url().to_string();
        let pipeline = AuthPipeline::new(settings.backend.api_key().clone(), tokens.clone())
            .with_navigator(navigation_tx);
        let backend = Backend::new(settings.backend, pipeline)?;

        Ok(Self {
            screen: Screen::Login,
            tokens,
            auth: AuthService::new(backend.clone()),
            accounts: AccountService::new(backend.clone()),
            results_service: ResultsService::new(backend),
            navigation_rx,
            cleared_rx,
            clear_listener: Some(clear_listener),
            backend_label,
            login: LoginView::new(settings.username),
            lookup: LookupView::default(),
            results: ResultsView::default(),
            logout: None,
            status: None,
            ui_options: UiOptions {
                high_contrast: settings.high_contrast,
            },
            tick_count: 0,
            should_quit: false,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Topbar state: whether a session token is held right now.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.tokens.exists()
    }

    #[must_use]
    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    #[must_use]
    pub fn login_view(&self) -> &LoginView {
        &self.login
    }

    #[must_use]
    pub fn lookup_view(&self) -> &LookupView {
        &self.lookup
    }

    #[must_use]
    pub fn results_view(&self) -> &ResultsView {
        &self.results
    }

    #[must_use]
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    /// Frames since start; drives the spinner.
    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick_count
    }

    #[must_use]
    pub fn is_logging_out(&self) -> bool {
        self.logout.is_some()
    }

    /// True while any request task is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.logout.is_some()
            || self.login.is_loading()
            || self.lookup.is_loading()
            || self.results.is_loading()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Switch screens. Session-only screens fall back to `Login` without a token.
    pub fn navigate(&mut self, target: Screen) {
        if target.requires_session() && !self.tokens.exists() {
            tracing::debug!(?target, "Route guard: no session");
            self.screen = Screen::Login;
            return;
        }
        if target == self.screen {
            return;
        }

        self.screen = target;
        if target == Screen::Results {
            // Entering the results screen always starts from a fresh list.
            self.results = ResultsView::default();
            self.reload_results();
        }
    }

    /// Cycle between the session screens (topbar tabs).
    pub fn next_screen(&mut self) {
        let target = match self.screen {
            Screen::Accounts => Screen::Results,
            Screen::Results | Screen::Login => Screen::Accounts,
        };
        if self.tokens.exists() {
            self.navigate(target);
        }
    }

    // ------------------------------------------------------------------------
    // Topbar
    // ------------------------------------------------------------------------

    /// Ask the backend to end the session. The local token is cleared when the
    /// call completes, whether it succeeded or not.
    pub fn logout(&mut self) {
        if self.logout.is_some() || !self.tokens.exists() {
            return;
        }
        let auth = self.auth.clone();
        self.logout = Some(Pending::spawn("logout", async move { auth.logout().await }));
        self.status = Some(StatusLine::info("Logging out..."));
    }

    fn finish_logout(&mut self, outcome: anyhow::Result<Result<(), ApiError>>) {
        match outcome {
            Ok(Ok(())) => tracing::info!("Logout acknowledged"),
            Ok(Err(e)) => tracing::warn!(status = ?e.status(), "Logout failed: {e}"),
            Err(e) => tracing::error!("{e}"),
        }
        self.tokens.clear();
        self.screen = Screen::Login;
        self.status = Some(StatusLine::info("Logged out"));
    }

    // ------------------------------------------------------------------------
    // Event loop
    // ------------------------------------------------------------------------

    /// Apply session signals and finished requests. Called once per frame.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.drain_session_signals();

        if let Some(outcome) = poll_slot(&mut self.logout) {
            self.finish_logout(outcome);
        }
        self.poll_login();
        self.poll_lookup();
        self.poll_results();

        // Session-signal side effects of the tasks just collected.
        self.drain_session_signals();

        if self.screen.requires_session() && !self.tokens.exists() {
            self.expire_session_screen();
        }
    }

    fn expire_session_screen(&mut self) {
        self.status = Some(StatusLine::error(SESSION_EXPIRED));
        self.screen = Screen::Login;
    }

    fn drain_session_signals(&mut self) {
        let mut cleared = false;
        while self.cleared_rx.try_recv().is_ok() {
            cleared = true;
        }
        if cleared {
            tracing::debug!("Session cleared; resetting session views");
            self.lookup.clear_history();
            self.lookup.reset_pending();
            self.results = ResultsView::default();
        }

        while let Ok(Navigation::Login) = self.navigation_rx.try_recv() {
            if self.screen != Screen::Login {
                self.expire_session_screen();
            }
        }
    }

    /// Detach the token store listener. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(id) = self.clear_listener.take() {
            self.tokens.remove_listener(id);
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("screen", &self.screen)
            .field("logged_in", &self.tokens.exists())
            .field("backend", &self.backend_label)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}
