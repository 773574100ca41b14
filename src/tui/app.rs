//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation behind the role guard
//! - Input event handling
//! - Service integration
//! - Non-blocking backend calls via background tasks

use std::io;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use zeroize::Zeroize;

use crate::adapters::export::save_export;
use crate::adapters::{HttpBackend, InMemorySessionStore, PdfReportWriter};
use crate::application::history::summarize;
use crate::application::{
    generate_report, validate_registration, AnalyticsError, AnalyticsService, AnalyticsView,
    AuthError, AuthService, BackgroundTask, HistoryService, PredictionWorkflow, ReportSubject,
    RouteDecision, TaskPoll, WorkflowEvent,
};
use crate::config::ClientConfig;
use crate::domain::{DiseaseType, Identity, PatientDetails, PredictionRecord, Role};
use crate::ports::{ApiError, ApiEvent, SessionEvent, SessionStore, SharedBackend};

use super::ui::{
    analytics::{render_analytics, AnalyticsState},
    dashboard::{render_dashboard, DashboardState},
    history::{render_history, HistoryState},
    login::{render_login, LoginFormState},
    predict::{render_predict, PredictFormState},
    register::{render_register, RegisterFormState},
    render_disclaimer, Notice,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    Predict,
    History,
    Analytics,
}

impl Screen {
    /// Role a screen is restricted to, if any.
    fn required_role(self) -> Option<Role> {
        match self {
            Self::Analytics => Some(Role::Admin),
            _ => None,
        }
    }

    fn is_auth(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

type Records = Result<Vec<PredictionRecord>, ApiError>;

/// Backend calls in flight. Dropping a task discards its late response.
#[derive(Default)]
struct Pending {
    session_check: Option<BackgroundTask<Option<Identity>>>,
    login: Option<BackgroundTask<Result<Identity, AuthError>>>,
    register: Option<BackgroundTask<Result<Identity, AuthError>>>,
    logout: Option<BackgroundTask<()>>,
    summary: Option<BackgroundTask<Records>>,
    lookup: Option<BackgroundTask<(String, Result<PatientDetails, ApiError>, Records)>>,
    history: Option<BackgroundTask<Records>>,
    analytics: Option<BackgroundTask<Result<AnalyticsView, AnalyticsError>>>,
}

/// Main application state
pub struct App {
    config: ClientConfig,
    backend: SharedBackend,
    auth: Arc<AuthService>,
    history: Arc<HistoryService>,
    analytics: Arc<AnalyticsService>,
    report_writer: PdfReportWriter,

    /// 401 notifications from the transport
    api_events: Receiver<ApiEvent>,
    session_events: Receiver<SessionEvent>,

    screen: Screen,
    should_quit: bool,
    identity: Option<Identity>,

    login_state: LoginFormState,
    register_state: Option<RegisterFormState>,
    dashboard_state: DashboardState,
    predict_state: Option<PredictFormState>,
    history_state: HistoryState,
    analytics_state: AnalyticsState,

    pending: Pending,
}

impl App {
    /// Create the application with the HTTP backend and an in-memory session.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built from `config`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let backend = HttpBackend::new(&config)?.with_event_handler(Arc::new(move |event: ApiEvent| {
            if tx.send(event).is_err() {
                tracing::debug!("Dropping API event: application is gone");
            }
        }));

        Ok(Self::with_dependencies(
            config,
            Arc::new(backend),
            Arc::new(InMemorySessionStore::new()),
            rx,
        ))
    }

    /// Create application with injected dependencies (Composition Root pattern).
    ///
    /// `api_events` must be fed by the same transport that `backend` uses.
    #[must_use]
    pub fn with_dependencies(
        config: ClientConfig,
        backend: SharedBackend,
        session: Arc<dyn SessionStore>,
        api_events: Receiver<ApiEvent>,
    ) -> Self {
        let session_events = session.subscribe();
        Self {
            auth: Arc::new(AuthService::new(backend.clone(), session)),
            history: Arc::new(HistoryService::new(backend.clone())),
            analytics: Arc::new(AnalyticsService::new(backend.clone())),
            report_writer: PdfReportWriter::new(),
            config,
            backend,
            api_events,
            session_events,
            screen: Screen::Login,
            should_quit: false,
            identity: None,
            login_state: LoginFormState::default(),
            register_state: None,
            dashboard_state: DashboardState::default(),
            predict_state: None,
            history_state: HistoryState::default(),
            analytics_state: AnalyticsState::default(),
            pending: Pending::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        // Resume a session if the backend still recognises us.
        let auth = self.auth.clone();
        self.pending.session_check = Some(BackgroundTask::spawn("session check", move || auth.refresh()));

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

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

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.tick();

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match (self.screen, &self.identity) {
                    (Screen::Login, _) => {
                        render_login(f, content_area, &self.login_state, &self.config.api_url);
                    }
                    (Screen::Register, _) => {
                        if let Some(state) = &self.register_state {
                            render_register(f, content_area, state);
                        }
                    }
                    (Screen::Dashboard, Some(identity)) => {
                        render_dashboard(f, content_area, &self.dashboard_state, identity);
                    }
                    (Screen::Predict, _) => {
                        if let Some(state) = &self.predict_state {
                            render_predict(f, content_area, state);
                        }
                    }
                    (Screen::History, _) => render_history(f, content_area, &self.history_state),
                    (Screen::Analytics, _) => {
                        render_analytics(f, content_area, &self.analytics_state);
                    }
                    (Screen::Dashboard, None) => {}
                }

                render_disclaimer(f, chunks[1]);
            })?;

            // Handle input (short poll to stay responsive)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Apply everything that arrived since the last frame.
    fn tick(&mut self) {
        self.drain_api_events();
        self.drain_session_events();
        self.poll_auth_tasks();
        self.poll_data_tasks();
        self.poll_workflow();
    }

    fn drain_api_events(&mut self) {
        while let Ok(event) = self.api_events.try_recv() {
            match event {
                ApiEvent::Unauthorized => {
                    if self.auth.handle_unauthorized(self.screen.is_auth()) == RouteDecision::Login {
                        self.go_to_login(Some(Notice::error("Session expired. Please sign in again.")));
                    }
                }
            }
        }
    }

    fn drain_session_events(&mut self) {
        while let Ok(event) = self.session_events.try_recv() {
            match event {
                SessionEvent::SignedIn(identity) => self.identity = Some(identity),
                SessionEvent::SignedOut => {
                    self.identity = None;
                    if !self.screen.is_auth() {
                        self.go_to_login(None);
                    }
                }
            }
        }
    }

    fn poll_auth_tasks(&mut self) {
        if let Some(identity) = take_done(&mut self.pending.session_check) {
            if let Some(identity) = identity.flatten() {
                if self.screen.is_auth() {
                    tracing::info!("Resumed existing session");
                    self.enter_home(identity);
                }
            }
        }

        if let Some(outcome) = take_done(&mut self.pending.login) {
            self.login_state.submitting = false;
            match outcome {
                Some(Ok(identity)) => {
                    self.login_state = LoginFormState::default();
                    self.enter_home(identity);
                }
                Some(Err(e)) => self.login_state.notice = Some(Notice::error(e.to_string())),
                None => self.login_state.notice = Some(Notice::error("Login failed.")),
            }
        }

        if let Some(outcome) = take_done(&mut self.pending.register) {
            if let Some(state) = &mut self.register_state {
                state.submitting = false;
                match outcome {
                    Some(Ok(_)) => {
                        let email = state.to_form().email;
                        self.register_state = None;
                        self.login_state = LoginFormState::default();
                        for c in email.chars() {
                            self.login_state.email.push(c);
                        }
                        self.login_state.focus = super::ui::login::LoginField::Password;
                        self.go_to_login(Some(Notice::success("Account created. Please sign in.")));
                    }
                    Some(Err(AuthError::InvalidForm(errors))) => {
                        state.field_errors = errors;
                        state.notice = Some(Notice::error("Please fix the errors below."));
                    }
                    Some(Err(e)) => state.notice = Some(Notice::error(e.to_string())),
                    None => state.notice = Some(Notice::error("Registration failed.")),
                }
            }
        }

        if take_done(&mut self.pending.logout).is_some() {
            tracing::debug!("Logout request finished");
        }
    }

    fn poll_data_tasks(&mut self) {
        if let Some(outcome) = take_done(&mut self.pending.summary) {
            self.dashboard_state.loading_summary = false;
            match outcome {
                Some(Ok(records)) => self.dashboard_state.summary = Some(summarize(&records)),
                Some(Err(e)) => {
                    tracing::warn!("Failed to load dashboard summary: {}", e);
                    self.dashboard_state.notice = Some(Notice::error("Failed to load your predictions."));
                }
                None => {}
            }
        }

        if let Some(outcome) = take_done(&mut self.pending.lookup) {
            let state = &mut self.dashboard_state;
            state.looking_up = false;
            state.loading_summary = false;
            match outcome {
                Some((code, Ok(patient), records)) => {
                    let summary = records.ok().map(|r| summarize(&r));
                    if state.apply_lookup(code, patient, summary) {
                        state.notice = None;
                    } else {
                        tracing::debug!("Discarding lookup for an edited patient code");
                    }
                }
                Some((_, Err(e), _)) => {
                    let message = match e.status() {
                        Some(404) => "No patient found with that ID".to_string(),
                        _ => e.detail_or("Failed to load patient"),
                    };
                    state.patient = None;
                    state.patient_lookup_code = None;
                    state.summary = None;
                    state.notice = Some(Notice::error(message));
                }
                None => state.notice = Some(Notice::error("Failed to load patient")),
            }
        }

        if let Some(outcome) = take_done(&mut self.pending.history) {
            let state = &mut self.history_state;
            state.loading = false;
            match outcome {
                Some(Ok(records)) => {
                    state.records = records;
                    state.error = None;
                }
                Some(Err(e)) => state.error = Some(e.detail_or("Failed to load history.")),
                None => state.error = Some("Failed to load history.".to_string()),
            }
        }

        if let Some(outcome) = take_done(&mut self.pending.analytics) {
            let state = &mut self.analytics_state;
            state.loading = false;
            match outcome {
                Some(Ok(view)) => {
                    state.view = Some(view);
                    state.error = None;
                }
                Some(Err(e)) => state.error = Some(e.to_string()),
                None => state.error = Some(AnalyticsError::Unavailable.to_string()),
            }
        }
    }

    fn poll_workflow(&mut self) {
        let Some(state) = &mut self.predict_state else {
            return;
        };

        for event in state.workflow.poll() {
            match event {
                WorkflowEvent::PatientVerified(patient) => {
                    state.notice = Some(Notice::success(format!("Patient verified: {}", patient.full_name)));
                }
                WorkflowEvent::PredictionSucceeded(result) => {
                    state.notice = Some(Notice::success(format!(
                        "Prediction complete: {} ({})",
                        result.risk.label,
                        result.percentage()
                    )));
                }
                WorkflowEvent::VerificationFailed(_) | WorkflowEvent::PredictionFailed(_) => {
                    state.notice = None;
                }
            }
        }
    }

    /// Switch screens, applying the role guard.
    fn navigate(&mut self, target: Screen) {
        match self.auth.guard(target.required_role()) {
            RouteDecision::Allow => self.enter(target),
            RouteDecision::Login => self.go_to_login(None),
            RouteDecision::Redirect(role) => {
                tracing::info!("Redirecting {} away from {:?}", role, target);
                self.enter(Screen::Dashboard);
                self.dashboard_state.notice = Some(Notice::error("That screen is not available for your role."));
            }
        }
    }

    fn enter(&mut self, target: Screen) {
        match target {
            Screen::Dashboard => self.refresh_dashboard(),
            Screen::History => {
                let patient_id = match self.identity.as_ref().map(|i| i.role) {
                    Some(Role::Provider) => match self.dashboard_state.selected_patient_code() {
                        Some(code) => Some(code),
                        None => {
                            self.dashboard_state.notice = Some(Notice::info("Look up a patient first ([P])."));
                            return;
                        }
                    },
                    _ => None,
                };
                self.history_state = HistoryState::for_patient(patient_id);
                self.load_history();
            }
            Screen::Analytics => self.load_analytics(),
            Screen::Login | Screen::Register | Screen::Predict => {}
        }
        self.screen = target;
    }

    fn enter_home(&mut self, identity: Identity) {
        tracing::info!("Signed in as {}", identity.role);
        self.identity = Some(identity);
        self.dashboard_state = DashboardState::default();
        self.navigate(Screen::Dashboard);
    }

    fn go_to_login(&mut self, notice: Option<Notice>) {
        self.predict_state = None;
        self.register_state = None;
        self.dashboard_state = DashboardState::default();
        self.history_state = HistoryState::default();
        self.analytics_state = AnalyticsState::default();
        self.pending.summary = None;
        self.pending.lookup = None;
        self.pending.history = None;
        self.pending.analytics = None;
        if notice.is_some() {
            self.login_state.notice = notice;
        }
        self.screen = Screen::Login;
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if modifiers.contains(KeyModifiers::CONTROL) && matches!(key, KeyCode::Char('q') | KeyCode::Char('c')) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Register => self.handle_register_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::Predict => self.handle_predict_key(key, modifiers),
            Screen::History => self.handle_history_key(key),
            Screen::Analytics => self.handle_analytics_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyCode) {
        let state = &mut self.login_state;
        match key {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => state.toggle_focus(),
            KeyCode::Char(c) => {
                state.focused_mut().push(c);
                state.notice = None;
            }
            KeyCode::Backspace => state.focused_mut().pop(),
            KeyCode::Enter => self.submit_login(),
            KeyCode::F(2) => self.open_register(Role::Patient),
            KeyCode::F(3) => self.open_register(Role::Provider),
            KeyCode::Esc => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        if self.pending.login.is_some() {
            return;
        }

        let state = &mut self.login_state;
        let email = state.email.value.trim().to_string();
        let mut password = state.password.value.clone();
        state.clear_sensitive();

        if email.is_empty() || password.is_empty() {
            password.zeroize();
            state.notice = Some(Notice::error(AuthError::MissingCredentials.to_string()));
            return;
        }

        state.submitting = true;
        state.notice = None;
        let auth = self.auth.clone();
        // The logout response may reset cookies; let it land before the new session starts.
        let logout = self.pending.logout.take();
        self.pending.login = Some(BackgroundTask::spawn("login", move || {
            if let Some(task) = logout {
                task.wait();
            }
            let outcome = auth.login(&email, &password);
            password.zeroize();
            outcome
        }));
    }

    fn open_register(&mut self, role: Role) {
        self.register_state = Some(RegisterFormState::new(role));
        self.screen = Screen::Register;
    }

    fn handle_register_key(&mut self, key: KeyCode) {
        if self.register_state.is_none() {
            self.screen = Screen::Login;
            return;
        }
        let Some(state) = &mut self.register_state else {
            return;
        };

        match key {
            KeyCode::Esc => {
                self.pending.register = None;
                self.register_state = None;
                self.screen = Screen::Login;
            }
            KeyCode::Up | KeyCode::BackTab => state.prev_field(),
            KeyCode::Down | KeyCode::Tab => state.next_field(),
            KeyCode::Char(c) => state.focused_mut().push(c),
            KeyCode::Backspace => state.focused_mut().pop(),
            KeyCode::Enter => self.submit_registration(),
            _ => {}
        }
    }

    fn submit_registration(&mut self) {
        let Some(state) = &mut self.register_state else {
            return;
        };
        if self.pending.register.is_some() {
            return;
        }

        let form = state.to_form();
        let role = state.role;
        state.field_errors = validate_registration(&form, role);
        if !state.field_errors.is_empty() {
            state.notice = Some(Notice::error("Please fix the errors below."));
            return;
        }

        state.submitting = true;
        state.notice = None;
        let auth = self.auth.clone();
        self.pending.register = Some(BackgroundTask::spawn("registration", move || {
            let mut form = form;
            let outcome = auth.register(&form, role);
            form.password.zeroize();
            form.confirm_password.zeroize();
            outcome
        }));
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        if self.dashboard_state.editing_code {
            let state = &mut self.dashboard_state;
            match key {
                KeyCode::Esc => state.editing_code = false,
                KeyCode::Char(c) => state.push_code(c),
                KeyCode::Backspace => state.pop_code(),
                KeyCode::Enter => self.lookup_patient(),
                _ => {}
            }
            return;
        }

        let role = self.identity.as_ref().map(|i| i.role);
        match key {
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                if let Some(disease) = DiseaseType::ALL.get(index).copied() {
                    self.open_prediction(disease);
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => self.navigate(Screen::History),
            KeyCode::Char('a') | KeyCode::Char('A') => self.navigate(Screen::Analytics),
            KeyCode::Char('p') | KeyCode::Char('P') if role == Some(Role::Provider) => {
                self.dashboard_state.editing_code = true;
                self.dashboard_state.notice = None;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_dashboard(),
            KeyCode::Char('l') | KeyCode::Char('L') => self.logout(),
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn refresh_dashboard(&mut self) {
        match self.identity.as_ref().map(|i| i.role) {
            Some(Role::Patient) => {
                self.dashboard_state.loading_summary = true;
                let history = self.history.clone();
                self.pending.summary = Some(BackgroundTask::spawn("dashboard summary", move || history.load(None)));
            }
            Some(Role::Provider) if self.dashboard_state.patient.is_some() => self.lookup_patient(),
            _ => {}
        }
    }

    fn lookup_patient(&mut self) {
        let state = &mut self.dashboard_state;
        let code = state.patient_code.value.trim().to_string();
        if code.is_empty() {
            state.notice = Some(Notice::error("Please enter a patient ID"));
            return;
        }

        state.editing_code = false;
        state.looking_up = true;
        state.loading_summary = true;
        state.notice = None;

        let backend = self.backend.clone();
        let history = self.history.clone();
        self.pending.lookup = Some(BackgroundTask::spawn("patient lookup", move || {
            let details = backend.patient_details(&code);
            let records = match &details {
                Ok(_) => history.load(Some(&code)),
                Err(_) => Ok(Vec::new()),
            };
            (code, details, records)
        }));
    }

    fn logout(&mut self) {
        self.auth.sign_out();
        let auth = self.auth.clone();
        self.pending.logout = Some(BackgroundTask::spawn("logout", move || auth.end_remote_session()));
        self.identity = None;
        self.go_to_login(Some(Notice::info("Signed out.")));
    }

    fn open_prediction(&mut self, disease: DiseaseType) {
        let Some(role) = self.identity.as_ref().map(|i| i.role) else {
            self.go_to_login(None);
            return;
        };

        match PredictionWorkflow::open(self.backend.clone(), disease.id(), role) {
            Ok(workflow) => {
                let mut state = PredictFormState::new(workflow);
                if let Some(code) = self.dashboard_state.selected_patient_code() {
                    if state.workflow.requires_patient() {
                        state.preselect_patient(&code);
                    }
                }
                self.predict_state = Some(state);
                self.navigate(Screen::Predict);
            }
            Err(e) => self.dashboard_state.notice = Some(Notice::error(e.to_string())),
        }
    }

    fn handle_predict_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('r') && modifiers.contains(KeyModifiers::CONTROL) {
            self.save_report();
            return;
        }

        if self.predict_state.is_none() {
            self.navigate(Screen::Dashboard);
            return;
        }
        let Some(state) = &mut self.predict_state else {
            return;
        };

        match key {
            KeyCode::Esc => {
                // Dropping the workflow discards any response still in flight.
                self.predict_state = None;
                self.navigate(Screen::Dashboard);
            }
            KeyCode::Up | KeyCode::BackTab => state.prev_field(),
            KeyCode::Down | KeyCode::Tab => state.next_field(),
            KeyCode::Char(c) => state.input_char(c),
            KeyCode::Backspace => state.delete_char(),
            KeyCode::Enter => state.confirm(),
            _ => {}
        }
    }

    fn save_report(&mut self) {
        let Some(state) = &mut self.predict_state else {
            return;
        };
        let Some(result) = state.workflow.result() else {
            state.notice = Some(Notice::error("Run a prediction first."));
            return;
        };

        let subject = match (state.workflow.patient(), &self.identity) {
            (Some(patient), _) => ReportSubject::new(patient.full_name.clone(), Some(patient.id.clone())),
            (None, Some(identity)) => ReportSubject::new(identity.display_name(), Some(identity.id.to_string())),
            (None, None) => ReportSubject::new("Patient", None),
        };

        let outcome = generate_report(
            &self.report_writer,
            result,
            &subject,
            state.workflow.disease(),
            Local::now(),
        )
        .and_then(|(filename, bytes)| save_export(&self.config.report_dir, &filename, &bytes));

        state.notice = Some(match outcome {
            Ok(path) => Notice::success(format!("Report saved to {}", path.display())),
            Err(e) => {
                tracing::warn!("Failed to save report: {}", e);
                Notice::error(format!("Failed to save report: {e}"))
            }
        });
    }

    fn handle_history_key(&mut self, key: KeyCode) {
        let state = &mut self.history_state;
        match key {
            KeyCode::Esc => {
                self.pending.history = None;
                self.navigate(Screen::Dashboard);
            }
            KeyCode::Right | KeyCode::PageDown => state.next_page(),
            KeyCode::Left | KeyCode::PageUp => state.prev_page(),
            KeyCode::Char('f') | KeyCode::Char('F') => state.cycle_filter(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.export_history(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.load_history(),
            _ => {}
        }
    }

    fn load_history(&mut self) {
        self.history_state.loading = true;
        self.history_state.notice = None;
        let history = self.history.clone();
        let patient_id = self.history_state.patient_id.clone();
        self.pending.history = Some(BackgroundTask::spawn("history", move || {
            history.load(patient_id.as_deref())
        }));
    }

    fn export_history(&mut self) {
        let state = &mut self.history_state;
        let rows = state.filtered();
        if rows.is_empty() {
            state.notice = Some(Notice::info("Nothing to export."));
            return;
        }

        let own_id = self.identity.as_ref().map(|i| i.id.to_string());
        let patient_id = state.patient_id.clone().or(own_id);
        state.notice = Some(
            match self
                .history
                .export_csv(&rows, patient_id.as_deref(), &self.config.report_dir)
            {
                Ok(path) => Notice::success(format!("Exported {} rows to {}", rows.len(), path.display())),
                Err(e) => {
                    tracing::warn!("History export failed: {}", e);
                    Notice::error(format!("Export failed: {e}"))
                }
            },
        );
    }

    fn handle_analytics_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.pending.analytics = None;
                self.navigate(Screen::Dashboard);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.load_analytics(),
            _ => {}
        }
    }

    fn load_analytics(&mut self) {
        self.analytics_state.loading = true;
        self.analytics_state.error = None;
        let analytics = self.analytics.clone();
        self.pending.analytics = Some(BackgroundTask::spawn("analytics", move || analytics.load()));
    }
}

/// Take a finished task's value, leaving pending ones in place.
/// `Some(None)` means the worker died without reporting.
fn take_done<T: Send + 'static>(slot: &mut Option<BackgroundTask<T>>) -> Option<Option<T>> {
    let outcome = match slot.as_ref()?.try_recv() {
        TaskPoll::Pending => return None,
        TaskPoll::Done(value) => Some(value),
        TaskPoll::Lost => None,
    };
    *slot = None;
    Some(outcome)
}
