use crate::domain::error::{AppError, AppResult};
use crate::domain::models::{
    AppEvent, BlockPlan, BluetoothCommand, ConnectionStatus, DashboardStats, LeaderboardEntry,
    LeaderboardSort, MessageSeverity, ScannedDevice, SessionDetails, SessionSummary,
    StatusMessage, User,
};
use crate::domain::progress::SharedSession;
use crate::domain::settings::SettingsService;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::bluetooth::SensorConfig;
use crate::infrastructure::logging::{self, LoggingGuard};
use crate::infrastructure::sensor_session::SensorSession;
use crate::presentation::tabs::account::AccountView;
use crate::presentation::tabs::login::LoginForm;
use crate::presentation::tabs::signup::SignUpForm;
use eframe::egui;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Login,
    SignUp,
    Dashboard,
    CreateSession,
    ActiveSession,
    History,
    Leaderboard,
    Account,
    Settings,
    Debug,
}

impl Tab {
    pub fn requires_login(&self) -> bool {
        !matches!(self, Tab::Login | Tab::SignUp | Tab::Settings | Tab::Debug)
    }
}

pub struct AccuAimApp {
    // Services
    pub(crate) settings: SettingsService,
    pub(crate) runtime: tokio::runtime::Runtime,
    pub(crate) api: ApiClient,
    pub(crate) event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    pub(crate) pending_requests: usize,

    // Account
    pub(crate) user: Option<User>,
    pub(crate) login_form: LoginForm,
    pub(crate) signup_form: SignUpForm,
    pub(crate) account_view: AccountView,

    // Sensor, present only while the active session tab is open
    pub(crate) sensor: Option<SensorSession>,
    pub(crate) connection_status: ConnectionStatus,
    pub(crate) scanned_devices: Vec<ScannedDevice>,
    pub(crate) impact_count: Option<i32>,

    // Sessions
    pub(crate) session: SharedSession,
    pub(crate) session_complete: bool,
    pub(crate) block_plans: Vec<BlockPlan>,
    pub(crate) sessions: Vec<SessionSummary>,
    pub(crate) selected_session: Option<SessionDetails>,

    // Stats
    pub(crate) dashboard: Option<DashboardStats>,
    pub(crate) leaderboard: Vec<LeaderboardEntry>,
    pub(crate) leaderboard_sort: LeaderboardSort,

    // UI State
    pub(crate) selected_tab: Tab,
    pub(crate) status_message: Option<StatusMessage>,
    pub(crate) debug_payload: String,
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) logging_guard: Option<LoggingGuard>,
}

impl AccuAimApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        let settings = SettingsService::new()?;
        let is_dark_mode = settings.get().dark_mode;
        crate::presentation::theme::configure_neubrutalism(&cc.egui_ctx, is_dark_mode);

        let logging_guard = logging::init_logger(&settings.get().log_settings)
            .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
            .ok();

        info!("Starting AccuAim");
        info!("Settings loaded from {}", settings.path().display());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("accuaim-io")
            .enable_all()
            .build()?;
        let api = ApiClient::new(
            &settings.get().api_base_url,
            settings.get().request_timeout(),
        )?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Self {
            settings,
            runtime,
            api,
            event_tx,
            event_rx,
            pending_requests: 0,
            user: None,
            login_form: LoginForm::default(),
            signup_form: SignUpForm::default(),
            account_view: AccountView::Main,
            sensor: None,
            connection_status: ConnectionStatus::Disconnected,
            scanned_devices: Vec::new(),
            impact_count: None,
            session: Arc::new(Mutex::new(None)),
            session_complete: false,
            block_plans: vec![BlockPlan::default()],
            sessions: Vec::new(),
            selected_session: None,
            dashboard: None,
            leaderboard: Vec::new(),
            leaderboard_sort: LeaderboardSort::default(),
            selected_tab: Tab::Login,
            status_message: None,
            debug_payload: String::new(),
            is_dark_mode,
            logging_guard,
        })
    }

    /// Run an API call on the runtime and deliver its result as an event.
    pub(crate) fn spawn_request<T, F>(&mut self, request: F, into_event: fn(AppResult<T>) -> AppEvent)
    where
        T: Send + 'static,
        F: Future<Output = AppResult<T>> + Send + 'static,
    {
        let tx = self.event_tx.clone();
        self.pending_requests += 1;
        self.runtime.spawn(async move {
            let _ = tx.send(into_event(request.await));
        });
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.pending_requests > 0
    }

    pub(crate) fn set_status(&mut self, message: impl Into<String>, severity: MessageSeverity) {
        self.status_message = Some(StatusMessage::new(message, severity));
    }

    pub(crate) fn show_error(&mut self, e: &AppError) {
        if e.is_user_facing() {
            self.set_status(e.to_string(), MessageSeverity::Error);
        } else {
            warn!("{}", e);
        }
    }

    pub(crate) fn send_bluetooth(&self, command: BluetoothCommand) {
        match &self.sensor {
            Some(sensor) => sensor.send(command),
            None => warn!("No sensor session, dropping {:?}", command),
        }
    }

    /// Rebuild the API client after the server settings changed
    pub(crate) fn apply_server_settings(&mut self) {
        let s = self.settings.get();
        match ApiClient::new(&s.api_base_url, s.request_timeout()) {
            Ok(api) => {
                info!("API base URL set to {}", api.base_url());
                self.api = api;
            }
            Err(e) => self.show_error(&e),
        }
    }

    pub(crate) fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub(crate) fn refresh_dashboard(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(async move { api.dashboard(user_id).await }, AppEvent::DashboardLoaded);
    }

    pub(crate) fn refresh_sessions(&mut self) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(
            async move { api.list_sessions(user_id).await },
            AppEvent::SessionsListed,
        );
    }

    pub(crate) fn refresh_leaderboard(&mut self) {
        let api = self.api.clone();
        let sort = self.leaderboard_sort;
        self.spawn_request(async move { api.leaderboard(sort).await }, AppEvent::LeaderboardLoaded);
    }

    pub(crate) fn open_session_details(&mut self, session_id: i64) {
        let Some(user_id) = self.user_id() else {
            return;
        };
        let api = self.api.clone();
        self.spawn_request(
            async move { api.fetch_session(user_id, session_id).await },
            AppEvent::SessionLoaded,
        );
    }

    pub(crate) fn log_out(&mut self) {
        info!("Logging out");
        self.user = None;
        self.dashboard = None;
        self.sessions.clear();
        self.selected_session = None;
        self.account_view = AccountView::Main;
        if let Ok(mut session) = self.session.lock() {
            *session = None;
        }
        self.select_tab(Tab::Login);
    }

    pub(crate) fn select_tab(&mut self, tab: Tab) {
        if self.selected_tab == tab {
            return;
        }
        self.selected_tab = tab;
        match tab {
            Tab::Dashboard => self.refresh_dashboard(),
            Tab::History => self.refresh_sessions(),
            Tab::Leaderboard => self.refresh_leaderboard(),
            _ => {}
        }
    }

    /// The sensor lives exactly as long as the active session tab is shown.
    fn sync_sensor_session(&mut self) {
        let wanted = self.selected_tab == Tab::ActiveSession;
        if wanted && self.sensor.is_none() {
            match SensorConfig::from_settings(self.settings.get()) {
                Ok(config) => {
                    self.sensor = Some(SensorSession::start(
                        self.runtime.handle(),
                        config,
                        self.api.clone(),
                        self.session.clone(),
                        self.event_tx.clone(),
                    ));
                }
                Err(e) => self.show_error(&e),
            }
        } else if !wanted {
            if let Some(sensor) = self.sensor.take() {
                self.runtime.spawn(sensor.close());
                self.connection_status = ConnectionStatus::Disconnected;
                self.scanned_devices.clear();
                self.impact_count = None;
            }
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ConnectionStatus(status) => {
                self.connection_status = status;
                match status {
                    ConnectionStatus::Scanning => self.scanned_devices.clear(),
                    ConnectionStatus::Connected => self.impact_count = Some(0),
                    _ => {}
                }
            }
            AppEvent::DeviceFound(device) => {
                if let Some(existing) = self.scanned_devices.iter_mut().find(|d| d.id == device.id) {
                    existing.signal_strength = device.signal_strength;
                } else {
                    self.scanned_devices.push(device);
                }
            }
            AppEvent::ImpactCount(count) => self.impact_count = Some(count),
            AppEvent::ShotRecorded {
                block_id,
                made_shots,
            } => {
                self.set_status(
                    format!("Shot recorded (block {}, {} made)", block_id, made_shots),
                    MessageSeverity::Success,
                );
            }
            AppEvent::SessionComplete { session_id } => {
                info!("Session {} complete", session_id);
                self.session_complete = true;
                self.set_status("Session complete!", MessageSeverity::Success);
            }
            AppEvent::LogMessage(msg) => self.status_message = Some(msg),
            reply => {
                self.pending_requests = self.pending_requests.saturating_sub(1);
                self.handle_reply(reply);
            }
        }
    }

    fn handle_reply(&mut self, reply: AppEvent) {
        match reply {
            AppEvent::LoggedIn(Ok(user)) => {
                self.login_form = LoginForm::default();
                self.set_status(format!("Welcome, {}", user.name), MessageSeverity::Success);
                self.user = Some(user);
                self.select_tab(Tab::Dashboard);
            }
            AppEvent::Registered(Ok(())) => {
                self.login_form.email = self.signup_form.email.clone();
                self.signup_form = SignUpForm::default();
                self.set_status("Account created, please log in", MessageSeverity::Success);
                self.select_tab(Tab::Login);
            }
            AppEvent::SessionStarted(Ok(active)) => {
                self.session_complete = active.progress.is_complete();
                if let Ok(mut session) = self.session.lock() {
                    *session = Some(active);
                }
                self.block_plans = vec![BlockPlan::default()];
                self.select_tab(Tab::ActiveSession);
            }
            AppEvent::SessionFinished(Ok(session_id)) => {
                if let Ok(mut session) = self.session.lock() {
                    if session.as_ref().map(|s| s.session_id()) == Some(session_id) {
                        *session = None;
                    }
                }
                self.session_complete = false;
                self.set_status("Session saved", MessageSeverity::Success);
                self.select_tab(Tab::History);
                self.open_session_details(session_id);
            }
            AppEvent::SessionLoaded(Ok(details)) => self.selected_session = Some(details),
            AppEvent::SessionsListed(Ok(sessions)) => self.sessions = sessions,
            AppEvent::DashboardLoaded(Ok(stats)) => self.dashboard = Some(stats),
            AppEvent::LeaderboardLoaded(Ok(rows)) => self.leaderboard = rows,
            AppEvent::ProfileUpdated(Ok(user)) => {
                self.user = Some(user);
                self.account_view = AccountView::Main;
                self.set_status("Profile updated", MessageSeverity::Success);
            }
            AppEvent::PasswordChanged(Ok(())) => {
                self.account_view = AccountView::Main;
                self.set_status("Password changed", MessageSeverity::Success);
            }
            AppEvent::AccountDeleted(Ok(())) => {
                self.log_out();
                self.set_status("Account deleted", MessageSeverity::Info);
            }
            AppEvent::LoggedIn(Err(e))
            | AppEvent::Registered(Err(e))
            | AppEvent::PasswordChanged(Err(e))
            | AppEvent::AccountDeleted(Err(e)) => self.show_error(&e),
            AppEvent::SessionStarted(Err(e)) => self.show_error(&e),
            AppEvent::SessionFinished(Err(e)) => self.show_error(&e),
            AppEvent::SessionLoaded(Err(e)) => self.show_error(&e),
            AppEvent::SessionsListed(Err(e)) => self.show_error(&e),
            AppEvent::DashboardLoaded(Err(e)) => self.show_error(&e),
            AppEvent::LeaderboardLoaded(Err(e)) => self.show_error(&e),
            AppEvent::ProfileUpdated(Err(e)) => self.show_error(&e),
            other => error!("Unexpected event routed as reply: {:?}", other),
        }
    }

    fn tab_button(&mut self, ui: &mut egui::Ui, tab: Tab, label: &str) {
        if ui.selectable_label(self.selected_tab == tab, label).clicked() {
            self.select_tab(tab);
        }
    }
}

impl eframe::App for AccuAimApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }

        if self.selected_tab.requires_login() && self.user.is_none() {
            self.selected_tab = Tab::Login;
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                if self.user.is_some() {
                    self.tab_button(ui, Tab::Dashboard, "Dashboard");
                    self.tab_button(ui, Tab::CreateSession, "New Session");
                    self.tab_button(ui, Tab::ActiveSession, "Active Session");
                    self.tab_button(ui, Tab::History, "History");
                    self.tab_button(ui, Tab::Leaderboard, "Leaderboard");
                    self.tab_button(ui, Tab::Account, "Account");
                } else {
                    self.tab_button(ui, Tab::Login, "Log In");
                    self.tab_button(ui, Tab::SignUp, "Sign Up");
                }
                self.tab_button(ui, Tab::Settings, "Settings");
                self.tab_button(ui, Tab::Debug, "Debug");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        self.settings.get_mut().dark_mode = self.is_dark_mode;
                        crate::presentation::theme::configure_neubrutalism(ctx, self.is_dark_mode);
                    }
                    if self.is_busy() {
                        ui.spinner();
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(800.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.selected_tab {
                        Tab::Login => tabs::login::render(self, ui),
                        Tab::SignUp => tabs::signup::render(self, ui),
                        Tab::Dashboard => tabs::dashboard::render(self, ui),
                        Tab::CreateSession => tabs::create_session::render(self, ui),
                        Tab::ActiveSession => tabs::active_session::render(self, ui),
                        Tab::History => tabs::history::render(self, ui),
                        Tab::Leaderboard => tabs::leaderboard::render(self, ui),
                        Tab::Account => tabs::account::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                        Tab::Debug => tabs::debug::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });

        self.sync_sensor_session();

        // Background tasks report through the channel, poll it regularly
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

impl Drop for AccuAimApp {
    fn drop(&mut self) {
        if let Err(e) = self.settings.save() {
            error!("Failed to save settings: {}", e);
        }
        if let Some(sensor) = self.sensor.take() {
            self.runtime.block_on(sensor.close());
        }
        if let Some(guard) = &self.logging_guard {
            info!(log_dir = ?guard.log_dir, "AccuAim shutting down");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_tabs() {
        assert!(!Tab::Login.requires_login());
        assert!(!Tab::Settings.requires_login());
        assert!(Tab::ActiveSession.requires_login());
        assert!(Tab::Account.requires_login());
    }
}
