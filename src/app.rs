//! Application state management.
//!
//! This module contains the `App` struct that owns the session controller,
//! the identity service client, the screen router, and the form state for
//! the login and registration screens.
//!
//! Network calls run on spawned tasks and report back through an MPSC
//! channel of `AuthEvent` values. The session store write and the in-memory
//! snapshot update both happen on the event loop when the event is
//! processed, so no render ever observes a half-applied transition.

use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{SessionController, SessionStore};
use crate::config::Config;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the auth event channel.
/// Only one auth call is ever in flight, so a small buffer suffices.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for username input.
pub const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for email input.
pub const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Namespace prefix isolating this app's keys in the shared store.
pub const STORE_NAMESPACE: &str = "authgate";

// ============================================================================
// Routes and UI state
// ============================================================================

/// Client-visible screens. `Dashboard` is gated: navigating there while
/// anonymous redirects to `Login`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
}

impl Route {
    pub fn title(&self) -> &'static str {
        match self {
            Route::Landing => "Welcome",
            Route::Login => "Log In",
            Route::Register => "Register",
            Route::Dashboard => "Dashboard",
        }
    }

    fn requires_auth(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Username,
    Email,
    Password,
    Button,
}

// ============================================================================
// Background auth events
// ============================================================================

/// Results from spawned identity service calls, sent back to the main loop.
#[derive(Debug)]
enum AuthEvent {
    /// Credentials accepted; carries the fresh token pair
    LoggedIn {
        username: String,
        access: String,
        refresh: String,
    },
    /// Account created; the 201 response carries a token pair, so this
    /// flows straight into the login transition
    Registered {
        username: String,
        access: String,
        refresh: String,
    },
    /// Refresh endpoint returned a new access token
    Refreshed { access: String },
    /// The call failed; carries a user-facing message
    AuthFailed(String),
}

// ============================================================================
// Main application struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub controller: SessionController,
    pub api: ApiClient,

    pub state: AppState,
    pub route: Route,
    /// True while an identity service call is in flight
    pub busy: bool,
    /// Transient status bar message
    pub notice: Option<String>,
    /// Error line shown on the active form
    pub form_error: Option<String>,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,

    // Registration form state
    pub register_username: String,
    pub register_email: String,
    pub register_password: String,
    pub register_focus: RegisterFocus,

    // Background task channel
    auth_rx: mpsc::Receiver<AuthEvent>,
    auth_tx: mpsc::Sender<AuthEvent>,
}

impl App {
    /// Create the application and hydrate the session from the store.
    /// The initial screen is the dashboard when a prior session survives,
    /// the landing screen otherwise.
    pub fn new(config: Config, store_path: PathBuf) -> Result<Self> {
        debug!(?store_path, "App starting");

        let store = SessionStore::new(store_path, STORE_NAMESPACE);
        let mut controller = SessionController::new(store);
        controller.check_status()?;
        debug!(authenticated = controller.is_authenticated(), "Session hydrated");

        let api = ApiClient::new(&config.base_url)
            .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;

        let (auth_tx, auth_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = std::env::var("AUTHGATE_USERNAME")
            .ok()
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();

        let route = if controller.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Landing
        };

        Ok(Self {
            config,
            controller,
            api,

            state: AppState::Normal,
            route,
            busy: false,
            notice: None,
            form_error: None,

            login_username,
            login_password: String::new(),
            login_focus: LoginFocus::Username,

            register_username: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            register_focus: RegisterFocus::Username,

            auth_rx,
            auth_tx,
        })
    }

    pub fn quit(&mut self) {
        self.state = AppState::Quitting;
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Switch screens. Gated routes redirect to the login screen when the
    /// session is anonymous.
    pub fn navigate(&mut self, route: Route) {
        if route.requires_auth() && !self.controller.is_authenticated() {
            debug!(?route, "Redirecting anonymous navigation to login");
            self.notice = Some("Please log in to continue".to_string());
            self.enter_login();
            return;
        }

        self.form_error = None;
        if route == Route::Login {
            self.enter_login();
        } else {
            self.route = route;
        }
    }

    fn enter_login(&mut self) {
        self.route = Route::Login;
        self.form_error = None;
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Submit the login form. The network call runs on a spawned task; the
    /// session transition is applied when the resulting event is processed.
    pub fn submit_login(&mut self) {
        if self.busy {
            return;
        }
        let username = self.login_username.trim().to_string();
        let password = self.login_password.clone();

        if username.is_empty() || password.is_empty() {
            self.form_error = Some("Username and password required".to_string());
            return;
        }

        self.form_error = None;
        self.busy = true;

        let api = self.api.clone();
        let tx = self.auth_tx.clone();
        tokio::spawn(async move {
            let event = match api.login(&username, &password).await {
                Ok(pair) => AuthEvent::LoggedIn {
                    username,
                    access: pair.access,
                    refresh: pair.refresh,
                },
                Err(e) => {
                    error!(error = %e, "Login failed");
                    AuthEvent::AuthFailed(login_error_message(&e))
                }
            };
            Self::send_event(&tx, event).await;
        });
    }

    /// Submit the registration form. On success the 201 response's token
    /// pair feeds the same login transition; on failure no state changes.
    pub fn submit_register(&mut self) {
        if self.busy {
            return;
        }
        let username = self.register_username.trim().to_string();
        let email = self.register_email.trim().to_string();
        let password = self.register_password.clone();

        if username.is_empty() || email.is_empty() || password.is_empty() {
            self.form_error = Some("Username, email, and password required".to_string());
            return;
        }

        self.form_error = None;
        self.busy = true;

        let api = self.api.clone();
        let tx = self.auth_tx.clone();
        tokio::spawn(async move {
            let event = match api.register(&username, &email, &password).await {
                Ok(pair) => AuthEvent::Registered {
                    username,
                    access: pair.access,
                    refresh: pair.refresh,
                },
                Err(e) => {
                    error!(error = %e, "Registration failed");
                    AuthEvent::AuthFailed(register_error_message(&e))
                }
            };
            Self::send_event(&tx, event).await;
        });
    }

    /// Exchange the stored refresh token for a new access token. This is a
    /// user-triggered action; nothing refreshes automatically on expiry.
    pub fn submit_refresh(&mut self) {
        if self.busy {
            return;
        }
        let refresh_token = match self.controller.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.notice = Some("No refresh token stored".to_string());
                return;
            }
            Err(e) => {
                error!(error = %e, "Failed to read refresh token");
                self.notice = Some(format!("Storage error: {}", e));
                return;
            }
        };

        self.busy = true;

        let api = self.api.clone();
        let tx = self.auth_tx.clone();
        tokio::spawn(async move {
            let event = match api.refresh(&refresh_token).await {
                Ok(access) => AuthEvent::Refreshed { access },
                Err(e) => {
                    error!(error = %e, "Token refresh failed");
                    AuthEvent::AuthFailed(refresh_error_message(&e))
                }
            };
            Self::send_event(&tx, event).await;
        });
    }

    /// Clear the session and return to the landing screen. Safe to call
    /// while already anonymous.
    pub fn logout(&mut self) -> Result<()> {
        self.controller.logout()?;
        self.notice = Some("Logged out".to_string());
        self.route = Route::Landing;
        Ok(())
    }

    // =========================================================================
    // Background event processing
    // =========================================================================

    async fn send_event(tx: &mpsc::Sender<AuthEvent>, event: AuthEvent) {
        // A closed channel means the app was torn down while the call was
        // in flight; the stale transition is dropped rather than applied.
        if let Err(e) = tx.send(event).await {
            warn!(error = %e, "Auth event discarded - receiver gone");
        }
    }

    /// Drain and apply any completed auth events.
    pub fn check_background_tasks(&mut self) {
        while let Ok(event) = self.auth_rx.try_recv() {
            self.process_auth_event(event);
        }
    }

    fn process_auth_event(&mut self, event: AuthEvent) {
        self.busy = false;
        match event {
            AuthEvent::LoggedIn {
                username,
                access,
                refresh,
            } => self.apply_session(&access, &refresh, &username, "Logged in as"),
            AuthEvent::Registered {
                username,
                access,
                refresh,
            } => self.apply_session(&access, &refresh, &username, "Welcome,"),
            AuthEvent::Refreshed { access } => {
                // The session may have been cleared while the call was in
                // flight; do not resurrect it from a stale response.
                let current = match self.controller.state() {
                    crate::auth::SessionState::Authenticated {
                        username,
                        refresh_token: Some(refresh_token),
                        ..
                    } => Some((username.clone(), refresh_token.clone())),
                    _ => None,
                };
                match current {
                    Some((username, refresh_token)) => {
                        match self.controller.login(&access, &refresh_token, &username) {
                            Ok(()) => {
                                info!("Access token refreshed");
                                self.notice = Some("Access token refreshed".to_string());
                            }
                            Err(e) => {
                                error!(error = %e, "Failed to store refreshed token");
                                self.notice = Some(format!("Storage error: {}", e));
                            }
                        }
                    }
                    None => {
                        debug!("Dropping refresh result for a cleared session");
                    }
                }
            }
            AuthEvent::AuthFailed(message) => {
                if matches!(self.route, Route::Login | Route::Register) {
                    self.form_error = Some(message);
                } else {
                    self.notice = Some(message);
                }
            }
        }
    }

    /// Apply a fresh token pair as the one and only session, then land on
    /// the dashboard. A storage failure keeps the prior state and surfaces
    /// on the form.
    fn apply_session(&mut self, access: &str, refresh: &str, username: &str, greeting: &str) {
        if let Err(e) = self.controller.login(access, refresh, username) {
            error!(error = %e, "Failed to persist session");
            self.form_error = Some(format!("Could not save session: {}", e));
            return;
        }

        self.config.last_username = Some(username.to_string());
        self.login_password.clear();
        self.register_password.clear();
        self.form_error = None;
        self.notice = Some(format!("{} {}", greeting, username));
        self.route = Route::Dashboard;
    }
}

// ============================================================================
// User-facing error messages
// ============================================================================

fn connection_message(e: &ApiError) -> Option<String> {
    match e {
        ApiError::NetworkError(inner) if inner.is_timeout() => {
            Some("Connection timed out. Please try again.".to_string())
        }
        ApiError::NetworkError(_) => {
            Some("Unable to connect to server. Check that it is running.".to_string())
        }
        _ => None,
    }
}

fn login_error_message(e: &ApiError) -> String {
    connection_message(e).unwrap_or_else(|| match e {
        ApiError::Unauthorized => "Invalid username or password".to_string(),
        other => format!("Login failed: {}", other),
    })
}

fn register_error_message(e: &ApiError) -> String {
    connection_message(e).unwrap_or_else(|| match e {
        ApiError::ValidationFailed(_) => {
            "Registration rejected - username may already be taken".to_string()
        }
        other => format!("Registration failed: {}", other),
    })
}

fn refresh_error_message(e: &ApiError) -> String {
    connection_message(e).unwrap_or_else(|| match e {
        ApiError::Unauthorized => "Refresh token expired - please log in again".to_string(),
        other => format!("Refresh failed: {}", other),
    })
}
