//! Session lifecycle state machine.
//!
//! `SessionController` owns the transition between anonymous and
//! authenticated states. The `SessionStore` is the single source of truth;
//! the in-memory snapshot is rebuilt from it via `check_status`, which must
//! run once at process start before anything renders.

use anyhow::Result;
use tracing::{debug, info};

use super::store::SessionStore;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USERNAME_KEY: &str = "username";

/// Current authentication state as a tagged union, matched exhaustively
/// by every consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated {
        username: String,
        access_token: String,
        /// Absent when the stored session predates refresh support or the
        /// store lost the key; the session is still considered logged in.
        refresh_token: Option<String>,
    },
}

pub struct SessionController {
    store: SessionStore,
    state: SessionState,
}

impl SessionController {
    /// Create a controller with an empty snapshot. Call `check_status` to
    /// hydrate from the store before trusting the state.
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    /// Transition to `Authenticated`, overwriting any prior session
    /// wholesale. The identity is written before the tokens so a partial
    /// storage failure cannot leave a token without an identity; any write
    /// failure is fatal to the login attempt.
    pub fn login(&mut self, access_token: &str, refresh_token: &str, username: &str) -> Result<()> {
        if access_token.is_empty() || refresh_token.is_empty() || username.is_empty() {
            return Err(anyhow::anyhow!(
                "login requires a non-empty access token, refresh token, and username"
            ));
        }

        self.store.set(USERNAME_KEY, username)?;
        self.store.set(ACCESS_TOKEN_KEY, access_token)?;
        self.store.set(REFRESH_TOKEN_KEY, refresh_token)?;

        self.state = SessionState::Authenticated {
            username: username.to_string(),
            access_token: access_token.to_string(),
            refresh_token: Some(refresh_token.to_string()),
        };

        info!(username, "Session established");
        Ok(())
    }

    /// Transition to `Anonymous`, removing every session key from the
    /// store. A no-op when already anonymous.
    pub fn logout(&mut self) -> Result<()> {
        self.store.clear_all()?;
        if self.is_authenticated() {
            info!("Session cleared");
        }
        self.state = SessionState::Anonymous;
        Ok(())
    }

    /// Re-read the store and rebuild the snapshot. Authenticated iff both
    /// the access token and the identity are present.
    pub fn check_status(&mut self) -> Result<&SessionState> {
        let access_token = self.store.get(ACCESS_TOKEN_KEY)?;
        let username = self.store.get(USERNAME_KEY)?;

        self.state = match (access_token, username) {
            (Some(access_token), Some(username)) => SessionState::Authenticated {
                username,
                access_token,
                refresh_token: self.store.get(REFRESH_TOKEN_KEY)?,
            },
            _ => SessionState::Anonymous,
        };

        debug!(authenticated = self.is_authenticated(), "Session status checked");
        Ok(&self.state)
    }

    /// Pure store read; `None` when unset.
    pub fn access_token(&self) -> Result<Option<String>> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// Pure store read; `None` when unset.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.store.get(REFRESH_TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(dir: &tempfile::TempDir) -> SessionController {
        let store = SessionStore::new(dir.path().join("store.json"), "authgate");
        SessionController::new(store)
    }

    #[test]
    fn fresh_store_checks_out_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        assert_eq!(ctl.check_status().unwrap(), &SessionState::Anonymous);
        assert_eq!(ctl.username(), None);
    }

    #[test]
    fn login_then_check_status_is_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        ctl.login("access123", "refresh456", "alice").unwrap();

        assert_eq!(
            ctl.check_status().unwrap(),
            &SessionState::Authenticated {
                username: "alice".to_string(),
                access_token: "access123".to_string(),
                refresh_token: Some("refresh456".to_string()),
            }
        );
        assert_eq!(ctl.access_token().unwrap().as_deref(), Some("access123"));
        assert_eq!(ctl.refresh_token().unwrap().as_deref(), Some("refresh456"));
    }

    #[test]
    fn session_survives_process_restart() {
        let dir = tempfile::tempdir().unwrap();

        controller(&dir).login("access123", "refresh456", "alice").unwrap();

        // A fresh controller over the same store hydrates the prior session
        let mut ctl = controller(&dir);
        ctl.check_status().unwrap();
        assert_eq!(ctl.username(), Some("alice"));
    }

    #[test]
    fn logout_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        ctl.login("access123", "refresh456", "alice").unwrap();
        ctl.logout().unwrap();

        assert_eq!(ctl.check_status().unwrap(), &SessionState::Anonymous);
        assert_eq!(ctl.access_token().unwrap(), None);
        assert_eq!(ctl.refresh_token().unwrap(), None);
    }

    #[test]
    fn logout_while_anonymous_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        ctl.logout().unwrap();
        assert_eq!(ctl.state(), &SessionState::Anonymous);
    }

    #[test]
    fn logout_leaves_foreign_keys_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let foreign = SessionStore::new(path.clone(), "otherapp");
        foreign.set("theme", "dark").unwrap();

        let store = SessionStore::new(path.clone(), "authgate");
        let mut ctl = SessionController::new(store);
        ctl.login("access123", "refresh456", "alice").unwrap();
        ctl.logout().unwrap();

        let ours = SessionStore::new(path, "authgate");
        assert_eq!(ours.key_count().unwrap(), 0);
        assert_eq!(foreign.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn relogin_overwrites_prior_session_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        ctl.login("access123", "refresh456", "alice").unwrap();
        ctl.login("access789", "refresh000", "bob").unwrap();

        assert_eq!(ctl.username(), Some("bob"));
        assert_eq!(ctl.access_token().unwrap().as_deref(), Some("access789"));
        assert_eq!(ctl.refresh_token().unwrap().as_deref(), Some("refresh000"));
    }

    #[test]
    fn login_rejects_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctl = controller(&dir);

        assert!(ctl.login("", "refresh456", "alice").is_err());
        assert!(ctl.login("access123", "", "alice").is_err());
        assert!(ctl.login("access123", "refresh456", "").is_err());

        // No partial session leaked into the store
        assert_eq!(ctl.check_status().unwrap(), &SessionState::Anonymous);
    }

    #[test]
    fn token_without_identity_checks_out_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = SessionStore::new(path.clone(), "authgate");
        store.set(ACCESS_TOKEN_KEY, "orphaned").unwrap();

        let mut ctl = SessionController::new(SessionStore::new(path, "authgate"));
        assert_eq!(ctl.check_status().unwrap(), &SessionState::Anonymous);
    }
}
