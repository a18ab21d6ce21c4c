//! Session state management.
//!
//! This module provides:
//! - `SessionStore`: namespaced key/value persistence for session fields
//! - `SessionController`: the anonymous/authenticated state machine
//!
//! The store is the single source of truth; the controller's in-memory
//! snapshot is rehydrated from it at startup.

pub mod controller;
pub mod store;

pub use controller::{SessionController, SessionState};
pub use store::SessionStore;
