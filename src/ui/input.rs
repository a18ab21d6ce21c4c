//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes. Auth submissions are handed off to the app,
//! which runs them on background tasks.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{
    App, LoginFocus, RegisterFocus, Route, MAX_EMAIL_LENGTH, MAX_PASSWORD_LENGTH,
    MAX_USERNAME_LENGTH,
};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.route {
        Route::Landing => handle_landing_input(app, key),
        Route::Login => handle_login_input(app, key),
        Route::Register => handle_register_input(app, key),
        Route::Dashboard => handle_dashboard_input(app, key),
    }
}

fn handle_landing_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('l') => app.navigate(Route::Login),
        KeyCode::Char('r') => app.navigate(Route::Register),
        KeyCode::Char('d') => app.navigate(Route::Dashboard),
        KeyCode::Char('q') | KeyCode::Esc => {
            app.quit();
            return Ok(true);
        }
        _ => {}
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => app.submit_login(),
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if app.login_username.len() < MAX_USERNAME_LENGTH {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if app.login_password.len() < MAX_PASSWORD_LENGTH {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Tab | KeyCode::Down => {
            app.register_focus = match app.register_focus {
                RegisterFocus::Username => RegisterFocus::Email,
                RegisterFocus::Email => RegisterFocus::Password,
                RegisterFocus::Password => RegisterFocus::Button,
                RegisterFocus::Button => RegisterFocus::Username,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.register_focus = match app.register_focus {
                RegisterFocus::Username => RegisterFocus::Button,
                RegisterFocus::Email => RegisterFocus::Username,
                RegisterFocus::Password => RegisterFocus::Email,
                RegisterFocus::Button => RegisterFocus::Password,
            };
        }
        KeyCode::Enter => match app.register_focus {
            RegisterFocus::Username => app.register_focus = RegisterFocus::Email,
            RegisterFocus::Email => app.register_focus = RegisterFocus::Password,
            RegisterFocus::Password | RegisterFocus::Button => app.submit_register(),
        },
        KeyCode::Backspace => match app.register_focus {
            RegisterFocus::Username => {
                app.register_username.pop();
            }
            RegisterFocus::Email => {
                app.register_email.pop();
            }
            RegisterFocus::Password => {
                app.register_password.pop();
            }
            RegisterFocus::Button => {}
        },
        KeyCode::Char(c) => match app.register_focus {
            RegisterFocus::Username => {
                if app.register_username.len() < MAX_USERNAME_LENGTH {
                    app.register_username.push(c);
                }
            }
            RegisterFocus::Email => {
                if app.register_email.len() < MAX_EMAIL_LENGTH {
                    app.register_email.push(c);
                }
            }
            RegisterFocus::Password => {
                if app.register_password.len() < MAX_PASSWORD_LENGTH {
                    app.register_password.push(c);
                }
            }
            RegisterFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

fn handle_dashboard_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('r') => app.submit_refresh(),
        KeyCode::Char('x') => app.logout()?,
        KeyCode::Esc => app.navigate(Route::Landing),
        KeyCode::Char('q') => {
            app.quit();
            return Ok(true);
        }
        _ => {}
    }
    Ok(false)
}
