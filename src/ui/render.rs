use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus, RegisterFocus, Route};

use super::styles;

/// Truncate an opaque token for display; tokens are never shown in full.
const TOKEN_PREVIEW_LENGTH: usize = 16;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  authgate - {}", app.route.title());
    let identity = match app.controller.username() {
        Some(name) => format!("logged in as {} ", name),
        None => "anonymous ".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + identity.len() + 2),
        )),
        Span::styled(identity, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Landing => render_landing(frame, app, area),
        Route::Login => render_login(frame, app, area),
        Route::Register => render_register(frame, app, area),
        Route::Dashboard => render_dashboard(frame, app, area),
    }
}

fn render_landing(frame: &mut Frame, _app: &App, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "JWT session demo client",
            styles::title_style(),
        )),
        Line::from(""),
        Line::from("This client talks to an identity service for login,"),
        Line::from("registration, and token refresh. The dashboard is only"),
        Line::from("reachable with an active session."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[l]", styles::accent_style()),
            Span::raw(" log in    "),
            Span::styled("[r]", styles::accent_style()),
            Span::raw(" register    "),
            Span::styled("[d]", styles::accent_style()),
            Span::raw(" dashboard    "),
            Span::styled("[q]", styles::accent_style()),
            Span::raw(" quit"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(paragraph, area);
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    masked: bool,
    focused: bool,
) {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let cursor = if focused { "_" } else { "" };

    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        format!("{}{}", shown, cursor),
        styles::field_style(focused),
    )]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused))
            .title(label.to_string()),
    );
    frame.render_widget(paragraph, area);
}

fn render_submit_button(frame: &mut Frame, area: Rect, label: &str, focused: bool, busy: bool) {
    let text = if busy { "Working..." } else { label };
    let paragraph = Paragraph::new(Span::styled(text, styles::field_style(focused)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        );
    frame.render_widget(paragraph, area);
}

fn render_form_error(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(ref error) = app.form_error {
        let paragraph = Paragraph::new(Span::styled(error.as_str(), styles::error_style()))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }
}

fn centered_form(area: Rect, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(4),
            Constraint::Length(48),
            Constraint::Min(4),
        ])
        .split(vertical[1]);
    horizontal[1]
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let form = centered_form(area, 13);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Password
            Constraint::Length(3), // Button
            Constraint::Length(1), // Error line
            Constraint::Length(1), // Hint
        ])
        .split(form);

    render_field(
        frame,
        rows[0],
        "Username",
        &app.login_username,
        false,
        app.login_focus == LoginFocus::Username,
    );
    render_field(
        frame,
        rows[1],
        "Password",
        &app.login_password,
        true,
        app.login_focus == LoginFocus::Password,
    );
    render_submit_button(
        frame,
        rows[2],
        "Log In",
        app.login_focus == LoginFocus::Button,
        app.busy,
    );
    render_form_error(frame, app, rows[3]);

    let hint = Paragraph::new(Span::styled(
        "Tab: next field | Enter: submit | Esc: back",
        styles::muted_style(),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(hint, rows[4]);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let form = centered_form(area, 16);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(3), // Email
            Constraint::Length(3), // Password
            Constraint::Length(3), // Button
            Constraint::Length(1), // Error line
            Constraint::Length(1), // Hint
        ])
        .split(form);

    render_field(
        frame,
        rows[0],
        "Username",
        &app.register_username,
        false,
        app.register_focus == RegisterFocus::Username,
    );
    render_field(
        frame,
        rows[1],
        "Email",
        &app.register_email,
        false,
        app.register_focus == RegisterFocus::Email,
    );
    render_field(
        frame,
        rows[2],
        "Password",
        &app.register_password,
        true,
        app.register_focus == RegisterFocus::Password,
    );
    render_submit_button(
        frame,
        rows[3],
        "Create Account",
        app.register_focus == RegisterFocus::Button,
        app.busy,
    );
    render_form_error(frame, app, rows[4]);

    let hint = Paragraph::new(Span::styled(
        "Tab: next field | Enter: submit | Esc: back",
        styles::muted_style(),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(hint, rows[5]);
}

fn token_preview(token: Option<&str>) -> String {
    match token {
        Some(token) if token.chars().count() > TOKEN_PREVIEW_LENGTH => {
            let prefix: String = token.chars().take(TOKEN_PREVIEW_LENGTH).collect();
            format!("{}…", prefix)
        }
        Some(token) => token.to_string(),
        None => "(absent)".to_string(),
    }
}

fn render_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    // The router only lands here when the session is authenticated; the
    // snapshot is the render-time view of the store.
    let (username, access, refresh) = match app.controller.state() {
        crate::auth::SessionState::Authenticated {
            username,
            access_token,
            refresh_token,
        } => (
            username.clone(),
            token_preview(Some(access_token)),
            token_preview(refresh_token.as_deref()),
        ),
        crate::auth::SessionState::Anonymous => {
            ("?".to_string(), token_preview(None), token_preview(None))
        }
    };

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Hello, "),
            Span::styled(username, styles::success_style()),
            Span::raw("! You are holding an active session."),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("access token:  ", styles::muted_style()),
            Span::raw(access),
        ]),
        Line::from(vec![
            Span::styled("refresh token: ", styles::muted_style()),
            Span::raw(refresh),
        ]),
        Line::from(""),
        Line::from("Authenticated API calls would carry the access token as"),
        Line::from("an `Authorization: Bearer` header."),
        Line::from(""),
        Line::from(vec![
            Span::styled("[r]", styles::accent_style()),
            Span::raw(" refresh access token    "),
            Span::styled("[x]", styles::accent_style()),
            Span::raw(" log out    "),
            Span::styled("[q]", styles::accent_style()),
            Span::raw(" quit"),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::NONE));
    frame.render_widget(paragraph, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if let Some(ref msg) = app.notice {
        format!(" {} ", msg)
    } else if app.busy {
        " Contacting identity service... ".to_string()
    } else {
        String::from(" Ready ")
    };

    let right_text = format!(" {} ", app.config.base_url);

    let padding = (area.width as usize).saturating_sub(left_text.len() + right_text.len());
    let line = Line::from(vec![
        Span::raw(left_text),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(line).style(styles::status_bar_style()),
        area,
    );
}
