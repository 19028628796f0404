//! TUI rendering for the heat-risk form.
//!
//! This module draws the input form, the results view and the blocking
//! alert popup using the `ratatui` crate.

use crate::app::{App, Field, ViewMode};
use crate::models::RiskResult;
use ratatui::{prelude::*, widgets::*};

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Renders one frame of the TUI based on current application state.
///
/// Picks the form or results view from [`App::view_mode`] and draws the
/// alert popup on top when one is pending.
pub fn render(f: &mut Frame, app: &App) {
    match app.view_mode {
        ViewMode::Form => render_form_view(f, app),
        ViewMode::Results => render_results_view(f, app),
    }

    if let Some(ref msg) = app.alert {
        render_alert(f, msg);
    }
}

/// Form view: age, condition, optional city, coordinates line, submit
/// button, status line and key help.
fn render_form_view(f: &mut Frame, app: &App) {
    let area = f.size();
    let city_height = if app.manual_input_visible { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),           // Title
            Constraint::Length(3),           // Age
            Constraint::Length(3),           // Condition
            Constraint::Length(city_height), // City name
            Constraint::Length(1),           // Coordinates
            Constraint::Length(3),           // Submit
            Constraint::Length(1),           // Status
            Constraint::Min(0),
            Constraint::Length(1), // Help
        ])
        .split(area);

    let title = Paragraph::new(" Heat Risk Check ")
        .style(Style::default().add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    render_input(f, app, Field::Age, " Age ", &app.form.age, chunks[1]);
    render_input(
        f,
        app,
        Field::Condition,
        " Condition ",
        &app.form.condition,
        chunks[2],
    );
    if app.manual_input_visible {
        render_input(
            f,
            app,
            Field::CityName,
            " City name ",
            &app.form.city_name,
            chunks[3],
        );
    }

    let coords = match app.form.coordinates() {
        Some(c) => Line::from(vec![
            Span::styled("  Current location: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{:.4}, {:.4}", c.latitude, c.longitude),
                Style::default().fg(Color::Magenta),
            ),
        ]),
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(coords), chunks[4]);

    let (label, style) = if app.submit_enabled {
        (
            format!(" {} ", app.submit_label),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        let frame = SPINNER[app.tick_count % SPINNER.len()];
        (
            format!(" {} {} ", frame, app.submit_label),
            Style::default().fg(Color::DarkGray),
        )
    };
    let button = Paragraph::new(Line::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(button, chunks[5]);

    if let Some(ref status) = app.status {
        let p = Paragraph::new(status.as_str())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(p, chunks[6]);
    }

    let help = Paragraph::new(" Tab/↑/↓ move   Enter submit   Esc quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[8]);
}

fn render_input(f: &mut Frame, app: &App, field: Field, title: &str, value: &str, area: Rect) {
    let focused = app.focus == field && app.alert.is_none();
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text = if focused {
        format!("{}▏", value)
    } else {
        value.to_string()
    };
    let input = Paragraph::new(text).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(input, area);
}

/// Results view: the stored record, with the risk level colour coded.
fn render_results_view(f: &mut Frame, app: &App) {
    let area = f.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let Some(result) = app.result.as_ref() else {
        let p = Paragraph::new("No result yet.")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(p, chunks[0]);
        return;
    };

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let color = risk_color(result);
    let risk_text = match (&result.risk_label, &result.risk_level) {
        (Some(label), Some(level)) => format!("{} ({})", level, label),
        (None, Some(level)) => level.clone(),
        (Some(label), None) => label.clone(),
        (None, None) => "—".to_string(),
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Location:    ", bold),
            Span::styled(result.location_label(), Style::default().fg(Color::Magenta)),
        ]),
        Line::from(vec![
            Span::styled("Age:         ", bold),
            Span::raw(result.age.as_str()),
            Span::raw("  |  "),
            Span::styled("Condition: ", bold),
            Span::raw(result.condition.as_str()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Heat index:  ", bold),
            Span::raw(format_reading(result.heat_index, "°C")),
        ]),
        Line::from(vec![
            Span::styled("WBGT:        ", bold),
            Span::raw(format_reading(result.wbgt, "°C")),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Risk level:  ", bold),
            Span::styled(risk_text, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
    ];

    let p = Paragraph::new(lines).block(
        Block::default()
            .title(" Heat Risk Result ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .padding(Padding::new(2, 2, 1, 1)),
    );
    f.render_widget(p, chunks[0]);

    let help = Paragraph::new(" b back to form   q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[1]);
}

/// Blocking alert drawn over the current view.
fn render_alert(f: &mut Frame, msg: &str) {
    let area = centered_rect(60, 7, f.size());
    f.render_widget(Clear, area);
    let p = Paragraph::new(vec![
        Line::from(msg),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(" Notice ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    );
    f.render_widget(p, area);
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn format_reading(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{:.1}{}", v, unit))
}

/// Colour for the risk line. Prefers the server's bucket, falls back to the
/// free-form risk level.
fn risk_color(result: &RiskResult) -> Color {
    let key = result
        .risk_bucket
        .as_deref()
        .or(result.risk_level.as_deref())
        .unwrap_or("")
        .to_lowercase();
    if key.contains("veryhigh") || key.contains("very high") || key.contains("danger") {
        Color::Magenta
    } else if key.contains("high") {
        Color::Red
    } else if key.contains("mid") || key.contains("moderate") {
        Color::Yellow
    } else if key.contains("low") {
        Color::Green
    } else {
        Color::White
    }
}
