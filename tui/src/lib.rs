//! TUI rendering for the FinLab console using ratatui.

mod input;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{Palette, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table},
};
use unicode_width::UnicodeWidthStr;

use finlab_engine::ui::{DraftInput, Screen, StatusKind};
use finlab_engine::{
    App, LookupView, ResultsView, Severity, TestResultSummary, format_execution_date,
    sanitize_display_text,
};

const LOGIN_FORM_WIDTH: u16 = 50;
const LOGIN_FORM_HEIGHT: u16 = 9;
const DETAILS_PANEL_WIDTH: u16 = 46;

pub fn draw(frame: &mut Frame, app: &App) {
    let palette = palette(app.ui_options());
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Topbar
            Constraint::Min(1),    // Screen
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_topbar(frame, app, chunks[0], &palette);
    match app.screen() {
        Screen::Login => draw_login(frame, app, chunks[1], &palette),
        Screen::Accounts => draw_lookup(frame, app.lookup_view(), chunks[1], &palette),
        Screen::Results => draw_results(frame, app.results_view(), chunks[1], &palette),
    }
    draw_status_bar(frame, app, chunks[2], &palette);
}

// ============================================================================
// Topbar
// ============================================================================

fn draw_topbar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mut left = vec![Span::styled(" FinLab ", styles::title(palette)), Span::raw(" ")];
    if app.is_logged_in() {
        for screen in Screen::AUTHENTICATED {
            let style = if screen == app.screen() {
                styles::tab_active(palette)
            } else {
                styles::tab_inactive(palette)
            };
            left.push(Span::styled(format!(" {} ", screen.title()), style));
            left.push(Span::raw(" "));
        }
    }

    let session = if app.is_logging_out() {
        Span::styled("logging out... ", Style::default().fg(palette.warning))
    } else if app.is_logged_in() {
        Span::styled("● logged in ", Style::default().fg(palette.success))
    } else {
        Span::styled("○ signed out ", styles::key_hint(palette))
    };
    let right = Line::from(vec![
        Span::styled(app.backend_label().to_string(), styles::key_hint(palette)),
        Span::raw("  "),
        session,
    ])
    .alignment(Alignment::Right);

    let bar_style = Style::default().bg(palette.bg_panel);
    frame.render_widget(Paragraph::new(Line::from(left)).style(bar_style), area);
    frame.render_widget(Paragraph::new(right), area);
}

// ============================================================================
// Forms
// ============================================================================

/// Render a single-line bordered input and place the terminal cursor in it.
fn draw_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    draft: &DraftInput,
    focused: bool,
    palette: &Palette,
) {
    let border_color = if focused {
        palette.accent
    } else {
        palette.bg_border
    };
    let inner_width = usize::from(area.width.saturating_sub(2));
    let before_cursor = sanitize_display_text(draft.text_before_cursor()).width();
    // Keep the cursor visible by scrolling the field horizontally.
    let scroll = before_cursor.saturating_sub(inner_width.saturating_sub(1));

    let field = Paragraph::new(Line::from(Span::styled(
        sanitize_display_text(draft.text()).into_owned(),
        Style::default().fg(palette.text_primary),
    )))
    .scroll((0, u16::try_from(scroll).unwrap_or(u16::MAX)))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {title} ")),
    );
    frame.render_widget(field, area);

    if focused {
        let offset = u16::try_from(before_cursor - scroll).unwrap_or(u16::MAX);
        frame.set_cursor_position((
            area.x.saturating_add(1).saturating_add(offset),
            area.y.saturating_add(1),
        ));
    }
}

fn error_line(error: Option<&str>, palette: &Palette) -> Line<'static> {
    match error {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(palette.error),
        )),
        None => Line::from(""),
    }
}

fn hints(pairs: &[(&str, &str)], palette: &Palette) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, label) in pairs {
        spans.push(Span::styled((*key).to_string(), styles::key_highlight(palette)));
        spans.push(Span::styled(format!(" {label}  "), styles::key_hint(palette)));
    }
    Line::from(spans)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_login(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let view = app.login_view();
    let form = centered(area, LOGIN_FORM_WIDTH, LOGIN_FORM_HEIGHT);
    frame.render_widget(Clear, form);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.primary_dim))
        .title(Span::styled(" Login ", styles::title(palette)))
        .style(Style::default().bg(palette.bg_panel));
    let inner = block.inner(form);
    frame.render_widget(block, form);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Username
            Constraint::Length(1), // Error
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    draw_field(
        frame,
        rows[0],
        "Username",
        view.username(),
        !view.is_loading(),
        palette,
    );
    frame.render_widget(Paragraph::new(error_line(view.error(), palette)), rows[1]);

    let footer = if view.is_loading() {
        Line::from(Span::styled(
            format!("{} Logging in...", spinner_frame(app.tick_count())),
            Style::default().fg(palette.primary),
        ))
    } else {
        hints(&[("Enter", "log in"), ("Ctrl+C", "quit")], palette)
    };
    frame.render_widget(Paragraph::new(footer), rows[3]);
}

// ============================================================================
// IBAN lookup
// ============================================================================

fn draw_lookup(frame: &mut Frame, view: &LookupView, area: Rect, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // IBAN field
            Constraint::Length(1), // Error / loading
            Constraint::Min(3),    // History
            Constraint::Length(1), // Hints
        ])
        .split(area);

    draw_field(frame, rows[0], "IBAN", view.draft(), true, palette);

    let feedback = if view.is_loading() {
        Line::from(Span::styled(
            "Looking up...",
            Style::default().fg(palette.primary),
        ))
    } else {
        error_line(view.error(), palette)
    };
    frame.render_widget(Paragraph::new(feedback), rows[1]);

    let history_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(format!(" Lookup History ({}) ", view.history().len()));

    if view.history().is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No lookups yet",
            styles::key_hint(palette),
        )))
        .block(history_block);
        frame.render_widget(empty, rows[2]);
    } else {
        let body: Vec<Row> = view
            .history()
            .iter()
            .map(|record| {
                let status = sanitize_display_text(record.status.label()).into_owned();
                Row::new(vec![
                    Cell::from(sanitize_display_text(record.iban.as_str()).into_owned()),
                    Cell::from(status).style(
                        Style::default()
                            .fg(palette.risk_status(&record.status))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Cell::from(record.looked_up_at.format("%H:%M:%S").to_string()),
                ])
            })
            .collect();
        let table = Table::new(
            body,
            [
                Constraint::Min(24),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["IBAN", "Status", "Time"])
                .style(Style::default().fg(palette.text_secondary).add_modifier(Modifier::BOLD)),
        )
        .style(Style::default().fg(palette.text_primary))
        .block(history_block);
        frame.render_widget(table, rows[2]);
    }

    frame.render_widget(
        Paragraph::new(hints(
            &[
                ("Enter", "look up"),
                ("Ctrl+X", "clear history"),
                ("Tab", "results"),
                ("Ctrl+L", "logout"),
            ],
            palette,
        )),
        rows[3],
    );
}

// ============================================================================
// Stress test results
// ============================================================================

fn draw_results(frame: &mut Frame, view: &ResultsView, area: Rect, palette: &Palette) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Error / loading
            Constraint::Min(3),    // List (+ details)
            Constraint::Length(1), // Hints
        ])
        .split(area);

    let feedback = if view.is_loading() {
        Line::from(Span::styled("Loading...", Style::default().fg(palette.primary)))
    } else {
        error_line(view.error(), palette)
    };
    frame.render_widget(Paragraph::new(feedback), rows[0]);

    let (list_area, details_area) = match view.details() {
        Some(_) => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(20), Constraint::Length(DETAILS_PANEL_WIDTH)])
                .split(rows[1]);
            (cols[0], Some(cols[1]))
        }
        None => (rows[1], None),
    };

    draw_results_table(frame, view, list_area, palette);
    if let (Some(summary), Some(details_area)) = (view.details(), details_area) {
        draw_details(frame, summary, details_area, palette);
    }

    let hint_pairs: &[(&str, &str)] = if view.details().is_some() {
        &[("Esc", "close details"), ("↑↓", "select"), ("r", "reload")]
    } else {
        &[
            ("Enter", "details"),
            ("↑↓", "select"),
            ("r", "reload"),
            ("Tab", "lookup"),
        ]
    };
    frame.render_widget(Paragraph::new(hints(hint_pairs, palette)), rows[2]);
}

fn draw_results_table(frame: &mut Frame, view: &ResultsView, area: Rect, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(" Stress Test Results ");

    if view.items().is_empty() {
        let message = if view.is_loading() {
            ""
        } else {
            "No test results"
        };
        let empty =
            Paragraph::new(Line::from(Span::styled(message, styles::key_hint(palette)))).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let body: Vec<Row> = view
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let row = Row::new(vec![
                Cell::from(sanitize_display_text(&item.test_name).into_owned()),
                Cell::from(format_execution_date(&item.execution_date)),
                Cell::from(sanitize_display_text(&item.file_name).into_owned()),
            ]);
            if index == view.selected() {
                row.style(styles::selected_row(palette))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        body,
        [
            Constraint::Min(18),
            Constraint::Length(17),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["Test", "Executed", "File"])
            .style(Style::default().fg(palette.text_secondary).add_modifier(Modifier::BOLD)),
    )
    .style(Style::default().fg(palette.text_primary))
    .block(block);
    frame.render_widget(table, area);
}

fn metric_line(label: &str, value: String, color: ratatui::style::Color) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{label:<16}")),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn severity_line(
    label: &str,
    millis: f64,
    severity: Severity,
    palette: &Palette,
) -> Line<'static> {
    metric_line(
        label,
        format!("{millis:.1} ms  [{}]", severity.as_str()),
        palette.severity(severity),
    )
}

fn draw_details(frame: &mut Frame, summary: &TestResultSummary, area: Rect, palette: &Palette) {
    let plain = palette.text_primary;
    let lines = vec![
        Line::from(Span::styled(
            sanitize_display_text(&summary.test_name).into_owned(),
            styles::title(palette),
        )),
        metric_line(
            "Executed",
            format_execution_date(&summary.execution_date),
            plain,
        ),
        Line::from(""),
        metric_line("Total requests", summary.total_requests.to_string(), plain),
        metric_line(
            "Successful",
            summary.successful_requests.to_string(),
            palette.success,
        ),
        metric_line("Failed", summary.failed_requests.to_string(), palette.error),
        metric_line("Error rate", format!("{:.2}%", summary.error_rate), plain),
        Line::from(""),
        severity_line(
            "Average",
            summary.average_response_time,
            summary.average_severity(),
            palette,
        ),
        metric_line(
            "Min / Max",
            format!(
                "{:.0} / {:.0} ms",
                summary.min_response_time, summary.max_response_time
            ),
            plain,
        ),
        severity_line(
            "90th percentile",
            summary.p90_response_time,
            summary.p90_severity(),
            palette,
        ),
        severity_line(
            "95th percentile",
            summary.p95_response_time,
            summary.p95_severity(),
            palette,
        ),
        metric_line(
            "Throughput",
            format!("{:.1} req/s", summary.throughput),
            plain,
        ),
    ];

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(palette.primary_dim))
            .title(" Details "),
    );
    frame.render_widget(panel, area);
}

// ============================================================================
// Status bar
// ============================================================================

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let (status_text, status_style) = if app.is_busy() {
        (
            format!("{} Waiting for backend...", spinner_frame(app.tick_count())),
            Style::default().fg(palette.primary),
        )
    } else if let Some(status) = app.status() {
        let (prefix, color) = match status.kind {
            StatusKind::Error => ("Error: ", palette.error),
            StatusKind::Info => ("", palette.text_secondary),
        };
        (
            format!("{prefix}{}", sanitize_display_text(&status.text)),
            Style::default().fg(color),
        )
    } else {
        (app.screen().title().to_string(), styles::key_hint(palette))
    };

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status_text, status_style),
    ]));
    frame.render_widget(status, area);
}
