use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, OverlayState};
use crate::highlight::{build_highlight_regex, match_ranges};
use crate::license::{ExpiryStatus, LicenseRecord, StatusKind};
use crate::view::{FilterMode, Summary};

const EMPTY_CELL: &str = "-";
const KEY_HELP: &str =
    "/ search • f filter • s sort • o order • v keys • Enter details • Ctrl-r reload • q quit";

pub fn draw_app(frame: &mut Frame, state: &AppState, table_state: &mut TableState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(frame.size());

    let pass = state.render_pass();
    render_summary(frame, &pass.summary, vertical[0]);

    let highlight_regex = build_highlight_regex(state.search_term());
    let highlight_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let header = Row::new(
        ["Product", "Vendor", "License Key", "Expires", "Status", "Department"]
            .into_iter()
            .map(|title| Cell::from(title).style(Style::default().add_modifier(Modifier::BOLD))),
    )
    .style(Style::default().fg(Color::Cyan));

    let rows: Vec<Row> = pass
        .rows
        .iter()
        .map(|row| {
            let searchable = |text: &str| {
                Cell::from(Line::from(highlight_line(
                    text,
                    highlight_regex.as_ref(),
                    highlight_style,
                    Style::default(),
                )))
            };
            let department = row.record.department.as_deref().unwrap_or(EMPTY_CELL);
            Row::new(vec![
                searchable(&row.record.product_name),
                searchable(&row.record.vendor),
                Cell::from(Span::styled(
                    row.key.to_string(),
                    Style::default().fg(Color::Gray),
                )),
                Cell::from(row.record.expiry_date.clone()),
                Cell::from(Span::styled(row.status.label(), status_style(row.status.kind()))),
                searchable(department),
            ])
        })
        .collect();

    let title = format!(
        "Licenses ({} of {}) • {} • sorted by {} {}",
        pass.len(),
        pass.summary.total,
        state.view.filter.label(),
        state.view.sort_key.label(),
        state.view.direction.arrow()
    );
    let widths = [
        Constraint::Percentage(22),
        Constraint::Percentage(16),
        Constraint::Percentage(24),
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("➤ ");

    if pass.is_empty() {
        let message = if state.catalog.is_empty() {
            "No licenses loaded. Point the [source] path in config.toml at a licenses file."
        } else {
            "No licenses found matching your criteria."
        };
        let empty = Paragraph::new(Line::from(Span::styled(
            message,
            Style::default().fg(Color::Gray),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Licenses"));
        frame.render_widget(empty, vertical[1]);
    } else {
        frame.render_stateful_widget(table, vertical[1], table_state);
    }

    let status = build_status_line(state, pass.today.to_string());
    let status_paragraph = Paragraph::new(status).style(Style::default().fg(Color::Gray));
    frame.render_widget(status_paragraph, vertical[2]);

    render_overlay(frame, state);
}

fn render_summary(frame: &mut Frame, summary: &Summary, area: Rect) {
    let cards = summary_cards(summary);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, cards.len() as u32); cards.len()])
        .split(area);

    for ((label, count, color), column) in cards.into_iter().zip(columns.iter()) {
        let card = Paragraph::new(Line::from(vec![
            Span::styled(
                count.to_string(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!(" {label}")),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(card, *column);
    }
}

fn summary_cards(summary: &Summary) -> Vec<(&'static str, usize, Color)> {
    let mut cards = vec![
        ("Total", summary.total, Color::White),
        ("Expired", summary.expired, status_color(StatusKind::Expired)),
        ("Expiring", summary.expiring, status_color(StatusKind::Expiring)),
        ("Warning", summary.warning, status_color(StatusKind::Warning)),
        ("Active", summary.active, status_color(StatusKind::Active)),
    ];
    if summary.unknown > 0 {
        cards.push(("Unknown", summary.unknown, status_color(StatusKind::Unknown)));
    }
    cards
}

fn build_status_line(state: &AppState, today: String) -> Text<'static> {
    let total = state.len();
    let position = if state.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", state.selected + 1, total)
    };

    let mut spans = vec![
        Span::raw("Selected: "),
        Span::styled(position, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" | As of: "),
        Span::styled(today, Style::default().add_modifier(Modifier::BOLD)),
    ];

    if state.is_search_active() || !state.search_term().is_empty() {
        spans.push(Span::raw(" | Search: "));
        let mut term = state.search_term().to_string();
        if state.is_search_active() {
            term.push('▏');
        }
        spans.push(Span::styled(term, Style::default().fg(Color::Yellow)));
    }

    if state.view.filter != FilterMode::All {
        spans.push(Span::raw(" | Filter: "));
        spans.push(Span::styled(
            state.view.filter.label(),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    spans.push(Span::raw(" | Keys: "));
    if state.view.show_keys {
        spans.push(Span::styled(
            "shown",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    } else {
        spans.push(Span::raw("hidden"));
    }

    let mut lines = vec![Line::from(spans)];
    let second = match &state.status_message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Yellow),
        )),
        None => Line::from(KEY_HELP),
    };
    lines.push(second);
    Text::from(lines)
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match state.overlay() {
        Some(OverlayState::Details(_)) => {
            let Some(record) = state.details_record() else {
                return;
            };
            let area = centered_rect(60, 50, frame.size());
            frame.render_widget(Clear, area);
            let lines = details_lines(record, &record.status(state.today), state.view.show_keys);
            let details = Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(truncate_to_width(
                            &record.product_name,
                            area.width.saturating_sub(4) as usize,
                        ))
                        .title_bottom("v toggle key • Esc close"),
                );
            frame.render_widget(details, area);
        }
        None => {}
    }
}

fn details_lines(
    record: &LicenseRecord,
    status: &ExpiryStatus,
    show_keys: bool,
) -> Vec<Line<'static>> {
    let label_style = Style::default().fg(Color::Gray);
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<13}"), label_style),
            Span::raw(value),
        ])
    };
    let optional = |value: &Option<String>| value.clone().unwrap_or_else(|| EMPTY_CELL.to_string());

    let mut lines = vec![
        field("Vendor", record.vendor.clone()),
        field("Department", optional(&record.department)),
        field("Category", optional(&record.category)),
        field("Expiry Date", record.expiry_date.clone()),
        Line::from(vec![
            Span::styled(format!("{:<13}", "Status"), label_style),
            Span::styled(
                crate::cli::commands::describe_status(status),
                status_style(status.kind()),
            ),
        ]),
        field("License Key", record.display_key(show_keys).into_owned()),
    ];
    if let Some(notes) = &record.notes {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Notes", label_style)));
        lines.extend(notes.lines().map(|line| Line::from(line.to_string())));
    }
    lines
}

fn status_color(kind: StatusKind) -> Color {
    match kind {
        StatusKind::Expired => Color::Red,
        StatusKind::Expiring => Color::LightRed,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Active => Color::Green,
        StatusKind::Unknown => Color::Gray,
    }
}

fn status_style(kind: StatusKind) -> Style {
    let style = Style::default().fg(status_color(kind));
    match kind {
        StatusKind::Expired | StatusKind::Expiring => style.add_modifier(Modifier::BOLD),
        StatusKind::Unknown => style.add_modifier(Modifier::ITALIC),
        _ => style,
    }
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for (start, end) in match_ranges(text, regex) {
        if start > last {
            spans.push(Span::styled(text[last..start].to_string(), base_style));
        }
        spans.push(Span::styled(text[start..end].to_string(), highlight_style));
        last = end;
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), base_style));
    }
    spans
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for grapheme in text.graphemes(true) {
        let next = UnicodeWidthStr::width(grapheme);
        if width + next + 1 > max_width {
            break;
        }
        out.push_str(grapheme);
        width += next;
    }
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
