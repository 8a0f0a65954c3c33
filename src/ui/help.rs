use ratatui::layout::{Constraint, Direction, Flex, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::theme;

pub fn render(frame: &mut Frame, area: Rect) {
    let popup = centered_rect(60, 17, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        header_line("Locations"),
        key_line("1-9", "Select location by position"),
        key_line("h / l", "Previous / next location"),
        key_line("Click", "Select location or view"),
        Line::raw(""),
        header_line("Views"),
        key_line("Tab / Shift+Tab", "Cycle Overview / Trends / Alerts"),
        key_line("d / w / m", "Trend period: 24 hours / 7 days / 30 days"),
        Line::raw(""),
        header_line("General"),
        key_line("r", "Refresh now"),
        key_line("+/-", "Faster / slower refresh"),
        key_line("?", "Toggle this help"),
        key_line("q / Ctrl+C", "Quit"),
    ];

    let block = Block::default()
        .title(Line::styled(" Help ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .style(ratatui::style::Style::default().bg(theme::BASE));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, popup);
}

fn header_line(text: &str) -> Line<'_> {
    Line::from(Span::styled(format!("  {text}"), theme::title_style()))
}

fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("    {key:<20}"), theme::key_hint_style()),
        Span::styled(desc, theme::label_style()),
    ])
}

fn centered_rect(width_pct: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .flex(Flex::Center)
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_pct) / 2),
            Constraint::Percentage(width_pct),
            Constraint::Percentage((100 - width_pct) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
