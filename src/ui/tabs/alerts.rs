use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::dashboard::Dashboard;
use crate::source::Severity;
use crate::ui::theme;
use crate::ui::widgets::alert_table;

pub fn render(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let alerts = dashboard.alerts_view();
    let danger = alerts
        .iter()
        .filter(|a| a.severity == Severity::Danger)
        .count();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(4)])
        .split(area);

    let summary = Line::from(vec![
        Span::styled(" Showing ", theme::label_style()),
        Span::styled(alerts.len().to_string(), theme::value_style()),
        Span::styled(" most recent  ", theme::label_style()),
        Span::styled(
            format!("{danger} danger"),
            ratatui::style::Style::default().fg(theme::severity_color(Severity::Danger)),
        ),
        Span::styled("  ", theme::label_style()),
        Span::styled(
            format!("{} warning", alerts.len() - danger),
            ratatui::style::Style::default().fg(theme::severity_color(Severity::Warning)),
        ),
    ]);
    frame.render_widget(Paragraph::new(summary), chunks[0]);

    alert_table::render(frame, chunks[1], "Alerts", &alerts);
}
