use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use crate::dashboard::AlertDisplay;
use crate::ui::theme;

pub fn render(frame: &mut Frame, area: Rect, title: &str, alerts: &[AlertDisplay]) {
    let block = Block::default()
        .title(Line::styled(format!(" {title} "), theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .style(Style::default().bg(theme::BASE));

    if alerts.is_empty() {
        let msg = Paragraph::new(Line::styled(" No recent alerts", theme::label_style()))
            .block(block);
        frame.render_widget(msg, area);
        return;
    }

    let rows: Vec<Row> = alerts
        .iter()
        .map(|a| {
            let color = theme::severity_color(a.severity);
            Row::new(vec![
                Cell::from(a.severity.as_str().to_uppercase())
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Cell::from(a.message.clone()).style(theme::value_style()),
                Cell::from(a.time.clone()).style(theme::label_style()),
                Cell::from(format!("[{}]", a.action)).style(Style::default().fg(color)),
            ])
        })
        .collect();

    let header = Row::new(vec!["LEVEL", "ALERT", "TIME", "ACTION"])
        .style(theme::label_style())
        .height(1);

    let widths = [
        Constraint::Length(9),
        Constraint::Min(30),
        Constraint::Length(14),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}
