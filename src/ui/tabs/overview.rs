use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::dashboard::{DisplayBundle, Dashboard};
use crate::ui::theme;
use crate::ui::widgets::{alert_table, metric_gauge};

pub fn render(frame: &mut Frame, area: Rect, dashboard: &Dashboard) {
    let display = dashboard.current_display();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // ventilation status
            Constraint::Length(3), // temperature + gas
            Constraint::Length(3), // air quality + dust
            Constraint::Length(3), // haulage tunnel
            Constraint::Min(5),    // recent alerts
        ])
        .split(area);

    render_ventilation(frame, chunks[0], &display);

    for (row, pair) in display.metrics.chunks(2).enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1 + row]);
        for (col, metric) in pair.iter().enumerate() {
            metric_gauge::render(frame, cols[col], metric);
        }
    }

    let haulage_block = Block::default()
        .title(Line::styled(" Haulage Tunnel ", theme::title_style()))
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .style(Style::default().bg(theme::BASE));
    frame.render_widget(
        Paragraph::new(Line::styled(format!(" {}", display.haulage), theme::value_style()))
            .block(haulage_block),
        chunks[3],
    );

    alert_table::render(frame, chunks[4], "Recent Alerts", &dashboard.alerts_view());
}

fn render_ventilation(frame: &mut Frame, area: Rect, display: &DisplayBundle) {
    let mut spans = vec![Span::styled(
        format!(" {}", display.ventilation_text()),
        theme::ventilation_style(display.ventilation),
    )];
    if let Some(at) = display.observed_at {
        spans.push(Span::styled(
            format!("   last reading {}", at.format("%Y-%m-%d %H:%M:%S")),
            theme::label_style(),
        ));
    }

    let block = Block::default()
        .title(Line::styled(
            format!(" {} ", display.location_name),
            theme::title_style(),
        ))
        .borders(Borders::ALL)
        .border_style(theme::border_style())
        .style(Style::default().bg(theme::BASE));

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
