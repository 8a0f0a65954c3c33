use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge};
use ratatui::Frame;

use crate::dashboard::MetricDisplay;
use crate::status::MetricStatus;
use crate::ui::theme;

pub fn render(frame: &mut Frame, area: Rect, metric: &MetricDisplay) {
    let fill = metric.fill.clamp(0.0, 100.0);

    let mut title = vec![Span::styled(
        format!(" {} ", metric.metric.label()),
        theme::title_style(),
    )];
    if metric.status != MetricStatus::Unavailable {
        title.push(Span::styled(
            format!("{} ", metric.status.label()),
            ratatui::style::Style::default().fg(theme::status_color(metric.status)),
        ));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_style(theme::border_style());

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(theme::gauge_style(metric.status))
        .percent(fill.round() as u16)
        .label(metric.text.as_str());

    frame.render_widget(gauge, area);
}
