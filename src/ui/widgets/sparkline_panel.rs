use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Sparkline};
use ratatui::Frame;

use crate::ui::theme;

/// Resolution of the bars; values are mapped onto 0..=STEPS of `full_scale`.
const STEPS: f64 = 1000.0;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    values: &[f64],
    full_scale: f64,
    color: Color,
    annotation: &str,
) {
    let block = Block::default()
        .title(Line::styled(format!(" {title} "), theme::title_style()))
        .title_bottom(Line::styled(
            format!(" {annotation} "),
            Style::default().fg(color),
        ))
        .borders(Borders::ALL)
        .border_style(theme::border_style());

    let data = scale(values, full_scale);
    let sparkline = Sparkline::default()
        .block(block)
        .data(&data)
        .max(STEPS as u64)
        .style(Style::default().fg(color));

    frame.render_widget(sparkline, area);
}

fn scale(values: &[f64], full_scale: f64) -> Vec<u64> {
    if full_scale <= 0.0 {
        return vec![0; values.len()];
    }
    values
        .iter()
        .map(|v| (v / full_scale * STEPS).clamp(0.0, STEPS).round() as u64)
        .collect()
}
