use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::dashboard::trend::{TrendPeriod, TrendSeries};
use crate::ui::theme;
use crate::ui::widgets::sparkline_panel;

pub fn render(frame: &mut Frame, area: Rect, series: &TrendSeries, location_name: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let mut spans = vec![Span::styled(format!(" {location_name} "), theme::title_style())];
    for period in TrendPeriod::ALL {
        spans.push(Span::raw(" "));
        let style = if period == series.period {
            theme::active_tab_style()
        } else {
            theme::inactive_tab_style()
        };
        spans.push(Span::styled(
            format!(" {}:{} ", period.key(), period.label()),
            style,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    let span = match (series.labels.first(), series.labels.last()) {
        (Some(first), Some(last)) => format!("{first} .. {last}"),
        _ => String::new(),
    };

    let panels = [
        ("Temperature Trends", &series.temperature, 50.0, "°C", theme::PEACH),
        ("Gas Levels", &series.gas, 2.0, "%", theme::TEAL),
        ("Dust Levels", &series.dust, 2.0, " mg/m³", theme::YELLOW),
    ];
    for (i, (title, values, full_scale, unit, color)) in panels.into_iter().enumerate() {
        sparkline_panel::render(
            frame,
            chunks[1 + i],
            title,
            values,
            full_scale,
            color,
            &annotation(values, unit, &span),
        );
    }
}

fn annotation(values: &[f64], unit: &str, span: &str) -> String {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        return span.to_string();
    }
    format!("min {min:.1}{unit}  max {max:.1}{unit}  {span}")
}
