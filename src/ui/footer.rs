use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use std::time::Duration;

use super::tabs::Tab;
use super::theme;
use crate::util::format_interval;

pub fn render(frame: &mut Frame, area: Rect, current_tab: Tab, refresh_rate: Duration) {
    let mut hints = vec![
        Span::styled(" q", theme::key_hint_style()),
        Span::styled(" quit  ", theme::label_style()),
        Span::styled("?", theme::key_hint_style()),
        Span::styled(" help  ", theme::label_style()),
        Span::styled("Tab", theme::key_hint_style()),
        Span::styled(" view  ", theme::label_style()),
        Span::styled("1-9 h/l", theme::key_hint_style()),
        Span::styled(" location  ", theme::label_style()),
        Span::styled("r", theme::key_hint_style()),
        Span::styled(" refresh  ", theme::label_style()),
        Span::styled("+/-", theme::key_hint_style()),
        Span::styled(" rate  ", theme::label_style()),
    ];

    if current_tab == Tab::Trends {
        hints.extend([
            Span::styled("d/w/m", theme::key_hint_style()),
            Span::styled(" period", theme::label_style()),
        ]);
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(16)])
        .split(area);

    frame.render_widget(
        Paragraph::new(Line::from(hints)).style(theme::footer_style()),
        chunks[0],
    );

    let rate_line = Line::from(vec![
        Span::styled("refresh ", theme::label_style()),
        Span::styled(format!("{} ", format_interval(refresh_rate)), theme::value_style()),
    ]);
    frame.render_widget(
        Paragraph::new(rate_line)
            .alignment(Alignment::Right)
            .style(theme::footer_style()),
        chunks[1],
    );
}
