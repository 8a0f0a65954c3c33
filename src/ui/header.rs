use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::tabs::Tab;
use super::theme;
use crate::app::App;
use crate::dashboard::Phase;
use crate::source::Location;

const LOCATION_PREFIX: &str = " Locations:";

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(status_line(app)).style(theme::header_style()),
        chunks[0],
    );

    // Location bar
    let selected = app.dashboard.selected_index();
    let mut loc_spans = vec![Span::styled(LOCATION_PREFIX, theme::label_style())];
    for (i, label) in location_labels(app.dashboard.locations()).into_iter().enumerate() {
        loc_spans.push(Span::raw(" "));
        let style = if Some(i) == selected {
            theme::active_tab_style()
        } else {
            theme::inactive_tab_style()
        };
        loc_spans.push(Span::styled(label, style));
    }
    frame.render_widget(
        Paragraph::new(Line::from(loc_spans)).style(theme::header_style()),
        chunks[1],
    );

    // Tab bar
    let mut tab_spans = vec![];
    for (tab, label) in Tab::ALL.iter().zip(tab_labels()) {
        tab_spans.push(Span::raw(" "));
        if *tab == app.current_tab {
            tab_spans.push(Span::styled(label, theme::active_tab_style()));
        } else {
            tab_spans.push(Span::styled(label, theme::inactive_tab_style()));
        }
    }
    frame.render_widget(
        Paragraph::new(Line::from(tab_spans)).style(theme::header_style()),
        chunks[2],
    );
}

fn status_line(app: &App) -> Line<'static> {
    let mut spans = vec![
        Span::styled(" minemon ", theme::title_style()),
        Span::styled(format!("  {}", app.dashboard.source_label()), theme::value_style()),
    ];

    if let Some(err) = app.dashboard.last_error() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(" STALE ", theme::stale_style()));
        spans.push(Span::styled(format!(" {err}"), theme::label_style()));
    } else if let Some(at) = app.dashboard.last_success() {
        spans.push(Span::styled(
            format!("  updated {}s ago", at.elapsed().as_secs()),
            theme::label_style(),
        ));
    }
    if app.dashboard.phase() == Phase::Ready {
        let reporting = app.dashboard.snapshot().readings.len();
        spans.push(Span::styled(
            format!("  {reporting}/{} reporting", app.dashboard.locations().len()),
            theme::label_style(),
        ));
    }
    if app.dashboard.is_refreshing() {
        spans.push(Span::styled("  refreshing", theme::key_hint_style()));
    }
    Line::from(spans)
}

fn location_labels(locations: &[Location]) -> Vec<String> {
    locations
        .iter()
        .enumerate()
        .map(|(i, l)| format!(" {}:{} ", i + 1, l.name))
        .collect()
}

fn tab_labels() -> Vec<String> {
    Tab::ALL.iter().map(|t| format!(" {} ", t.label())).collect()
}

/// Index of the label under column `col`, given labels laid out from
/// `start` with one space before each.
fn hit(start: u16, labels: &[String], col: u16) -> Option<usize> {
    let mut x = start;
    for (i, label) in labels.iter().enumerate() {
        x += 1;
        let width = label.chars().count() as u16;
        if col >= x && col < x + width {
            return Some(i);
        }
        x += width;
    }
    None
}

pub fn location_at(locations: &[Location], col: u16) -> Option<usize> {
    hit(
        LOCATION_PREFIX.chars().count() as u16,
        &location_labels(locations),
        col,
    )
}

pub fn tab_at(col: u16) -> Option<Tab> {
    hit(0, &tab_labels(), col).and_then(|i| Tab::ALL.get(i).copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Dashboard, Settings};
    use crate::source::sqlite::tests::seeded;
    use crate::source::LocationId;
    use std::sync::Arc;
    use std::time::Duration;

    fn locations() -> Vec<Location> {
        vec![
            Location {
                id: LocationId::from("1"),
                name: "North".into(),
            },
            Location {
                id: LocationId::from("2"),
                name: "Drift".into(),
            },
        ]
    }

    #[test]
    fn location_click_targets() {
        // " Locations:" is 11 wide, then " " + " 1:North " (9) + " " + " 2:Drift " (9)
        let locs = locations();
        assert_eq!(location_at(&locs, 5), None);
        assert_eq!(location_at(&locs, 11), None);
        assert_eq!(location_at(&locs, 12), Some(0));
        assert_eq!(location_at(&locs, 20), Some(0));
        assert_eq!(location_at(&locs, 21), None);
        assert_eq!(location_at(&locs, 22), Some(1));
        assert_eq!(location_at(&locs, 31), None);
    }

    #[test]
    fn status_line_counts_reporting_locations() {
        let dashboard = Dashboard::connect(Arc::new(seeded()), Settings::default()).unwrap();
        let app = App::new(dashboard, Duration::from_millis(5000));
        let text: String = status_line(&app)
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect();
        // The sump has no readings.
        assert!(text.contains("2/3 reporting"), "{text}");
        assert!(!text.contains("STALE"));
    }

    #[test]
    fn tab_click_targets() {
        // " " + " Overview " (10) + " " + " Trends " (8) + " " + " Alerts "
        assert_eq!(tab_at(0), None);
        assert_eq!(tab_at(1), Some(Tab::Overview));
        assert_eq!(tab_at(12), Some(Tab::Trends));
        assert_eq!(tab_at(21), Some(Tab::Alerts));
    }
}
