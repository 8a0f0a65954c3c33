use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Rows of the header, top to bottom.
pub const STATUS_ROW: u16 = 0;
pub const LOCATION_ROW: u16 = 1;
pub const TAB_ROW: u16 = 2;

pub struct AppLayout {
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
}

pub fn compute_layout(area: Rect) -> AppLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status line, location bar, tab bar
            Constraint::Min(10),   // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    AppLayout {
        header: chunks[0],
        body: chunks[1],
        footer: chunks[2],
    }
}
