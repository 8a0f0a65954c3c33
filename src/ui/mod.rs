pub mod footer;
pub mod header;
pub mod help;
pub mod layout;
pub mod tabs;
pub mod theme;
pub mod widgets;

use ratatui::Frame;

use crate::app::App;
use tabs::Tab;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let app_layout = layout::compute_layout(area);

    header::render(frame, app_layout.header, app);

    match app.current_tab {
        Tab::Overview => tabs::overview::render(frame, app_layout.body, &app.dashboard),
        Tab::Trends => {
            let location = app.dashboard.current_display().location_name;
            tabs::trends::render(frame, app_layout.body, &app.trend, &location)
        }
        Tab::Alerts => tabs::alerts::render(frame, app_layout.body, &app.dashboard),
    }

    footer::render(frame, app_layout.footer, app.current_tab, app.refresh_rate);

    if app.show_help {
        help::render(frame, area);
    }
}
