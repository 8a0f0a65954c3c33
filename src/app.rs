use chrono::Utc;
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{MAX_REFRESH_MS, MIN_REFRESH_MS};
use crate::dashboard::trend::{self, TrendPeriod, TrendSeries};
use crate::dashboard::{Dashboard, Tick};
use crate::event::{self, Action, AppEvent};
use crate::ui::header;
use crate::ui::layout::{LOCATION_ROW, TAB_ROW};
use crate::ui::tabs::Tab;

const RATE_STEP_MS: u64 = 1000;

pub struct App {
    pub running: bool,
    pub current_tab: Tab,
    pub dashboard: Dashboard,
    pub refresh_rate: Duration,
    pub trend: TrendSeries,
    pub show_help: bool,
    rng: SmallRng,
}

impl App {
    pub fn new(dashboard: Dashboard, refresh_rate: Duration) -> Self {
        let mut rng = SmallRng::from_rng(&mut rand::rng());
        let trend = trend::generate(
            TrendPeriod::Day,
            Utc::now(),
            dashboard.selected_reading(),
            &mut rng,
        );

        Self {
            running: true,
            current_tab: Tab::Overview,
            dashboard,
            refresh_rate,
            trend,
            show_help: false,
            rng,
        }
    }

    pub fn run(
        &mut self,
        terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<std::io::Stdout>>,
    ) -> color_eyre::Result<()> {
        let mut last_refresh = Instant::now();
        let poll_timeout = Duration::from_millis(250);

        while self.running {
            terminal.draw(|frame| crate::ui::render(frame, self))?;

            match event::poll_event(poll_timeout)? {
                AppEvent::Key(key) => {
                    if self.show_help {
                        self.show_help = false;
                    } else if let Some(action) = Action::from_key(key) {
                        if action == Action::Refresh {
                            last_refresh = Instant::now();
                        }
                        self.handle_action(action);
                    }
                }
                AppEvent::Mouse(mouse) => self.handle_mouse(mouse),
                AppEvent::Resize => {}
                AppEvent::Tick => {}
            }

            // Periodic refresh; ticks during an outstanding fetch are folded into it.
            if last_refresh.elapsed() >= self.refresh_rate {
                self.dashboard.request_refresh();
                last_refresh = Instant::now();
            }
            self.dashboard.poll_refresh();
        }

        info!(
            coalesced = self.dashboard.coalesced_ticks(),
            "monitor stopped"
        );
        Ok(())
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::SelectLocation(index) => {
                self.change_location(|d| {
                    d.select_index(index);
                });
            }
            Action::NextLocation => self.change_location(Dashboard::select_next),
            Action::PrevLocation => self.change_location(Dashboard::select_prev),
            Action::NextView => self.current_tab = self.current_tab.next(),
            Action::PrevView => self.current_tab = self.current_tab.prev(),
            Action::Period(period) => self.regenerate_trend(period),
            Action::Refresh => {
                if let Tick::Coalesced = self.dashboard.request_refresh() {
                    debug!("manual refresh folded into the outstanding fetch");
                }
            }
            Action::FasterRefresh => {
                let ms = self.refresh_rate.as_millis() as u64;
                self.set_refresh_rate(ms.saturating_sub(RATE_STEP_MS).max(MIN_REFRESH_MS));
            }
            Action::SlowerRefresh => {
                let ms = self.refresh_rate.as_millis() as u64;
                self.set_refresh_rate((ms + RATE_STEP_MS).min(MAX_REFRESH_MS));
            }
        }
    }

    fn set_refresh_rate(&mut self, ms: u64) {
        let rate = Duration::from_millis(ms);
        if rate != self.refresh_rate {
            info!(refresh_ms = ms, "refresh rate changed");
            self.refresh_rate = rate;
        }
    }

    fn change_location(&mut self, select: impl FnOnce(&mut Dashboard)) {
        let before = self.dashboard.selected().cloned();
        select(&mut self.dashboard);
        if self.dashboard.selected() != before.as_ref() {
            self.regenerate_trend(self.trend.period);
        }
    }

    fn regenerate_trend(&mut self, period: TrendPeriod) {
        self.trend = trend::generate(
            period,
            Utc::now(),
            self.dashboard.selected_reading(),
            &mut self.rng,
        );
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.show_help {
            if matches!(mouse.kind, MouseEventKind::Down(_)) {
                self.show_help = false;
            }
            return;
        }

        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            match mouse.row {
                LOCATION_ROW => {
                    if let Some(index) =
                        header::location_at(self.dashboard.locations(), mouse.column)
                    {
                        self.handle_action(Action::SelectLocation(index));
                    }
                }
                TAB_ROW => {
                    if let Some(tab) = header::tab_at(mouse.column) {
                        self.current_tab = tab;
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Settings;
    use crate::source::sqlite::tests::seeded;
    use crate::source::LocationId;
    use crossterm::event::KeyModifiers;
    use std::sync::Arc;

    fn app() -> App {
        let dashboard = Dashboard::connect(Arc::new(seeded()), Settings::default()).unwrap();
        App::new(dashboard, Duration::from_millis(5000))
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn starts_on_first_location_by_name_with_day_trend() {
        let app = app();
        // "Haulage Drift" sorts first.
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(2)));
        assert_eq!(app.current_tab, Tab::Overview);
        assert_eq!(app.trend.period, TrendPeriod::Day);
        assert_eq!(app.trend.labels.len(), 24);
    }

    #[test]
    fn location_keys_change_selection() {
        let mut app = app();
        app.handle_action(Action::SelectLocation(1));
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(1)));

        app.handle_action(Action::SelectLocation(8));
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(1)));

        app.handle_action(Action::NextLocation);
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(3)));
        app.handle_action(Action::NextLocation);
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(2)));
    }

    #[test]
    fn period_switch_regenerates_series() {
        let mut app = app();
        app.handle_action(Action::Period(TrendPeriod::Month));
        assert_eq!(app.trend.period, TrendPeriod::Month);
        assert_eq!(app.trend.gas.len(), 30);

        app.handle_action(Action::Period(TrendPeriod::Week));
        assert_eq!(app.trend.dust.len(), 7);
    }

    #[test]
    fn refresh_rate_is_clamped() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_action(Action::FasterRefresh);
        }
        assert_eq!(app.refresh_rate, Duration::from_millis(MIN_REFRESH_MS));
        for _ in 0..100 {
            app.handle_action(Action::SlowerRefresh);
        }
        assert_eq!(app.refresh_rate, Duration::from_millis(MAX_REFRESH_MS));
    }

    #[test]
    fn views_cycle_both_ways() {
        let mut app = app();
        app.handle_action(Action::PrevView);
        assert_eq!(app.current_tab, Tab::Alerts);
        app.handle_action(Action::NextView);
        assert_eq!(app.current_tab, Tab::Overview);
    }

    #[test]
    fn clicks_select_locations_and_tabs() {
        let mut app = app();
        // " Locations:" then " 1:Haulage Drift " (17 wide) then " 2:Level 1 North "
        app.handle_mouse(click(31, LOCATION_ROW));
        assert_eq!(app.dashboard.selected(), Some(&LocationId::from(1)));

        app.handle_mouse(click(14, TAB_ROW));
        assert_eq!(app.current_tab, Tab::Trends);
    }

    #[test]
    fn help_and_quit() {
        let mut app = app();
        app.handle_action(Action::ToggleHelp);
        assert!(app.show_help);
        app.handle_mouse(click(0, 10));
        assert!(!app.show_help);

        app.handle_action(Action::Quit);
        assert!(!app.running);
    }

    #[test]
    fn manual_refresh_applies_in_background() {
        let mut app = app();
        app.handle_action(Action::Refresh);
        app.handle_action(Action::Refresh);
        assert_eq!(app.dashboard.coalesced_ticks(), 1);
        assert!(app.dashboard.wait_for_refresh(Duration::from_secs(5)));
        assert!(!app.dashboard.is_stale());
    }
}
