use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent};
use std::time::Duration;

use crate::dashboard::trend::TrendPeriod;

pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Tick,
    Resize,
}

pub fn poll_event(timeout: Duration) -> color_eyre::Result<AppEvent> {
    if event::poll(timeout)? {
        match event::read()? {
            // Some terminals report releases too; act on presses only.
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(AppEvent::Key(key)),
            Event::Mouse(mouse) => Ok(AppEvent::Mouse(mouse)),
            Event::Resize(_, _) => Ok(AppEvent::Resize),
            _ => Ok(AppEvent::Tick),
        }
    } else {
        Ok(AppEvent::Tick)
    }
}

/// What a key press asks the app to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleHelp,
    /// Zero-based position in the location bar.
    SelectLocation(usize),
    NextLocation,
    PrevLocation,
    NextView,
    PrevView,
    Period(TrendPeriod),
    Refresh,
    FasterRefresh,
    SlowerRefresh,
}

impl Action {
    pub fn from_key(key: KeyEvent) -> Option<Action> {
        let action = match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('?') => Action::ToggleHelp,
            KeyCode::Char(c @ '1'..='9') => Action::SelectLocation(c as usize - '1' as usize),
            KeyCode::Char('l') | KeyCode::Right => Action::NextLocation,
            KeyCode::Char('h') | KeyCode::Left => Action::PrevLocation,
            KeyCode::Tab => Action::NextView,
            KeyCode::BackTab => Action::PrevView,
            KeyCode::Char('d') => Action::Period(TrendPeriod::Day),
            KeyCode::Char('w') => Action::Period(TrendPeriod::Week),
            KeyCode::Char('m') => Action::Period(TrendPeriod::Month),
            KeyCode::Char('r') => Action::Refresh,
            KeyCode::Char('+') | KeyCode::Char('=') => Action::FasterRefresh,
            KeyCode::Char('-') => Action::SlowerRefresh,
            _ => return None,
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn number_keys_pick_locations() {
        assert_eq!(
            Action::from_key(press(KeyCode::Char('1'))),
            Some(Action::SelectLocation(0))
        );
        assert_eq!(
            Action::from_key(press(KeyCode::Char('9'))),
            Some(Action::SelectLocation(8))
        );
        assert_eq!(Action::from_key(press(KeyCode::Char('0'))), None);
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Action::from_key(key), Some(Action::Quit));
        assert_eq!(Action::from_key(press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn period_keys() {
        assert_eq!(
            Action::from_key(press(KeyCode::Char('w'))),
            Some(Action::Period(TrendPeriod::Week))
        );
        assert_eq!(
            Action::from_key(press(KeyCode::Char('m'))),
            Some(Action::Period(TrendPeriod::Month))
        );
    }
}
