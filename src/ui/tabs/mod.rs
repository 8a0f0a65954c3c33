#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Tab {
    Overview,
    Trends,
    Alerts,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Overview, Tab::Trends, Tab::Alerts];

    pub fn label(&self) -> &str {
        match self {
            Tab::Overview => "Overview",
            Tab::Trends => "Trends",
            Tab::Alerts => "Alerts",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Tab::Overview => 0,
            Tab::Trends => 1,
            Tab::Alerts => 2,
        }
    }

    pub fn next(&self) -> Tab {
        let idx = (self.index() + 1) % Tab::ALL.len();
        Tab::ALL[idx]
    }

    pub fn prev(&self) -> Tab {
        let idx = if self.index() == 0 {
            Tab::ALL.len() - 1
        } else {
            self.index() - 1
        };
        Tab::ALL[idx]
    }
}

pub mod alerts;
pub mod overview;
pub mod trends;
