use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Page currently selected by the operator. Drives the view-specific fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveView {
    #[default]
    Dashboard,
    History,
    Rules,
    Holders,
    Community,
}

impl FromStr for ActiveView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dashboard" | "stats" => Ok(ActiveView::Dashboard),
            "history" => Ok(ActiveView::History),
            "rules" => Ok(ActiveView::Rules),
            "holders" => Ok(ActiveView::Holders),
            "community" => Ok(ActiveView::Community),
            _ => Err(format!("Invalid view: {}", s)),
        }
    }
}

impl ActiveView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveView::Dashboard => "dashboard",
            ActiveView::History => "history",
            ActiveView::Rules => "rules",
            ActiveView::Holders => "holders",
            ActiveView::Community => "community",
        }
    }
}

/// Active view plus the holder page index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewSelection {
    pub view: ActiveView,
    pub holders_page: u64,
}
