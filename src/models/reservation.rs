use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::menu::MenuItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitType {
    First,
    Revisit,
}

impl VisitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::First => "first",
            VisitType::Revisit => "revisit",
        }
    }
}

impl fmt::Display for VisitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(VisitType::First),
            "revisit" => Ok(VisitType::Revisit),
            other => Err(format!("unknown visit type '{}'", other)),
        }
    }
}

/// Position of the form flow.
///
/// `Completed` and `Failed` are only reachable through submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    MenuSelection,
    DateTime,
    CustomerInfo,
    Confirm,
    Completed,
    Failed,
}

impl Step {
    pub const TOTAL: u8 = 4;

    // 1-based number shown in the step indicator, None once the flow has ended
    pub fn number(&self) -> Option<u8> {
        match self {
            Step::MenuSelection => Some(1),
            Step::DateTime => Some(2),
            Step::CustomerInfo => Some(3),
            Step::Confirm => Some(4),
            Step::Completed | Step::Failed => None,
        }
    }

    pub fn next(&self) -> Option<Step> {
        match self {
            Step::MenuSelection => Some(Step::DateTime),
            Step::DateTime => Some(Step::CustomerInfo),
            Step::CustomerInfo => Some(Step::Confirm),
            _ => None,
        }
    }

    pub fn previous(&self) -> Option<Step> {
        match self {
            Step::DateTime => Some(Step::MenuSelection),
            Step::CustomerInfo => Some(Step::DateTime),
            Step::Confirm => Some(Step::CustomerInfo),
            _ => None,
        }
    }

    /// Step indicator text, e.g. "ステップ 2 / 4".
    pub fn progress_label(&self) -> Option<String> {
        self.number()
            .map(|n| format!("ステップ {} / {}", n, Step::TOTAL))
    }
}

// The chosen treatment. Kept as one value so id, name and duration change together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSelection {
    pub menu_id: String,
    pub menu_name: String,
    pub duration_minutes: u32,
}

impl From<&MenuItem> for MenuSelection {
    fn from(menu: &MenuItem) -> Self {
        Self {
            menu_id: menu.id.clone(),
            menu_name: menu.name.clone(),
            duration_minutes: menu.duration_min,
        }
    }
}

/// The in-progress reservation for the active session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    pub visit_type: Option<VisitType>,
    pub menu: Option<MenuSelection>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveTime>,
    pub customer_name: String,
    pub phone: String,
    pub symptom_note: String,
    pub memo: String,
    pub(crate) submission_in_flight: bool,
}

impl ReservationDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn menu_id(&self) -> Option<&str> {
        self.menu.as_ref().map(|m| m.menu_id.as_str())
    }

    pub fn is_submitting(&self) -> bool {
        self.submission_in_flight
    }
}
