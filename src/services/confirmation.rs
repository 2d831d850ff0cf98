use std::fmt;

use crate::config::FormConfig;
use crate::models::payload::ReservationPayload;
use crate::models::reservation::ReservationDraft;
use crate::services::time_slots::{format_date_for_display, format_slot};

/// Read-only view of the draft shown on the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub visit_type_label: String,
    pub menu_name: String,
    pub date_label: String,
    pub time_label: String,
    pub duration_min: u32,
    pub customer_name: String,
    pub phone: String,
    // Optional notes are omitted from the view when empty
    pub symptom_note: Option<String>,
    pub memo: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Confirmation {
    // None while any of the step 1/2 selections is still missing
    pub fn from_draft(draft: &ReservationDraft, config: &FormConfig) -> Option<Self> {
        let visit_type = draft.visit_type?;
        let menu = draft.menu.as_ref()?;
        let date = draft.selected_date?;
        let time = draft.selected_time?;

        Some(Self {
            visit_type_label: config.visit_types.get(visit_type).name.clone(),
            menu_name: menu.menu_name.clone(),
            date_label: format_date_for_display(date),
            time_label: format_slot(time),
            duration_min: menu.duration_minutes,
            customer_name: draft.customer_name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            symptom_note: non_empty(&draft.symptom_note),
            memo: non_empty(&draft.memo),
        })
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "予約内容")?;
        writeln!(f, "  来院区分: {}", self.visit_type_label)?;
        writeln!(f, "  施術メニュー: {}", self.menu_name)?;
        writeln!(f, "  希望日時: {} {}〜", self.date_label, self.time_label)?;
        writeln!(f, "  所要時間（目安）: 約{}分", self.duration_min)?;
        writeln!(f, "お客様情報")?;
        writeln!(f, "  お名前: {}", self.customer_name)?;
        write!(f, "  電話番号: {}", self.phone)?;
        if let Some(note) = &self.symptom_note {
            write!(f, "\n  お悩みや症状: {}", note)?;
        }
        if let Some(memo) = &self.memo {
            write!(f, "\n  連絡事項: {}", memo)?;
        }
        Ok(())
    }
}

/// Short summary shown after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSummary {
    pub visit_and_menu: String,
    pub schedule: String,
    pub customer: String,
}

impl CompletionSummary {
    pub fn new(payload: &ReservationPayload, confirmation: &Confirmation) -> Self {
        Self {
            visit_and_menu: format!("{} - {}", confirmation.visit_type_label, payload.menu_name),
            schedule: format!("{} {}〜", confirmation.date_label, confirmation.time_label),
            customer: format!("{} 様", payload.customer_name),
        }
    }
}

impl fmt::Display for CompletionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.visit_and_menu)?;
        writeln!(f, "{}", self.schedule)?;
        write!(f, "{}", self.customer)
    }
}
