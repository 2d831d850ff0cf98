use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use crate::models::common::SessionContext;
use crate::models::payload::ReservationPayload;
use crate::models::reservation::ReservationDraft;
use crate::services::time_slots::{format_instant, format_tokyo_timestamp};
use crate::services::validation::Field;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("draft has no value for {0}")]
    Missing(Field),
}

/// Build the webhook document from a draft.
///
/// Text fields are trimmed but not re-validated. The end time is the start
/// time plus the menu duration and may roll over into the next day.
pub fn build_payload(
    draft: &ReservationDraft,
    session: &SessionContext,
    submitted_at: DateTime<Utc>,
) -> Result<ReservationPayload, PayloadError> {
    let visit_type = draft.visit_type.ok_or(PayloadError::Missing(Field::VisitType))?;
    let menu = draft.menu.as_ref().ok_or(PayloadError::Missing(Field::Menu))?;
    let date = draft.selected_date.ok_or(PayloadError::Missing(Field::Date))?;
    let time = draft.selected_time.ok_or(PayloadError::Missing(Field::Time))?;

    let start = date.and_time(time);
    let end = start + Duration::minutes(menu.duration_minutes as i64);

    debug!(
        "Building payload for menu {} ({} minutes)",
        menu.menu_id, menu.duration_minutes
    );

    Ok(ReservationPayload {
        user_id: session.user_id.clone(),
        source: session.source,
        menu_id: menu.menu_id.clone(),
        menu_name: menu.menu_name.clone(),
        visit_type,
        start_date_time: format_tokyo_timestamp(start),
        end_date_time: format_tokyo_timestamp(end),
        duration_min: menu.duration_minutes,
        customer_name: draft.customer_name.trim().to_string(),
        phone: draft.phone.trim().to_string(),
        symptom_note: draft.symptom_note.trim().to_string(),
        memo: draft.memo.trim().to_string(),
        client_timestamp: format_instant(submitted_at),
    })
}

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;
