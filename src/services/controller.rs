use chrono::{NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::{AvailabilitySource, ReservationTransport};
use crate::config::FormConfig;
use crate::models::common::SessionContext;
use crate::models::menu::MenuItem;
use crate::models::payload::ReservationPayload;
use crate::models::reservation::{MenuSelection, ReservationDraft, Step, VisitType};
use crate::services::availability::AvailabilityTracker;
use crate::services::confirmation::{CompletionSummary, Confirmation};
use crate::services::payload::build_payload;
use crate::services::time_slots::{
    format_slot, is_within_window, selectable_dates, time_slots, today_in_tokyo, SelectableDate,
};
use crate::services::validation::{Field, Rule, ValidationResult, Validator};

/// A command was rejected and the draft left untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("choose a visit type before picking a menu")]
    VisitTypeNotChosen,
    #[error("menu '{0}' is not offered for this visit type")]
    UnknownMenu(String),
    #[error("{0} is outside the bookable window")]
    DateOutOfWindow(NaiveDate),
    #[error("{0} is not one of the bookable time slots")]
    UnknownSlot(String),
    #[error("{0} is already taken")]
    SlotUnavailable(String),
    #[error("the form cannot be edited at this point ({0:?})")]
    Locked(Step),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed,
    Failed,
    /// Another submission is still in flight; nothing was sent
    AlreadyInFlight,
    /// Submitting is only possible from the confirmation step or after a failure
    NotReady(Step),
    /// The draft no longer passes validation; nothing was sent
    Invalid,
}

// Holds the in-flight flag for the duration of a transport call and clears it
// on drop, including when the submit future itself is dropped mid-flight.
struct InFlightGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> InFlightGuard<'a> {
    fn engage(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}

/// Drives one reservation session through the four form steps.
///
/// Every UI event maps to one command on this type; the UI layer then reads
/// back the step, errors and derived views it needs to render.
pub struct FormController {
    config: Arc<FormConfig>,
    session: SessionContext,
    transport: Arc<dyn ReservationTransport>,
    availability: AvailabilityTracker,
    draft: ReservationDraft,
    step: Step,
    errors: ValidationResult,
    today: NaiveDate,
    confirmation: Option<Confirmation>,
    submitted: Option<ReservationPayload>,
}

impl FormController {
    pub fn new(
        config: Arc<FormConfig>,
        session: SessionContext,
        transport: Arc<dyn ReservationTransport>,
    ) -> Self {
        let today = today_in_tokyo(Utc::now());
        info!(
            "New reservation session started (source: {}, date window from {})",
            session.source, today
        );

        Self {
            config,
            session,
            transport,
            availability: AvailabilityTracker::disabled(),
            draft: ReservationDraft::new(),
            step: Step::MenuSelection,
            errors: ValidationResult::new(),
            today,
            confirmation: None,
            submitted: None,
        }
    }

    pub fn with_availability(mut self, source: Arc<dyn AvailabilitySource>) -> Self {
        self.availability = AvailabilityTracker::new(source);
        self
    }

    // Pins the first selectable day instead of reading the clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn draft(&self) -> &ReservationDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationResult {
        &self.errors
    }

    pub fn is_submitting(&self) -> bool {
        self.draft.is_submitting()
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn submitted_payload(&self) -> Option<&ReservationPayload> {
        self.submitted.as_ref()
    }

    pub fn completion_summary(&self) -> Option<CompletionSummary> {
        match (&self.submitted, &self.confirmation) {
            (Some(payload), Some(confirmation)) if self.step == Step::Completed => {
                Some(CompletionSummary::new(payload, confirmation))
            }
            _ => None,
        }
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.config)
    }

    // Only the input steps accept edits
    fn ensure_editable(&self) -> Result<(), SelectionError> {
        match self.step {
            Step::MenuSelection | Step::DateTime | Step::CustomerInfo
                if !self.draft.submission_in_flight =>
            {
                Ok(())
            }
            step => Err(SelectionError::Locked(step)),
        }
    }

    // ----- derived lists for rendering -----

    pub fn available_menus(&self) -> Vec<&MenuItem> {
        match self.draft.visit_type {
            Some(visit_type) => self.config.menus_for(visit_type),
            None => Vec::new(),
        }
    }

    pub fn selectable_dates(&self) -> Vec<SelectableDate> {
        selectable_dates(self.today, self.config.available_days)
    }

    pub fn time_slots(&self) -> Vec<NaiveTime> {
        time_slots(&self.config.business_hours)
    }

    /// Slot list paired with availability for the selected date.
    pub fn slot_availability(&self) -> Vec<(NaiveTime, bool)> {
        let slots = self.time_slots();
        match self.draft.selected_date {
            Some(date) => slots
                .into_iter()
                .map(|slot| (slot, self.availability.is_available(date, slot)))
                .collect(),
            None => slots.into_iter().map(|slot| (slot, true)).collect(),
        }
    }

    // ----- step 1 -----

    pub fn select_visit_type(&mut self, visit_type: VisitType) -> Result<(), SelectionError> {
        self.ensure_editable()?;

        if self.draft.visit_type != Some(visit_type) {
            debug!("Visit type changed to {}, clearing menu selection", visit_type);
            self.draft.visit_type = Some(visit_type);
            self.draft.menu = None;
        }

        self.errors.clear(Field::VisitType);
        self.errors.clear(Field::Menu);
        Ok(())
    }

    pub fn select_menu(&mut self, menu_id: &str) -> Result<(), SelectionError> {
        self.ensure_editable()?;

        let visit_type = self
            .draft
            .visit_type
            .ok_or(SelectionError::VisitTypeNotChosen)?;
        let menu = self
            .config
            .find_menu(visit_type, menu_id)
            .ok_or_else(|| SelectionError::UnknownMenu(menu_id.to_string()))?;

        debug!("Menu {} selected ({} minutes)", menu.id, menu.duration_min);
        self.draft.menu = Some(MenuSelection::from(menu));
        self.errors.clear(Field::Menu);
        Ok(())
    }

    // ----- step 2 -----

    pub fn select_date(&mut self, date: NaiveDate) -> Result<(), SelectionError> {
        self.ensure_editable()?;

        if !is_within_window(date, self.today, self.config.available_days) {
            return Err(SelectionError::DateOutOfWindow(date));
        }

        debug!("Date {} selected", date);
        self.draft.selected_date = Some(date);
        self.errors.clear(Field::Date);

        // Fire and forget, the flow never waits on it
        self.availability.request(date);
        Ok(())
    }

    pub fn select_time(&mut self, time: NaiveTime) -> Result<(), SelectionError> {
        self.ensure_editable()?;

        if !self.time_slots().contains(&time) {
            return Err(SelectionError::UnknownSlot(format_slot(time)));
        }

        self.refresh_availability();
        if let Some(date) = self.draft.selected_date {
            if !self.availability.is_available(date, time) {
                return Err(SelectionError::SlotUnavailable(format_slot(time)));
            }
        }

        debug!("Time {} selected", format_slot(time));
        self.draft.selected_time = Some(time);
        self.errors.clear(Field::Time);
        Ok(())
    }

    /// Pick up a finished availability lookup without waiting.
    pub fn poll_availability(&mut self) {
        self.refresh_availability();
    }

    /// Wait for a pending availability lookup. Only for callers that want to.
    pub async fn settle_availability(&mut self) {
        self.availability.settle().await;
        self.drop_unavailable_time();
    }

    pub fn availability_pending(&self) -> bool {
        self.availability.is_pending()
    }

    fn refresh_availability(&mut self) {
        self.availability.poll();
        self.drop_unavailable_time();
    }

    // A lookup can land after the time was picked. A slot it rules out is
    // cleared and the form goes back to step 2 if it had moved past it.
    fn drop_unavailable_time(&mut self) {
        if matches!(self.step, Step::Completed | Step::Failed) {
            return;
        }
        let (Some(date), Some(time)) = (self.draft.selected_date, self.draft.selected_time) else {
            return;
        };
        if self.availability.is_available(date, time) {
            return;
        }

        warn!(
            "Selected time {} on {} is no longer available, clearing it",
            format_slot(time),
            date
        );
        self.draft.selected_time = None;
        let message = self.config.error_messages.message(Field::Time, Rule::Required);
        self.errors.insert(Field::Time, message);

        if matches!(self.step, Step::CustomerInfo | Step::Confirm) {
            self.enter(Step::DateTime);
        }
    }

    // ----- step 3 -----

    pub fn set_customer_name(&mut self, value: impl Into<String>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.draft.customer_name = value.into();
        self.errors.clear(Field::Name);
        Ok(())
    }

    pub fn set_phone(&mut self, value: impl Into<String>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.draft.phone = value.into();
        self.errors.clear(Field::Phone);
        Ok(())
    }

    // Free-text fields are re-checked on every change so the limit shows immediately
    pub fn set_symptom_note(&mut self, value: impl Into<String>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.draft.symptom_note = value.into();
        self.refresh_field_error(Field::SymptomNote);
        Ok(())
    }

    pub fn set_memo(&mut self, value: impl Into<String>) -> Result<(), SelectionError> {
        self.ensure_editable()?;
        self.draft.memo = value.into();
        self.refresh_field_error(Field::Memo);
        Ok(())
    }

    fn refresh_field_error(&mut self, field: Field) {
        self.errors.clear(field);
        if let Err(message) = self.validator().validate_field(field, &self.draft) {
            self.errors.insert(field, message);
        }
    }

    /// Validate one field and surface the result, e.g. when the input loses focus.
    pub fn check_field(&mut self, field: Field) -> Option<&str> {
        self.refresh_field_error(field);
        self.errors.error(field)
    }

    pub fn char_count(&self, field: Field) -> Option<(usize, usize)> {
        self.validator().char_count(field, &self.draft)
    }

    // ----- navigation -----

    /// Move forward if the current step validates.
    ///
    /// On failure the step is unchanged and the errors are both returned and
    /// kept for [`errors`](Self::errors).
    pub fn advance(&mut self) -> Result<Step, ValidationResult> {
        let Some(next) = self.step.next() else {
            debug!("No forward transition from {:?}", self.step);
            return Ok(self.step);
        };

        let result = self.validator().validate_step(self.step, &self.draft);
        if !result.is_valid() {
            info!(
                "Step {:?} refused to advance, invalid fields: {:?}",
                self.step,
                result.errors().keys().collect::<Vec<_>>()
            );
            self.errors = result.clone();
            return Err(result);
        }

        self.errors = ValidationResult::new();
        self.enter(next);
        Ok(self.step)
    }

    pub fn retreat(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.enter(previous);
        }
        self.step
    }

    /// Leave the confirmation step to correct the draft from the start.
    pub fn edit(&mut self) -> Step {
        if self.step == Step::Confirm {
            self.enter(Step::MenuSelection);
        }
        self.step
    }

    fn enter(&mut self, step: Step) {
        info!("Form moved from {:?} to {:?}", self.step, step);
        self.step = step;
        self.confirmation = if step == Step::Confirm {
            Confirmation::from_draft(&self.draft, &self.config)
        } else {
            None
        };
    }

    // ----- submission -----

    /// Send the reservation.
    ///
    /// From `Confirm` the whole draft is validated first. From `Failed` the
    /// same draft is resent as is, since it cannot be edited in between.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.draft.submission_in_flight {
            warn!("Submission already in flight, ignoring duplicate submit");
            return SubmitOutcome::AlreadyInFlight;
        }

        match self.step {
            Step::Confirm => {
                let result = self.validator().validate_all(&self.draft);
                if !result.is_valid() {
                    warn!("Draft failed validation at confirmation, not submitting");
                    self.errors = result;
                    return SubmitOutcome::Invalid;
                }
            }
            Step::Failed => info!("Retrying failed submission"),
            step => {
                debug!("Submit ignored in step {:?}", step);
                return SubmitOutcome::NotReady(step);
            }
        }

        let payload = match build_payload(&self.draft, &self.session, Utc::now()) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Could not build reservation payload: {}", e);
                self.step = Step::Failed;
                return SubmitOutcome::Failed;
            }
        };

        let result = {
            let _guard = InFlightGuard::engage(&mut self.draft.submission_in_flight);
            self.transport.post_reservation(&payload).await
        };

        match result {
            Ok(()) => {
                info!("Reservation submitted for {}", payload.start_date_time);
                self.submitted = Some(payload);
                self.step = Step::Completed;
                SubmitOutcome::Completed
            }
            Err(e) => {
                error!("Reservation submission failed: {}", e);
                self.step = Step::Failed;
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn retry(&mut self) -> SubmitOutcome {
        if self.step != Step::Failed {
            return SubmitOutcome::NotReady(self.step);
        }
        self.submit().await
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;
