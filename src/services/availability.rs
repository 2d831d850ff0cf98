use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::client::{AvailabilitySource, TransportError};

type FetchResult = Result<Vec<NaiveTime>, TransportError>;

/// Tracks the best-effort free-slot lookup for the selected date.
///
/// Lookups run as detached tasks. Nothing waits on them: results are picked
/// up by [`poll`](Self::poll) when they are ready, and failures only leave
/// the slot set unknown.
pub struct AvailabilityTracker {
    source: Option<Arc<dyn AvailabilitySource>>,
    pending: Option<(NaiveDate, oneshot::Receiver<FetchResult>)>,
    known: Option<(NaiveDate, BTreeSet<NaiveTime>)>,
}

impl AvailabilityTracker {
    pub fn disabled() -> Self {
        Self {
            source: None,
            pending: None,
            known: None,
        }
    }

    pub fn new(source: Arc<dyn AvailabilitySource>) -> Self {
        Self {
            source: Some(source),
            pending: None,
            known: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a lookup for `date`, replacing any lookup still in flight.
    pub fn request(&mut self, date: NaiveDate) {
        let Some(source) = self.source.as_ref() else {
            return;
        };

        if self.known.as_ref().is_some_and(|(known_date, _)| *known_date != date) {
            self.known = None;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, skipping availability lookup");
                self.pending = None;
                return;
            }
        };

        let (tx, rx) = oneshot::channel();
        let fetch = source.fetch_slots(date);
        handle.spawn(async move {
            // The receiver is gone if another date was picked meanwhile
            let _ = tx.send(fetch.await);
        });

        debug!("Availability lookup started for {}", date);
        self.pending = Some((date, rx));
    }

    /// Apply a finished lookup, if any. Never blocks.
    pub fn poll(&mut self) {
        let Some((date, rx)) = self.pending.as_mut() else {
            return;
        };

        match rx.try_recv() {
            Ok(result) => {
                let date = *date;
                self.pending = None;
                self.apply(date, result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Closed) => {
                warn!("Availability lookup for {} ended without a result", date);
                self.pending = None;
            }
        }
    }

    /// Wait for the lookup in flight to finish and apply it.
    pub async fn settle(&mut self) {
        if let Some((date, rx)) = self.pending.take() {
            match rx.await {
                Ok(result) => self.apply(date, result),
                Err(_) => warn!("Availability lookup for {} ended without a result", date),
            }
        }
    }

    fn apply(&mut self, date: NaiveDate, result: FetchResult) {
        match result {
            Ok(slots) => {
                info!("{} free slots reported for {}", slots.len(), date);
                self.known = Some((date, slots.into_iter().collect()));
            }
            Err(e) => {
                warn!("Availability lookup for {} failed: {}", date, e);
            }
        }
    }

    pub fn slots_for(&self, date: NaiveDate) -> Option<&BTreeSet<NaiveTime>> {
        match &self.known {
            Some((known_date, slots)) if *known_date == date => Some(slots),
            _ => None,
        }
    }

    // Unknown availability counts as available
    pub fn is_available(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.slots_for(date)
            .map_or(true, |slots| slots.contains(&time))
    }
}
