//! Reservation Form
//!
//! Core of a four-step clinic reservation form that runs inside a messaging
//! app mini-app. The user picks a visit type and treatment menu, then a date
//! and time slot, enters contact details and confirms. The finished booking
//! is POSTed as JSON to a webhook.
//!
//! # Modules
//!
//! - `services::controller`: `FormController`, the step state machine any UI drives
//! - `services::validation`: field and per-step validation with configurable messages
//! - `services::payload`: builds the webhook document with `+09:00` timestamps
//! - `client`: reqwest-backed webhook and availability clients
//! - `config`: externally supplied menus, limits, hours and messages
//! - `identity`: user identifier and request source handed over by the host app

pub mod cli;
pub mod client;
pub mod config;
pub mod identity;
pub mod models;
pub mod services;

#[cfg(test)]
mod tests;

// Re-export the main API types for ease of use
pub use client::{AvailabilityClient, ReservationTransport, TransportError, WebhookClient};
pub use config::{ConfigError, FormConfig};
pub use models::common::{SessionContext, Source};
pub use models::payload::ReservationPayload;
pub use models::reservation::{ReservationDraft, Step, VisitType};
pub use services::controller::{FormController, SelectionError, SubmitOutcome};
pub use services::validation::{Field, Rule, ValidationResult, Validator};
