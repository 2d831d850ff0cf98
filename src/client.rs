use chrono::{NaiveDate, NaiveTime};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::FormConfig;
use crate::models::payload::ReservationPayload;
use crate::services::time_slots::parse_slot;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("endpoint responded with HTTP {0}")]
    Status(u16),
}

/// Sends a finished reservation somewhere.
///
/// The returned future owns everything it needs so the caller can keep
/// mutating its own state while the request is pending.
#[cfg_attr(test, mockall::automock)]
pub trait ReservationTransport: Send + Sync {
    fn post_reservation(
        &self,
        payload: &ReservationPayload,
    ) -> BoxFuture<'static, Result<(), TransportError>>;
}

/// Looks up which slots are still free on a date.
#[cfg_attr(test, mockall::automock)]
pub trait AvailabilitySource: Send + Sync {
    fn fetch_slots(&self, date: NaiveDate)
        -> BoxFuture<'static, Result<Vec<NaiveTime>, TransportError>>;
}

fn build_http_client() -> Result<Client, reqwest::Error> {
    Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Client for the reservation webhook
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    webhook_url: String,
}

impl WebhookClient {
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client()?,
            webhook_url: webhook_url.into(),
        })
    }

    pub fn from_config(config: &FormConfig) -> Result<Self, TransportError> {
        Self::new(config.webhook_url.clone())
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }
}

impl ReservationTransport for WebhookClient {
    fn post_reservation(
        &self,
        payload: &ReservationPayload,
    ) -> BoxFuture<'static, Result<(), TransportError>> {
        info!("Posting reservation for menu {} to webhook", payload.menu_id);
        debug!("Webhook URL: {}", self.webhook_url);

        // json() sets Content-Type: application/json
        let request = self.client.post(&self.webhook_url).json(payload);

        async move {
            let res = request.send().await?;
            let status = res.status();
            info!("Webhook responded with status: {}", status);

            if status.is_success() {
                Ok(())
            } else {
                Err(TransportError::Status(status.as_u16()))
            }
        }
        .boxed()
    }
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    slots: Vec<String>,
}

/// Client for the optional free-slot lookup endpoint
#[derive(Debug, Clone)]
pub struct AvailabilityClient {
    client: Client,
    api_url: String,
}

impl AvailabilityClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_http_client()?,
            api_url: api_url.into(),
        })
    }
}

impl AvailabilitySource for AvailabilityClient {
    fn fetch_slots(
        &self,
        date: NaiveDate,
    ) -> BoxFuture<'static, Result<Vec<NaiveTime>, TransportError>> {
        let date_param = date.format("%Y-%m-%d").to_string();
        debug!("Fetching available slots for {}", date_param);

        let request = self
            .client
            .get(&self.api_url)
            .query(&[("date", date_param.as_str())]);

        async move {
            let res = request.send().await?;
            let status = res.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }

            let body = res.json::<AvailabilityResponse>().await?;
            let slots = body
                .slots
                .iter()
                .filter_map(|raw| match parse_slot(raw) {
                    Ok(time) => Some(time),
                    Err(e) => {
                        warn!("Ignoring slot from availability API: {}", e);
                        None
                    }
                })
                .collect();
            Ok(slots)
        }
        .boxed()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;
