//! Session identity supplied by the host messaging app.
//!
//! The host SDK itself is outside this crate. Whatever the host hands over
//! (a user identifier and the URL the mini-app was launched with) is turned
//! into a [`SessionContext`]. Missing or malformed values degrade to
//! defaults and are only logged.

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::models::common::{SessionContext, Source};

/// Pick the request source from a raw `source` query value.
pub fn source_from_param(value: Option<&str>, default: Source) -> Source {
    match value.map(str::parse::<Source>) {
        Some(Ok(source)) => source,
        Some(Err(e)) => {
            warn!("{}, falling back to {}", e, default);
            default
        }
        None => default,
    }
}

// Reads ?source=... from the launch URL
pub fn source_from_launch_url(launch_url: &str, default: Source) -> Source {
    match Url::parse(launch_url) {
        Ok(url) => {
            let value = url
                .query_pairs()
                .find(|(key, _)| key == "source")
                .map(|(_, value)| value.into_owned());
            source_from_param(value.as_deref(), default)
        }
        Err(e) => {
            warn!("Could not parse launch URL: {}", e);
            default
        }
    }
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, source: Source) -> Self {
        Self {
            user_id: user_id.into(),
            source,
        }
    }

    /// Build the context from whatever the host could provide.
    pub fn from_host(
        user_id: Option<String>,
        launch_url: Option<&str>,
        default_source: Source,
    ) -> Self {
        let user_id = match user_id {
            Some(id) if !id.trim().is_empty() => {
                debug!("User identifier supplied by host");
                id.trim().to_string()
            }
            _ => {
                info!("No user identifier available, submitting without one");
                String::new()
            }
        };

        let source = match launch_url {
            Some(url) => source_from_launch_url(url, default_source),
            None => default_source,
        };

        Self { user_id, source }
    }
}
