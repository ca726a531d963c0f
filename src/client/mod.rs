//! OpsGenie REST API client.
//!
//! [`OpsgenieClient`] aggregates one sub-client per resource family, all
//! sharing a single HTTP transport. Construction validates the api key
//! format and fails fast; no request is made until a sub-client is used.
//! The client holds no mutable state and is safe to share behind an `Arc`.

mod http;

pub mod contact;
pub mod schedule;
pub mod team;
pub mod user;

use crate::error::ProviderError;
use http::HttpClient;

pub use contact::ContactApi;
pub use schedule::ScheduleApi;
pub use team::TeamApi;
pub use user::UserApi;

/// The fixed OpsGenie API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.opsgenie.com";

/// Aggregate client: one sub-client per resource family.
#[derive(Debug, Clone)]
pub struct OpsgenieClient {
    /// Teams API (`/v2/teams`).
    pub teams: TeamApi,
    /// Users API (`/v2/users`).
    pub users: UserApi,
    /// User contacts API (`/v2/users/{id}/contacts`).
    pub contacts: ContactApi,
    /// Schedules API (`/v2/schedules`).
    pub schedules: ScheduleApi,
}

impl OpsgenieClient {
    /// Build a client against the production OpsGenie endpoint.
    pub fn new(api_key: &str) -> Result<Self, ProviderError> {
        Self::with_endpoint(api_key, DEFAULT_API_URL)
    }

    /// Build a client against a custom endpoint. Used by tests to point at
    /// a mock server.
    pub fn with_endpoint(api_key: &str, base_url: &str) -> Result<Self, ProviderError> {
        let http = HttpClient::new(api_key, base_url)?;
        Ok(Self {
            teams: TeamApi::new(http.clone()),
            users: UserApi::new(http.clone()),
            contacts: ContactApi::new(http.clone()),
            schedules: ScheduleApi::new(http),
        })
    }
}
