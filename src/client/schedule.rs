//! Schedules API (`/v2/schedules`).

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use crate::error::ProviderError;

/// Reference to the team that owns a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTeam {
    /// Team id; present in read responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Team name; used to attach the owner on create and update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A rotation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant kind: `user`, `team`, `escalation` or `schedule`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced object id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Username, for `user` participants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A rotation within a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rotation {
    /// Rotation name.
    pub name: String,
    /// RFC3339 start of the rotation.
    pub start_date: String,
    /// RFC3339 end of the rotation, if bounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Rotation cadence: `daily`, `weekly` or `hourly`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Who takes part in the rotation.
    pub participants: Vec<Participant>,
}

/// A schedule as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,
    /// Schedule name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// IANA timezone name.
    #[serde(default)]
    pub timezone: Option<String>,
    /// The owning team.
    #[serde(default)]
    pub owner_team: Option<OwnerTeam>,
    /// Rotations.
    #[serde(default)]
    pub rotations: Vec<Rotation>,
}

/// Payload for create and update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// Schedule name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// IANA timezone name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// The owning team, referenced by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_team: Option<OwnerTeam>,
    /// Rotations.
    pub rotations: Vec<Rotation>,
}

/// Typed access to the schedules endpoints.
#[derive(Debug, Clone)]
pub struct ScheduleApi {
    http: HttpClient,
}

impl ScheduleApi {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create a schedule and return the created object.
    pub async fn create(&self, req: &ScheduleRequest) -> Result<Schedule, ProviderError> {
        self.http.post("/v2/schedules", req).await
    }

    /// Get a schedule by id.
    pub async fn get(&self, id: &str) -> Result<Schedule, ProviderError> {
        self.http
            .get(&format!("/v2/schedules/{}?identifierType=id", id))
            .await
    }

    /// Get a schedule by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Schedule, ProviderError> {
        self.http
            .get(&format!("/v2/schedules/{}?identifierType=name", name))
            .await
    }

    /// Update a schedule by id with a full payload.
    pub async fn update(&self, id: &str, req: &ScheduleRequest) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .http
            .patch(&format!("/v2/schedules/{}", id), req)
            .await?;
        Ok(())
    }

    /// Delete a schedule by id.
    pub async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.http
            .delete(&format!("/v2/schedules/{}?identifierType=id", id))
            .await
    }
}
