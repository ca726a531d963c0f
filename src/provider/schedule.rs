//! The `opsgenie_schedule` resource.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::schedule::{OwnerTeam, Participant, Rotation, Schedule, ScheduleRequest};
use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

use super::handler::ResourceHandler;
use super::team::clear_id;
use super::user::DEFAULT_TIMEZONE;
use super::{decode, stored_id, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_schedule";

#[derive(Debug, Deserialize)]
struct ScheduleConfig {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_timezone")]
    timezone: String,
    owner_team: String,
    #[serde(default)]
    rotation: Vec<RotationConfig>,
}

/// The identifying subset of state, enough for read and delete.
#[derive(Debug, Deserialize)]
struct ScheduleIdentity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RotationConfig {
    name: String,
    start_date: String,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    participant: Vec<ParticipantConfig>,
}

#[derive(Debug, Deserialize)]
struct ParticipantConfig {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn schedule_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("name", Attribute::required_string())
        .with_attribute("description", Attribute::optional_string())
        .with_attribute(
            "timezone",
            Attribute::optional_string().with_default(json!(DEFAULT_TIMEZONE)),
        )
        .with_attribute(
            "owner_team",
            Attribute::required_string()
                .with_description("Name of the team that owns this schedule"),
        )
        .with_block(
            "rotation",
            NestedBlock::list(
                Block::new()
                    .with_attribute("name", Attribute::required_string())
                    .with_attribute(
                        "start_date",
                        Attribute::required_string()
                            .with_description("RFC3339 timestamp, e.g. 2019-06-10T17:00:00Z"),
                    )
                    .with_attribute("end_date", Attribute::optional_string())
                    .with_attribute(
                        "type",
                        Attribute::required_string()
                            .with_description("Rotation cadence, one of daily, weekly or hourly"),
                    )
                    .with_block(
                        "participant",
                        // username and id are optional+computed: the API
                        // fills in whichever one the configuration omits,
                        // and plans carry those values forward.
                        NestedBlock::list(
                            Block::new()
                                .with_attribute("type", Attribute::required_string())
                                .with_attribute(
                                    "username",
                                    Attribute::optional_computed_string(),
                                )
                                .with_attribute("id", Attribute::optional_computed_string()),
                        ),
                    ),
            ),
        )
}

/// Check that a timestamp parses as RFC3339 before it is sent to the API,
/// which would otherwise accept and silently reinterpret malformed dates.
fn check_rfc3339(value: &str, field: &str) -> Result<(), ProviderError> {
    DateTime::parse_from_rfc3339(value).map_err(|e| {
        ProviderError::Validation(format!("{} is not a valid RFC3339 timestamp: {}", field, e))
    })?;
    Ok(())
}

fn expand(config: &ScheduleConfig) -> Result<ScheduleRequest, ProviderError> {
    let mut rotations = Vec::with_capacity(config.rotation.len());
    for rotation in &config.rotation {
        check_rfc3339(&rotation.start_date, "start_date")?;
        if let Some(end) = &rotation.end_date {
            check_rfc3339(end, "end_date")?;
        }
        let kind = validators::rotation_type(&rotation.kind)?.to_string();

        let mut participants = Vec::with_capacity(rotation.participant.len());
        for participant in &rotation.participant {
            participants.push(Participant {
                kind: validators::participant_type(&participant.kind)?.to_string(),
                id: participant.id.clone(),
                username: participant.username.clone(),
            });
        }

        rotations.push(Rotation {
            name: rotation.name.clone(),
            start_date: rotation.start_date.clone(),
            end_date: rotation.end_date.clone(),
            kind,
            participants,
        });
    }

    Ok(ScheduleRequest {
        name: config.name.clone(),
        description: config.description.clone(),
        timezone: Some(config.timezone.clone()),
        owner_team: Some(OwnerTeam {
            id: None,
            name: Some(config.owner_team.clone()),
        }),
        rotations,
    })
}

// Absent optionals flatten to null so the state diffs clean against an
// unchanged configuration.
fn flatten(schedule: &Schedule) -> Value {
    json!({
        "id": schedule.id,
        "name": schedule.name,
        "description": schedule.description,
        "timezone": schedule.timezone.clone().unwrap_or_else(default_timezone),
        "owner_team": schedule.owner_team.as_ref().and_then(|t| t.name.clone()),
        "rotation": schedule.rotations.iter().map(|r| json!({
            "name": r.name,
            "start_date": r.start_date,
            "end_date": r.end_date,
            "type": r.kind,
            "participant": r.participants.iter().map(|p| json!({
                "type": p.kind,
                "username": p.username,
                "id": p.id,
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    })
}

/// Handler for `opsgenie_schedule`.
pub struct ScheduleResource;

#[async_trait::async_trait]
impl ResourceHandler for ScheduleResource {
    fn schema(&self) -> Schema {
        schedule_schema()
    }

    async fn create(
        &self,
        client: &OpsgenieClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let config: ScheduleConfig = decode(&planned, TYPE_NAME)?;
        let request = expand(&config)?;
        info!(name = %config.name, "creating schedule");

        let created = client.schedules.create(&request).await?;
        let schedule = client.schedules.get(&created.id).await?;
        info!(id = %schedule.id, name = %schedule.name, "created schedule");
        Ok(flatten(&schedule))
    }

    async fn read(&self, client: &OpsgenieClient, state: Value) -> Result<Value, ProviderError> {
        let identity: ScheduleIdentity = decode(&state, TYPE_NAME)?;
        let result = match stored_id(&identity.id) {
            Some(id) => client.schedules.get(id).await,
            None => client.schedules.get_by_name(&identity.name).await,
        };

        match result {
            Ok(schedule) => Ok(flatten(&schedule)),
            Err(e) if e.is_not_found() => {
                warn!(name = %identity.name, "schedule no longer exists, clearing id");
                Ok(clear_id(state))
            }
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        client: &OpsgenieClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let prior_identity: ScheduleIdentity = decode(&prior, TYPE_NAME)?;
        let config: ScheduleConfig = decode(&planned, TYPE_NAME)?;
        let id = stored_id(&config.id)
            .or_else(|| stored_id(&prior_identity.id))
            .ok_or_else(|| {
                ProviderError::Configuration("schedule id missing from state".to_string())
            })?
            .to_string();
        let request = expand(&config)?;
        info!(id = %id, name = %config.name, "updating schedule");

        client.schedules.update(&id, &request).await?;
        let schedule = client.schedules.get(&id).await?;
        Ok(flatten(&schedule))
    }

    async fn delete(&self, client: &OpsgenieClient, state: Value) -> Result<(), ProviderError> {
        let identity: ScheduleIdentity = decode(&state, TYPE_NAME)?;
        let id = stored_id(&identity.id).ok_or_else(|| {
            ProviderError::Configuration("schedule id missing from state".to_string())
        })?;
        info!(id = %id, name = %identity.name, "deleting schedule");
        client.schedules.delete(id).await
    }
}
