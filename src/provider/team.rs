//! The `opsgenie_team` resource.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::team::{MemberUser, Team, TeamMember, TeamRequest};
use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

use super::handler::ResourceHandler;
use super::{decode, stored_id, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_team";

#[derive(Debug, Deserialize)]
struct TeamConfig {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    member: Vec<MemberConfig>,
}

/// The identifying subset of state, enough for read and delete. Imported
/// state carries only the id, so nothing here is required.
#[derive(Debug, Deserialize)]
struct TeamIdentity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MemberConfig {
    username: String,
    #[serde(default = "default_member_role")]
    role: String,
}

fn default_member_role() -> String {
    "user".to_string()
}

fn team_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string()
                .with_description("Name of the team, alphanumeric and underscores only")
                .with_validator(validators::validate_team_name),
        )
        .with_attribute("description", Attribute::optional_string())
        .with_block(
            "member",
            NestedBlock::list(
                Block::new()
                    .with_attribute(
                        "username",
                        Attribute::required_string()
                            .with_validator(validators::validate_username),
                    )
                    .with_attribute(
                        "role",
                        Attribute::optional_string()
                            .with_default(json!("user"))
                            .with_validator(validators::validate_member_role),
                    ),
            ),
        )
}

/// Resolve each member's username to a user id via the users list.
///
/// A username with no matching user is an explicit `NotFound` naming the
/// username; it surfaces to the host before any team mutation happens.
async fn expand_members(
    client: &OpsgenieClient,
    members: &[MemberConfig],
) -> Result<Vec<TeamMember>, ProviderError> {
    if members.is_empty() {
        return Ok(Vec::new());
    }
    let users = client.users.list().await?;
    members
        .iter()
        .map(|member| {
            let user = users
                .iter()
                .find(|u| u.username == member.username)
                .ok_or_else(|| {
                    ProviderError::NotFound(format!(
                        "no user found with username '{}'",
                        member.username
                    ))
                })?;
            Ok(TeamMember {
                user: MemberUser {
                    id: user.id.clone(),
                    username: None,
                },
                role: Some(member.role.to_lowercase()),
            })
        })
        .collect()
}

// Optionals the remote omits flatten to null, never to "", so an unchanged
// configuration diffs clean against its own flattened state.
fn flatten(team: &Team) -> Value {
    json!({
        "id": team.id,
        "name": team.name,
        "description": team.description,
        "member": team.members.iter().map(|m| json!({
            "username": m.user.username,
            "role": m.role.clone().unwrap_or_else(default_member_role),
        })).collect::<Vec<_>>(),
    })
}

/// Handler for `opsgenie_team`.
pub struct TeamResource;

#[async_trait::async_trait]
impl ResourceHandler for TeamResource {
    fn schema(&self) -> Schema {
        team_schema()
    }

    async fn create(
        &self,
        client: &OpsgenieClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let config: TeamConfig = decode(&planned, TYPE_NAME)?;
        info!(name = %config.name, "creating team");

        let members = expand_members(client, &config.member).await?;
        let created = client
            .teams
            .create(&TeamRequest {
                name: config.name.clone(),
                description: config.description.clone(),
                members,
            })
            .await?;

        let team = client.teams.get(&created.id).await?;
        info!(id = %team.id, name = %team.name, "created team");
        Ok(flatten(&team))
    }

    async fn read(&self, client: &OpsgenieClient, state: Value) -> Result<Value, ProviderError> {
        let identity: TeamIdentity = decode(&state, TYPE_NAME)?;
        let result = match stored_id(&identity.id) {
            Some(id) => client.teams.get(id).await,
            None => client.teams.get_by_name(&identity.name).await,
        };

        match result {
            Ok(team) => Ok(flatten(&team)),
            Err(e) if e.is_not_found() => {
                warn!(name = %identity.name, "team no longer exists, clearing id");
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
        let prior_identity: TeamIdentity = decode(&prior, TYPE_NAME)?;
        let config: TeamConfig = decode(&planned, TYPE_NAME)?;
        let id = stored_id(&config.id)
            .or_else(|| stored_id(&prior_identity.id))
            .ok_or_else(|| {
                ProviderError::Configuration("team id missing from state".to_string())
            })?
            .to_string();
        info!(id = %id, name = %config.name, "updating team");

        let members = expand_members(client, &config.member).await?;
        client
            .teams
            .update(
                &id,
                &TeamRequest {
                    name: config.name.clone(),
                    description: config.description.clone(),
                    members,
                },
            )
            .await?;

        let team = client.teams.get(&id).await?;
        Ok(flatten(&team))
    }

    async fn delete(&self, client: &OpsgenieClient, state: Value) -> Result<(), ProviderError> {
        let identity: TeamIdentity = decode(&state, TYPE_NAME)?;
        let id = stored_id(&identity.id).ok_or_else(|| {
            ProviderError::Configuration("team id missing from state".to_string())
        })?;
        info!(id = %id, name = %identity.name, "deleting team");
        client.teams.delete(id).await
    }
}

pub(super) fn clear_id(state: Value) -> Value {
    let mut state = state;
    if let Some(obj) = state.as_object_mut() {
        obj.insert("id".to_string(), Value::Null);
    }
    state
}
