//! The `opsgenie_team` data source: look up an existing team by name.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

use super::handler::DataSourceHandler;
use super::{decode, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_team";

#[derive(Debug, Deserialize)]
struct TeamQuery {
    name: String,
}

fn data_team_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "name",
            Attribute::required_string().with_validator(validators::validate_team_name),
        )
        .with_attribute("description", Attribute::computed_string())
        .with_block(
            "member",
            NestedBlock::list(
                Block::new()
                    .with_attribute("username", Attribute::computed_string())
                    .with_attribute("role", Attribute::computed_string()),
            ),
        )
}

/// Handler for the `opsgenie_team` data source.
pub struct TeamDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for TeamDataSource {
    fn schema(&self) -> Schema {
        data_team_schema()
    }

    async fn read(&self, client: &OpsgenieClient, config: Value) -> Result<Value, ProviderError> {
        let query: TeamQuery = decode(&config, TYPE_NAME)?;
        info!(name = %query.name, "reading team data source");

        let team = client.teams.get_by_name(&query.name).await?;
        Ok(json!({
            "id": team.id,
            "name": team.name,
            "description": team.description.clone().unwrap_or_default(),
            "member": team.members.iter().map(|m| json!({
                "username": m.user.username.clone().unwrap_or_default(),
                "role": m.role.clone().unwrap_or_else(|| "user".to_string()),
            })).collect::<Vec<_>>(),
        }))
    }
}
