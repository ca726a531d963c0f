//! The `opsgenie_user` data source: look up an existing user by username.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

use super::handler::DataSourceHandler;
use super::{decode, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_user";

#[derive(Debug, Deserialize)]
struct UserQuery {
    username: String,
}

fn data_user_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "username",
            Attribute::required_string().with_validator(validators::validate_username),
        )
        .with_attribute("full_name", Attribute::computed_string())
        .with_attribute("role", Attribute::computed_string())
        .with_attribute("locale", Attribute::computed_string())
        .with_attribute("timezone", Attribute::computed_string())
}

/// Handler for the `opsgenie_user` data source.
pub struct UserDataSource;

#[async_trait::async_trait]
impl DataSourceHandler for UserDataSource {
    fn schema(&self) -> Schema {
        data_user_schema()
    }

    async fn read(&self, client: &OpsgenieClient, config: Value) -> Result<Value, ProviderError> {
        let query: UserQuery = decode(&config, TYPE_NAME)?;
        info!(username = %query.username, "reading user data source");

        let user = client.users.get(&query.username).await?;
        Ok(json!({
            "id": user.id,
            "username": user.username,
            "full_name": user.full_name,
            "role": user.role.as_ref().map(|r| r.name.clone()).unwrap_or_default(),
            "locale": user.locale.clone().unwrap_or_default(),
            "timezone": user.time_zone.clone().unwrap_or_default(),
        }))
    }
}
