//! The `opsgenie_user` resource.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::user::{User, UserRequest, UserRole};
use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

use super::handler::ResourceHandler;
use super::team::clear_id;
use super::{decode, stored_id, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_user";

/// Locale applied when the configuration does not set one.
pub const DEFAULT_LOCALE: &str = "en_US";
/// Timezone applied when the configuration does not set one.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

#[derive(Debug, Deserialize)]
struct UserConfig {
    #[serde(default)]
    id: Option<String>,
    username: String,
    full_name: String,
    role: String,
    #[serde(default = "default_locale")]
    locale: String,
    #[serde(default = "default_timezone")]
    timezone: String,
}

/// The identifying subset of state, enough for read and delete.
#[derive(Debug, Deserialize)]
struct UserIdentity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_string()
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn user_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "username",
            Attribute::required_string()
                .with_description("Email address used as the username; changing it replaces the user")
                .with_force_new()
                .with_validator(validators::validate_username),
        )
        .with_attribute(
            "full_name",
            Attribute::required_string().with_validator(validators::validate_full_name),
        )
        .with_attribute(
            "role",
            Attribute::required_string().with_validator(validators::validate_user_role),
        )
        .with_attribute(
            "locale",
            Attribute::optional_string().with_default(json!(DEFAULT_LOCALE)),
        )
        .with_attribute(
            "timezone",
            Attribute::optional_string().with_default(json!(DEFAULT_TIMEZONE)),
        )
}

fn expand(config: &UserConfig) -> UserRequest {
    UserRequest {
        username: config.username.clone(),
        full_name: config.full_name.clone(),
        role: UserRole {
            name: config.role.clone(),
        },
        locale: Some(config.locale.clone()),
        time_zone: Some(config.timezone.clone()),
    }
}

fn flatten(user: &User) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "full_name": user.full_name,
        "role": user.role.as_ref().map(|r| r.name.clone()),
        "locale": user.locale.clone().unwrap_or_else(default_locale),
        "timezone": user.time_zone.clone().unwrap_or_else(default_timezone),
    })
}

/// Handler for `opsgenie_user`.
pub struct UserResource;

#[async_trait::async_trait]
impl ResourceHandler for UserResource {
    fn schema(&self) -> Schema {
        user_schema()
    }

    async fn create(
        &self,
        client: &OpsgenieClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let config: UserConfig = decode(&planned, TYPE_NAME)?;
        info!(username = %config.username, "creating user");

        let created = client.users.create(&expand(&config)).await?;
        let user = client.users.get(&created.id).await?;
        info!(id = %user.id, username = %user.username, "created user");
        Ok(flatten(&user))
    }

    async fn read(&self, client: &OpsgenieClient, state: Value) -> Result<Value, ProviderError> {
        let identity: UserIdentity = decode(&state, TYPE_NAME)?;
        let identifier = stored_id(&identity.id).unwrap_or(&identity.username);

        match client.users.get(identifier).await {
            Ok(user) => Ok(flatten(&user)),
            Err(e) if e.is_not_found() => {
                warn!(username = %identity.username, "user no longer exists, clearing id");
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
        let prior_identity: UserIdentity = decode(&prior, TYPE_NAME)?;
        let config: UserConfig = decode(&planned, TYPE_NAME)?;
        let id = stored_id(&config.id)
            .or_else(|| stored_id(&prior_identity.id))
            .ok_or_else(|| {
                ProviderError::Configuration("user id missing from state".to_string())
            })?
            .to_string();
        info!(id = %id, username = %config.username, "updating user");

        client.users.update(&id, &expand(&config)).await?;
        let user = client.users.get(&id).await?;
        Ok(flatten(&user))
    }

    async fn delete(&self, client: &OpsgenieClient, state: Value) -> Result<(), ProviderError> {
        let identity: UserIdentity = decode(&state, TYPE_NAME)?;
        let id = stored_id(&identity.id).ok_or_else(|| {
            ProviderError::Configuration("user id missing from state".to_string())
        })?;
        info!(id = %id, username = %identity.username, "deleting user");
        client.users.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_builds_full_request() {
        let config: UserConfig = decode(
            &json!({
                "username": "alice@example.com",
                "full_name": "Alice Example",
                "role": "User"
            }),
            TYPE_NAME,
        )
        .unwrap();

        let req = expand(&config);
        assert_eq!(req.username, "alice@example.com");
        assert_eq!(req.role.name, "User");
        assert_eq!(req.locale.as_deref(), Some(DEFAULT_LOCALE));
        assert_eq!(req.time_zone.as_deref(), Some(DEFAULT_TIMEZONE));
    }

    #[test]
    fn test_config_keeps_explicit_locale_and_timezone() {
        let config: UserConfig = decode(
            &json!({
                "username": "bob@example.com",
                "full_name": "Bob",
                "role": "Admin",
                "locale": "nl_NL",
                "timezone": "Europe/Amsterdam"
            }),
            TYPE_NAME,
        )
        .unwrap();

        assert_eq!(config.locale, "nl_NL");
        assert_eq!(config.timezone, "Europe/Amsterdam");
    }

    #[test]
    fn test_flatten_fills_defaults_for_absent_fields() {
        let user = User {
            id: "u-1".to_string(),
            username: "alice@example.com".to_string(),
            full_name: "Alice Example".to_string(),
            role: None,
            locale: None,
            time_zone: None,
        };

        let state = flatten(&user);
        assert_eq!(state["id"], "u-1");
        assert!(state["role"].is_null());
        assert_eq!(state["locale"], DEFAULT_LOCALE);
        assert_eq!(state["timezone"], DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_schema_marks_username_force_new() {
        let schema = user_schema();
        let username = &schema.block.attributes["username"];
        assert!(username.force_new);
        assert!(username.flags.required);
        assert_eq!(
            schema.block.attributes["locale"].default,
            Some(json!(DEFAULT_LOCALE))
        );
        assert_eq!(
            schema.block.attributes["timezone"].default,
            Some(json!(DEFAULT_TIMEZONE))
        );
    }
}
