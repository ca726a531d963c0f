//! The `opsgenie_contact` resource.
//!
//! Contacts hang off a user; the state carries both the owning username and
//! the contact id. Username and method force replacement, only the address
//! is updatable in place.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::client::contact::{Contact, ContactRequest, ContactUpdateRequest};
use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

use super::handler::ResourceHandler;
use super::team::clear_id;
use super::{decode, stored_id, validators};

/// Type name in the provider registry.
pub const TYPE_NAME: &str = "opsgenie_contact";

#[derive(Debug, Deserialize)]
struct ContactConfig {
    #[serde(default)]
    id: Option<String>,
    username: String,
    method: String,
    to: String,
}

/// The identifying subset of state, enough for read and delete.
#[derive(Debug, Deserialize)]
struct ContactIdentity {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    username: String,
}

fn contact_schema() -> Schema {
    Schema::v0()
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "username",
            Attribute::required_string()
                .with_description("Username of the user owning this contact")
                .with_force_new()
                .with_validator(validators::validate_username),
        )
        .with_attribute(
            "method",
            Attribute::required_string()
                .with_description("Contact method, one of sms, email or voice")
                .with_force_new(),
        )
        .with_attribute("to", Attribute::required_string())
}

fn flatten(username: &str, contact: &Contact) -> Value {
    json!({
        "id": contact.id,
        "username": username,
        "method": contact.method,
        "to": contact.to,
    })
}

/// Handler for `opsgenie_contact`.
pub struct ContactResource;

#[async_trait::async_trait]
impl ResourceHandler for ContactResource {
    fn schema(&self) -> Schema {
        contact_schema()
    }

    /// Every contact call is keyed by owner and contact id, so the import
    /// id is composite: `username/contact-id`.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        match id.rsplit_once('/') {
            Some((username, contact_id)) if !username.is_empty() && !contact_id.is_empty() => {
                Ok(json!({ "id": contact_id, "username": username }))
            }
            _ => Err(ProviderError::Validation(format!(
                "contact import id must be 'username/contact-id', got '{}'",
                id
            ))),
        }
    }

    async fn create(
        &self,
        client: &OpsgenieClient,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let config: ContactConfig = decode(&planned, TYPE_NAME)?;
        let method = validators::contact_method(&config.method)?.to_string();
        info!(username = %config.username, method = %method, "creating contact");

        let created = client
            .contacts
            .create(
                &config.username,
                &ContactRequest {
                    method,
                    to: config.to.clone(),
                },
            )
            .await?;

        let contact = client.contacts.get(&config.username, &created.id).await?;
        info!(id = %contact.id, username = %config.username, "created contact");
        Ok(flatten(&config.username, &contact))
    }

    async fn read(&self, client: &OpsgenieClient, state: Value) -> Result<Value, ProviderError> {
        let identity: ContactIdentity = decode(&state, TYPE_NAME)?;
        let id = match stored_id(&identity.id) {
            Some(id) => id,
            // Never created or already cleared; nothing to look up.
            None => return Ok(clear_id(state)),
        };

        match client.contacts.get(&identity.username, id).await {
            Ok(contact) => Ok(flatten(&identity.username, &contact)),
            Err(e) if e.is_not_found() => {
                warn!(username = %identity.username, "contact no longer exists, clearing id");
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
        let prior_identity: ContactIdentity = decode(&prior, TYPE_NAME)?;
        let config: ContactConfig = decode(&planned, TYPE_NAME)?;
        let id = stored_id(&config.id)
            .or_else(|| stored_id(&prior_identity.id))
            .ok_or_else(|| {
                ProviderError::Configuration("contact id missing from state".to_string())
            })?
            .to_string();
        info!(id = %id, username = %config.username, "updating contact");

        client
            .contacts
            .update(
                &config.username,
                &id,
                &ContactUpdateRequest {
                    to: config.to.clone(),
                },
            )
            .await?;

        let contact = client.contacts.get(&config.username, &id).await?;
        Ok(flatten(&config.username, &contact))
    }

    async fn delete(&self, client: &OpsgenieClient, state: Value) -> Result<(), ProviderError> {
        let identity: ContactIdentity = decode(&state, TYPE_NAME)?;
        let id = stored_id(&identity.id).ok_or_else(|| {
            ProviderError::Configuration("contact id missing from state".to_string())
        })?;
        info!(id = %id, username = %identity.username, "deleting contact");
        client.contacts.delete(&identity.username, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_carries_owning_username() {
        let contact = Contact {
            id: "c-1".to_string(),
            method: "sms".to_string(),
            to: "1-541-754-3010".to_string(),
        };

        let state = flatten("alice@example.com", &contact);
        assert_eq!(state["id"], "c-1");
        assert_eq!(state["username"], "alice@example.com");
        assert_eq!(state["method"], "sms");
        assert_eq!(state["to"], "1-541-754-3010");
    }

    #[test]
    fn test_schema_marks_username_and_method_force_new() {
        let schema = contact_schema();
        assert!(schema.block.attributes["username"].force_new);
        assert!(schema.block.attributes["method"].force_new);
        assert!(!schema.block.attributes["to"].force_new);
    }

    #[test]
    fn test_import_splits_composite_id() {
        let state = ContactResource.import("alice@example.com/c-1").unwrap();
        assert_eq!(state["username"], "alice@example.com");
        assert_eq!(state["id"], "c-1");
    }

    #[test]
    fn test_import_rejects_bare_id() {
        let err = ContactResource.import("c-1").unwrap_err();
        assert!(err.to_string().contains("username/contact-id"));

        let err = ContactResource.import("/c-1").unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }

    #[test]
    fn test_config_rejects_missing_to() {
        let err = decode::<ContactConfig>(
            &json!({"username": "alice@example.com", "method": "sms"}),
            TYPE_NAME,
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
    }
}
