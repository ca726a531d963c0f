//! The OpsGenie provider: resource and data source registry plus the
//! [`ProviderService`] implementation driving them.
//!
//! Resources and data sources are registered once at construction; every
//! operation dispatches through the registry by type name. The configured
//! API client is created in `configure` and shared behind an `Arc` for the
//! life of the process.

mod contact;
mod data_team;
mod data_user;
mod handler;
mod schedule;
mod team;
mod user;
pub mod validators;

pub use contact::ContactResource;
pub use data_team::TeamDataSource;
pub use data_user::UserDataSource;
pub use handler::{DataSourceHandler, ResourceHandler};
pub use schedule::ScheduleResource;
pub use team::TeamResource;
pub use user::UserResource;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::info;

use crate::client::{OpsgenieClient, DEFAULT_API_URL};
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, BlockNestingMode, Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{AttributeChange, ImportedResource, PlanResult};
use crate::validation;

/// Environment variable consulted when the provider configuration does not
/// set an api key.
pub const API_KEY_ENV: &str = "OPSGENIE_API_KEY";

/// Decode a JSON value into a typed config struct, turning serde errors
/// into validation errors that name the type being decoded.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    value: &Value,
    what: &str,
) -> Result<T, ProviderError> {
    serde_json::from_value(value.clone())
        .map_err(|e| ProviderError::Validation(format!("invalid {} configuration: {}", what, e)))
}

/// Treat an empty stored id as absent.
pub(crate) fn stored_id(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.is_empty())
}

#[derive(Debug, Deserialize)]
struct ProviderConfig {
    #[serde(default)]
    api_key: Option<String>,
}

fn provider_config_schema() -> Schema {
    Schema::v0().with_attribute(
        "api_key",
        Attribute::optional_string()
            .sensitive()
            .with_description(format!(
                "OpsGenie API key; falls back to the {} environment variable",
                API_KEY_ENV
            )),
    )
}

/// The OpsGenie provider.
pub struct OpsgenieProvider {
    endpoint: String,
    resources: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
    client: RwLock<Option<Arc<OpsgenieClient>>>,
}

impl OpsgenieProvider {
    /// Create a provider against the production OpsGenie endpoint.
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_API_URL)
    }

    /// Create a provider against a custom endpoint. Used by tests to point
    /// at a mock server.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let mut resources: HashMap<&'static str, Box<dyn ResourceHandler>> = HashMap::new();
        resources.insert(team::TYPE_NAME, Box::new(TeamResource));
        resources.insert(user::TYPE_NAME, Box::new(UserResource));
        resources.insert(contact::TYPE_NAME, Box::new(ContactResource));
        resources.insert(schedule::TYPE_NAME, Box::new(ScheduleResource));

        let mut data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>> = HashMap::new();
        data_sources.insert(data_team::TYPE_NAME, Box::new(TeamDataSource));
        data_sources.insert(data_user::TYPE_NAME, Box::new(UserDataSource));

        Self {
            endpoint: endpoint.into(),
            resources,
            data_sources,
            client: RwLock::new(None),
        }
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn ResourceHandler, ProviderError> {
        self.resources
            .get(resource_type)
            .map(|h| h.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(
        &self,
        data_source_type: &str,
    ) -> Result<&dyn DataSourceHandler, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(|h| h.as_ref())
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }

    async fn client(&self) -> Result<Arc<OpsgenieClient>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn check_config(schema: &Schema, config: &Value) -> Result<(), ProviderError> {
        let diagnostics = validation::validate(schema, config);
        if diagnostics.is_empty() {
            return Ok(());
        }
        let summaries: Vec<String> = diagnostics.into_iter().map(|d| d.summary).collect();
        Err(ProviderError::Validation(summaries.join("; ")))
    }
}

impl Default for OpsgenieProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Fill in attribute defaults, recursing into nested block values.
fn apply_defaults(block: &Block, value: &mut Value) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };

    for (name, attr) in &block.attributes {
        if let Some(default) = &attr.default {
            if obj.get(name).map_or(true, Value::is_null) {
                obj.insert(name.clone(), default.clone());
            }
        }
    }

    for (name, nested) in &block.blocks {
        if let Some(nested_value) = obj.get_mut(name) {
            match nested.nesting_mode {
                BlockNestingMode::Single => apply_defaults(&nested.block, nested_value),
                BlockNestingMode::List | BlockNestingMode::Set => {
                    if let Some(items) = nested_value.as_array_mut() {
                        for item in items {
                            apply_defaults(&nested.block, item);
                        }
                    }
                }
            }
        }
    }
}

/// Carry computed values from the prior state into the planned state so
/// remote-assigned fields (the id, resolved participant ids) do not show
/// up as changes on every plan. Recurses into nested blocks, pairing list
/// items by position; values set in the planned state always win.
fn carry_computed(block: &Block, prior: &Value, planned: &mut Value) {
    let Some(prior_obj) = prior.as_object() else {
        return;
    };
    let Some(obj) = planned.as_object_mut() else {
        return;
    };

    for (name, attr) in &block.attributes {
        if !attr.flags.computed {
            continue;
        }
        if obj.get(name).map_or(true, Value::is_null) {
            if let Some(value) = prior_obj.get(name).filter(|v| !v.is_null()) {
                obj.insert(name.clone(), value.clone());
            }
        }
    }

    for (name, nested) in &block.blocks {
        let Some(prior_nested) = prior_obj.get(name) else {
            continue;
        };
        let Some(planned_nested) = obj.get_mut(name) else {
            continue;
        };
        match nested.nesting_mode {
            BlockNestingMode::Single => {
                carry_computed(&nested.block, prior_nested, planned_nested);
            }
            BlockNestingMode::List | BlockNestingMode::Set => {
                if let (Some(prior_items), Some(items)) =
                    (prior_nested.as_array(), planned_nested.as_array_mut())
                {
                    for (item, prior_item) in items.iter_mut().zip(prior_items) {
                        carry_computed(&nested.block, prior_item, item);
                    }
                }
            }
        }
    }
}

/// Drop null entries at every depth so null and absent compare equal
/// inside nested blocks too, not just at the top level.
fn without_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(without_nulls).collect()),
        other => other.clone(),
    }
}

/// Diff prior and planned state at the top level. Null and absent are
/// treated the same at any depth, so defaults, cleared fields and
/// remote-omitted optionals do not ping-pong.
fn diff_changes(prior: Option<&Value>, planned: &Value) -> Vec<AttributeChange> {
    let empty = Map::new();
    let prior_obj = prior.and_then(Value::as_object).unwrap_or(&empty);
    let Some(planned_obj) = planned.as_object() else {
        return Vec::new();
    };

    let keys: BTreeSet<&String> = prior_obj.keys().chain(planned_obj.keys()).collect();
    let mut changes = Vec::new();
    for key in keys {
        let before = prior_obj.get(key).filter(|v| !v.is_null());
        let after = planned_obj.get(key).filter(|v| !v.is_null());
        match (before, after) {
            (None, None) => {}
            (Some(b), Some(a)) if without_nulls(b) == without_nulls(a) => {}
            (b, a) => changes.push(AttributeChange::new(key.clone(), b.cloned(), a.cloned())),
        }
    }
    changes
}

#[async_trait::async_trait]
impl ProviderService for OpsgenieProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(provider_config_schema());
        for (name, handler) in &self.resources {
            schema = schema.with_resource(*name, handler.schema());
        }
        for (name, handler) in &self.data_sources {
            schema = schema.with_data_source(*name, handler.schema());
        }
        schema
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&provider_config_schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let provider_config: ProviderConfig = decode(&config, "provider")?;
        let api_key = match provider_config
            .api_key
            .filter(|key| !key.trim().is_empty())
        {
            Some(key) => key,
            None => std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    ProviderError::Configuration(format!(
                        "api_key is not set and the {} environment variable is empty",
                        API_KEY_ENV
                    ))
                })?,
        };

        let client = OpsgenieClient::with_endpoint(&api_key, &self.endpoint)?;
        *self.client.write().await = Some(Arc::new(client));
        info!(endpoint = %self.endpoint, "provider configured");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        info!("provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let handler = self.resource(resource_type)?;
        Ok(validation::validate(&handler.schema(), &config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let handler = self.resource(resource_type)?;
        let schema = handler.schema();
        Self::check_config(&schema, &config)?;

        let mut planned = proposed_state;
        apply_defaults(&schema.block, &mut planned);

        if let Some(prior) = &prior_state {
            carry_computed(&schema.block, prior, &mut planned);
        }

        let changes = diff_changes(prior_state.as_ref(), &planned);
        let requires_replace = prior_state.is_some()
            && changes.iter().any(|change| {
                schema
                    .block
                    .attributes
                    .get(&change.path)
                    .is_some_and(|attr| attr.force_new)
            });

        if changes.is_empty() {
            Ok(PlanResult::no_change(planned))
        } else {
            Ok(PlanResult::with_changes(planned, changes, requires_replace))
        }
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.create(&client, planned_state).await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.read(&client, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.update(&client, prior_state, planned_state).await
    }

    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.delete(&client, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        // The handler turns the import id into a minimal state; the next
        // read fills the rest.
        let handler = self.resource(resource_type)?;
        Ok(vec![ImportedResource::new(resource_type, handler.import(id)?)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let handler = self.data_source(data_source_type)?;
        Ok(validation::validate(&handler.schema(), &config))
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let handler = self.data_source(data_source_type)?;
        let client = self.client().await?;
        handler.read(&client, config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;
    use serde_json::json;

    #[test]
    fn test_schema_registers_all_types() {
        let provider = OpsgenieProvider::new();
        let schema = provider.schema();

        for resource in [
            "opsgenie_team",
            "opsgenie_user",
            "opsgenie_contact",
            "opsgenie_schedule",
        ] {
            assert!(
                schema.resources.contains_key(resource),
                "missing resource {}",
                resource
            );
        }
        for data_source in ["opsgenie_team", "opsgenie_user"] {
            assert!(
                schema.data_sources.contains_key(data_source),
                "missing data source {}",
                data_source
            );
        }
        assert!(schema.provider.block.attributes["api_key"].flags.sensitive);
    }

    #[test]
    fn test_apply_defaults_fills_missing_and_null() {
        let schema = Schema::v0()
            .with_attribute(
                "locale",
                Attribute::optional_string().with_default(json!("en_US")),
            )
            .with_attribute("name", Attribute::required_string());

        let mut value = json!({"name": "x", "locale": null});
        apply_defaults(&schema.block, &mut value);
        assert_eq!(value["locale"], "en_US");

        let mut value = json!({"name": "x", "locale": "nl_NL"});
        apply_defaults(&schema.block, &mut value);
        assert_eq!(value["locale"], "nl_NL");
    }

    #[test]
    fn test_apply_defaults_recurses_into_block_lists() {
        let schema = Schema::v0().with_block(
            "member",
            crate::schema::NestedBlock::list(
                Block::new()
                    .with_attribute("username", Attribute::required_string())
                    .with_attribute(
                        "role",
                        Attribute::optional_string().with_default(json!("user")),
                    ),
            ),
        );

        let mut value = json!({"member": [
            {"username": "alice@example.com"},
            {"username": "bob@example.com", "role": "admin"}
        ]});
        apply_defaults(&schema.block, &mut value);
        assert_eq!(value["member"][0]["role"], "user");
        assert_eq!(value["member"][1]["role"], "admin");
    }

    #[test]
    fn test_diff_treats_null_and_absent_alike() {
        let prior = json!({"id": "t-1", "name": "ops", "description": null});
        let planned = json!({"id": "t-1", "name": "ops"});
        assert!(diff_changes(Some(&prior), &planned).is_empty());
    }

    #[test]
    fn test_diff_reports_modified_added_removed() {
        let prior = json!({"id": "t-1", "name": "ops", "description": "old"});
        let planned = json!({"id": "t-1", "name": "ops_new", "timezone": "UTC"});
        let changes = diff_changes(Some(&prior), &planned);

        let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, ["description", "name", "timezone"]);
    }

    #[tokio::test]
    async fn test_plan_applies_defaults_and_carries_id() {
        let provider = OpsgenieProvider::new();
        let config = json!({
            "username": "alice@example.com",
            "full_name": "Alice Example",
            "role": "User"
        });
        let prior = json!({
            "id": "u-1",
            "username": "alice@example.com",
            "full_name": "Alice",
            "role": "User",
            "locale": "en_US",
            "timezone": "America/New_York"
        });

        let result = provider
            .plan("opsgenie_user", Some(prior), config.clone(), config)
            .await
            .unwrap();

        assert_eq!(result.planned_state["id"], "u-1");
        assert_eq!(result.planned_state["locale"], "en_US");
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].path, "full_name");
        assert!(!result.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_unchanged_team_config_plans_nothing() {
        let provider = OpsgenieProvider::new();
        // Prior state as a create-then-read produces it: description was
        // never configured and the remote omitted it.
        let prior = json!({
            "id": "t-1",
            "name": "ops_team",
            "description": null,
            "member": [{"username": "alice@example.com", "role": "admin"}]
        });
        let config = json!({
            "name": "ops_team",
            "member": [{"username": "alice@example.com", "role": "admin"}]
        });

        let result = provider
            .plan("opsgenie_team", Some(prior), config.clone(), config)
            .await
            .unwrap();
        assert!(result.changes.is_empty(), "changes: {:?}", result.changes);
    }

    #[tokio::test]
    async fn test_plan_unchanged_schedule_keeps_remote_participant_id() {
        let provider = OpsgenieProvider::new();
        // The remote resolved the participant username to a user id; the
        // configuration only ever names the username.
        let prior = json!({
            "id": "s-1",
            "name": "oncall",
            "description": null,
            "timezone": "America/New_York",
            "owner_team": "ops_team",
            "rotation": [{
                "name": "primary",
                "start_date": "2019-06-10T17:00:00Z",
                "end_date": null,
                "type": "weekly",
                "participant": [
                    {"type": "user", "username": "alice@example.com", "id": "u-1"}
                ]
            }]
        });
        let config = json!({
            "name": "oncall",
            "owner_team": "ops_team",
            "rotation": [{
                "name": "primary",
                "start_date": "2019-06-10T17:00:00Z",
                "type": "weekly",
                "participant": [{"type": "user", "username": "alice@example.com"}]
            }]
        });

        let result = provider
            .plan("opsgenie_schedule", Some(prior), config.clone(), config)
            .await
            .unwrap();
        assert!(result.changes.is_empty(), "changes: {:?}", result.changes);
        assert_eq!(
            result.planned_state["rotation"][0]["participant"][0]["id"],
            "u-1"
        );
    }

    #[tokio::test]
    async fn test_plan_username_change_requires_replace() {
        let provider = OpsgenieProvider::new();
        let config = json!({
            "username": "new@example.com",
            "full_name": "Alice",
            "role": "User"
        });
        let prior = json!({
            "id": "u-1",
            "username": "old@example.com",
            "full_name": "Alice",
            "role": "User",
            "locale": "en_US",
            "timezone": "America/New_York"
        });

        let result = provider
            .plan("opsgenie_user", Some(prior), config.clone(), config)
            .await
            .unwrap();
        assert!(result.requires_replace);
    }

    #[tokio::test]
    async fn test_plan_create_never_requires_replace() {
        let provider = OpsgenieProvider::new();
        let config = json!({
            "username": "alice@example.com",
            "full_name": "Alice",
            "role": "User"
        });

        let result = provider
            .plan("opsgenie_user", None, config.clone(), config)
            .await
            .unwrap();
        assert!(!result.requires_replace);
        assert!(!result.changes.is_empty());
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let provider = OpsgenieProvider::new();
        let config = json!({"full_name": "Alice", "role": "User"});

        let err = provider
            .plan("opsgenie_user", None, config.clone(), config)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[tokio::test]
    async fn test_unknown_resource_type() {
        let provider = OpsgenieProvider::new();
        let err = provider
            .plan("opsgenie_escalation", None, json!({}), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_operations_require_configure_first() {
        let provider = OpsgenieProvider::new();
        let err = provider
            .read("opsgenie_team", json!({"name": "ops"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_validate_resource_config_reports_validator_errors() {
        let provider = OpsgenieProvider::new();
        let diagnostics = provider
            .validate_resource_config("opsgenie_team", json!({"name": "ops team"}))
            .await
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, DiagnosticSeverity::Error);
        assert!(diagnostics[0].summary.contains("alphanumeric"));
    }

    #[tokio::test]
    async fn test_import_is_id_passthrough() {
        let provider = OpsgenieProvider::new();
        let imported = provider
            .import_resource("opsgenie_team", "t-1")
            .await
            .unwrap();

        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, "opsgenie_team");
        assert_eq!(imported[0].state["id"], "t-1");

        let err = provider
            .import_resource("opsgenie_escalation", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));
    }

    #[tokio::test]
    async fn test_import_contact_splits_owner_and_id() {
        let provider = OpsgenieProvider::new();
        let imported = provider
            .import_resource("opsgenie_contact", "alice@example.com/c-1")
            .await
            .unwrap();

        assert_eq!(imported[0].state["username"], "alice@example.com");
        assert_eq!(imported[0].state["id"], "c-1");

        let err = provider
            .import_resource("opsgenie_contact", "c-1")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("username/contact-id"));
    }
}
