//! CRUD seams between the provider registry and the per-resource modules.

use serde_json::{json, Value};

use crate::client::OpsgenieClient;
use crate::error::ProviderError;
use crate::schema::Schema;

/// A managed resource: schema plus CRUD against the OpsGenie API.
///
/// Handlers are stateless; the configured client is passed in per call.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    /// The resource's schema.
    fn schema(&self) -> Schema;

    /// Build the minimal state for an imported object from the import id;
    /// the follow-up read fills the rest. The default is an id passthrough.
    /// Resources addressed by a composite key override this.
    fn import(&self, id: &str) -> Result<Value, ProviderError> {
        Ok(json!({ "id": id }))
    }

    /// Create the remote object from the planned state and return the state
    /// as re-read from the API, so computed fields are authoritative.
    async fn create(
        &self,
        client: &OpsgenieClient,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the remote object. A missing remote object is not an error:
    /// the returned state has a null `id`, which signals drift to the host.
    async fn read(&self, client: &OpsgenieClient, state: Value) -> Result<Value, ProviderError>;

    /// Update the remote object with a full payload, then re-read and
    /// return the fresh state.
    async fn update(
        &self,
        client: &OpsgenieClient,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object. Remote errors propagate.
    async fn delete(&self, client: &OpsgenieClient, state: Value) -> Result<(), ProviderError>;
}

/// A read-only data source.
#[async_trait::async_trait]
pub trait DataSourceHandler: Send + Sync {
    /// The data source's schema.
    fn schema(&self) -> Schema;

    /// Look up the remote object described by `config` and return its state.
    async fn read(&self, client: &OpsgenieClient, config: Value) -> Result<Value, ProviderError>;
}
