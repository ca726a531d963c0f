//! Terraform provider plugin for OpsGenie.
//!
//! The provider manages OpsGenie teams, users, user contacts and on-call
//! schedules, and exposes team and user data sources. It runs as a gRPC
//! plugin: the host spawns the binary, reads the handshake line from
//! stdout, and drives the provider protocol over the advertised address.
//!
//! # Layout
//!
//! - [`client`]: typed REST client for the OpsGenie v2 API
//! - [`provider`]: resource and data source handlers plus the registry
//! - [`schema`] / [`validation`]: schema types and schema-driven validation
//! - [`server`]: the gRPC plugin server and the [`ProviderService`] seam
//! - [`testing`]: in-process harness for lifecycle tests
//!
//! # Quick Start
//!
//! ```ignore
//! use terraform_provider_opsgenie::{init_logging, provider::OpsgenieProvider, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_logging();
//!     serve(OpsgenieProvider::new()).await
//! }
//! ```
//!
//! # Handshake Protocol
//!
//! On startup via [`serve`] the provider prints a single handshake line to
//! stdout and keeps all logging on stderr:
//!
//! ```text
//! OPSGENIE_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `OPSGENIE_PROVIDER|<protocol_version>|<address>`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod logging;
pub mod provider;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod proto;

// Re-export main types at crate root
pub use client::OpsgenieClient;
pub use error::ProviderError;
pub use logging::{init_logging, try_init_logging};
pub use provider::OpsgenieProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_on, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tonic;
pub use tracing;
