//! Provider plugin entry point.
//!
//! Prints the handshake line to stdout and serves the provider protocol
//! until SIGTERM/SIGINT. All logging goes to stderr so the handshake stays
//! parseable.

use terraform_provider_opsgenie::{init_logging, serve, OpsgenieProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    serve(OpsgenieProvider::new()).await
}
