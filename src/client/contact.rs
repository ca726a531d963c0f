//! User contacts API (`/v2/users/{id}/contacts`).
//!
//! Contacts are scoped to a user; every call takes the owning user's
//! identifier.

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use crate::error::ProviderError;

/// A contact as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,
    /// Contact method: `sms`, `email` or `voice`.
    #[serde(default)]
    pub method: String,
    /// Address for the method (phone number or email).
    #[serde(default)]
    pub to: String,
}

/// Payload for creating a contact.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRequest {
    /// Contact method: `sms`, `email` or `voice`.
    pub method: String,
    /// Address for the method.
    pub to: String,
}

/// Payload for updating a contact. Only the address can change; a method
/// change replaces the contact.
#[derive(Debug, Clone, Serialize)]
pub struct ContactUpdateRequest {
    /// New address for the method.
    pub to: String,
}

/// Typed access to the contact endpoints.
#[derive(Debug, Clone)]
pub struct ContactApi {
    http: HttpClient,
}

impl ContactApi {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create a contact for a user.
    pub async fn create(
        &self,
        username: &str,
        req: &ContactRequest,
    ) -> Result<Contact, ProviderError> {
        self.http
            .post(&format!("/v2/users/{}/contacts", username), req)
            .await
    }

    /// Get a contact by (username, contact id).
    pub async fn get(&self, username: &str, id: &str) -> Result<Contact, ProviderError> {
        self.http
            .get(&format!("/v2/users/{}/contacts/{}", username, id))
            .await
    }

    /// Update a contact's address.
    pub async fn update(
        &self,
        username: &str,
        id: &str,
        req: &ContactUpdateRequest,
    ) -> Result<(), ProviderError> {
        let _: serde_json::Value = self
            .http
            .patch(&format!("/v2/users/{}/contacts/{}", username, id), req)
            .await?;
        Ok(())
    }

    /// Delete a contact by (username, contact id).
    pub async fn delete(&self, username: &str, id: &str) -> Result<(), ProviderError> {
        self.http
            .delete(&format!("/v2/users/{}/contacts/{}", username, id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_request_wire_format() {
        let req = ContactRequest {
            method: "sms".to_string(),
            to: "1-541-754-3010".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "sms");
        assert_eq!(json["to"], "1-541-754-3010");
    }

    #[test]
    fn test_contact_deserializes_api_shape() {
        let contact: Contact = serde_json::from_str(
            r#"{"id": "c-1", "method": "email", "to": "alice@example.com", "status": {"enabled": true}}"#,
        )
        .unwrap();
        assert_eq!(contact.id, "c-1");
        assert_eq!(contact.method, "email");
        assert_eq!(contact.to, "alice@example.com");
    }
}
