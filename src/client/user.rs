//! Users API (`/v2/users`).

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use crate::error::ProviderError;

/// Page size for [`UserApi::list`].
const LIST_PAGE_SIZE: usize = 100;

/// A user's role. OpsGenie models this as an object with a free-form name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Role name, e.g. `User`, `Admin`, or a custom role.
    pub name: String,
}

/// A user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,
    /// The email address used as the username.
    pub username: String,
    /// Display name.
    #[serde(default)]
    pub full_name: String,
    /// The user's role.
    #[serde(default)]
    pub role: Option<UserRole>,
    /// Locale, e.g. `en_US`.
    #[serde(default)]
    pub locale: Option<String>,
    /// IANA timezone name.
    #[serde(default)]
    pub time_zone: Option<String>,
}

/// Payload for create and update.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    /// The email address used as the username.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// The user's role.
    pub role: UserRole,
    /// Locale, e.g. `en_US`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// IANA timezone name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// Typed access to the users endpoints.
#[derive(Debug, Clone)]
pub struct UserApi {
    http: HttpClient,
}

impl UserApi {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create a user and return the created object.
    pub async fn create(&self, req: &UserRequest) -> Result<User, ProviderError> {
        self.http.post("/v2/users", req).await
    }

    /// Get a user by id or username.
    pub async fn get(&self, identifier: &str) -> Result<User, ProviderError> {
        self.http.get(&format!("/v2/users/{}", identifier)).await
    }

    /// List all users, following offset pagination.
    pub async fn list(&self) -> Result<Vec<User>, ProviderError> {
        let mut users = Vec::new();
        let mut offset = 0;
        loop {
            let page: Vec<User> = self
                .http
                .get(&format!("/v2/users?limit={}&offset={}", LIST_PAGE_SIZE, offset))
                .await?;
            let page_len = page.len();
            users.extend(page);
            if page_len < LIST_PAGE_SIZE {
                break;
            }
            offset += page_len;
        }
        Ok(users)
    }

    /// Update a user by id. Username changes are not supported by the API;
    /// the provider replaces the user instead.
    pub async fn update(&self, id: &str, req: &UserRequest) -> Result<(), ProviderError> {
        let _: serde_json::Value = self.http.patch(&format!("/v2/users/{}", id), req).await?;
        Ok(())
    }

    /// Delete a user by id.
    pub async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.http.delete(&format!("/v2/users/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_request_wire_format() {
        let req = UserRequest {
            username: "alice@example.com".to_string(),
            full_name: "Alice Example".to_string(),
            role: UserRole {
                name: "User".to_string(),
            },
            locale: Some("en_US".to_string()),
            time_zone: Some("America/New_York".to_string()),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["username"], "alice@example.com");
        assert_eq!(json["fullName"], "Alice Example");
        assert_eq!(json["role"]["name"], "User");
        assert_eq!(json["locale"], "en_US");
        assert_eq!(json["timeZone"], "America/New_York");
    }

    #[test]
    fn test_user_request_omits_absent_options() {
        let req = UserRequest {
            username: "bob@example.com".to_string(),
            full_name: "Bob".to_string(),
            role: UserRole {
                name: "Admin".to_string(),
            },
            locale: None,
            time_zone: None,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("locale").is_none());
        assert!(json.get("timeZone").is_none());
    }

    #[test]
    fn test_user_deserializes_api_shape() {
        let user: User = serde_json::from_str(
            r#"{
                "id": "b5b92115-bfe7-43eb-8c2a-e467f2e5ddc4",
                "username": "alice@example.com",
                "fullName": "Alice Example",
                "role": {"id": "User", "name": "User"},
                "timeZone": "Europe/Kirov",
                "locale": "en_US"
            }"#,
        )
        .unwrap();

        assert_eq!(user.id, "b5b92115-bfe7-43eb-8c2a-e467f2e5ddc4");
        assert_eq!(user.username, "alice@example.com");
        assert_eq!(user.full_name, "Alice Example");
        assert_eq!(user.role.as_ref().unwrap().name, "User");
        assert_eq!(user.time_zone.as_deref(), Some("Europe/Kirov"));
    }
}
