//! Teams API (`/v2/teams`).

use serde::{Deserialize, Serialize};

use super::http::HttpClient;
use crate::error::ProviderError;

/// Reference to a user inside a team member entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUser {
    /// The user's id.
    #[serde(default)]
    pub id: String,
    /// The user's username; present in read responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A member of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// The referenced user.
    pub user: MemberUser,
    /// Member role, `admin` or `user`.
    #[serde(default)]
    pub role: Option<String>,
}

/// A team as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Server-assigned id.
    #[serde(default)]
    pub id: String,
    /// Team name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Team members.
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

/// Payload for create and update.
#[derive(Debug, Clone, Serialize)]
pub struct TeamRequest {
    /// Team name.
    pub name: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Team members; users are referenced by id.
    pub members: Vec<TeamMember>,
}

/// Typed access to the teams endpoints.
#[derive(Debug, Clone)]
pub struct TeamApi {
    http: HttpClient,
}

impl TeamApi {
    pub(crate) fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create a team and return the created object.
    pub async fn create(&self, req: &TeamRequest) -> Result<Team, ProviderError> {
        self.http.post("/v2/teams", req).await
    }

    /// Get a team by id.
    pub async fn get(&self, id: &str) -> Result<Team, ProviderError> {
        self.http
            .get(&format!("/v2/teams/{}?identifierType=id", id))
            .await
    }

    /// Get a team by name.
    pub async fn get_by_name(&self, name: &str) -> Result<Team, ProviderError> {
        self.http
            .get(&format!("/v2/teams/{}?identifierType=name", name))
            .await
    }

    /// Update a team by id with a full payload.
    pub async fn update(&self, id: &str, req: &TeamRequest) -> Result<(), ProviderError> {
        let _: serde_json::Value = self.http.patch(&format!("/v2/teams/{}", id), req).await?;
        Ok(())
    }

    /// Delete a team by id.
    pub async fn delete(&self, id: &str) -> Result<(), ProviderError> {
        self.http
            .delete(&format!("/v2/teams/{}?identifierType=id", id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_request_wire_format() {
        let req = TeamRequest {
            name: "ops_team".to_string(),
            description: Some("On-call team".to_string()),
            members: vec![TeamMember {
                user: MemberUser {
                    id: "u-1".to_string(),
                    username: None,
                },
                role: Some("admin".to_string()),
            }],
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["name"], "ops_team");
        assert_eq!(json["description"], "On-call team");
        assert_eq!(json["members"][0]["user"]["id"], "u-1");
        assert_eq!(json["members"][0]["role"], "admin");
        // username is omitted on the wire when absent
        assert!(json["members"][0]["user"].get("username").is_none());
    }

    #[test]
    fn test_team_deserializes_api_shape() {
        let team: Team = serde_json::from_str(
            r#"{
                "id": "90098alp9-f0e3-41d3-a060-0ea895027630",
                "name": "ops_team",
                "description": "On-call team",
                "members": [
                    {"user": {"id": "u-1", "username": "alice@example.com"}, "role": "admin"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(team.name, "ops_team");
        assert_eq!(team.members.len(), 1);
        assert_eq!(
            team.members[0].user.username.as_deref(),
            Some("alice@example.com")
        );
    }

    #[test]
    fn test_team_tolerates_missing_members() {
        let team: Team =
            serde_json::from_str(r#"{"id": "t-1", "name": "empty_team"}"#).unwrap();
        assert!(team.members.is_empty());
        assert!(team.description.is_none());
    }
}
