//! End-to-end resource lifecycles against a mock OpsGenie API.

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use terraform_provider_opsgenie::provider::OpsgenieProvider;
use terraform_provider_opsgenie::testing::{
    assert_plan_creates, assert_plan_no_changes, assert_plan_replaces, ProviderTester,
};
use terraform_provider_opsgenie::ProviderError;

async fn configured_tester(server: &MockServer) -> ProviderTester<OpsgenieProvider> {
    let tester = ProviderTester::new(OpsgenieProvider::with_endpoint(server.uri()));
    tester
        .configure(json!({"api_key": "test-genie-key"}))
        .await
        .expect("configure against mock endpoint");
    tester
}

fn users_list_page(users: serde_json::Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/v2/users"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": users})))
}

#[tokio::test]
async fn test_team_crud_lifecycle() {
    let server = MockServer::start().await;

    users_list_page(json!([
        {"id": "u-1", "username": "alice@example.com", "fullName": "Alice"}
    ]))
    .mount(&server)
    .await;

    Mock::given(method("POST"))
        .and(path("/v2/teams"))
        .and(body_partial_json(json!({
            "name": "ops_team",
            "members": [{"user": {"id": "u-1"}, "role": "admin"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "t-1", "name": "ops_team"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/teams/t-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "t-1",
                "name": "ops_team",
                "description": "On-call",
                "members": [
                    {"user": {"id": "u-1", "username": "alice@example.com"}, "role": "admin"}
                ]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/v2/teams/t-1"))
        .and(body_partial_json(json!({"description": "On-call team"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/teams/t-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;

    let state = tester
        .lifecycle_create(
            "opsgenie_team",
            json!({
                "name": "ops_team",
                "member": [{"username": "alice@example.com", "role": "admin"}]
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["id"], "t-1");
    assert_eq!(state["member"][0]["username"], "alice@example.com");
    assert_eq!(state["member"][0]["role"], "admin");

    let updated = tester
        .lifecycle_update(
            "opsgenie_team",
            state,
            json!({
                "id": "t-1",
                "name": "ops_team",
                "description": "On-call team",
                "member": [{"username": "alice@example.com", "role": "admin"}]
            }),
        )
        .await
        .unwrap();
    // State comes from the re-read, not from what was sent.
    assert_eq!(updated["description"], "On-call");

    tester.delete("opsgenie_team", updated).await.unwrap();
}

#[tokio::test]
async fn test_team_member_unknown_username_is_not_found() {
    let server = MockServer::start().await;

    users_list_page(json!([
        {"id": "u-1", "username": "alice@example.com", "fullName": "Alice"}
    ]))
    .mount(&server)
    .await;

    let tester = configured_tester(&server).await;
    let err = tester
        .create(
            "opsgenie_team",
            json!({
                "name": "ops_team",
                "member": [{"username": "ghost@example.com", "role": "user"}]
            }),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotFound(_)));
    assert!(err.to_string().contains("ghost@example.com"));
}

#[tokio::test]
async fn test_user_lifecycle_applies_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/users"))
        .and(body_partial_json(json!({
            "username": "alice@example.com",
            "fullName": "Alice Example",
            "role": {"name": "User"},
            "locale": "en_US",
            "timeZone": "America/New_York"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "u-1", "username": "alice@example.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "u-1",
                "username": "alice@example.com",
                "fullName": "Alice Example",
                "role": {"name": "User"},
                "locale": "en_US",
                "timeZone": "America/New_York"
            }
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;

    let plan = tester
        .plan_create(
            "opsgenie_user",
            json!({
                "username": "alice@example.com",
                "full_name": "Alice Example",
                "role": "User"
            }),
        )
        .await
        .unwrap();
    assert_plan_creates(&plan);
    assert_eq!(plan.planned_state["locale"], "en_US");
    assert_eq!(plan.planned_state["timezone"], "America/New_York");

    let state = tester
        .create("opsgenie_user", plan.planned_state)
        .await
        .unwrap();
    assert_eq!(state["id"], "u-1");
    assert_eq!(state["timezone"], "America/New_York");
}

#[tokio::test]
async fn test_user_username_change_plans_replacement() {
    let tester = ProviderTester::new(OpsgenieProvider::new());

    let prior = json!({
        "id": "u-1",
        "username": "old@example.com",
        "full_name": "Alice",
        "role": "User",
        "locale": "en_US",
        "timezone": "America/New_York"
    });
    let plan = tester
        .plan_update(
            "opsgenie_user",
            prior.clone(),
            json!({
                "username": "new@example.com",
                "full_name": "Alice",
                "role": "User",
                "locale": "en_US",
                "timezone": "America/New_York"
            }),
        )
        .await
        .unwrap();
    assert_plan_replaces(&plan);

    // An unchanged config plans to nothing.
    let plan = tester
        .plan_update("opsgenie_user", prior.clone(), prior)
        .await
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_update_rereads_remote_state() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v2/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    // The API normalized the name; the provider must report what it re-read.
    Mock::given(method("GET"))
        .and(path("/v2/users/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "u-1",
                "username": "alice@example.com",
                "fullName": "Alice B. Example",
                "role": {"name": "User"},
                "locale": "en_US",
                "timeZone": "America/New_York"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
    let state = tester
        .update(
            "opsgenie_user",
            json!({"id": "u-1", "username": "alice@example.com", "full_name": "Alice", "role": "User"}),
            json!({"id": "u-1", "username": "alice@example.com", "full_name": "Alice Example", "role": "User"}),
        )
        .await
        .unwrap();

    assert_eq!(state["full_name"], "Alice B. Example");
}

#[tokio::test]
async fn test_read_clears_id_when_remote_deleted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/teams/t-gone"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "Team not found"})),
        )
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
    let state = tester
        .read(
            "opsgenie_team",
            json!({"id": "t-gone", "name": "ops_team"}),
        )
        .await
        .unwrap();

    assert!(state["id"].is_null());
    assert_eq!(state["name"], "ops_team");
}

#[tokio::test]
async fn test_contact_lifecycle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/users/alice@example.com/contacts"))
        .and(body_json(json!({"method": "sms", "to": "1-541-754-3010"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "c-1", "method": "sms", "to": "1-541-754-3010"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/users/alice@example.com/contacts/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "c-1", "method": "sms", "to": "1-541-754-3010"}
        })))
        .mount(&server)
        .await;

    // Only the address travels on update.
    Mock::given(method("PATCH"))
        .and(path("/v2/users/alice@example.com/contacts/c-1"))
        .and(body_json(json!({"to": "1-541-754-9999"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/v2/users/alice@example.com/contacts/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": "Deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;

    let state = tester
        .lifecycle_create(
            "opsgenie_contact",
            json!({
                "username": "alice@example.com",
                "method": "sms",
                "to": "1-541-754-3010"
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["id"], "c-1");
    assert_eq!(state["method"], "sms");

    let mut updated_config = state.clone();
    updated_config["to"] = json!("1-541-754-9999");
    tester
        .update("opsgenie_contact", state.clone(), updated_config)
        .await
        .unwrap();

    tester.delete("opsgenie_contact", state).await.unwrap();
}

#[tokio::test]
async fn test_contact_create_rejects_unknown_method() {
    let server = MockServer::start().await;
    let tester = configured_tester(&server).await;

    let err = tester
        .create(
            "opsgenie_contact",
            json!({
                "username": "alice@example.com",
                "method": "pager",
                "to": "1-541-754-3010"
            }),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Invalid contact method: pager"));
}

#[tokio::test]
async fn test_schedule_create_attaches_owner_team() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/schedules"))
        .and(body_partial_json(json!({
            "name": "oncall",
            "timezone": "America/New_York",
            "ownerTeam": {"name": "ops_team"},
            "rotations": [{
                "name": "primary",
                "startDate": "2019-06-10T17:00:00Z",
                "type": "weekly",
                "participants": [{"type": "user", "username": "alice@example.com"}]
            }]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "s-1", "name": "oncall"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/schedules/s-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "s-1",
                "name": "oncall",
                "timezone": "America/New_York",
                "ownerTeam": {"id": "t-1", "name": "ops_team"},
                "rotations": [{
                    "name": "primary",
                    "startDate": "2019-06-10T17:00:00Z",
                    "type": "weekly",
                    "participants": [{"type": "user", "id": "u-1", "username": "alice@example.com"}]
                }]
            }
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
    let state = tester
        .lifecycle_create(
            "opsgenie_schedule",
            json!({
                "name": "oncall",
                "owner_team": "ops_team",
                "rotation": [{
                    "name": "primary",
                    "start_date": "2019-06-10T17:00:00Z",
                    "type": "weekly",
                    "participant": [{"type": "user", "username": "alice@example.com"}]
                }]
            }),
        )
        .await
        .unwrap();

    assert_eq!(state["id"], "s-1");
    assert_eq!(state["owner_team"], "ops_team");
    assert_eq!(state["rotation"][0]["type"], "weekly");
}

#[tokio::test]
async fn test_schedule_create_rejects_malformed_start_date() {
    let server = MockServer::start().await;
    let tester = configured_tester(&server).await;

    let err = tester
        .create(
            "opsgenie_schedule",
            json!({
                "name": "oncall",
                "owner_team": "ops_team",
                "rotation": [{
                    "name": "primary",
                    "start_date": "next Tuesday",
                    "type": "weekly",
                    "participant": []
                }]
            }),
        )
        .await
        .unwrap_err();

    assert!(err.to_string().contains("RFC3339"));
}

#[tokio::test]
async fn test_data_sources_read_by_identifier() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/teams/ops_team"))
        .and(query_param("identifierType", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "t-1",
                "name": "ops_team",
                "description": "On-call",
                "members": [
                    {"user": {"id": "u-1", "username": "alice@example.com"}, "role": "admin"}
                ]
            }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/users/alice@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "u-1",
                "username": "alice@example.com",
                "fullName": "Alice Example",
                "role": {"name": "Admin"},
                "locale": "en_US",
                "timeZone": "Europe/Kirov"
            }
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;

    let team = tester
        .read_data_source("opsgenie_team", json!({"name": "ops_team"}))
        .await
        .unwrap();
    assert_eq!(team["id"], "t-1");
    assert_eq!(team["member"][0]["role"], "admin");

    let user = tester
        .read_data_source("opsgenie_user", json!({"username": "alice@example.com"}))
        .await
        .unwrap();
    assert_eq!(user["id"], "u-1");
    assert_eq!(user["full_name"], "Alice Example");
    assert_eq!(user["timezone"], "Europe/Kirov");
}

#[tokio::test]
async fn test_team_plan_after_create_is_idempotent() {
    let server = MockServer::start().await;

    users_list_page(json!([
        {"id": "u-1", "username": "alice@example.com", "fullName": "Alice"}
    ]))
    .mount(&server)
    .await;

    Mock::given(method("POST"))
        .and(path("/v2/teams"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "t-1", "name": "ops_team"}
        })))
        .mount(&server)
        .await;

    // The remote object has no description; the config never set one.
    Mock::given(method("GET"))
        .and(path("/v2/teams/t-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "t-1",
                "name": "ops_team",
                "members": [
                    {"user": {"id": "u-1", "username": "alice@example.com"}, "role": "admin"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
    let config = json!({
        "name": "ops_team",
        "member": [{"username": "alice@example.com", "role": "admin"}]
    });

    let state = tester
        .lifecycle_create("opsgenie_team", config.clone())
        .await
        .unwrap();

    let plan = tester
        .plan_update("opsgenie_team", state, config)
        .await
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_schedule_plan_after_create_is_idempotent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": "s-1", "name": "oncall"}
        })))
        .mount(&server)
        .await;

    // The remote resolves the participant username to a user id.
    Mock::given(method("GET"))
        .and(path("/v2/schedules/s-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "s-1",
                "name": "oncall",
                "timezone": "America/New_York",
                "ownerTeam": {"id": "t-1", "name": "ops_team"},
                "rotations": [{
                    "name": "primary",
                    "startDate": "2019-06-10T17:00:00Z",
                    "type": "weekly",
                    "participants": [
                        {"type": "user", "id": "u-1", "username": "alice@example.com"}
                    ]
                }]
            }
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
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

    let state = tester
        .lifecycle_create("opsgenie_schedule", config.clone())
        .await
        .unwrap();

    let plan = tester
        .plan_update("opsgenie_schedule", state, config)
        .await
        .unwrap();
    assert_plan_no_changes(&plan);
}

#[tokio::test]
async fn test_contact_import_then_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/users/alice@example.com/contacts/c-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "c-1", "method": "sms", "to": "1-541-754-3010"}
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;
    let imported = tester
        .import_resource("opsgenie_contact", "alice@example.com/c-1")
        .await
        .unwrap();
    assert_eq!(imported[0].state["username"], "alice@example.com");
    assert_eq!(imported[0].state["id"], "c-1");

    let state = tester
        .read("opsgenie_contact", imported[0].state.clone())
        .await
        .unwrap();
    assert_eq!(state["method"], "sms");
    assert_eq!(state["to"], "1-541-754-3010");
}

#[tokio::test]
async fn test_import_then_read_fills_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v2/teams/t-1"))
        .and(query_param("identifierType", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "t-1", "name": "ops_team", "members": []}
        })))
        .mount(&server)
        .await;

    let tester = configured_tester(&server).await;

    let imported = tester
        .import_resource("opsgenie_team", "t-1")
        .await
        .unwrap();
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].state["id"], "t-1");

    // The imported state carries only the id; the read fills the rest.
    let state = tester
        .read("opsgenie_team", imported[0].state.clone())
        .await
        .unwrap();
    assert_eq!(state["name"], "ops_team");
}
