//! HTTP backend tests against a mock auth method service.

use assert_json_diff::assert_json_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use authsync_core::{AuthMethodOption, Field, FieldValue, MethodType};
use authsync_gateway::{
    AuthMethodGateway, CreateRequest, GatewayConfig, GatewayError, HttpGateway, Lookup,
    UpdateRequest, VersionToken,
};

fn gateway(server: &MockServer) -> HttpGateway {
    HttpGateway::new(GatewayConfig::new(server.uri()).with_token("at_test")).unwrap()
}

fn oidc_document(version: u32) -> serde_json::Value {
    json!({
        "id": "amoidc_1234567890",
        "version": version,
        "type": "oidc",
        "scope_id": "global",
        "name": "corporate",
        "attributes": {
            "state": "inactive",
            "issuer": "https://idp.example.com",
            "client_id": "authsync",
            "client_secret_hmac": "abc",
            "max_age": 3600
        }
    })
}

#[tokio::test]
async fn test_create_posts_typed_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth-methods"))
        .and(header("authorization", "Bearer at_test"))
        .and(body_json(json!({
            "type": "oidc",
            "scope_id": "global",
            "name": "corporate",
            "attributes": {"issuer": "https://idp.example.com", "max_age": 3600}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(oidc_document(1)))
        .expect(1)
        .mount(&server)
        .await;

    let created = gateway(&server)
        .create(&CreateRequest {
            method_type: MethodType::Oidc,
            scope_id: "global".to_string(),
            options: vec![
                AuthMethodOption::set(Field::Name, FieldValue::Str("corporate".to_string())),
                AuthMethodOption::set(
                    Field::OidcIssuer,
                    FieldValue::Str("https://idp.example.com".to_string()),
                ),
                AuthMethodOption::set(Field::OidcMaxAge, FieldValue::Uint(3600)),
            ],
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created.id, "amoidc_1234567890");
    assert_eq!(created.version, 1);
    assert_eq!(created.method_type, "oidc");
    assert_json_eq!(created.attributes["max_age"], json!(3600));
}

#[tokio::test]
async fn test_create_with_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let created = gateway(&server)
        .create(&CreateRequest {
            method_type: MethodType::Password,
            scope_id: "global".to_string(),
            options: vec![],
        })
        .await
        .unwrap();
    assert!(created.is_none());
}

#[tokio::test]
async fn test_create_unknown_scope_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "NotFound",
            "message": "Scope \"o_missing\" not found."
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .create(&CreateRequest {
            method_type: MethodType::Password,
            scope_id: "o_missing".to_string(),
            options: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::rejected(
            404,
            Some("NotFound".to_string()),
            "Scope \"o_missing\" not found."
        )
    );
}

#[tokio::test]
async fn test_create_failure_without_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .create(&CreateRequest {
            method_type: MethodType::Password,
            scope_id: "global".to_string(),
            options: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::rejected(503, None, "upstream unavailable"));
}

#[tokio::test]
async fn test_read_found_and_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/auth-methods/amoidc_1234567890"))
        .respond_with(ResponseTemplate::new(200).set_body_json(oidc_document(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/auth-methods/amoidc_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "kind": "NotFound",
            "message": "Resource not found."
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let found = gateway.read("amoidc_1234567890").await.unwrap().found().unwrap();
    assert_eq!(found.version, 4);
    assert_eq!(found.name.as_deref(), Some("corporate"));

    assert_eq!(gateway.read("amoidc_gone").await.unwrap(), Lookup::NotFound);
}

#[tokio::test]
async fn test_read_malformed_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ampw_1"})))
        .mount(&server)
        .await;

    let err = gateway(&server).read("ampw_1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Malformed(_)));
}

#[tokio::test]
async fn test_update_automatic_versioning() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/auth-methods/amoidc_1234567890"))
        .and(query_param("automatic_versioning", "true"))
        .and(body_json(json!({"attributes": {"max_age": 3600}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(oidc_document(2)))
        .expect(1)
        .mount(&server)
        .await;

    let updated = gateway(&server)
        .update(&UpdateRequest {
            id: "amoidc_1234567890".to_string(),
            version: VersionToken::Automatic,
            options: vec![AuthMethodOption::set(Field::OidcMaxAge, FieldValue::Uint(3600))],
        })
        .await
        .unwrap();

    let envelope = updated.found().flatten().unwrap();
    assert_eq!(envelope.version, 2);
}

#[tokio::test]
async fn test_update_exact_version_and_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(body_json(json!({"description": null, "version": 1})))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "kind": "FailedPrecondition",
            "message": "Version mismatch."
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .update(&UpdateRequest {
            id: "amoidc_1234567890".to_string(),
            version: VersionToken::Exact(1),
            options: vec![AuthMethodOption::Default(Field::Description)],
        })
        .await
        .unwrap_err();
    assert!(err.is_version_conflict());
    assert_eq!(
        err.to_string(),
        "Remote service rejected the request (HTTP 409): Version mismatch."
    );
}

#[tokio::test]
async fn test_update_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = gateway(&server)
        .update(&UpdateRequest {
            id: "ampw_gone".to_string(),
            version: VersionToken::Automatic,
            options: vec![AuthMethodOption::Default(Field::Name)],
        })
        .await
        .unwrap();
    assert!(result.is_not_found());
}

#[tokio::test]
async fn test_delete_outcomes() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/auth-methods/ampw_1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/auth-methods/ampw_gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v1/auth-methods/ampw_locked"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "kind": "PermissionDenied",
            "message": "Forbidden."
        })))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    assert_eq!(gateway.delete("ampw_1").await.unwrap(), Lookup::Found(()));
    assert_eq!(gateway.delete("ampw_gone").await.unwrap(), Lookup::NotFound);

    let err = gateway.delete("ampw_locked").await.unwrap_err();
    assert_eq!(
        err,
        GatewayError::rejected(403, Some("PermissionDenied".to_string()), "Forbidden.")
    );
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    let server = MockServer::start().await;
    let addr = server.uri();
    drop(server);

    let gateway = HttpGateway::new(GatewayConfig::new(addr)).unwrap();
    let err = gateway.read("ampw_1").await.unwrap_err();
    assert!(err.is_transport());
}
