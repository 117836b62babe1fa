//! End-to-end tests of the 401-recovery path against a mock backend.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use atrium_application::{CredentialStore, MemoryCredentialStore};
use atrium_domain::{ApiRequest, AuthError, ClientConfig, Credential};
use atrium_infrastructure::{ApiClient, ApiError};

fn client_for(server: &MockServer, store: Arc<MemoryCredentialStore>) -> ApiClient {
    let config = ClientConfig::new(server.uri());
    ApiClient::new(&config, store).unwrap()
}

fn seeded_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credential(Credential::new(
        "tok-old",
        "tok-refresh",
    )))
}

async fn mount_refresh_success(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/auth/refresh-token"))
        .and(header("authorization", "Bearer tok-refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"accessToken": "tok-new"})),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn attaches_bearer_credential_to_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs"))
        .and(header("authorization", "Bearer tok-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"orgs": []})))
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store());
    let response = client
        .execute(&ApiRequest::get("/orgs"))
        .await
        .expect("request should succeed");
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn requests_without_credential_go_out_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(MemoryCredentialStore::new()));
    let response = client
        .execute(&ApiRequest::get("/health"))
        .await
        .expect("request should succeed");
    assert_eq!(response.status, 200);

    let received = server.received_requests().await.unwrap_or_default();
    assert!(
        received
            .iter()
            .all(|r| !r.headers.contains_key("authorization"))
    );
}

/// Two requests hit a backend that rejects the expired token; exactly one
/// refresh exchange happens and both complete with their original payloads.
#[tokio::test]
async fn concurrent_401s_share_one_refresh_exchange() {
    let server = MockServer::start().await;
    mount_refresh_success(&server, 1).await;

    for route in ["/orgs", "/projects"] {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer tok-old"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", "Bearer tok-new"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"route": route})),
            )
            .mount(&server)
            .await;
    }

    let store = seeded_store();
    let client = client_for(&server, Arc::clone(&store));

    let orgs = ApiRequest::get("/orgs");
    let projects = ApiRequest::get("/projects");
    let (a, b) = tokio::join!(
        client.execute(&orgs),
        client.execute(&projects),
    );

    let a = a.expect("request A should recover");
    let b = b.expect("request B should recover");
    assert_eq!(a.status, 200);
    assert_eq!(b.status, 200);

    // The refreshed access credential is persisted; the refresh half is kept.
    assert_eq!(
        store.load().await,
        Some(Credential::new("tok-new", "tok-refresh"))
    );
    // MockServer verifies the refresh endpoint saw exactly one call on drop.
}

/// A 401 that survives a successful refresh is terminal: the request is
/// not retried a second time.
#[tokio::test]
async fn second_401_is_not_retried_again() {
    let server = MockServer::start().await;
    mount_refresh_success(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/always-stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, seeded_store());
    let result = client.execute(&ApiRequest::get("/always-stale")).await;

    match result {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected terminal 401, got {other:?}"),
    }
}

/// A rejected refresh exchange fails every in-flight request with a cause
/// traceable to the refresh failure, and purges both stored credentials.
#[tokio::test]
async fn refresh_rejection_fails_all_requests_and_purges_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    for route in ["/orgs", "/projects"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
    }

    let store = seeded_store();
    let client = client_for(&server, Arc::clone(&store));

    let orgs = ApiRequest::get("/orgs");
    let projects = ApiRequest::get("/projects");
    let (a, b) = tokio::join!(
        client.execute(&orgs),
        client.execute(&projects),
    );

    for result in [a, b] {
        match result {
            Err(ApiError::Auth(error)) => match error {
                AuthError::RefreshFailed { status, .. } => assert_eq!(status, Some(403)),
                // A request that discovered the purge after settlement finds
                // no refresh token to renew with; still an auth failure.
                AuthError::MissingRefreshToken => {}
                other => panic!("unexpected auth error: {other:?}"),
            },
            other => panic!("expected auth failure, got {other:?}"),
        }
    }

    assert_eq!(store.load().await, None);
}

/// Transport-level failures propagate directly and never touch the
/// refresh path or the stored credentials.
#[tokio::test]
async fn transport_errors_bypass_refresh() {
    // Nothing listens on this port.
    let config = ClientConfig::new("http://127.0.0.1:9").with_request_timeout(1);
    let store = seeded_store();
    let client = ApiClient::new(&config, store.clone()).unwrap();

    let result = client.execute(&ApiRequest::get("/orgs")).await;
    assert!(matches!(
        result,
        Err(ApiError::Transport(_) | ApiError::Timeout)
    ));

    // Credentials are untouched.
    assert_eq!(
        store.load().await,
        Some(Credential::new("tok-old", "tok-refresh"))
    );
}

/// A 401 arriving after a settled refresh cycle starts a fresh cycle
/// rather than being suppressed.
#[tokio::test]
async fn stale_401_after_settled_refresh_starts_new_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/refresh-token"))
        .and(header("authorization", "Bearer tok-refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"accessToken": "tok-new"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    // First call: expired token, recovers. Second call: the server expired
    // the renewed token as well, recovering again.
    Mock::given(method("GET"))
        .and(path("/orgs"))
        .and(header("authorization", "Bearer tok-old"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orgs"))
        .and(header("authorization", "Bearer tok-new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(header("authorization", "Bearer tok-new"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let store = seeded_store();
    let client = client_for(&server, Arc::clone(&store));

    let first = client.execute(&ApiRequest::get("/orgs")).await;
    assert!(first.is_ok());

    // The renewed token is immediately rejected on the next endpoint; the
    // client treats that as a fresh idle-state discovery.
    let second = client.execute(&ApiRequest::get("/projects")).await;
    match second {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected terminal 401 after second recovery, got {other:?}"),
    }
}
