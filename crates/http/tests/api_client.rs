use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use gatehouse_auth::UserInfoProvider;
use gatehouse_core::recording::{CountingReloader, Notice, RecordingNotifier, ScriptedConfirm};
use gatehouse_core::{Role, SessionContext};
use gatehouse_http::{
    ApiClient, ApiError, FALLBACK_NOTICE, FORBIDDEN_TEXT, HttpUserInfoProvider, RELOGIN_TEXT,
    ResponseInterceptor,
};
use serde::Deserialize;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let app = Router::new()
            .route("/ok", get(saved))
            .route("/quiet", get(|| async { Json(json!({ "Success": true, "Items": [1, 2] })) }))
            .route("/fail", get(quota_exceeded))
            .route("/expired", get(|| async { StatusCode::UNAUTHORIZED }))
            .route("/forbidden", get(|| async { StatusCode::FORBIDDEN }))
            .route("/boom", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }))
            .route("/plain", get(|| async { "not json" }))
            .route("/echo", post(echo_headers))
            .route("/user/info", get(current_user));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn saved() -> Json<Value> {
    Json(json!({ "Success": true, "Message": "Saved", "Id": 7 }))
}

async fn quota_exceeded() -> Json<Value> {
    Json(json!({ "Success": false, "Message": "Quota exceeded" }))
}

async fn current_user() -> Json<Value> {
    Json(json!({ "Success": true, "Name": "alice", "Roles": ["admin"] }))
}

async fn echo_headers(headers: HeaderMap) -> Json<Value> {
    let read = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "Success": true,
        "Authorization": read("authorization"),
        "AccessToken": read("x-access-token"),
        "Nonce": read("x-ca-nonce"),
    }))
}

struct Harness {
    session: Arc<SessionContext>,
    notifier: Arc<RecordingNotifier>,
    dialog: Arc<ScriptedConfirm>,
    reloader: Arc<CountingReloader>,
    client: Arc<ApiClient>,
}

fn harness(base_url: &str, dialog: ScriptedConfirm) -> Harness {
    let session = Arc::new(SessionContext::new());
    session.sign_in("secret-token");
    let notifier = Arc::new(RecordingNotifier::new());
    let dialog = Arc::new(dialog);
    let reloader = Arc::new(CountingReloader::new());
    let responses = ResponseInterceptor::new(session.clone())
        .with_notifier(notifier.clone())
        .with_dialog(dialog.clone())
        .with_reloader(reloader.clone());
    let client = Arc::new(ApiClient::new(
        reqwest::Client::new(),
        base_url,
        session.clone(),
        responses,
    ));
    Harness {
        session,
        notifier,
        dialog,
        reloader,
        client,
    }
}

#[tokio::test]
async fn success_envelope_resolves_payload_with_notice() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let payload = h.client.send(h.client.get("/ok")).await.unwrap();

    assert_eq!(payload, json!({ "Id": 7 }));
    assert_eq!(h.notifier.notices(), vec![Notice::Success("Saved".to_string())]);
}

#[tokio::test]
async fn typed_payload_decodes() {
    #[derive(Deserialize)]
    struct Page {
        #[serde(rename = "Items")]
        items: Vec<u32>,
    }

    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let page: Page = h.client.send_json(h.client.get("/quiet")).await.unwrap();

    assert_eq!(page.items, vec![1, 2]);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn requests_carry_token_and_nonce() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let first = h.client.send(h.client.post("/echo")).await.unwrap();
    let second = h.client.send(h.client.post("/echo")).await.unwrap();

    assert_eq!(first["Authorization"], "Bearer secret-token");
    assert_eq!(first["AccessToken"], "secret-token");
    assert!(first["Nonce"].is_string());
    assert_ne!(first["Nonce"], second["Nonce"]);
}

#[tokio::test]
async fn anonymous_requests_omit_credentials() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());
    h.session.reset();

    let echoed = h.client.send(h.client.post("/echo")).await.unwrap();

    assert!(echoed["Authorization"].is_null());
    assert!(echoed["AccessToken"].is_null());
    assert!(echoed["Nonce"].is_string());
}

#[tokio::test]
async fn domain_failure_is_rejected_with_server_message() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let err = h.client.send(h.client.get("/fail")).await.unwrap_err();

    assert!(matches!(err, ApiError::Domain(_)));
    assert_eq!(h.notifier.errors(), vec!["Quota exceeded"]);
}

#[tokio::test]
async fn expired_session_accepted_resets_and_reloads() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::accepting());

    let err = h.client.send(h.client.get("/expired")).await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    assert!(!h.session.is_authenticated());
    assert_eq!(h.reloader.reloads(), 1);
    assert_eq!(h.dialog.prompts()[0].text, RELOGIN_TEXT);
}

#[tokio::test]
async fn expired_session_declined_keeps_token() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let err = h.client.send(h.client.get("/expired")).await.unwrap_err();

    assert!(matches!(err, ApiError::SessionExpired));
    assert_eq!(h.session.token().as_deref(), Some("secret-token"));
    assert_eq!(h.reloader.reloads(), 0);
}

#[tokio::test]
async fn forbidden_shows_permission_alert() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::accepting());

    let err = h.client.send(h.client.get("/forbidden")).await.unwrap_err();

    assert!(matches!(err, ApiError::Forbidden));
    assert!(h.session.is_authenticated());
    assert_eq!(h.dialog.prompts()[0].text, FORBIDDEN_TEXT);
}

#[tokio::test]
async fn server_error_and_plain_body_are_rejected() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());

    let err = h.client.send(h.client.get("/boom")).await.unwrap_err();
    assert!(matches!(err, ApiError::UnexpectedStatus(500)));

    let err = h.client.send(h.client.get("/plain")).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));

    assert_eq!(
        h.notifier.errors(),
        vec!["Request failed with status 500", FALLBACK_NOTICE]
    );
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness(&format!("http://{}", addr), ScriptedConfirm::declining());

    let err = h.client.send(h.client.get("/ok")).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].is_empty());
}

#[tokio::test]
async fn user_info_provider_reads_profile_from_api() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());
    let provider = HttpUserInfoProvider::new(h.client.clone(), "/user/info");

    let info = provider.current_user("secret-token").await.unwrap();

    assert_eq!(info.name, "alice");
    assert_eq!(info.roles, vec![Role::new("admin")]);
}

#[tokio::test]
async fn user_info_provider_surfaces_api_failures() {
    let server = TestServer::spawn().await;
    let h = harness(&server.base_url, ScriptedConfirm::declining());
    let provider = HttpUserInfoProvider::new(h.client.clone(), "/fail");

    let err = provider.current_user("secret-token").await.unwrap_err();

    assert!(err.to_string().contains("Quota exceeded"));
}
