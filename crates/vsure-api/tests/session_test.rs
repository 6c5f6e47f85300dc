#![allow(clippy::unwrap_used)]
// Integration tests for `Session` using wiremock.

use std::net::TcpListener;
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vsure_api::graphql::{OperationDescriptor, OperationKind, SessionVariable, Slot, SlotType};
use reqwest::Method;
use vsure_api::{
    AuthState, BodyFormat, Credentials, Error, Session, SessionConfig, TokenStore, TransportRequest,
};

const USERNAME: &str = "user@example.com";
const PASSWORD: &str = "hunter2";
const GIID: &str = "123456789";

// ── Helpers ─────────────────────────────────────────────────────────

fn credentials() -> Credentials {
    Credentials::new(USERNAME, SecretString::from(PASSWORD))
}

fn basic_auth() -> String {
    format!("Basic {}", STANDARD.encode(format!("CPE/{USERNAME}:{PASSWORD}")))
}

fn url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).unwrap()
}

/// A base URL nothing listens on.
fn dead_mirror() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
}

fn session(endpoints: Vec<Url>, token_path: Option<PathBuf>) -> Session {
    let config = SessionConfig {
        endpoints,
        token_path,
        ..SessionConfig::default()
    };
    Session::new(credentials(), config).unwrap()
}

fn installations_body() -> Value {
    json!([{
        "data": {
            "account": {
                "installations": [{
                    "giid": GIID,
                    "alias": "Home",
                    "customerType": "PRIVATE",
                    "dealerId": "1",
                    "subsidiary": "SE",
                    "pinCodeLength": 4,
                    "locale": "sv_SE",
                    "address": { "street": "Main 1", "city": "Malmo", "postalNumber": "21100" }
                }]
            }
        }
    }])
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("authorization", basic_auth().as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessTokenMaxAgeSeconds": 900 }))
                .insert_header("set-cookie", "vid=abc123; Path=/; HttpOnly"),
        )
        .mount(server)
        .await;
}

async fn mount_installations(server: &MockServer, cookie: &str) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("cookie", cookie))
        .and(body_string_contains("fetchAllInstallations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(installations_body()))
        .mount(server)
        .await;
}

// ── Login and failover ──────────────────────────────────────────────

#[tokio::test]
async fn test_login_fails_over_to_second_mirror_and_sticks() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;

    let mut session = session(vec![dead_mirror(), url(&server)], None);
    let installations = session.login().await.unwrap();

    assert_eq!(installations.len(), 1);
    assert_eq!(session.state(), AuthState::Authenticated);
    assert_eq!(session.preferred_endpoint(), &url(&server));
    assert_eq!(session.active_installation().map(|i| i.giid.as_str()), Some(GIID));
}

#[tokio::test]
async fn test_outage_on_first_mirror_fails_over() {
    let down = MockServer::start().await;
    let up = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&down)
        .await;
    mount_login(&up).await;
    mount_installations(&up, "vid=abc123").await;

    let mut session = session(vec![url(&down), url(&up)], None);
    session.login().await.unwrap();

    assert_eq!(session.preferred_endpoint(), &url(&up));
}

#[tokio::test]
async fn test_rejected_credentials_are_a_login_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("{}"))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    let result = session.login().await;

    assert!(
        matches!(result, Err(Error::Login { .. })),
        "expected Login error, got: {result:?}"
    );
    assert_eq!(session.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_all_mirrors_down_is_a_login_error() {
    let mut session = session(vec![dead_mirror(), dead_mirror()], None);
    let result = session.login().await;

    assert!(matches!(result, Err(Error::Login { .. })), "got: {result:?}");
    assert_eq!(session.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_failed_installation_fetch_rolls_back_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "data": null,
            "errors": [{ "message": "Not allowed" }]
        }])))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    let result = session.login().await;

    assert!(matches!(result, Err(Error::Login { .. })), "got: {result:?}");
    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.installations().is_empty());
    assert!(session.token().is_empty());
    assert!(!token_path.exists());
}

#[tokio::test]
async fn test_out_of_range_installation_index_fails_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;

    let config = SessionConfig {
        endpoints: vec![url(&server)],
        installation_index: 3,
        ..SessionConfig::default()
    };
    let mut session = Session::new(credentials(), config).unwrap();

    assert!(matches!(session.login().await, Err(Error::Login { .. })));
    assert_eq!(session.state(), AuthState::Unauthenticated);
}

// ── Cached token ────────────────────────────────────────────────────

#[tokio::test]
async fn test_cached_token_resumes_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .insert_header("set-cookie", "vid=abc123; Path=/"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_installations(&server, "vid=abc123").await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");

    let mut first = session(vec![url(&server)], Some(token_path.clone()));
    let fetched = first.login().await.unwrap();
    assert!(token_path.exists());

    let mut second = session(vec![url(&server)], Some(token_path));
    let resumed = second.login_with_cached_token().await.unwrap();

    assert_eq!(resumed, fetched);
    assert_eq!(second.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_rejected_cache_is_deleted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut stale = vsure_api::SessionToken::default();
    stale.merge_set_cookie("vid=expired");
    TokenStore::new(Some(token_path.clone())).save(&stale).unwrap();

    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    let result = session.login_with_cached_token().await;

    assert!(matches!(result, Err(Error::LoggedOut { .. })), "got: {result:?}");
    assert!(!token_path.exists());
    assert_eq!(session.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_missing_cache_falls_back_to_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;

    let dir = tempfile::tempdir().unwrap();
    let mut session = session(vec![url(&server)], Some(dir.path().join("none.json")));

    let installations = session.authenticate().await.unwrap();
    assert_eq!(installations[0].giid, GIID);
}

#[tokio::test]
async fn test_username_only_resumes_cache_but_cannot_log_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;
    mount_installations(&server, "vid=cached").await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut cached = vsure_api::SessionToken::default();
    cached.merge_set_cookie("vid=cached");
    TokenStore::new(Some(token_path.clone())).save(&cached).unwrap();

    let config = |token_path| SessionConfig {
        endpoints: vec![url(&server)],
        token_path,
        ..SessionConfig::default()
    };

    let mut resumed =
        Session::new(Credentials::username_only(USERNAME), config(Some(token_path))).unwrap();
    let installations = resumed.authenticate().await.unwrap();
    assert_eq!(installations[0].giid, GIID);

    let mut fresh = Session::new(
        Credentials::username_only(USERNAME),
        config(Some(dir.path().join("none.json"))),
    )
    .unwrap();
    let result = fresh.authenticate().await;
    assert!(matches!(result, Err(Error::Login { .. })), "got: {result:?}");
    assert_eq!(fresh.state(), AuthState::Unauthenticated);
}

// ── Multi-factor ────────────────────────────────────────────────────

#[tokio::test]
async fn test_mfa_step_up_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "stepUpToken": "step" }))
                .insert_header("set-cookie", "vs-stepup=s1; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/mfa"))
        .and(query_param("type", "phone"))
        .and(header("cookie", "vs-stepup=s1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/mfa/validate"))
        .and(body_json(json!({ "token": "123456" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .insert_header("set-cookie", "vs-stepup=; Max-Age=0")
                .append_header("set-cookie", "vid=abc123; Path=/"),
        )
        .mount(&server)
        .await;
    mount_installations(&server, "vid=abc123").await;

    let mut session = session(vec![url(&server)], None);

    assert!(matches!(session.login().await, Err(Error::MfaRequired)));
    assert_eq!(session.state(), AuthState::AwaitingMfaChallenge);

    session.request_mfa().await.unwrap();
    let installations = session.validate_mfa("123456").await.unwrap();

    assert_eq!(installations.len(), 1);
    assert_eq!(session.state(), AuthState::Authenticated);
    assert_eq!(session.token().get("vs-stepup"), None);
}

#[tokio::test]
async fn test_trust_device_after_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/auth/trust"))
        .and(header("cookie", "vid=abc123"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    assert!(matches!(session.trust_device().await, Err(Error::NotAuthenticated)));

    session.login().await.unwrap();
    session.trust_device().await.unwrap();
    assert_eq!(session.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_wrong_mfa_code_rolls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stepUpToken": "s" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/mfa/validate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad code"))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    let _ = session.login().await;

    assert!(matches!(
        session.validate_mfa("000000").await,
        Err(Error::Login { .. })
    ));
    assert_eq!(session.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn test_mfa_calls_require_pending_challenge() {
    let mut session = session(vec![dead_mirror()], None);
    assert!(matches!(session.request_mfa().await, Err(Error::Login { .. })));
}

// ── Refresh and logout ──────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_merges_and_persists_cookies() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("GET"))
        .and(path("/auth/token"))
        .and(header("cookie", "vid=abc123"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "vid=refreshed; Path=/"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    session.login().await.unwrap();
    session.refresh().await.unwrap();

    assert_eq!(session.token().get("vid"), Some("refreshed"));
    let cached = TokenStore::new(Some(token_path)).load().unwrap().unwrap();
    assert_eq!(cached.get("vid"), Some("refreshed"));
}

#[tokio::test]
async fn test_refresh_requires_login() {
    let mut session = session(vec![dead_mirror()], None);
    assert!(matches!(session.refresh().await, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_logout_twice_is_harmless() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    session.login().await.unwrap();

    session.logout().await;
    session.logout().await;

    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.token().is_empty());
    assert!(session.installations().is_empty());
    assert!(!token_path.exists());
}

#[tokio::test]
async fn test_logout_with_unreachable_server_still_clears() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    session.login().await.unwrap();
    session.logout().await;

    assert_eq!(session.state(), AuthState::Unauthenticated);
    assert!(session.token().is_empty());
}

#[tokio::test]
async fn test_logout_ends_cached_session_from_fresh_process() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/auth/logout"))
        .and(header("cookie", "vid=cached"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut token = vsure_api::SessionToken::default();
    token.merge_set_cookie("vid=cached; Path=/");
    TokenStore::new(Some(token_path.clone())).save(&token).unwrap();

    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    session.logout().await;

    assert!(session.token().is_empty());
    assert!(!token_path.exists());
}

// ── Dispatch ────────────────────────────────────────────────────────

const SET_LOCK: OperationDescriptor = OperationDescriptor {
    key: "set_lock",
    name: "DoorLock",
    kind: OperationKind::Mutation,
    help: "",
    document: "mutation DoorLock($email: String!, $deviceLabel: String!, $code: String!) { x }",
    slots: &[
        Slot::session("email", SessionVariable::Username),
        Slot::caller("deviceLabel", SlotType::DeviceLabel),
        Slot::caller("code", SlotType::Code),
    ],
};

#[tokio::test]
async fn test_missing_caller_value_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session(vec![url(&server)], None);
    let result = session.build(&SET_LOCK, &[json!("ABCD EFGH")]);

    assert!(
        matches!(result, Err(Error::MissingVariable { ref slot, .. }) if slot == "code"),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn test_end_to_end_login_select_and_query() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("application_id", "PS_PYTHON"))
        .and(body_string_contains("SmartPlug"))
        .and(body_string_contains(GIID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "data": {
                "installation": {
                    "smartplugs": [{
                        "device": { "deviceLabel": "ABCD EFGH", "area": "Kitchen" },
                        "currentState": "ON"
                    }]
                }
            }
        }])))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    let installations = session.login().await.unwrap();
    assert!(!installations.is_empty());

    session.set_active_installation(&installations[0].giid).unwrap();
    let data = session.query("smart_plugs", &[]).await.unwrap();

    assert_eq!(
        data.pointer("/installation/smartplugs/0/currentState"),
        Some(&json!("ON"))
    );
}

#[tokio::test]
async fn test_batch_results_keep_request_order() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("RemainingSms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "data": { "installation": { "remainingSms": 7 } } },
            { "data": { "installation": { "broadband": { "isBroadbandConnected": true } } } }
        ])))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    session.login().await.unwrap();

    let first = session
        .build(vsure_api::graphql::catalog::find("remaining_sms").unwrap(), &[])
        .unwrap();
    let second = session
        .build(vsure_api::graphql::catalog::find("broadband").unwrap(), &[])
        .unwrap();
    let results = session.dispatch(&[first, second]).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].pointer("/installation/remainingSms"), Some(&json!(7)));
    assert_eq!(
        results[1].pointer("/installation/broadband/isBroadbandConnected"),
        Some(&json!(true))
    );
}

#[tokio::test]
async fn test_unknown_installation_is_rejected() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;

    let mut session = session(vec![url(&server)], None);
    session.login().await.unwrap();

    assert!(matches!(
        session.set_active_installation("nope"),
        Err(Error::UnknownInstallation { .. })
    ));
}

#[tokio::test]
async fn test_login_page_mid_session_logs_out() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("Climate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><head><title>Log in - My Pages - Verisure</title></head></html>",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("session.json");
    let mut session = session(vec![url(&server)], Some(token_path.clone()));
    session.login().await.unwrap();
    assert!(token_path.exists());

    let result = session.query("climate", &[]).await;

    assert!(matches!(result, Err(Error::LoggedOut { .. })), "got: {result:?}");
    assert_eq!(session.state(), AuthState::LoggedOut);
    assert!(session.token().is_empty());
    assert!(!token_path.exists());
}

#[tokio::test]
async fn test_mutation_does_not_fail_over_on_outage() {
    let down = MockServer::start().await;
    let spare = MockServer::start().await;
    mount_login(&down).await;
    mount_installations(&down, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("DoorLock"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&down)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "data": {} }])))
        .expect(0)
        .mount(&spare)
        .await;

    let mut session = session(vec![url(&down), url(&spare)], None);
    session.login().await.unwrap();

    let op = session
        .build(&SET_LOCK, &[json!("ABCD EFGH"), json!("1234")])
        .unwrap();
    let result = session.dispatch(&[op]).await;

    assert!(matches!(result, Err(Error::TemporarilyUnavailable)), "got: {result:?}");
    assert_eq!(session.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_application_errors_carry_batch_position() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("Capability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "data": null,
            "errors": [{ "message": "denied", "data": { "errorCode": "SYS_00004" } }]
        }])))
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    session.login().await.unwrap();

    match session.query("capability", &[]).await {
        Err(Error::Application { errors }) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].index, 0);
            assert_eq!(errors[0].code.as_deref(), Some("SYS_00004"));
        }
        other => panic!("expected Application error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatch_requires_login() {
    let mut session = session(vec![dead_mirror()], None);
    assert!(matches!(
        session.query("broadband", &[]).await,
        Err(Error::NotAuthenticated)
    ));
}

// ── Generic REST requests ───────────────────────────────────────────

#[tokio::test]
async fn test_get_request_decodes_xml_attribute_bags() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_installations(&server, "vid=abc123").await;
    Mock::given(method("GET"))
        .and(path("/installation/123456789/eventlog"))
        .and(query_param("offset", "0"))
        .and(query_param("pagesize", "2"))
        .and(header("cookie", "vid=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<events><event><type>ARM</type><area>Hall &amp; Kitchen</area></event>\
             <event><type>DISARM</type><note/></event></events>",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session(vec![url(&server)], None);
    session.login().await.unwrap();

    let request = TransportRequest::get(format!("/installation/{GIID}/eventlog"))
        .query(&[("offset", "0"), ("pagesize", "2")]);
    let value = session.request(request, BodyFormat::Xml).await.unwrap();

    assert_eq!(
        value,
        json!([
            { "type": "ARM", "area": "Hall & Kitchen" },
            { "type": "DISARM", "note": null }
        ])
    );
}

#[tokio::test]
async fn test_get_request_fails_over_and_unescapes() {
    let down = MockServer::start().await;
    let spare = MockServer::start().await;
    mount_login(&down).await;
    mount_installations(&down, "vid=abc123").await;
    Mock::given(method("GET"))
        .and(path("/overview"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&down)
        .await;
    Mock::given(method("GET"))
        .and(path("/overview"))
        .and(header("cookie", "vid=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{&quot;area&quot;:&quot;Tom & Jerry&quot;}"),
        )
        .expect(1)
        .mount(&spare)
        .await;

    let mut session = session(vec![url(&down), url(&spare)], None);
    session.login().await.unwrap();

    let value = session
        .request(TransportRequest::get("/overview"), BodyFormat::EscapedJson)
        .await
        .unwrap();

    assert_eq!(value, json!({ "area": "Tom & Jerry" }));
    assert_eq!(session.preferred_endpoint(), &url(&spare));
}

#[tokio::test]
async fn test_put_request_does_not_fail_over_on_outage() {
    let down = MockServer::start().await;
    let spare = MockServer::start().await;
    mount_login(&down).await;
    mount_installations(&down, "vid=abc123").await;
    Mock::given(method("PUT"))
        .and(path("/settings/name"))
        .and(body_json(json!({ "name": "Cabin" })))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&down)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&spare)
        .await;

    let mut session = session(vec![url(&down), url(&spare)], None);
    session.login().await.unwrap();

    let request =
        TransportRequest::new(Method::PUT, "/settings/name").json(json!({ "name": "Cabin" }));
    let result = session.request(request, BodyFormat::Json).await;

    assert!(matches!(result, Err(Error::TemporarilyUnavailable)), "got: {result:?}");
    assert_eq!(session.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_request_requires_login() {
    let mut session = session(vec![dead_mirror()], None);
    assert!(matches!(
        session.request(TransportRequest::get("/overview"), BodyFormat::Json).await,
        Err(Error::NotAuthenticated)
    ));
}
