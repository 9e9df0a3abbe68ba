//! Endpoint tests for the full HTTP surface.
//!
//! Each test builds an in-process service over a [`MemoryCredentialStore`] it keeps a handle to,
//! so it can seed tenants beforehand and inspect records afterwards. Fixed signatures are
//! precomputed HMAC-SHA256 digests over the exact bytes the test sends.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use actix_web::{
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use aps_common::Secret;
use platform_tools::TokenCache;
use trust_engine::{
    helpers::calculate_hmac,
    AppIdentity,
    CredentialApi,
    CredentialStore,
    MemoryCredentialStore,
    TenantCredentials,
    VerificationApi,
    SIGNATURE_HEADER,
};

use crate::{
    config::ServerOptions,
    data_objects::RegistrationResponse,
    dispatcher::Dispatcher,
    routes::{health, ActionRoute, ConfirmRoute, PageRoute, RegisterRoute, WebhookRoute},
};

const APP_SECRET: &str = "mysecret";
const SERVER_URL: &str = "https://app.example.com";

fn configure(store: MemoryCredentialStore, dispatcher: Dispatcher) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let app_identity = AppIdentity::new("test-app", APP_SECRET);
        cfg.app_data(web::Data::new(VerificationApi::new(app_identity.clone(), store.clone())))
            .app_data(web::Data::new(CredentialApi::new(app_identity, store)))
            .app_data(web::Data::new(TokenCache::new()))
            .app_data(web::Data::new(dispatcher))
            .app_data(web::Data::new(ServerOptions { server_url: SERVER_URL.to_string() }))
            .route("/health", web::get().to(health))
            .service(RegisterRoute::<MemoryCredentialStore>::new())
            .service(ConfirmRoute::<MemoryCredentialStore>::new())
            .service(WebhookRoute::<MemoryCredentialStore>::new())
            .service(ActionRoute::<MemoryCredentialStore>::new())
            .service(PageRoute::<MemoryCredentialStore>::new());
    }
}

async fn call(
    store: MemoryCredentialStore,
    dispatcher: Dispatcher,
    req: TestRequest,
) -> (StatusCode, String) {
    let app = App::new().configure(configure(store, dispatcher));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    (status, body)
}

async fn seed_tenant(store: &MemoryCredentialStore, tenant_id: &str, secret: &str, confirmed: bool) {
    let (api_key, api_secret) = if confirmed {
        (Some("the-key".to_string()), Some(Secret::new("the-secret".to_string())))
    } else {
        (None, None)
    };
    store
        .store(TenantCredentials {
            tenant_id: tenant_id.to_string(),
            tenant_base_url: "https://tenant.example.com".to_string(),
            shared_secret: Secret::new(secret.to_string()),
            api_key,
            api_secret,
            registered_at: "1".to_string(),
        })
        .await
        .unwrap();
}

fn signed_post(path: &str, body: &str, key: &str) -> TestRequest {
    let signature = calculate_hmac(key, body.as_bytes());
    TestRequest::post()
        .uri(path)
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(body.to_string())
}

#[actix_web::test]
async fn health_always_responds() {
    let (status, body) = call(MemoryCredentialStore::new(), Dispatcher::new(), TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn the_full_registration_handshake_succeeds() {
    let store = MemoryCredentialStore::new();

    // Step 1: registration, query-signed with the app secret. The digest covers
    // "tenant_id=123&tenant_base_url=https://x&timestamp=1".
    let query = "tenant_id=123&tenant_base_url=https%3A%2F%2Fx&timestamp=1\
                 &signature=7df002b149153d62dcc513970bb48d2156a56740238c9857a2b4c405903829b3";
    let req = TestRequest::get().uri(&format!("/setup/register?{query}"));
    let (status, body) = call(store.clone(), Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: RegistrationResponse = serde_json::from_str(&body).unwrap();
    // HMAC-SHA256("mysecret", "123" + "https://x" + "test-app")
    assert_eq!(response.proof, "ed91ec7208d4ceafb110da083e2d5712284f133f3a01eab0a09cf02a84e5ec38");
    assert_eq!(response.confirmation_url, format!("{SERVER_URL}/setup/register-confirm"));
    assert_eq!(store.get("123").await.unwrap().shared_secret.reveal(), &response.secret);

    // Step 2: confirmation, payload-signed with the freshly issued shared secret.
    let confirmation = r#"{"tenant_id":"123","api_key":"the-key","api_secret":"the-secret"}"#;
    let req = signed_post("/setup/register-confirm", confirmation, &response.secret);
    let (status, body) = call(store.clone(), Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let record = store.get("123").await.unwrap();
    assert_eq!(record.api_key.as_deref(), Some("the-key"));
    assert_eq!(record.api_secret.as_ref().map(|s| s.reveal().as_str()), Some("the-secret"));
}

#[actix_web::test]
async fn a_forged_registration_request_is_rejected_opaquely() {
    let query = format!("tenant_id=123&tenant_base_url=https%3A%2F%2Fx&timestamp=1&signature={}", "00".repeat(32));
    let req = TestRequest::get().uri(&format!("/setup/register?{query}"));
    let (status, body) = call(MemoryCredentialStore::new(), Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"invalid signature"}"#);
}

#[actix_web::test]
async fn confirming_an_unregistered_tenant_fails_opaquely() {
    let confirmation = r#"{"tenant_id":"ghost","api_key":"k","api_secret":"s"}"#;
    let req = signed_post("/setup/register-confirm", confirmation, "whatever");
    let (status, body) = call(MemoryCredentialStore::new(), Dispatcher::new(), req).await;
    // The tenant lookup happens inside verification, so the failure stays opaque.
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body, r#"{"error":"invalid signature"}"#);
}

#[actix_web::test]
async fn a_signed_webhook_reaches_its_handler() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", true).await;
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let mut dispatcher = Dispatcher::new();
    dispatcher.on_event("foo", move |req, _api| {
        let seen = Arc::clone(&seen);
        Box::pin(async move {
            assert_eq!(req.source.tenant_id, "123");
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    let body = r#"{"data":{"event":"foo"},"source":{"tenant_id":"123"}}"#;
    // HMAC-SHA256("mysecret", body)
    let req = TestRequest::post()
        .uri("/webhook")
        .insert_header((SIGNATURE_HEADER, "632775d04900b15bebbe40d5c493f21773fd87e375efab2ccecab2565f3ec81f"))
        .set_payload(body);
    let (status, body) = call(store, dispatcher, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn a_webhook_with_a_garbage_signature_never_reaches_the_dispatcher() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", true).await;
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let mut dispatcher = Dispatcher::new();
    dispatcher.on_event("foo", move |_req, _api| {
        let seen = Arc::clone(&seen);
        Box::pin(async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });

    let req = TestRequest::post()
        .uri("/webhook")
        .insert_header((SIGNATURE_HEADER, "foo"))
        .set_payload(r#"{"data":{"event":"foo"},"source":{"tenant_id":"123"}}"#);
    let (status, body) = call(store, dispatcher, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"invalid signature"}"#);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[actix_web::test]
async fn an_unrouted_webhook_event_is_a_404() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", true).await;
    let body = r#"{"data":{"event":"order.placed"},"source":{"tenant_id":"123"}}"#;
    let req = signed_post("/webhook", body, "mysecret");
    let (status, body) = call(store, Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("no webhook handler found for event: order.placed"), "{body}");
}

#[actix_web::test]
async fn a_webhook_for_an_unconfirmed_tenant_is_a_409() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", false).await;
    let mut dispatcher = Dispatcher::new();
    dispatcher.on_event("foo", |_req, _api| Box::pin(async { Ok(()) }));
    let body = r#"{"data":{"event":"foo"},"source":{"tenant_id":"123"}}"#;
    let req = signed_post("/webhook", body, "mysecret");
    let (status, body) = call(store, dispatcher, req).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[actix_web::test]
async fn an_action_without_entity_or_action_is_a_400() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", true).await;
    let body = r#"{"data":{"ids":[],"entity":"","action":"sync"},"source":{"tenant_id":"123"}}"#;
    let req = signed_post("/action", body, "mysecret");
    let (status, body) = call(store, Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("missing action or entity"), "{body}");
}

#[actix_web::test]
async fn a_signed_action_reaches_its_handler() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "mysecret", true).await;
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let mut dispatcher = Dispatcher::new();
    dispatcher.on_action("product", "sync", move |req, _api| {
        let seen = Arc::clone(&seen);
        Box::pin(async move {
            assert_eq!(req.data.ids, vec!["p1".to_string()]);
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    });
    let body = r#"{"data":{"ids":["p1"],"entity":"product","action":"sync"},"source":{"tenant_id":"123"}}"#;
    let req = signed_post("/action", body, "mysecret");
    let (status, body) = call(store, dispatcher, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[actix_web::test]
async fn a_signed_page_load_is_acknowledged() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "tenant-secret-1", false).await;
    // HMAC-SHA256("tenant-secret-1", "tenant_id=123&page=home")
    let query = "tenant_id=123&page=home\
                 &signature=804571c94d73bb001ae927aa8b392c039ffbb567c61dbaaa64eedecceddfc8c5";
    let req = TestRequest::get().uri(&format!("/page?{query}"));
    let (status, body) = call(store, Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

#[actix_web::test]
async fn a_page_load_without_a_signature_is_rejected() {
    let store = MemoryCredentialStore::new();
    seed_tenant(&store, "123", "tenant-secret-1", false).await;
    let req = TestRequest::get().uri("/page?tenant_id=123&page=home");
    let (status, body) = call(store, Dispatcher::new(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"invalid signature"}"#);
}
