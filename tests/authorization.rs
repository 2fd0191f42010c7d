mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use common::FakeAuthenticator;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use image_catalog::auth::{AuthorizationIdentity, Role};
use image_catalog::http::middleware::{authorize, AuthorizeState};

type Seen = Arc<Mutex<Vec<AuthorizationIdentity>>>;

fn gated(authenticator: Arc<FakeAuthenticator>, role: Role) -> (Router, Seen) {
    let seen: Seen = Arc::default();
    let hits = seen.clone();
    let router = Router::new()
        .route(
            "/protected",
            get(move |identity: AuthorizationIdentity| {
                let hits = hits.clone();
                async move {
                    hits.lock().unwrap().push(identity);
                    "ok"
                }
            }),
        )
        .route_layer(middleware::from_fn_with_state(
            AuthorizeState::new(authenticator, role),
            authorize,
        ));
    (router, seen)
}

fn request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/protected");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let authenticator = Arc::new(FakeAuthenticator::new().with_token("good", "alice"));
    let (router, seen) = gated(authenticator.clone(), Role::Admin);

    let response = router.oneshot(request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({ "err": "Unauthorized" }));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(authenticator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_headers_never_reach_the_authenticator() {
    let authenticator = Arc::new(FakeAuthenticator::new().with_token("good", "alice"));

    for value in ["good", "Basic good", "Bearer", "Bearer ", "Bearer good extra"] {
        let (router, seen) = gated(authenticator.clone(), Role::Admin);
        let response = router.oneshot(request(Some(value))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {value:?}");
        assert!(seen.lock().unwrap().is_empty());
    }
    assert_eq!(authenticator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_token_is_unauthorized() {
    let authenticator = Arc::new(FakeAuthenticator::new().with_token("good", "alice"));
    let (router, seen) = gated(authenticator.clone(), Role::Admin);

    let response = router.oneshot(request(Some("Bearer forged"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({ "err": "Unauthorized" }));
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(authenticator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn authenticator_failure_does_not_leak_details() {
    let authenticator = Arc::new(FakeAuthenticator::new().failing_on("flaky"));
    let (router, seen) = gated(authenticator, Role::Admin);

    let response = router.oneshot(request(Some("Bearer flaky"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "err": "Unauthorized" }));
    assert!(!body.to_string().contains("10.0.0.7"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn valid_token_reaches_handler_once_with_identity() {
    let authenticator = Arc::new(FakeAuthenticator::new().with_token("good", "alice"));
    let (router, seen) = gated(authenticator.clone(), Role::User);

    let response = router.oneshot(request(Some("bearer good"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![AuthorizationIdentity {
            header: "bearer good".into(),
            principal: "alice".into(),
            role: Role::User,
        }]
    );
    assert_eq!(*authenticator.roles.lock().unwrap(), vec![Role::User]);
}

#[tokio::test]
async fn identity_without_gateway_is_server_error() {
    let router = Router::new().route(
        "/protected",
        get(|identity: AuthorizationIdentity| async move { identity.principal }),
    );

    let response = router.oneshot(request(Some("Bearer good"))).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({ "err": "Server error" }));
}
