//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, panics, timeout, CORS, security headers)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown, force-close them at the deadline

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware,
    response::Response,
    routing::get,
    Router,
};
use axum_server::Handle;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::time::{timeout_at, Instant};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::catalog::ImagesService;
use crate::config::ServiceConfig;
use crate::http::images::images_router;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::http::response::{failure, REQUEST_TIMEOUT, SERVER_ERROR};
use crate::lifecycle::{Listener, ServerError};
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServeState {
    Idle,
    Serving,
    Stopped,
}

/// HTTP server for the image catalog.
pub struct HttpServer {
    router: Router,
    bind_address: String,
    socket: Mutex<Option<TcpListener>>,
    local_addr: OnceLock<SocketAddr>,
    handle: Handle,
    state: watch::Sender<ServeState>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(
        config: &ServiceConfig,
        images: Arc<dyn ImagesService>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        let (state, _) = watch::channel(ServeState::Idle);
        Self {
            router: Self::build_router(config, images, authenticator),
            bind_address: config.listener.bind_address.clone(),
            socket: Mutex::new(None),
            local_addr: OnceLock::new(),
            handle: Handle::new(),
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(
        config: &ServiceConfig,
        images: Arc<dyn ImagesService>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Router {
        Router::new()
            .route(&config.listener.heartbeat_path, get(|| async { "." }))
            .nest("/api/v1/images", images_router(images, authenticator))
            .layer(DefaultBodyLimit::max(config.http.max_body_bytes))
            .layer(cors_layer(&config.http.cors_allow_origins))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.http.request_timeout_secs),
            ))
            .layer(middleware::map_response(timeout_envelope))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Address the server is bound to, once [`Listener::bind`] succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }
}

/// The timeout layer answers with a bare 408; give it the usual envelope.
async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        metrics::record_http_error("timeout");
        return failure(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT);
    }
    response
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %detail, "Handler panicked");
    metrics::record_http_error("unclassified");
    failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(300))
}

#[async_trait]
impl Listener for HttpServer {
    async fn bind(&self) -> Result<SocketAddr, ServerError> {
        let bind_error = |source| ServerError::Bind {
            address: self.bind_address.clone(),
            source,
        };
        let listener = TcpListener::bind(&self.bind_address).await.map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;

        let _ = self.local_addr.set(addr);
        *self.socket.lock().await = Some(listener);
        Ok(addr)
    }

    async fn start(&self) -> Result<(), ServerError> {
        let listener = {
            let mut socket = self.socket.lock().await;
            let listener = socket
                .take()
                .ok_or(ServerError::NotBound)?
                .into_std()
                .map_err(ServerError::Serve)?;
            self.state.send_replace(ServeState::Serving);
            listener
        };

        tracing::info!(address = ?self.local_addr(), "HTTP server starting");
        let result = axum_server::from_tcp(listener)
            .handle(self.handle.clone())
            .serve(self.router.clone().into_make_service())
            .await;

        self.state.send_replace(ServeState::Stopped);
        tracing::info!("HTTP server stopped");
        result.map_err(ServerError::Serve)
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServerError> {
        let mut state = self.state.subscribe();
        self.handle.graceful_shutdown(None);

        {
            let mut socket = self.socket.lock().await;
            let idle = *state.borrow() == ServeState::Idle;
            if idle {
                // Never served: release the bound socket right away.
                *socket = None;
                return Ok(());
            }
        }

        let drained = timeout_at(deadline, state.wait_for(|s| *s == ServeState::Stopped))
            .await
            .is_ok();
        if drained {
            return Ok(());
        }

        tracing::warn!(
            connections = self.handle.connection_count(),
            "Closing connections still open at the shutdown deadline"
        );
        self.handle.shutdown();
        Err(ServerError::DrainTimeout)
    }
}
