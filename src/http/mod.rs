//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, CORS, timeout)
//!     → images.rs (routing)
//!     → middleware/authorize.rs (protected routes only)
//!     → handler → catalog
//!     → error.rs (domain error → status + {"err": ...})
//! ```

pub mod error;
pub mod images;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::{classify, ApiError};
pub use request::{token_from_header, X_REQUEST_ID};
pub use response::FailureResponse;
pub use server::HttpServer;
