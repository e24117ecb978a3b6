//! Routers, middleware, and handlers.

/// Bearer token and role middleware.
pub(crate) mod auth;
/// Problem type URIs and header names.
pub(crate) mod constants;
/// Problem response wrapper.
pub(crate) mod errors;
/// Liveness and metrics endpoints.
pub(crate) mod health;
/// Mail and upload handlers.
pub(crate) mod outbound;
/// Router construction and server host.
pub(crate) mod router;
/// Signup, login, refresh, logout, and profile handlers.
pub(crate) mod session;
/// Request counting middleware.
pub(crate) mod telemetry;
/// Owner-scoped todo handlers.
pub(crate) mod todos;
