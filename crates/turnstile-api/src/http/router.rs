//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{
        Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};
use turnstile_auth::SessionManager;
use turnstile_outbound::OutboundService;
use turnstile_telemetry::{Metrics, build_sha};
use turnstile_todo::TodoService;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::auth::{require_admin, require_bearer};
use crate::http::constants::{HEADER_REQUEST_ID, MAX_UPLOAD_BODY_BYTES};
use crate::http::health::{health, metrics};
use crate::http::outbound::{send_email, upload};
use crate::http::session::{
    admin, change_password, login, logout, profile, refresh, signup,
};
use crate::http::telemetry::HttpMetricsLayer;
use crate::http::todos::{create_todo, delete_todo, get_todo, list_todos, update_todo};
use crate::state::ApiState;

/// Axum router wrapper that hosts the Turnstile API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the session manager, todo and outbound services, and metrics into a router.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionManager>,
        todos: TodoService,
        outbound: OutboundService,
        telemetry: Metrics,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            sessions,
            todos,
            outbound,
            telemetry.clone(),
        ));
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(turnstile_telemetry::set_request_id_layer())
            .layer(turnstile_telemetry::propagate_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::public_routes()
            .merge(Self::session_routes(&state))
            .merge(Self::todo_routes(&state))
            .merge(Self::outbound_routes(&state))
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/signup", post(signup))
            .route("/login", post(login))
            .route("/refresh", post(refresh))
            .route("/logout", post(logout))
    }

    fn session_routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        let bearer = middleware::from_fn_with_state(state.clone(), require_bearer);

        Router::new()
            .route("/profile", get(profile).route_layer(bearer.clone()))
            .route(
                "/profile/password",
                put(change_password).route_layer(bearer.clone()),
            )
            .route(
                "/admin",
                get(admin)
                    .route_layer(middleware::from_fn(require_admin))
                    .route_layer(bearer),
            )
    }

    fn todo_routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        let bearer = middleware::from_fn_with_state(state.clone(), require_bearer);

        Router::new()
            .route(
                "/todos",
                get(list_todos)
                    .post(create_todo)
                    .route_layer(bearer.clone()),
            )
            .route(
                "/todos/{id}",
                get(get_todo)
                    .put(update_todo)
                    .delete(delete_todo)
                    .route_layer(bearer),
            )
    }

    fn outbound_routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        let bearer = middleware::from_fn_with_state(state.clone(), require_bearer);

        Router::new()
            .route("/send-email", post(send_email).route_layer(bearer.clone()))
            .route(
                "/upload",
                post(upload)
                    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES))
                    .route_layer(bearer),
            )
    }

    /// Serve the router on `addr` until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve<F>(self, addr: SocketAddr, shutdown: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "api listening");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|source| ApiServerError::Serve { source })?;
        info!("api stopped");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) const fn router(&self) -> &Router {
        &self.router
    }
}
