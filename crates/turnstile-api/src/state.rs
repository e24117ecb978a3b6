//! Shared handler state.

use std::sync::Arc;

use turnstile_auth::SessionManager;
use turnstile_outbound::OutboundService;
use turnstile_telemetry::Metrics;
use turnstile_todo::TodoService;

pub(crate) struct ApiState {
    pub(crate) sessions: Arc<SessionManager>,
    pub(crate) todos: TodoService,
    pub(crate) outbound: OutboundService,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) const fn new(
        sessions: Arc<SessionManager>,
        todos: TodoService,
        outbound: OutboundService,
        telemetry: Metrics,
    ) -> Self {
        Self {
            sessions,
            todos,
            outbound,
            telemetry,
        }
    }
}
