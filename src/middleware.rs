//! Request middleware: per-request deadlines and request-id spans.
//!
//! [`request_timeout_layer`] binds every request to a deadline derived from a
//! process-wide root token. The deadline is exposed to handlers as a
//! [`RequestDeadline`] extension; nothing aborts a handler that ignores it, so
//! a handler that never checks the deadline answers as if there were none.
//!
//! [`request_id_layer`] wraps the whole request in a tracing span carrying a
//! UUID v4, so every log line for a request can be correlated.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// State for [`request_timeout_layer`].
#[derive(Clone, Debug)]
pub struct RequestTimeout {
    duration: Duration,
    root: CancellationToken,
    active_timers: Arc<AtomicUsize>,
}

impl RequestTimeout {
    /// Every request deadline is a child of `root`; cancelling `root` cancels
    /// all in-flight deadlines.
    pub fn new(duration: Duration, root: CancellationToken) -> Self {
        Self {
            duration,
            root,
            active_timers: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Number of request timers currently armed.
    pub fn active_timers(&self) -> usize {
        self.active_timers.load(Ordering::SeqCst)
    }
}

/// Deadline attached to a request, readable from handlers via `Extension`.
#[derive(Clone, Debug)]
pub struct RequestDeadline {
    deadline: Instant,
    token: CancellationToken,
}

impl RequestDeadline {
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// True once the deadline passed or the request finished.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the deadline passes or the request finishes.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Releases a request timer when dropped.
///
/// Dropping happens on every way out of the middleware: normal return, an
/// unwinding handler panic, or the connection task dropping the future.
struct TimerGuard {
    timer: JoinHandle<()>,
    token: CancellationToken,
    active_timers: Arc<AtomicUsize>,
}

impl TimerGuard {
    fn arm(timeout: &RequestTimeout, deadline: Instant, token: CancellationToken) -> Self {
        timeout.active_timers.fetch_add(1, Ordering::SeqCst);

        let expire = token.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tracing::debug!("Request deadline reached");
            expire.cancel();
        });

        Self {
            timer,
            token,
            active_timers: timeout.active_timers.clone(),
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.timer.abort();
        self.token.cancel();
        self.active_timers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Middleware that gives each request its own deadline.
pub async fn request_timeout_layer(
    State(timeout): State<RequestTimeout>,
    mut request: Request,
    next: Next,
) -> Response {
    let deadline = Instant::now() + timeout.duration;
    let token = timeout.root.child_token();
    let _guard = TimerGuard::arm(&timeout, deadline, token.clone());

    request
        .extensions_mut()
        .insert(RequestDeadline { deadline, token });

    next.run(request).await
}

/// Extension type for accessing the request ID in handlers.
#[derive(Clone, Debug)]
pub struct RequestId(pub Uuid);

/// Middleware that generates a request ID and creates a request span.
///
/// This should be the outermost layer so the span covers the other layers too.
pub async fn request_id_layer(mut request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        duration_ms = tracing::field::Empty,
    );

    request.extensions_mut().insert(RequestId(request_id));

    async move {
        let start = std::time::Instant::now();
        let response = next.run(request).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        tracing::Span::current().record("duration_ms", duration_ms);
        tracing::info!(status = response.status().as_u16(), "Request completed");

        response
    }
    .instrument(span)
    .await
}
