use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared_types::AppError;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sliding window rate limit state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    inner: Arc<Mutex<RateLimitInner>>,
    trust_forwarded: bool,
}

struct RateLimitInner {
    /// Map from client key -> request timestamps inside the window.
    /// Keys with no timestamps left are dropped.
    requests: HashMap<String, Vec<Instant>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitState {
    /// Create rate limiter allowing `max_requests` per `window`, keyed by
    /// the peer address of the connection.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimitInner {
                requests: HashMap::new(),
                max_requests,
                window,
            })),
            trust_forwarded: false,
        }
    }

    /// Key on the proxy-reported client address instead of the peer.
    /// Only enable behind a reverse proxy that sets the headers.
    pub fn trust_forwarded(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }

    /// Record a request from `key`. Returns false once the window is full.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        // Poisoning leaves the map consistent.
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let window = inner.window;
        let max = inner.max_requests as usize;

        inner.requests.retain(|_, timestamps| {
            timestamps.retain(|t| now.saturating_duration_since(*t) < window);
            !timestamps.is_empty()
        });

        let timestamps = inner.requests.entry(key.to_string()).or_default();
        if timestamps.len() >= max {
            return false;
        }

        timestamps.push(now);
        true
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.inner.lock().map(|inner| inner.requests.len()).unwrap_or(0)
    }

    fn client_key(&self, request: &Request) -> Option<String> {
        if self.trust_forwarded {
            if let Some(addr) = forwarded_client(request.headers()) {
                return Some(addr);
            }
        }
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    }
}

/// Client address reported by a reverse proxy. The proxy appends the peer it
/// saw to `X-Forwarded-For`, so the last hop is the one it vouches for.
fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Axum middleware that enforces rate limits per client address.
///
/// The server must be run with `into_make_service_with_connect_info` so the
/// peer address is available; a request without one is not limited.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key) = state.client_key(&request) else {
        tracing::warn!(path = %request.uri().path(), "No client address, skipping rate limit");
        return next.run(request).await;
    };

    if !state.check(&key) {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        return AppError::rate_limited("Rate limit exceeded. Please try again later.")
            .into_response();
    }

    next.run(request).await
}
