use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::utils::token::decode_access_token;

const WINDOW: Duration = Duration::from_secs(1);
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second windows, one per client key.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    token_secret: Option<Arc<str>>,
    windows: Arc<Mutex<HashMap<String, WindowState>>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            token_secret: None,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lets callers with a valid access token share one window per user.
    pub fn with_token_secret(mut self, secret: &str) -> Self {
        self.token_secret = Some(Arc::from(secret));
        self
    }

    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.start) < WINDOW);
        }
        let window = windows.entry(key.to_string()).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }
}

/// Authenticated user when the bearer token verifies, else the peer address,
/// else the first forwarded address. Unverified tokens never pick the bucket.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, secret: Option<&str>) -> String {
    let user = secret.and_then(|secret| {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| decode_access_token(token.trim(), secret))
    });
    if let Some(claims) = user {
        return format!("user:{}", claims.sub);
    }
    if let Some(peer) = peer {
        return format!("ip:{}", peer.ip());
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| format!("ip:{}", ip.trim()))
        .unwrap_or_else(|| "anonymous".to_string())
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer, state.token_secret.as_deref());
    if !state.allow(&key) {
        tracing::debug!(%key, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32, token_secret: &str) -> RateLimiter {
    RateLimiter::new(rps).with_token_secret(token_secret)
}
