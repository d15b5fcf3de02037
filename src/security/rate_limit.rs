//! Per-IP rate limiting for the credential endpoints.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::schema::RateLimitConfig;
use crate::observability::metrics;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn is_full(&self, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = self.last_update.elapsed().as_secs_f64();
        self.tokens + elapsed * refill_rate >= capacity
    }
}

/// Buckets keyed by client IP.
pub struct RateLimiterState {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
    enabled: bool,
    rps: f64,
    burst: f64,
}

impl RateLimiterState {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            enabled: config.enabled,
            rps: f64::from(config.requests_per_second),
            burst: f64::from(config.burst_size),
        }
    }

    /// Whether `ip` may make another request now.
    pub fn check(&self, ip: IpAddr) -> bool {
        if !self.enabled {
            return true;
        }
        // A poisoned map only holds stale token counts; keep limiting with it.
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.burst));

        bucket.try_acquire(self.burst, self.rps)
    }

    /// Forget clients whose buckets have refilled completely.
    pub fn prune(&self) -> usize {
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let before = buckets.len();
        buckets.retain(|_, bucket| !bucket.is_full(self.burst, self.rps));
        before - buckets.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }
}

/// Middleware for rate limiting by client IP.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<RateLimiterState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.check(addr.ip()) {
        return next.run(request).await;
    }

    tracing::warn!(client = %addr.ip(), path = %request.uri().path(), "Rate limit exceeded");
    metrics::record_rate_limited("credentials");
    (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
}

/// Prune idle buckets every `interval` until shutdown.
pub async fn run_prune_loop(
    state: Arc<RateLimiterState>,
    interval: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = state.prune();
                if removed > 0 {
                    tracing::debug!(removed, "Pruned idle rate limit buckets");
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(enabled: bool, rps: u32, burst: u32) -> RateLimiterState {
        RateLimiterState::new(&RateLimitConfig {
            enabled,
            requests_per_second: rps,
            burst_size: burst,
            ..RateLimitConfig::default()
        })
    }

    #[test]
    fn test_burst_then_reject() {
        let state = limiter(true, 1, 3);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert!(state.check(ip));
        assert!(state.check(ip));
        assert!(state.check(ip));
        assert!(!state.check(ip));
    }

    #[test]
    fn test_clients_are_independent() {
        let state = limiter(true, 1, 1);
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(state.check(a));
        assert!(!state.check(a));
        assert!(state.check(b));
        assert_eq!(state.tracked_clients(), 2);
    }

    #[test]
    fn test_disabled_never_limits() {
        let state = limiter(false, 1, 1);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        for _ in 0..10 {
            assert!(state.check(ip));
        }
        assert_eq!(state.tracked_clients(), 0);
    }

    #[test]
    fn test_refill_and_prune() {
        let state = limiter(true, 1000, 2);
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(state.check(ip));
        assert!(state.check(ip));
        std::thread::sleep(Duration::from_millis(20));
        assert!(state.check(ip));

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(state.prune(), 1);
        assert_eq!(state.tracked_clients(), 0);
    }
}
