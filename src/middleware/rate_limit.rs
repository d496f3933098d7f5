use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config;
use crate::error::ApiError;

/// Fixed-window counter per client IP. Windows expire on their own;
/// stale entries are swept once the map grows past a threshold.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

const SWEEP_THRESHOLD: usize = 1024;

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record a hit and report whether the client is still within budget.
    pub fn check(&self, ip: IpAddr, now: Instant) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, (start, _)| now.duration_since(*start) < window);
        }

        let entry = windows.entry(ip).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        entry.1 += 1;
        entry.1 <= self.max_requests
    }
}

fn limiter_from_config() -> RateLimiter {
    let cfg = &config::config().api;
    RateLimiter::new(
        cfg.rate_limit_requests,
        Duration::from_secs(cfg.rate_limit_window_secs),
    )
}

static GLOBAL_LIMITER: Lazy<RateLimiter> = Lazy::new(limiter_from_config);
static CREDENTIAL_LIMITER: Lazy<RateLimiter> = Lazy::new(limiter_from_config);

/// Per-IP limit on all traffic, active when `api.enable_rate_limiting`
/// is set.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if config::config().api.enable_rate_limiting
        && !GLOBAL_LIMITER.check(addr.ip(), Instant::now())
    {
        return Err(ApiError::too_many_requests("Rate limit exceeded, slow down"));
    }

    Ok(next.run(request).await)
}

/// Per-IP limit on the public credential endpoints. Always active; a
/// separate window map so the global limiter does not double-count.
pub async fn credential_rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !CREDENTIAL_LIMITER.check(addr.ip(), Instant::now()) {
        return Err(ApiError::too_many_requests("Rate limit exceeded, slow down"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check(ip(1), now));
        assert!(limiter.check(ip(1), now));
        assert!(limiter.check(ip(1), now));
        assert!(!limiter.check(ip(1), now));
    }

    #[test]
    fn window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check(ip(1), start));
        assert!(!limiter.check(ip(1), start));
        assert!(limiter.check(ip(1), start + Duration::from_secs(61)));
    }

    #[test]
    fn clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check(ip(1), now));
        assert!(limiter.check(ip(2), now));
        assert!(!limiter.check(ip(1), now));
    }
}
