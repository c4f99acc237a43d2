//! Per-client sliding-window rate limiting for mutation endpoints.

use crate::{error::HttpError, AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use markpad_core::AppError;
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Tracks recent request instants per client address.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    inner: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Allow `max_requests` per `window` for each client.
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, HashMap<IpAddr, VecDeque<Instant>>>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Unavailable("Rate limiter is unavailable".to_string()))
    }

    /// Record a request from `client` at `now`.
    ///
    /// # Returns
    /// `Ok(())` when the request is within budget.
    ///
    /// # Errors
    /// Returns [`AppError::RateLimited`] with the seconds until the oldest
    /// request in the window expires.
    pub fn check(&self, client: IpAddr, now: Instant) -> Result<(), AppError> {
        let mut state = self.state()?;
        let window = self.window;
        state.retain(|_, hits| {
            while hits
                .front()
                .is_some_and(|hit| now.saturating_duration_since(*hit) >= window)
            {
                hits.pop_front();
            }
            !hits.is_empty()
        });

        let hits = state.entry(client).or_default();
        if hits.len() >= self.max_requests {
            let retry_after = hits
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            return Err(AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            });
        }
        hits.push_back(now);
        Ok(())
    }

    /// Number of clients with requests inside the current window.
    pub fn tracked_clients(&self) -> usize {
        self.state().map(|state| state.len()).unwrap_or(0)
    }
}

/// Resolve the client address for rate limiting.
///
/// `X-Forwarded-For` is honored only when the peer is loopback or unknown,
/// i.e. a local reverse proxy or an in-process test transport.
pub fn client_ip(request: &Request) -> IpAddr {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let trusts_forwarded = peer.map_or(true, |ip| ip.is_loopback());
    if trusts_forwarded {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }
    }
    peer.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware rejecting clients over budget with `429`.
pub async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_ip(&request);
    if let Err(err) = state.limiter.check(client, Instant::now()) {
        tracing::info!("Rate limit exceeded for {}", client);
        return HttpError::from(err).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn allows_budget_then_rejects_with_retry_after() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();
        for offset in 0..3 {
            limiter
                .check(ip(1), start + Duration::from_secs(offset))
                .expect("within budget");
        }
        match limiter.check(ip(1), start + Duration::from_secs(10)) {
            Err(AppError::RateLimited { retry_after_secs }) => assert_eq!(retry_after_secs, 50),
            other => panic!("expected rate limit, got {:?}", other),
        }
        limiter
            .check(ip(2), start + Duration::from_secs(10))
            .expect("other clients unaffected");
    }

    #[test]
    fn window_slides_and_idle_clients_are_pruned() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check(ip(1), start).expect("first");
        assert!(limiter.check(ip(1), start + Duration::from_secs(59)).is_err());
        limiter
            .check(ip(2), start + Duration::from_secs(60))
            .expect("other client");
        assert_eq!(limiter.tracked_clients(), 1);
        limiter
            .check(ip(1), start + Duration::from_secs(60))
            .expect("window elapsed");
    }

    #[test]
    fn forwarded_header_trusted_only_from_loopback_peer() {
        let mut request = Request::builder()
            .header(FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .expect("request");
        assert_eq!(client_ip(&request), "203.0.113.7".parse::<IpAddr>().expect("ip"));

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 2], 4000))));
        assert_eq!(client_ip(&request), "198.51.100.2".parse::<IpAddr>().expect("ip"));
    }
}
