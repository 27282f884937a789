//! Sliding-window rate limiting for login attempts
//!
//! Attempts are counted per identifier over a trailing window. Expired
//! timestamps are dropped lazily when their key is next checked, and by
//! [`LoginRateLimiter::sweep`] for keys that are never checked again.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    sync::Arc,
    time::Duration,
};
use tokio::{sync::RwLock, time::Instant};

/// Rate-limit subject, rendered as `ip:<addr>` or `account:<username>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Ip(String),
    Account(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Ip(addr) => write!(f, "ip:{addr}"),
            Identifier::Account(username) => write!(f, "account:{username}"),
        }
    }
}

/// Attempt budget over a trailing window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPolicy {
    pub max_attempts: usize,
    pub window: Duration,
}

impl WindowPolicy {
    /// 5 attempts per minute per client address
    pub const PER_IP: WindowPolicy = WindowPolicy {
        max_attempts: 5,
        window: Duration::from_secs(60),
    };

    /// 20 attempts per hour per account
    pub const PER_ACCOUNT: WindowPolicy = WindowPolicy {
        max_attempts: 20,
        window: Duration::from_secs(3600),
    };
}

/// Outcome of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WindowKey {
    identifier: Identifier,
    window: Duration,
}

/// Shared attempt store with per-key sliding windows
#[derive(Clone, Default)]
pub struct SlidingWindowLimiter {
    attempts: Arc<RwLock<HashMap<WindowKey, VecDeque<Instant>>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `identifier` against `policy`, recording the attempt if allowed.
    ///
    /// The check and the record happen under one write lock, so concurrent
    /// callers for the same key can never be admitted past the limit.
    pub async fn check(&self, identifier: &Identifier, policy: WindowPolicy) -> RateLimitDecision {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;

        let timestamps = attempts
            .entry(WindowKey {
                identifier: identifier.clone(),
                window: policy.window,
            })
            .or_default();
        prune(timestamps, now, policy.window);

        if timestamps.len() >= policy.max_attempts {
            let oldest = timestamps.front().copied().unwrap_or(now);
            let retry_after = (oldest + policy.window).saturating_duration_since(now);
            return RateLimitDecision::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateLimitDecision::Allowed
    }

    /// Number of attempts currently counted for `identifier` under `policy`
    pub async fn attempts(&self, identifier: &Identifier, policy: WindowPolicy) -> usize {
        let now = Instant::now();
        let attempts = self.attempts.read().await;
        attempts
            .get(&WindowKey {
                identifier: identifier.clone(),
                window: policy.window,
            })
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|t| now.duration_since(**t) < policy.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Forget every window stored for `identifier`
    pub async fn reset(&self, identifier: &Identifier) {
        let mut attempts = self.attempts.write().await;
        attempts.retain(|key, _| &key.identifier != identifier);
    }

    /// Drop expired timestamps everywhere and remove keys left empty.
    ///
    /// Returns the number of keys removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut attempts = self.attempts.write().await;
        let before = attempts.len();

        attempts.retain(|key, timestamps| {
            prune(timestamps, now, key.window);
            !timestamps.is_empty()
        });

        before - attempts.len()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.attempts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.attempts.read().await.is_empty()
    }
}

fn prune(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = timestamps.front() {
        if now.duration_since(*oldest) >= window {
            timestamps.pop_front();
        } else {
            break;
        }
    }
}

/// Which limiter tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitScope {
    Ip,
    Account,
}

/// A login attempt refused by one of the limiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginThrottled {
    pub scope: LimitScope,
    pub retry_after: Duration,
}

/// Login brute-force guard: per-IP and per-account windows
#[derive(Clone)]
pub struct LoginRateLimiter {
    limiter: SlidingWindowLimiter,
    ip_policy: WindowPolicy,
    account_policy: WindowPolicy,
}

impl LoginRateLimiter {
    pub fn new(ip_policy: WindowPolicy, account_policy: WindowPolicy) -> Self {
        Self {
            limiter: SlidingWindowLimiter::new(),
            ip_policy,
            account_policy,
        }
    }

    /// Check both limits before credentials are verified.
    ///
    /// The IP limit is evaluated first so password spraying from one address
    /// is cut off before any account is targeted.
    pub async fn check_login(&self, ip: &str, username: &str) -> Result<(), LoginThrottled> {
        let checks = [
            (Identifier::Ip(ip.to_string()), self.ip_policy, LimitScope::Ip),
            (
                Identifier::Account(username.to_string()),
                self.account_policy,
                LimitScope::Account,
            ),
        ];

        for (identifier, policy, scope) in checks {
            if let RateLimitDecision::Limited { retry_after } =
                self.limiter.check(&identifier, policy).await
            {
                tracing::warn!(
                    identifier = %identifier,
                    retry_after_secs = retry_after.as_secs(),
                    "Login rate limit exceeded"
                );
                return Err(LoginThrottled { scope, retry_after });
            }
        }

        Ok(())
    }

    /// Clear both windows after a successful login
    pub async fn record_success(&self, ip: &str, username: &str) {
        self.limiter.reset(&Identifier::Ip(ip.to_string())).await;
        self.limiter
            .reset(&Identifier::Account(username.to_string()))
            .await;
    }

    /// Attempts currently counted against a client address
    pub async fn ip_attempts(&self, ip: &str) -> usize {
        self.limiter
            .attempts(&Identifier::Ip(ip.to_string()), self.ip_policy)
            .await
    }

    /// Attempts currently counted against an account
    pub async fn account_attempts(&self, username: &str) -> usize {
        self.limiter
            .attempts(&Identifier::Account(username.to_string()), self.account_policy)
            .await
    }

    /// Cleanup expired entries (called periodically)
    pub async fn sweep(&self) -> usize {
        let removed = self.limiter.sweep().await;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired rate-limit windows");
        }
        removed
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(WindowPolicy::PER_IP, WindowPolicy::PER_ACCOUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(addr: &str) -> Identifier {
        Identifier::Ip(addr.to_string())
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(ip("10.0.0.1").to_string(), "ip:10.0.0.1");
        assert_eq!(
            Identifier::Account("bob".to_string()).to_string(),
            "account:bob"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_sixth_attempt_is_limited() {
        let limiter = SlidingWindowLimiter::new();
        let client = ip("10.0.0.1");

        for _ in 0..5 {
            assert_eq!(
                limiter.check(&client, WindowPolicy::PER_IP).await,
                RateLimitDecision::Allowed
            );
        }

        match limiter.check(&client, WindowPolicy::PER_IP).await {
            RateLimitDecision::Limited { retry_after } => {
                assert!(retry_after > Duration::ZERO);
                assert!(retry_after <= Duration::from_secs(60));
            }
            RateLimitDecision::Allowed => panic!("sixth attempt admitted"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_counts_from_oldest_attempt() {
        let limiter = SlidingWindowLimiter::new();
        let client = ip("10.0.0.2");

        limiter.check(&client, WindowPolicy::PER_IP).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        for _ in 0..4 {
            limiter.check(&client, WindowPolicy::PER_IP).await;
        }

        assert_eq!(
            limiter.check(&client, WindowPolicy::PER_IP).await,
            RateLimitDecision::Limited {
                retry_after: Duration::from_secs(50)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = SlidingWindowLimiter::new();
        let client = ip("10.0.0.3");

        for _ in 0..5 {
            limiter.check(&client, WindowPolicy::PER_IP).await;
        }
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(matches!(
            limiter.check(&client, WindowPolicy::PER_IP).await,
            RateLimitDecision::Limited { .. }
        ));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(
            limiter.check(&client, WindowPolicy::PER_IP).await,
            RateLimitDecision::Allowed
        );
        assert_eq!(limiter.attempts(&client, WindowPolicy::PER_IP).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_clears_only_that_identifier() {
        let limiter = SlidingWindowLimiter::new();
        let a = ip("10.0.0.4");
        let b = ip("10.0.0.5");

        for _ in 0..5 {
            limiter.check(&a, WindowPolicy::PER_IP).await;
            limiter.check(&b, WindowPolicy::PER_IP).await;
        }
        limiter.check(&a, WindowPolicy::PER_ACCOUNT).await;

        limiter.reset(&a).await;

        assert_eq!(limiter.attempts(&a, WindowPolicy::PER_IP).await, 0);
        assert_eq!(limiter.attempts(&a, WindowPolicy::PER_ACCOUNT).await, 0);
        assert_eq!(limiter.attempts(&b, WindowPolicy::PER_IP).await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_expired_keys() {
        let limiter = SlidingWindowLimiter::new();
        limiter.check(&ip("10.0.0.6"), WindowPolicy::PER_IP).await;
        limiter
            .check(&Identifier::Account("bob".into()), WindowPolicy::PER_ACCOUNT)
            .await;

        assert_eq!(limiter.sweep().await, 0);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.sweep().await, 1);
        assert_eq!(limiter.len().await, 1);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(limiter.sweep().await, 1);
        assert!(limiter.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_over_admit() {
        let limiter = SlidingWindowLimiter::new();
        let client = ip("10.0.0.7");

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = limiter.clone();
                let client = client.clone();
                tokio::spawn(async move { limiter.check(&client, WindowPolicy::PER_IP).await })
            })
            .collect();

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() == RateLimitDecision::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, WindowPolicy::PER_IP.max_attempts);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_checks_ip_before_account() {
        let limiter = LoginRateLimiter::default();

        for i in 0..5 {
            assert!(limiter.check_login("10.1.0.1", &format!("user{i}")).await.is_ok());
        }
        let throttled = limiter.check_login("10.1.0.1", "user5").await.unwrap_err();
        assert_eq!(throttled.scope, LimitScope::Ip);
        assert!(throttled.retry_after > Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_account_limit_across_addresses() {
        let limiter = LoginRateLimiter::default();

        for i in 0..20 {
            assert!(limiter.check_login(&format!("10.2.0.{i}"), "victim").await.is_ok());
        }
        let throttled = limiter.check_login("10.2.1.1", "victim").await.unwrap_err();
        assert_eq!(throttled.scope, LimitScope::Account);
        assert!(throttled.retry_after > Duration::from_secs(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_both_windows() {
        let limiter = LoginRateLimiter::default();

        for _ in 0..4 {
            limiter.check_login("10.3.0.1", "bob").await.unwrap();
        }
        assert_eq!(limiter.ip_attempts("10.3.0.1").await, 4);
        assert_eq!(limiter.account_attempts("bob").await, 4);

        limiter.record_success("10.3.0.1", "bob").await;

        assert_eq!(limiter.ip_attempts("10.3.0.1").await, 0);
        assert_eq!(limiter.account_attempts("bob").await, 0);
        for _ in 0..5 {
            assert!(limiter.check_login("10.3.0.1", "bob").await.is_ok());
        }
    }
}
