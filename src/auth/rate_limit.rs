//! Per-client request admission gate.
//!
//! A plain token bucket per client IP: 100 tokens a minute of refill with a
//! burst of 100. The bucket table lives in process memory only and is lost on
//! restart; production deployments bound its growth with a periodic sweep
//! outside this module.
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

pub const RATE_PER_MINUTE: f64 = 100.0;
pub const BURST: f64 = 100.0;

/// Admission verdict for one inbound request. The router consults this
/// before any other work; tests inject scripted implementations.
pub trait RequestGate: Send + Sync {
    fn allow(&self, ip: &str) -> bool;
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(now: Instant) -> Self {
        Self {
            tokens: BURST,
            last_refill: now,
        }
    }

    fn try_take(&mut self, now: Instant, rate_per_sec: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate_per_sec).min(BURST);
        self.last_refill = now;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Production gate. The map mutex is only held for the bucket lookup and the
/// arithmetic above; never across I/O.
pub struct TokenBucketGate {
    buckets: Mutex<HashMap<String, Bucket>>,
    rate_per_sec: f64,
}

impl TokenBucketGate {
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            rate_per_sec: RATE_PER_MINUTE / 60.0,
        }
    }

    fn allow_at(&self, ip: &str, now: Instant) -> bool {
        // A panic elsewhere cannot leave the arithmetic half-done, so a
        // poisoned lock is still a usable map.
        let mut buckets = self.buckets.lock().unwrap_or_else(|err| err.into_inner());
        let bucket = buckets
            .entry(ip.to_string())
            .or_insert_with(|| Bucket::full(now));
        bucket.try_take(now, self.rate_per_sec)
    }
}

impl Default for TokenBucketGate {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestGate for TokenBucketGate {
    fn allow(&self, ip: &str) -> bool {
        let allowed = self.allow_at(ip, Instant::now());
        if !allowed {
            metrics::counter!("forumauth_rate_limited_total").increment(1);
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn burst_plus_one_is_rejected() {
        let gate = TokenBucketGate::new();
        let now = Instant::now();
        for _ in 0..BURST as usize {
            assert!(gate.allow_at("10.0.0.1", now));
        }
        assert!(!gate.allow_at("10.0.0.1", now));
    }

    #[test]
    fn refill_resumes_admission() {
        let gate = TokenBucketGate::new();
        let start = Instant::now();
        for _ in 0..BURST as usize {
            assert!(gate.allow_at("10.0.0.1", start));
        }
        assert!(!gate.allow_at("10.0.0.1", start));

        // One full refill window restores the whole burst.
        let later = start + Duration::from_secs(60);
        for _ in 0..BURST as usize {
            assert!(gate.allow_at("10.0.0.1", later));
        }
        assert!(!gate.allow_at("10.0.0.1", later));
    }

    #[test]
    fn partial_refill_grants_partial_budget() {
        let gate = TokenBucketGate::new();
        let start = Instant::now();
        for _ in 0..BURST as usize {
            assert!(gate.allow_at("10.0.0.1", start));
        }

        // 6 seconds at 100/min refills 10 tokens.
        let later = start + Duration::from_secs(6);
        for _ in 0..10 {
            assert!(gate.allow_at("10.0.0.1", later));
        }
        assert!(!gate.allow_at("10.0.0.1", later));
    }

    #[test]
    fn poisoned_bucket_table_keeps_admitting() {
        let gate = std::sync::Arc::new(TokenBucketGate::new());
        let now = Instant::now();
        assert!(gate.allow_at("10.0.0.1", now));

        let poisoner = gate.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.buckets.lock().unwrap();
            panic!("poison the table");
        })
        .join();

        assert!(gate.allow_at("10.0.0.1", now));
        assert!(gate.allow_at("10.0.0.2", now));
    }

    #[test]
    fn buckets_are_independent_per_ip() {
        let gate = TokenBucketGate::new();
        let now = Instant::now();
        for _ in 0..BURST as usize {
            assert!(gate.allow_at("10.0.0.1", now));
        }
        assert!(!gate.allow_at("10.0.0.1", now));
        assert!(gate.allow_at("10.0.0.2", now));
    }
}
