//! Sequential retry with capped exponential backoff.
//!
//! Kept apart from any transport: the judge client composes this over a single
//! attempt, so the retry rules can be tested without HTTP.

use std::{fmt::Display, future::Future, time::Duration};

use rand::Rng;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts including the first one. Zero is treated as one.
  pub max_attempts: u32,
  pub base_backoff: Duration,
  pub max_backoff: Duration,
  /// Spread each delay by ±10%.
  pub jitter: bool,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_backoff: Duration::from_millis(500),
      max_backoff: Duration::from_secs(8),
      jitter: true,
    }
  }
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, base_backoff: Duration, max_backoff: Duration) -> Self {
    Self { max_attempts, base_backoff, max_backoff, jitter: false }
  }

  pub fn with_jitter(mut self, jitter: bool) -> Self {
    self.jitter = jitter;
    self
  }

  /// Delay before retry number `retry` (1 = the wait after the first failure).
  /// Without jitter: base * 2^(retry-1), capped at `max_backoff`.
  pub fn backoff(&self, retry: u32) -> Duration {
    let factor = 2u32.saturating_pow(retry.saturating_sub(1));
    let delay = self.base_backoff.saturating_mul(factor).min(self.max_backoff);
    if !self.jitter || delay.is_zero() {
      return delay;
    }
    let spread: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
    Duration::from_secs_f64(delay.as_secs_f64() * spread)
  }

  /// Run `op` until it succeeds, `should_retry` rejects the error, or the attempt
  /// budget is spent. The last error is returned unchanged.
  pub async fn run<T, E, F, Fut, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
  where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
  {
    let attempts = self.max_attempts.max(1);
    let mut attempt = 1;
    loop {
      match op(attempt).await {
        Ok(v) => return Ok(v),
        Err(e) if attempt < attempts && should_retry(&e) => {
          let delay = self.backoff(attempt);
          warn!(
            target: "scoring",
            error = %e,
            attempt,
            max_attempts = attempts,
            backoff_ms = delay.as_millis() as u64,
            "judge attempt failed; retrying"
          );
          tokio::time::sleep(delay).await;
          attempt += 1;
        }
        Err(e) => return Err(e),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicU32, Ordering};

  #[test]
  fn backoff_doubles_and_caps() {
    let p = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(350));
    assert_eq!(p.backoff(1), Duration::from_millis(100));
    assert_eq!(p.backoff(2), Duration::from_millis(200));
    assert_eq!(p.backoff(3), Duration::from_millis(350));
    assert_eq!(p.backoff(40), Duration::from_millis(350));
  }

  #[test]
  fn jitter_stays_within_ten_percent() {
    let p = RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_secs(10)).with_jitter(true);
    for _ in 0..50 {
      let d = p.backoff(1).as_millis();
      assert!((900..=1100).contains(&d), "{d}");
    }
  }

  #[tokio::test(start_paused = true)]
  async fn retries_until_success() {
    let calls = AtomicU32::new(0);
    let p = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(4));
    let out: Result<u32, String> = p
      .run(
        |n| {
          calls.fetch_add(1, Ordering::SeqCst);
          async move { if n < 3 { Err(format!("fail {n}")) } else { Ok(n) } }
        },
        |_| true,
      )
      .await;
    assert_eq!(out, Ok(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn surfaces_last_error_after_budget() {
    let p = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(10));
    let started = tokio::time::Instant::now();
    let out: Result<(), String> = p.run(|n| async move { Err(format!("fail {n}")) }, |_| true).await;
    assert_eq!(out, Err("fail 3".to_string()));
    assert_eq!(started.elapsed(), Duration::from_millis(20));
  }

  #[tokio::test]
  async fn non_retryable_errors_stop_immediately() {
    let calls = AtomicU32::new(0);
    let p = RetryPolicy::new(3, Duration::ZERO, Duration::ZERO);
    let out: Result<(), String> = p
      .run(
        |_| {
          calls.fetch_add(1, Ordering::SeqCst);
          async { Err("fatal".to_string()) }
        },
        |e| e != "fatal",
      )
      .await;
    assert!(out.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn zero_attempts_still_runs_once() {
    let p = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
    let out: Result<u8, String> = p.run(|_| async { Ok(7) }, |_| true).await;
    assert_eq!(out, Ok(7));
  }
}
