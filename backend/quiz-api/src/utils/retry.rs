use std::time::Duration;

/// Bounded exponential backoff with optional jitter.
///
/// Only safe-to-repeat operations go through this helper: catalog reads are
/// idempotent GETs. Grading submissions are never auto-retried - the
/// attempt lifecycle owns that decision.
#[derive(Clone)]
pub struct Backoff {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter_max: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(400),
            jitter_max: Some(Duration::from_millis(50)),
        }
    }
}

impl Backoff {
    /// Wider window for reads the UI blocks on (quiz fetch at attempt start).
    pub fn persistent() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_millis(800),
            jitter_max: Some(Duration::from_millis(100)),
        }
    }
}

pub async fn with_retries<F, Fut, T, E>(policy: Backoff, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut delay = policy.base_delay;
    // A zero-attempt policy still runs the operation once.
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt == max_attempts => return Err(error),
            Err(_) => {
                let jitter = policy
                    .jitter_max
                    .map(|max| {
                        let window = max.as_millis() as u64;
                        if window == 0 {
                            0
                        } else {
                            rand::random::<u64>() % (window + 1)
                        }
                    })
                    .unwrap_or(0);
                tokio::time::sleep(delay + Duration::from_millis(jitter)).await;
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
        }
    }

    unreachable!("retry loop always returns within max_attempts")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_attempts: usize) -> Backoff {
        Backoff {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            jitter_max: None,
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicUsize::new(0);

        let result: Result<usize, &'static str> = with_retries(fast(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("transient")
            } else {
                Ok(n)
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), &'static str> = with_retries(fast(4), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("down")
        })
        .await;

        assert_eq!(result, Err("down"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let calls = AtomicUsize::new(0);

        let result: Result<(), &'static str> = with_retries(fast(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
