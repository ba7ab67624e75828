//! Condition waits behind the `expect_*` and `wait_*` steps.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// One observation of a polled condition.
pub enum Check<T> {
    Done(T),
    /// Not yet; carries what was observed for the failure message.
    Pending(String),
}

/// Re-run `check` every `poll` until it is done or `timeout` elapses.
///
/// Returns `Ok(Err(last_observation))` on timeout. Errors from `check`
/// abort the wait immediately.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    poll: Duration,
    mut check: F,
) -> Result<std::result::Result<T, String>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Check<T>>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let observed = match check().await? {
            Check::Done(value) => return Ok(Ok(value)),
            Check::Pending(observed) => observed,
        };
        let now = Instant::now();
        if now >= deadline {
            return Ok(Err(observed));
        }
        tokio::time::sleep(poll.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_succeeds_once_condition_holds() {
        let calls = AtomicUsize::new(0);
        let calls = &calls;
        let out = poll_until(Duration::from_secs(1), Duration::from_millis(100), move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Ok(if n >= 3 {
                Check::Done(n)
            } else {
                Check::Pending(format!("call {}", n))
            })
        })
        .await
        .unwrap();
        assert_eq!(out, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_with_last_observation() {
        let start = Instant::now();
        let out: std::result::Result<(), String> =
            poll_until(Duration::from_millis(250), Duration::from_millis(100), || async {
                Ok(Check::Pending("still hidden".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(out, Err("still hidden".to_string()));
        assert_eq!(start.elapsed(), Duration::from_millis(250));
    }
}
