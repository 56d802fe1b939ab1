//! Fail-open utilities for graceful degradation
//!
//! Use these for persistence whose failure must not end a daily run: writing
//! the daily plan file and flushing memory at the end of a run.
//!
//! DO NOT use fail-open for:
//! - Loading configuration (a broken config file must abort)
//! - Credential discovery
//! - Workshop decisions (rejections are handled by the state machine)

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::Result;

/// Run a persistence step whose failure must not end the run
///
/// The error is logged at warn level and swallowed.
///
/// ```no_run
/// use cookbot_core::fail_open::fail_open;
/// use cookbot_core::Result;
///
/// async fn write_plan() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let written = fail_open("daily_plan::save", || write_plan()).await;
///     assert!(written.is_some());
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    f().await
        .map_err(|e| warn!("{} failed, continuing without it: {}", operation_name, e))
        .ok()
}

/// [`fail_open`] with up to `attempts` tries, waiting `backoff` before the
/// first retry and doubling the wait after each one
///
/// ```no_run
/// use std::time::Duration;
/// use cookbot_core::fail_open::fail_open_with_retries;
/// use cookbot_core::Result;
///
/// async fn flush() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     fail_open_with_retries("memory::save", 3, Duration::from_millis(200), || flush()).await;
/// }
/// ```
pub async fn fail_open_with_retries<F, Fut, T>(
    operation_name: &str,
    attempts: usize,
    backoff: Duration,
    mut f: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut delay = backoff;

    for attempt in 1..attempts {
        match f().await {
            Ok(val) => return Some(val),
            Err(e) => {
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation_name, attempt, attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }
    }

    fail_open(operation_name, f).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CookbotError;

    #[tokio::test]
    async fn test_fail_open_success() {
        let result = fail_open("daily_plan::save", || async { Ok::<_, CookbotError>(42) }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn test_fail_open_failure() {
        let result = fail_open("daily_plan::save", || async {
            Err::<i32, _>(CookbotError::DailyPlan("disk full".to_string()))
        })
        .await;
        assert_eq!(result, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_open_with_retries_success_after_retry() {
        let mut attempts = 0;
        let result = fail_open_with_retries(
            "memory::save",
            3,
            Duration::from_millis(200),
            || {
                attempts += 1;
                let current = attempts;
                async move {
                    if current < 2 {
                        Err(CookbotError::Memory("locked".to_string()))
                    } else {
                        Ok("saved")
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Some("saved"));
        assert_eq!(attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fail_open_with_retries_all_failures() {
        let mut attempts = 0;
        let start = tokio::time::Instant::now();
        let result = fail_open_with_retries(
            "memory::save",
            3,
            Duration::from_millis(200),
            || {
                attempts += 1;
                async move { Err::<i32, _>(CookbotError::Memory("read-only".to_string())) }
            },
        )
        .await;
        assert_eq!(result, None);
        assert_eq!(attempts, 3);
        // 200ms then 400ms, nothing after the last attempt
        assert_eq!(start.elapsed(), Duration::from_millis(600));
    }
}
