/// Retry configuration for batch operations
pub(crate) mod retry_config {
    use std::time::Duration;

    /// Calculate retry delay with exponential backoff
    ///
    /// # Arguments
    /// * `attempt` - The retry attempt number (0-based)
    /// * `initial` - Initial delay duration
    /// * `max` - Maximum delay duration
    ///
    /// # Returns
    /// Duration to wait before retrying
    pub(crate) fn retry_delay(attempt: usize, initial: Duration, max: Duration) -> Duration {
        let factor = 2u64.saturating_pow(attempt.min(u32::MAX as usize) as u32);
        let delay_ms = (initial.as_millis() as u64).saturating_mul(factor);
        let capped_delay = delay_ms.min(max.as_millis() as u64);
        Duration::from_millis(capped_delay)
    }
}

/// Concurrent fan-out with a single fan-in point
pub(crate) mod fan_out {
    use futures_util::StreamExt;
    use std::future::Future;
    use std::pin::pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio_stream::{self as stream};
    use tracing::warn;

    use crate::Error;

    /// Run `branches` with at most `concurrency` in flight and wait for all of them
    ///
    /// Returns the outputs in branch order, or the first error in completion order.
    /// After an error no further branch is started; branches already in flight run to
    /// completion and their outputs are dropped.
    pub(crate) async fn join_all<I, Fut, T>(branches: I, concurrency: usize) -> Result<Vec<T>, Error>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, Error>>,
    {
        let aborted = AtomicBool::new(false);
        let aborted = &aborted;

        let tagged = branches.into_iter().enumerate().map(|(index, branch)| async move {
            if aborted.load(Ordering::Acquire) {
                return (index, None);
            }
            (index, Some(branch.await))
        });

        let mut pending = pin!(stream::iter(tagged).buffer_unordered(concurrency.max(1)));
        let mut outputs = Vec::new();
        let mut first_error = None;

        while let Some((index, outcome)) = pending.next().await {
            match outcome {
                Some(Ok(output)) => outputs.push((index, output)),
                Some(Err(error)) => {
                    warn!(branch = index, %error, "concurrent branch failed");
                    aborted.store(true, Ordering::Release);
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                None => {}
            }
        }

        if let Some(error) = first_error {
            return Err(error);
        }

        outputs.sort_by_key(|(index, _)| *index);
        Ok(outputs.into_iter().map(|(_, output)| output).collect())
    }
}

/// Standard batch sizes for DynamoDB operations
pub(crate) mod batch_processor {
    /// Keys per `BatchGetItem` request
    pub(crate) const BATCH_READ_SIZE: usize = 100;
    /// Operations per `BatchWriteItem` request
    pub(crate) const BATCH_WRITE_SIZE: usize = 25;
    /// Chunks in flight at once
    pub(crate) const DEFAULT_CONCURRENCY: usize = 10;
}

#[cfg(test)]
mod tests {
    use super::fan_out::join_all;
    use super::retry_config::retry_delay;
    use crate::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_retry_delay() {
        let initial = Duration::from_millis(100);
        let max = Duration::from_secs(2);
        assert_eq!(retry_delay(0, initial, max), Duration::from_millis(100));
        assert_eq!(retry_delay(3, initial, max), Duration::from_millis(800));
        assert_eq!(retry_delay(10, initial, max), max);
        assert_eq!(retry_delay(200, initial, max), max);
    }

    #[tokio::test]
    async fn test_join_all_preserves_branch_order() {
        let branches = (0..5u64).map(|i| async move {
            // later branches finish first
            tokio::time::sleep(Duration::from_millis(50 - i * 10)).await;
            Ok::<_, Error>(i)
        });
        assert_eq!(join_all(branches, 5).await.unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_join_all_empty() {
        let branches = Vec::<std::future::Ready<Result<u8, Error>>>::new();
        assert!(join_all(branches, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_join_all_stops_starting_after_error() {
        let started = Arc::new(AtomicUsize::new(0));
        let branches = (0..10).map(|i| {
            let started = started.clone();
            async move {
                let _ = started.fetch_add(1, Ordering::SeqCst);
                if i == 0 {
                    Err(Error::Validation("boom".into()))
                } else {
                    Ok(i)
                }
            }
        });

        let err = join_all(branches, 1).await.unwrap_err();
        assert!(err.is_validation_error());
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }
}
