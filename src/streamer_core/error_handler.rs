use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

#[derive(Debug)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    /// `None` retries forever
    max_retries: Option<u32>,
    current_attempt: u32,
}

#[derive(Debug, Error)]
#[error("Maximum retry attempts exceeded")]
pub struct MaxRetriesExceeded;

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration, retries: Option<u32>) -> Self {
        Self {
            initial_delay: initial,
            max_delay: max,
            max_retries: retries,
            current_attempt: 0,
        }
    }

    /// Delay the next `sleep` would wait: initial * 2^attempt, capped
    pub fn next_delay(&self) -> Duration {
        let factor = 2_u32.saturating_pow(self.current_attempt.min(31));
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }

    pub fn attempts(&self) -> u32 {
        self.current_attempt
    }

    pub async fn sleep(&mut self) -> Result<(), MaxRetriesExceeded> {
        if let Some(max) = self.max_retries {
            if self.current_attempt >= max {
                return Err(MaxRetriesExceeded);
            }
        }

        let delay = self.next_delay();

        match self.max_retries {
            Some(max) => log::warn!(
                "⏳ Retry attempt {} of {} in {}ms",
                self.current_attempt + 1,
                max,
                delay.as_millis()
            ),
            None => log::warn!(
                "⏳ Retry attempt {} in {}ms",
                self.current_attempt + 1,
                delay.as_millis()
            ),
        }

        sleep(delay).await;
        self.current_attempt = self.current_attempt.saturating_add(1);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delay_doubles_and_caps() {
        let mut backoff = ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(5), None);
        let mut delays = Vec::new();
        for _ in 0..5 {
            delays.push(backoff.next_delay().as_millis());
            backoff.sleep().await.unwrap();
        }
        assert_eq!(delays, vec![1, 2, 4, 5, 5]);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_retry_cap() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(2), Some(2));
        assert!(backoff.sleep().await.is_ok());
        assert!(backoff.sleep().await.is_ok());
        assert!(backoff.sleep().await.is_err());
        assert_eq!(backoff.attempts(), 2);
    }

    #[test]
    fn test_large_attempt_count_saturates() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_millis(500), Duration::from_secs(30), None);
        backoff.current_attempt = 1_000;
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
    }
}
