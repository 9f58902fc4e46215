//! Request spacing and the one-retry policy shared by both strategies.

use std::time::Duration;

use tokio::time::{Instant, sleep};

use crate::{Result, SourceError, query::FeatureQuery, transport::Transport, wire::FeaturePage};

/// Enforces a minimum gap between requests and a fixed delay before a retry.
#[derive(Debug, Clone)]
pub(crate) struct Pacer {
  request_delay: Duration,
  retry_delay:   Duration,
  last_request:  Option<Instant>,
}

impl Pacer {
  pub(crate) fn new(request_delay: Duration, retry_delay: Duration) -> Self {
    Self { request_delay, retry_delay, last_request: None }
  }

  /// Sleep until `request_delay` has passed since the previous request.
  async fn wait_turn(&mut self) {
    if let Some(last) = self.last_request {
      let elapsed = last.elapsed();
      if elapsed < self.request_delay {
        sleep(self.request_delay - elapsed).await;
      }
    }
    self.last_request = Some(Instant::now());
  }

  /// Issue `query`; on failure wait `retry_delay` and try exactly once more.
  ///
  /// A non-success status is retried against `alt_type_name` when one is
  /// given; every other failure retries the identical query.
  pub(crate) async fn fetch<T: Transport>(
    &mut self,
    transport: &T,
    unit: &str,
    query: &FeatureQuery,
    alt_type_name: Option<&str>,
  ) -> Result<FeaturePage> {
    self.wait_turn().await;
    let first = match transport.get_features(query).await {
      Ok(page) => return Ok(page),
      Err(e) => e,
    };

    tracing::warn!(
      unit,
      error = %first,
      retry_in_ms = self.retry_delay.as_millis() as u64,
      "request failed; retrying once"
    );
    sleep(self.retry_delay).await;

    let retry = match (&first, alt_type_name) {
      (SourceError::Status { .. }, Some(alt)) => query.with_type_name(alt),
      _ => query.clone(),
    };
    self.wait_turn().await;
    transport.get_features(&retry).await
  }
}
