//! Offset pagination.
//!
//! Walks the feature type in fixed-size pages ordered by a sort key. Stops
//! once the server-reported total is reached. That total is often missing or
//! unreliable, so a run of consecutive empty pages also ends the walk. Failed
//! pages join that run only while no total is known.

use std::time::Duration;

use crate::{
  SourceConfig,
  pacing::Pacer,
  query::{FeatureQuery, Selection},
  source::{Batch, FeatureSource, UnitOutcome},
  transport::Transport,
};

pub struct PagedSource<T> {
  transport:       T,
  pacer:           Pacer,
  type_name:       String,
  page_size:       u64,
  sort_by:         Option<String>,
  max_empty_pages: u32,
  max_units:       Option<u64>,
  /// Zero-based index of the next page to request.
  next_page:       u64,
  empty_streak:    u32,
  total:           Option<u64>,
  done:            bool,
}

impl<T: Transport> PagedSource<T> {
  pub fn new(config: &SourceConfig, transport: T) -> Self {
    Self {
      transport,
      pacer: Pacer::new(
        Duration::from_millis(config.request_delay_ms),
        Duration::from_millis(config.retry_delay_ms),
      ),
      type_name: config.type_name.clone(),
      page_size: config.page_size.max(1),
      sort_by: config.sort_by.clone(),
      max_empty_pages: config.max_empty_pages.max(1),
      max_units: config.max_units,
      next_page: 0,
      empty_streak: 0,
      total: None,
      done: false,
    }
  }

  /// The server-reported total, once any page has carried one.
  pub fn total(&self) -> Option<u64> { self.total }

  pub fn transport(&self) -> &T { &self.transport }
}

impl<T: Transport> FeatureSource for PagedSource<T> {
  async fn fetch_next(&mut self) -> Batch {
    if self.done {
      return Batch::exhausted();
    }

    let page = self.next_page;
    self.next_page += 1;
    let unit = format!("page {}", page + 1);
    let query = FeatureQuery {
      type_name: self.type_name.clone(),
      selection: Selection::Page {
        start_index: page * self.page_size,
        count:       self.page_size,
        sort_by:     self.sort_by.clone(),
      },
    };

    let (features, outcome) =
      match self.pacer.fetch(&self.transport, &unit, &query, None).await {
        Ok(fetched) => {
          if fetched.total_matched.is_some() {
            self.total = fetched.total_matched;
          }
          (fetched.features, UnitOutcome::Fetched)
        }
        Err(e) => {
          tracing::warn!(unit = %unit, error = %e, "page skipped after retry");
          (Vec::new(), UnitOutcome::Skipped { reason: e.to_string() })
        }
      };

    let next_start = self.next_page * self.page_size;
    let reached_total = self.total.is_some_and(|t| next_start >= t);

    // Failed pages below a known total never end the walk.
    let outage = outcome != UnitOutcome::Fetched && self.total.is_some() && !reached_total;
    if !features.is_empty() {
      self.empty_streak = 0;
    } else if !outage {
      self.empty_streak += 1;
    }
    let drained = self.empty_streak >= self.max_empty_pages;
    let capped = self.max_units.is_some_and(|m| self.next_page >= m);
    self.done = reached_total || drained || capped;

    if drained && !reached_total {
      tracing::info!(
        pages = self.next_page,
        empty_streak = self.empty_streak,
        "stopping after consecutive empty pages"
      );
    }

    Batch { unit, features, outcome, done: self.done }
  }
}
