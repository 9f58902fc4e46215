//! Settings for the PostgREST destination.

use serde::Deserialize;

/// Connection settings for a PostgREST-style destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RestConfig {
  /// Project URL, without the `/rest/v1` suffix.
  pub url:             String,
  /// Sent both as the `apikey` header and as the bearer token.
  pub api_key:         String,
  pub table:           String,
  pub refresh_fn:      String,
  pub global_stats_fn: String,
  pub region_stats_fn: String,
  pub timeout_secs:    u64,
}

impl Default for RestConfig {
  fn default() -> Self {
    Self {
      url:             String::new(),
      api_key:         String::new(),
      table:           "bridges".to_owned(),
      refresh_fn:      "refresh_region_stats".to_owned(),
      global_stats_fn: "get_global_stats".to_owned(),
      region_stats_fn: "get_region_stats".to_owned(),
      timeout_secs:    60,
    }
  }
}
