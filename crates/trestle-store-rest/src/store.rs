//! [`RestStore`]: [`RecordStore`] over a PostgREST-style HTTP endpoint.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, header::CONTENT_RANGE};
use serde::de::DeserializeOwned;

use trestle_core::{
  record::CanonicalRecord,
  stats::{GlobalStats, RegionAggregate},
  store::RecordStore,
};

use crate::{Error, RestConfig, Result};

/// Parse the total out of a `Content-Range` value such as `0-24/3573` or
/// `*/0`. Returns `None` when the total is unknown (`*`) or malformed.
pub fn parse_content_range(value: &str) -> Option<u64> {
  let (_, total) = value.trim().rsplit_once('/')?;
  total.parse().ok()
}

/// Functions returning a single composite row come back either bare or
/// wrapped in a one-element array depending on how they are declared.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
  Many(Vec<T>),
  One(T),
}

impl<T> OneOrMany<T> {
  fn into_first(self) -> Option<T> {
    match self {
      Self::Many(rows) => rows.into_iter().next(),
      Self::One(row) => Some(row),
    }
  }
}

/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct RestStore {
  client: Client,
  config: RestConfig,
}

impl RestStore {
  pub fn new(config: RestConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("trestle/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/rest/v1{}", self.config.url.trim_end_matches('/'), path)
  }

  fn table_url(&self) -> String { self.url(&format!("/{}", self.config.table)) }

  fn rpc_url(&self, function: &str) -> String { self.url(&format!("/rpc/{function}")) }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    req
      .header("apikey", &self.config.api_key)
      .bearer_auth(&self.config.api_key)
  }

  // ── Request builders ──────────────────────────────────────────────────────

  fn upsert_request(&self, records: &[CanonicalRecord]) -> RequestBuilder {
    self
      .auth(self.client.post(self.table_url()))
      .query(&[("on_conflict", "asset_id")])
      .header("Prefer", "resolution=merge-duplicates,return=minimal")
      .json(records)
  }

  fn rpc_request(&self, function: &str) -> RequestBuilder {
    self
      .auth(self.client.post(self.rpc_url(function)))
      .json(&serde_json::json!({}))
  }

  fn count_request(&self) -> RequestBuilder {
    self
      .auth(self.client.get(self.table_url()))
      .query(&[("select", "asset_id")])
      .header("Prefer", "count=exact")
      .header("Range-Unit", "items")
      .header("Range", "0-0")
  }

  fn get_request(&self, asset_id: &str) -> RequestBuilder {
    self
      .auth(self.client.get(self.table_url()))
      .query(&[("asset_id", format!("eq.{asset_id}")), ("limit", "1".to_owned())])
  }

  // ── Response handling ─────────────────────────────────────────────────────

  async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<Response> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status { endpoint: endpoint.to_owned(), status: status.as_u16(), body })
  }

  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for RestStore {
  type Error = Error;

  async fn upsert_batch(&self, records: &[CanonicalRecord]) -> Result<usize> {
    for record in records {
      record.validate()?;
    }
    self.send(&self.config.table, self.upsert_request(records)).await?;
    tracing::debug!(rows = records.len(), table = %self.config.table, "batch upserted");
    Ok(records.len())
  }

  async fn refresh_aggregates(&self) -> Result<()> {
    let function = &self.config.refresh_fn;
    self.send(function, self.rpc_request(function)).await?;
    Ok(())
  }

  async fn global_stats(&self) -> Result<GlobalStats> {
    let function = &self.config.global_stats_fn;
    let resp = self.send(function, self.rpc_request(function)).await?;
    let rows: OneOrMany<GlobalStats> = Self::decode(resp).await?;
    Ok(rows.into_first().unwrap_or_default())
  }

  async fn region_stats(&self) -> Result<Vec<RegionAggregate>> {
    let function = &self.config.region_stats_fn;
    let resp = self.send(function, self.rpc_request(function)).await?;
    let mut regions: Vec<RegionAggregate> = Self::decode(resp).await?;
    regions.sort_by(|a, b| a.region.cmp(&b.region));
    Ok(regions)
  }

  async fn count(&self) -> Result<u64> {
    let resp = self.send(&self.config.table, self.count_request()).await?;
    resp
      .headers()
      .get(CONTENT_RANGE)
      .and_then(|v| v.to_str().ok())
      .and_then(parse_content_range)
      .ok_or(Error::ContentRange)
  }

  async fn get(&self, asset_id: &str) -> Result<Option<CanonicalRecord>> {
    let resp = self.send(&self.config.table, self.get_request(asset_id)).await?;
    let rows: Vec<CanonicalRecord> = Self::decode(resp).await?;
    Ok(rows.into_iter().next())
  }
}
