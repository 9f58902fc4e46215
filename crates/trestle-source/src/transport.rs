//! The `Transport` seam and its HTTP implementation.
//!
//! Retrieval strategies only build [`FeatureQuery`]s; a [`Transport`] turns a
//! query into a decoded [`FeaturePage`]. Tests substitute a scripted transport
//! so pagination and retry logic run without a network.

use std::{future::Future, time::Duration};

use reqwest::Client;

use crate::{
  Result, SourceConfig, SourceError,
  query::{FeatureQuery, Selection},
  wire::FeaturePage,
};

/// Executes one GetFeature request.
pub trait Transport: Send + Sync {
  fn get_features<'a>(
    &'a self,
    query: &'a FeatureQuery,
  ) -> impl Future<Output = Result<FeaturePage>> + Send + 'a;
}

/// WFS GetFeature over HTTP(S) with a GeoJSON output format.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpTransport {
  client:        Client,
  base_url:      String,
  version:       String,
  output_format: String,
  srs_name:      String,
}

impl HttpTransport {
  pub fn new(config: &SourceConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("trestle/", env!("CARGO_PKG_VERSION")))
      .build()?;
    Ok(Self {
      client,
      base_url: config.base_url.clone(),
      version: config.version.clone(),
      output_format: config.output_format.clone(),
      srs_name: config.srs_name.clone(),
    })
  }

  /// Query-string parameters for `query`.
  pub fn params(&self, query: &FeatureQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
      ("service", "WFS".to_owned()),
      ("version", self.version.clone()),
      ("request", "GetFeature".to_owned()),
      ("typeNames", query.type_name.clone()),
      ("outputFormat", self.output_format.clone()),
      ("srsName", self.srs_name.clone()),
    ];

    match &query.selection {
      Selection::Page { start_index, count, sort_by } => {
        params.push(("count", count.to_string()));
        params.push(("startIndex", start_index.to_string()));
        if let Some(key) = sort_by {
          params.push(("sortBy", key.clone()));
        }
      }
      Selection::Tile { bbox, count } => {
        params.push((
          "bbox",
          format!(
            "{},{},{},{},{}",
            bbox.min_easting,
            bbox.min_northing,
            bbox.max_easting,
            bbox.max_northing,
            self.srs_name
          ),
        ));
        params.push(("count", count.to_string()));
      }
    }

    params
  }
}

impl Transport for HttpTransport {
  async fn get_features(&self, query: &FeatureQuery) -> Result<FeaturePage> {
    let resp = self
      .client
      .get(&self.base_url)
      .query(&self.params(query))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(SourceError::Status {
        status:    status.as_u16(),
        type_name: query.type_name.clone(),
      });
    }

    let body = resp.text().await?;
    FeaturePage::from_json(&body)
  }
}
