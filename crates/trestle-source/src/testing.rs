//! A scripted [`Transport`] for driving sources without a network.

use std::{
  collections::VecDeque,
  sync::{Mutex, PoisonError},
};

use trestle_core::record::{AttrValue, ProjectedPoint, RawFeature};

use crate::{Result, query::FeatureQuery, transport::Transport, wire::FeaturePage};

/// Replays queued responses in order, then answers with empty pages. Every
/// query it receives is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
  responses: Mutex<VecDeque<Result<FeaturePage>>>,
  queries:   Mutex<Vec<FeatureQuery>>,
}

impl ScriptedTransport {
  pub fn new(responses: Vec<Result<FeaturePage>>) -> Self {
    Self {
      responses: Mutex::new(responses.into()),
      queries:   Mutex::new(Vec::new()),
    }
  }

  /// Queries received so far, oldest first.
  pub fn queries(&self) -> Vec<FeatureQuery> {
    self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
  }
}

impl Transport for ScriptedTransport {
  async fn get_features(&self, query: &FeatureQuery) -> Result<FeaturePage> {
    self
      .queries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(query.clone());
    self
      .responses
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .pop_front()
      .unwrap_or_else(|| Ok(FeaturePage::default()))
  }
}

/// A page holding `features`, optionally reporting a server total.
pub fn page_of(features: Vec<RawFeature>, total_matched: Option<u64>) -> FeaturePage {
  FeaturePage { features, total_matched }
}

/// A point feature whose `id` is also its `asset_id` property.
pub fn point_feature(
  id: &str,
  easting: f64,
  northing: f64,
  properties: &[(&str, AttrValue)],
) -> RawFeature {
  let mut f = RawFeature {
    id:         Some(id.to_owned()),
    geometry:   Some(ProjectedPoint { easting, northing }),
    properties: properties
      .iter()
      .map(|(k, v)| ((*k).to_owned(), v.clone()))
      .collect(),
  };
  f.properties
    .entry("asset_id".to_owned())
    .or_insert_with(|| AttrValue::Text(id.to_owned()));
  f
}
