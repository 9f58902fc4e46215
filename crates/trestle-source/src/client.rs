//! [`SourceClient`]: the configured strategy behind one [`FeatureSource`].

use crate::{
  Result, SourceConfig, Strategy,
  paged::PagedSource,
  source::{Batch, FeatureSource},
  tiled::TiledSource,
  transport::{HttpTransport, Transport},
};

/// Either retrieval strategy, selected by [`SourceConfig::strategy`].
pub enum SourceClient<T> {
  Paged(PagedSource<T>),
  Tiled(TiledSource<T>),
}

impl<T: Transport> SourceClient<T> {
  pub fn new(config: &SourceConfig, transport: T) -> Self {
    match config.strategy {
      Strategy::Paged => Self::Paged(PagedSource::new(config, transport)),
      Strategy::Tiled => Self::Tiled(TiledSource::new(config, transport)),
    }
  }
}

impl SourceClient<HttpTransport> {
  /// Build a client that talks to `config.base_url` over HTTP.
  pub fn connect(config: &SourceConfig) -> Result<Self> {
    Ok(Self::new(config, HttpTransport::new(config)?))
  }
}

impl<T: Transport> FeatureSource for SourceClient<T> {
  async fn fetch_next(&mut self) -> Batch {
    match self {
      Self::Paged(source) => source.fetch_next().await,
      Self::Tiled(source) => source.fetch_next().await,
    }
  }
}
