//! PostgREST backend for the Trestle destination store.
//!
//! Rows are upserted into a single table keyed by `asset_id`; aggregate
//! refresh and statistics are remote procedures invoked over `/rpc`.

mod config;
mod store;

pub mod error;

pub use config::RestConfig;
pub use error::{Error, Result};
pub use store::{RestStore, parse_content_range};
