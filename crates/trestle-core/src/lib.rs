//! Core types and trait definitions for the Trestle bridge-inventory
//! ingestion pipeline.
//!
//! This crate is free of HTTP and database dependencies. Every other crate
//! depends on it: the source client produces [`record::RawFeature`]s, the
//! ingest crate turns them into [`record::CanonicalRecord`]s, and storage
//! backends implement [`store::RecordStore`].

// Native `async fn` in traits; the store trait spells out `Send` futures
// explicitly.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod record;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
