//! Product synchronization with the 100p article API.
//!
//! # Overview
//! Fetches an article by identifier, maps the API's field codes onto typed
//! product attributes and writes the result, together with sync status
//! bookkeeping, back to the host's product store.
//!
//! # Design
//! - `ApiClient` builds the request from an injected `ApiConfig`, runs it on
//!   a `Transport` and validates the response envelope.
//! - `FieldMapper` is a total function from a flat field map to
//!   `AttributeValues`; it never fails.
//! - `SyncService` resolves identifiers, records every outcome on the
//!   product and aggregates batch counts.
//! - Everything is synchronous and sequential. Scheduling, configuration
//!   storage and UI belong to the host.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mapper;
pub mod store;
pub mod sync;
pub mod types;

pub use client::{ApiClient, ArticleSource};
pub use config::{ApiConfig, EnvSettings, Settings};
pub use error::{Result, SyncError};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use mapper::FieldMapper;
pub use store::{InMemoryProductStore, ProductStore};
pub use sync::{SyncService, SyncSummary};
pub use types::{
    ApiAttributes, ApiEnvelope, AttributeValues, CategoryId, FlatFieldMap, ProductRecord, SyncStamp, SyncState,
    SyncStatus,
};
