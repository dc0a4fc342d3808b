//! # Remote Sync
//!
//! A [`SyncPort`] is the CRUD boundary between one record type and the server
//! that owns it. It issues the request and hands back the raw status and body;
//! deciding what a status means, parsing the body and updating state is the
//! caller's job.
//!
//! | Operation        | Method | Path          | Body         |
//! |------------------|--------|---------------|--------------|
//! | `fetch(id)`      | GET    | `{base}/{id}` |              |
//! | `fetch_all()`    | GET    | `{base}`      |              |
//! | `save(data)`, id | PUT    | `{base}/{id}` | JSON of data |
//! | `save(data)`     | POST   | `{base}`      | JSON of data |
//!
//! Ports never retry and never time out. The only `Err` a port returns is a
//! transport failure (or a body that could not be encoded); a completed
//! request with a failing status is still `Ok`.
//!
//! Implementations:
//! - [`api::ApiSync`]: HTTP via `reqwest`
//! - [`memory::InMemorySync`]: an in-process server double for tests and
//!   development

use crate::attributes::Record;
use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

pub mod api;
pub mod memory;

/// A completed request: status code and unparsed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes the body as JSON.
    pub fn json<V: DeserializeOwned>(&self) -> Result<V> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Abstract interface for syncing records of type `T` with a remote service.
///
/// Futures are not `Send`: models, collections and views are single-threaded.
#[async_trait(?Send)]
pub trait SyncPort<T: Record> {
    /// Reads one record.
    async fn fetch(&self, id: u64) -> Result<RawResponse>;

    /// Reads the whole collection.
    async fn fetch_all(&self) -> Result<RawResponse>;

    /// Updates `data` in place if it has an id, creates it otherwise.
    async fn save(&self, data: &T) -> Result<RawResponse>;
}
