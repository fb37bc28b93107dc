//! Readwise Reader API access
//!
//! The orchestrators only see [`ReaderApi`]; [`ReaderClient`] is the HTTP
//! implementation.

mod client;

use chrono::{DateTime, Utc};

pub use client::ReaderClient;

use crate::document::{Document, Location};
use crate::Result;

#[async_trait::async_trait]
pub trait ReaderApi: Send + Sync {
    /// All documents in `location` updated after the given instant, across pages
    async fn list_documents(
        &self,
        location: Option<Location>,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<Document>>;

    /// Delete one document, retrying transient failures
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// Move one document to `location`, retrying transient failures
    async fn update_location(&self, id: &str, location: Location) -> Result<()>;
}
