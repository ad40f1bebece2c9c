//! The storage seam consumed by the engine.
//!
//! The engine never talks to a database directly. It reads and writes
//! through the [`RecordStore`] trait, which any backend can implement as
//! long as it can answer every operation in a single round trip.
//!
//! [`InMemoryStore`] is a complete implementation kept in process memory.

mod memory;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::record::{MessageId, NewRecord, StoredMessage};

pub use memory::InMemoryStore;

/// Batched read and write operations over message records.
///
/// Every method is one round trip to the backend. Failures are reported as
/// [`Error::StoreUnavailable`] and never masked as empty results.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch all top-level records, newest first, joined with their authors.
    async fn fetch_top_level(&self) -> Result<Vec<StoredMessage>>;

    /// Fetch the records whose parent is `parent_id`, newest first, joined
    /// with their authors.
    ///
    /// An unknown `parent_id` yields an empty list.
    async fn fetch_children_of(&self, parent_id: MessageId) -> Result<Vec<StoredMessage>>;

    /// Fetch every record joined with its author, in any order.
    async fn fetch_all(&self) -> Result<Vec<StoredMessage>>;

    /// Return the members of `candidates` that are the parent of at least
    /// one record anywhere in the store.
    async fn fetch_parent_ids_having_children(
        &self,
        candidates: &HashSet<MessageId>,
    ) -> Result<HashSet<MessageId>>;

    /// Persist a new record and return its assigned identifier.
    ///
    /// A `parent_id` that does not resolve is dropped and the record is
    /// stored as top-level.
    async fn create_record(&self, record: NewRecord) -> Result<MessageId>;
}

#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    async fn fetch_top_level(&self) -> Result<Vec<StoredMessage>> {
        (**self).fetch_top_level().await
    }

    async fn fetch_children_of(&self, parent_id: MessageId) -> Result<Vec<StoredMessage>> {
        (**self).fetch_children_of(parent_id).await
    }

    async fn fetch_all(&self) -> Result<Vec<StoredMessage>> {
        (**self).fetch_all().await
    }

    async fn fetch_parent_ids_having_children(
        &self,
        candidates: &HashSet<MessageId>,
    ) -> Result<HashSet<MessageId>> {
        (**self).fetch_parent_ids_having_children(candidates).await
    }

    async fn create_record(&self, record: NewRecord) -> Result<MessageId> {
        (**self).create_record(record).await
    }
}

#[async_trait]
impl<'a, S: RecordStore + ?Sized> RecordStore for &'a S {
    async fn fetch_top_level(&self) -> Result<Vec<StoredMessage>> {
        (**self).fetch_top_level().await
    }

    async fn fetch_children_of(&self, parent_id: MessageId) -> Result<Vec<StoredMessage>> {
        (**self).fetch_children_of(parent_id).await
    }

    async fn fetch_all(&self) -> Result<Vec<StoredMessage>> {
        (**self).fetch_all().await
    }

    async fn fetch_parent_ids_having_children(
        &self,
        candidates: &HashSet<MessageId>,
    ) -> Result<HashSet<MessageId>> {
        (**self).fetch_parent_ids_having_children(candidates).await
    }

    async fn create_record(&self, record: NewRecord) -> Result<MessageId> {
        (**self).create_record(record).await
    }
}

/// Await a store operation, bounded by `deadline` when one is set.
///
/// An expired deadline drops the pending operation and reports
/// [`Error::StoreUnavailable`].
pub(crate) async fn with_deadline<T, F>(
    deadline: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(operation, ?limit, "store read timed out");
                Err(Error::store_unavailable(format!(
                    "{operation} timed out after {limit:?}"
                )))
            }
        },
    }
}
