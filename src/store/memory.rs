//! In-process record store.
//!
//! [`InMemoryStore`] keeps authors and messages behind a tokio `RwLock` and
//! answers every [`RecordStore`] operation with one lock acquisition. It
//! also exposes the hooks tests need to observe the engine from the store's
//! side: a read counter, failure injection and artificial read latency.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{
    AuthorId, AuthorSummary, MessageId, MessageRecord, NewRecord, StoredMessage, Timestamp,
};

use super::RecordStore;

#[derive(Debug, Default)]
struct State {
    authors: HashMap<AuthorId, AuthorSummary>,
    /// Records in insertion order
    messages: Vec<MessageRecord>,
    /// Position of each record in `messages`
    index: HashMap<MessageId, usize>,
    next_author_id: u64,
    next_message_id: u64,
}

impl State {
    fn join(&self, record: &MessageRecord) -> StoredMessage {
        StoredMessage::new(record.clone(), self.authors.get(&record.author_id).cloned())
    }

    fn resolves(&self, id: MessageId) -> bool {
        self.index.contains_key(&id)
    }

    fn push(&mut self, record: MessageRecord) {
        self.next_message_id = self.next_message_id.max(record.id.0.saturating_add(1));
        self.index.insert(record.id, self.messages.len());
        self.messages.push(record);
    }
}

/// A [`RecordStore`] kept entirely in memory.
///
/// # Example
///
/// ```
/// use message_tree::store::{InMemoryStore, RecordStore};
/// use message_tree::record::NewRecord;
///
/// # #[tokio::main]
/// # async fn main() -> message_tree::Result<()> {
/// let store = InMemoryStore::new();
/// let alice = store.register_author("alice", "alice@example.com").await;
/// let id = store.create_record(NewRecord::new("hello", alice, None)).await?;
/// assert_eq!(store.fetch_top_level().await?[0].id(), id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
    read_latency: Option<Duration>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose reads each take at least `latency`.
    pub fn with_read_latency(latency: Duration) -> Self {
        Self {
            read_latency: Some(latency),
            ..Self::default()
        }
    }

    /// Register an author and return the assigned identifier.
    pub async fn register_author(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> AuthorId {
        let mut state = self.state.write().await;
        state.next_author_id += 1;
        let id = AuthorId(state.next_author_id);
        state
            .authors
            .insert(id, AuthorSummary::new(id, username, email));
        id
    }

    /// Insert a fully specified record without any parent or author checks.
    ///
    /// Use this to load existing data or to reproduce dangling parents and
    /// unresolvable authors. Returns an error if the identifier is taken or
    /// is `u64::MAX`, which would leave no identifier for the next record.
    pub async fn insert(&self, record: MessageRecord) -> Result<MessageId> {
        if record.id.0 == u64::MAX {
            return Err(Error::validation(format!(
                "message id {} is out of range",
                record.id
            )));
        }
        let mut state = self.state.write().await;
        if state.resolves(record.id) {
            return Err(Error::validation(format!(
                "message {} already exists",
                record.id
            )));
        }
        let id = record.id;
        state.push(record);
        Ok(id)
    }

    /// Make every subsequent operation fail with [`Error::StoreUnavailable`]
    /// (or succeed again when `unavailable` is false).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of read round trips served so far, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Reset the read counter to zero.
    pub fn reset_read_count(&self) {
        self.reads.store(0, Ordering::SeqCst);
    }

    /// Number of stored messages.
    pub async fn message_count(&self) -> usize {
        self.state.read().await.messages.len()
    }

    /// Look up a single record by identifier.
    pub async fn get(&self, id: MessageId) -> Option<MessageRecord> {
        let state = self.state.read().await;
        state.index.get(&id).map(|&pos| state.messages[pos].clone())
    }

    /// Identifier the next created record will receive. Every identifier
    /// from here upwards is free.
    pub(crate) async fn next_message_id(&self) -> u64 {
        self.state.read().await.next_message_id.max(1)
    }

    async fn begin_read(&self, operation: &'static str) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.read_latency {
            tokio::time::sleep(latency).await;
        }
        self.check_available(operation)
    }

    fn check_available(&self, operation: &'static str) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::store_unavailable(format!(
                "{operation}: in-memory store marked unavailable"
            )))
        } else {
            Ok(())
        }
    }
}

/// Sort newest first. The sort is stable, so ties keep insertion order.
fn newest_first(mut messages: Vec<StoredMessage>) -> Vec<StoredMessage> {
    messages.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    messages
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn fetch_top_level(&self) -> Result<Vec<StoredMessage>> {
        self.begin_read("fetch_top_level").await?;
        let state = self.state.read().await;
        let top_level = state
            .messages
            .iter()
            .filter(|m| m.parent_id.map_or(true, |parent| !state.resolves(parent)))
            .map(|m| state.join(m))
            .collect();
        Ok(newest_first(top_level))
    }

    async fn fetch_children_of(&self, parent_id: MessageId) -> Result<Vec<StoredMessage>> {
        self.begin_read("fetch_children_of").await?;
        let state = self.state.read().await;
        let children = state
            .messages
            .iter()
            .filter(|m| m.parent_id == Some(parent_id))
            .map(|m| state.join(m))
            .collect();
        Ok(newest_first(children))
    }

    async fn fetch_all(&self) -> Result<Vec<StoredMessage>> {
        self.begin_read("fetch_all").await?;
        let state = self.state.read().await;
        Ok(state.messages.iter().map(|m| state.join(m)).collect())
    }

    async fn fetch_parent_ids_having_children(
        &self,
        candidates: &HashSet<MessageId>,
    ) -> Result<HashSet<MessageId>> {
        self.begin_read("fetch_parent_ids_having_children").await?;
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter_map(|m| m.parent_id)
            .filter(|parent| candidates.contains(parent))
            .collect())
    }

    async fn create_record(&self, record: NewRecord) -> Result<MessageId> {
        self.check_available("create_record")?;
        let mut state = self.state.write().await;

        let parent_id = match record.parent_id {
            Some(parent) if !state.resolves(parent) => {
                warn!(%parent, "parent does not exist, storing message as top-level");
                None
            }
            other => other,
        };

        let id = MessageId(state.next_message_id.max(1));
        if state.resolves(id) {
            return Err(Error::store_unavailable("message identifiers exhausted"));
        }
        state.push(MessageRecord {
            id,
            content: record.content,
            author_id: record.author_id,
            parent_id,
            created_at: Timestamp::now(),
        });
        debug!(%id, ?parent_id, "created message");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, parent: Option<u64>, at: i64, author: AuthorId) -> MessageRecord {
        MessageRecord {
            id: MessageId(id),
            content: format!("message {id}"),
            author_id: author,
            parent_id: parent.map(MessageId),
            created_at: Timestamp(at),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_increasing_ids() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;

        let first = store
            .create_record(NewRecord::new("first", author, None))
            .await
            .unwrap();
        let second = store
            .create_record(NewRecord::new("second", author, Some(first)))
            .await
            .unwrap();

        assert!(second > first);
        assert_eq!(store.get(second).await.unwrap().parent_id, Some(first));
    }

    #[tokio::test]
    async fn test_create_with_unknown_parent_is_top_level() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;

        let id = store
            .create_record(NewRecord::new("hello", author, Some(MessageId(9999))))
            .await
            .unwrap();

        assert_eq!(store.get(id).await.unwrap().parent_id, None);
    }

    #[tokio::test]
    async fn test_ids_continue_after_raw_insert() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        store.insert(record(50, None, 1, author)).await.unwrap();

        let id = store
            .create_record(NewRecord::new("next", author, None))
            .await
            .unwrap();
        assert_eq!(id, MessageId(51));
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        store.insert(record(1, None, 1, author)).await.unwrap();

        let err = store.insert(record(1, None, 2, author)).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_insert_rejects_max_id() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;

        let err = store
            .insert(record(u64::MAX, None, 1, author))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.message_count().await, 0);

        store.insert(record(u64::MAX - 1, None, 1, author)).await.unwrap();
        assert_eq!(store.next_message_id().await, u64::MAX);

        let last = store
            .create_record(NewRecord::new("last", author, None))
            .await
            .unwrap();
        assert_eq!(last, MessageId(u64::MAX));
        assert!(matches!(
            store.create_record(NewRecord::new("one more", author, None)).await,
            Err(Error::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_next_message_id_skips_sparse_ids() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        assert_eq!(store.next_message_id().await, 1);

        store.insert(record(1, None, 1, author)).await.unwrap();
        store.insert(record(5, None, 2, author)).await.unwrap();
        assert_eq!(store.next_message_id().await, 6);
    }

    #[tokio::test]
    async fn test_fetch_top_level_newest_first_and_includes_dangling() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        store.insert(record(1, None, 10, author)).await.unwrap();
        store.insert(record(2, None, 30, author)).await.unwrap();
        store.insert(record(3, Some(1), 40, author)).await.unwrap();
        store.insert(record(4, Some(77), 20, author)).await.unwrap();

        let ids: Vec<u64> = store
            .fetch_top_level()
            .await
            .unwrap()
            .iter()
            .map(|m| m.id().0)
            .collect();
        assert_eq!(ids, vec![2, 4, 1]);
    }

    #[tokio::test]
    async fn test_fetch_children_of_unknown_parent_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.fetch_children_of(MessageId(12)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parent_ids_having_children_is_store_wide() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        store.insert(record(1, None, 10, author)).await.unwrap();
        store.insert(record(2, Some(1), 20, author)).await.unwrap();
        store.insert(record(3, None, 30, author)).await.unwrap();

        let candidates: HashSet<MessageId> = [MessageId(1), MessageId(3)].into_iter().collect();
        let found = store
            .fetch_parent_ids_having_children(&candidates)
            .await
            .unwrap();
        assert_eq!(found, HashSet::from([MessageId(1)]));
    }

    #[tokio::test]
    async fn test_unresolved_author_joins_as_none() {
        let store = InMemoryStore::new();
        store.insert(record(1, None, 10, AuthorId(404))).await.unwrap();

        let all = store.fetch_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].author.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_fails_reads_and_writes() {
        let store = InMemoryStore::new();
        let author = store.register_author("alice", "alice@example.com").await;
        store.set_unavailable(true);

        assert!(matches!(
            store.fetch_all().await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.create_record(NewRecord::new("x", author, None)).await,
            Err(Error::StoreUnavailable(_))
        ));

        store.set_unavailable(false);
        assert!(store.fetch_all().await.is_ok());
    }

    #[tokio::test]
    async fn test_read_count() {
        let store = InMemoryStore::new();
        store.fetch_all().await.unwrap();
        store.fetch_top_level().await.unwrap();
        assert_eq!(store.read_count(), 2);

        store.reset_read_count();
        assert_eq!(store.read_count(), 0);
    }
}
