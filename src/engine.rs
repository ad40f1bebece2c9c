//! The materialization façade.
//!
//! [`MessageTree`] is the entry point for request handlers. It pairs a
//! [`RecordStore`] with the builders in [`crate::tree`]:
//!
//! | Operation                  | Store reads                            | Builder         |
//! |----------------------------|----------------------------------------|-----------------|
//! | `list_top_level`           | top-level fetch + existence check      | [`build_level`] |
//! | `list_children`            | children fetch + existence check       | [`build_level`] |
//! | `materialize_full_tree`    | full fetch + existence check           | [`build_forest`]|
//!
//! Every call is independent and holds no state between invocations, so a
//! single `MessageTree` can serve any number of concurrent requests. Store
//! failures abort the call; nothing is retried or partially returned.

use std::collections::HashSet;
use std::time::Instant;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::record::{AuthorId, MessageId, NewRecord, StoredMessage};
use crate::store::{with_deadline, RecordStore};
use crate::tree::{
    build_forest, build_level, resolve_parents_with_children, Forest, MessageDraft, MessageView,
};

/// Materializes parent-linked messages from a [`RecordStore`].
///
/// # Example
///
/// ```
/// use message_tree::{InMemoryStore, MessageTree};
///
/// # #[tokio::main]
/// # async fn main() -> message_tree::Result<()> {
/// let tree = MessageTree::new(InMemoryStore::new());
/// let alice = tree.store().register_author("alice", "alice@example.com").await;
///
/// let root = tree.create_message("Anyone around?", alice, None).await?;
/// tree.create_message("Yes!", alice, Some(root)).await?;
///
/// let top = tree.list_top_level().await?;
/// assert!(top[0].has_children);
///
/// let forest = tree.materialize_full_tree().await?;
/// assert_eq!(forest.roots()[0].children.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MessageTree<S> {
    store: S,
    config: EngineConfig,
}

impl<S: RecordStore> MessageTree<S> {
    /// Create an engine over `store` with the default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Create an engine over `store` with an explicit configuration.
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// List top-level messages, newest first, without their replies.
    ///
    /// Each view's `has_children` flag tells whether it can be expanded with
    /// [`list_children`](Self::list_children).
    pub async fn list_top_level(&self) -> Result<Vec<MessageView>> {
        let started = Instant::now();
        let records = with_deadline(
            self.config.read_timeout,
            "fetch_top_level",
            self.store.fetch_top_level(),
        )
        .await?;

        let views = self.flat_level(records).await?;
        debug!(count = views.len(), elapsed = ?started.elapsed(), "listed top-level messages");
        Ok(views)
    }

    /// List the direct replies to `parent_id`, newest first, without their replies.
    ///
    /// A parent with no replies and a parent that does not exist both yield
    /// an empty list.
    pub async fn list_children(&self, parent_id: MessageId) -> Result<Vec<MessageView>> {
        let started = Instant::now();
        let records = with_deadline(
            self.config.read_timeout,
            "fetch_children_of",
            self.store.fetch_children_of(parent_id),
        )
        .await?;

        let views = self.flat_level(records).await?;
        debug!(
            parent = %parent_id,
            count = views.len(),
            elapsed = ?started.elapsed(),
            "listed child messages"
        );
        Ok(views)
    }

    /// Materialize every message as a nested forest.
    ///
    /// Conversations are ordered newest first; replies within a conversation
    /// oldest first. Uses exactly two store reads however deep the threads go.
    pub async fn materialize_full_tree(&self) -> Result<Forest> {
        let started = Instant::now();
        let records = with_deadline(
            self.config.read_timeout,
            "fetch_all",
            self.store.fetch_all(),
        )
        .await?;

        let with_children = self.existence(&records).await?;
        let forest = build_forest(records, &with_children)?;
        debug!(
            roots = forest.len(),
            elapsed = ?started.elapsed(),
            "materialized full tree"
        );
        Ok(forest)
    }

    /// Persist a message as-is and return its identifier.
    ///
    /// No validation is applied; an unresolvable `parent_id` makes the
    /// message top-level. Use [`submit`](Self::submit) to validate first.
    pub async fn create_message(
        &self,
        content: impl Into<String>,
        author_id: AuthorId,
        parent_id: Option<MessageId>,
    ) -> Result<MessageId> {
        self.store
            .create_record(NewRecord::new(content, author_id, parent_id))
            .await
    }

    /// Validate a draft against the configured content limits, then persist it.
    pub async fn submit(&self, draft: MessageDraft) -> Result<MessageId> {
        let record = draft.build(&self.config.content)?;
        self.store.create_record(record).await
    }

    async fn flat_level(&self, records: Vec<StoredMessage>) -> Result<Vec<MessageView>> {
        let with_children = self.existence(&records).await?;
        build_level(records, &with_children)
    }

    async fn existence(&self, records: &[StoredMessage]) -> Result<HashSet<MessageId>> {
        let candidates: HashSet<MessageId> = records.iter().map(StoredMessage::id).collect();
        resolve_parents_with_children(&self.store, &candidates, self.config.read_timeout).await
    }
}
