//! # message-tree
//!
//! Materializes threaded discussions stored as flat, parent-linked messages
//! into the shapes clients render.
//!
//! ## Design
//!
//! Messages are stored as an adjacency list: each message optionally names
//! its parent. From that, this crate builds:
//!
//! - **Lazy listings**: one level at a time (top-level messages, or the
//!   replies to one message), each view flagged with whether it has replies
//!   to expand. Threads hundreds of levels deep can be browsed one click at a
//!   time.
//! - **Full trees**: every message nested under its parent in one go.
//!
//! Either way the store is asked a fixed number of questions per call, never
//! one per message: one fetch plus one batched "which of these have
//! children?" lookup.
//!
//! Storage is abstracted behind [`RecordStore`]; [`InMemoryStore`] is a
//! complete implementation for tests, demos and embedded use.
//!
//! ## Example
//!
//! ```rust
//! use message_tree::{InMemoryStore, MessageTree};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = MessageTree::new(InMemoryStore::new());
//! let alice = tree.store().register_author("alice", "alice@example.com").await;
//!
//! let question = tree.create_message("How deep can replies go?", alice, None).await?;
//! let answer = tree.create_message("Deeper than you think.", alice, Some(question)).await?;
//!
//! // Expand lazily...
//! let top = tree.list_top_level().await?;
//! assert!(top[0].has_children);
//! let replies = tree.list_children(question).await?;
//! assert_eq!(replies[0].id, answer);
//!
//! // ...or render everything at once.
//! let forest = tree.materialize_full_tree().await?;
//! assert_eq!(forest.total_messages(), 2);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod seed;
pub mod store;
pub mod tree;

pub use config::{ContentLimits, EngineConfig};
pub use engine::MessageTree;
pub use error::{Error, Result};
pub use record::{AuthorId, AuthorSummary, MessageId, MessageRecord, StoredMessage, Timestamp};
pub use store::{InMemoryStore, RecordStore};
pub use tree::{Forest, MessageDraft, MessageView};
