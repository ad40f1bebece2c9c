//! Hierarchical message materialization.
//!
//! This module turns flat, parent-linked [`StoredMessage`]s into views for
//! clients. There are two shapes:
//!
//! - **Flat levels** ([`build_level`]): one level of siblings, newest first,
//!   each flagged with whether it has anything to expand
//! - **Forests** ([`build_forest`]): every message nested under its parent,
//!   conversations newest first and replies oldest first
//!
//! Both rely on [`resolve_parents_with_children`], which answers the
//! "has children" question for a whole batch of messages in one store round
//! trip.
//!
//! The builders are synchronous and pure; only the resolver touches the
//! store. [`MessageTree`](crate::engine::MessageTree) ties them to fetches.

mod draft;
mod flat;
mod forest;
mod resolver;
mod types;

pub use draft::MessageDraft;
pub use flat::build_level;
pub use forest::build_forest;
pub use resolver::resolve_parents_with_children;
pub use types::{Forest, MessageView, ViewIterator};

use crate::error::{Error, Result};
use crate::record::{AuthorSummary, StoredMessage};

/// Get the author summary of a stored message, or fail the whole call.
fn require_author(stored: &StoredMessage) -> Result<AuthorSummary> {
    stored.author.clone().ok_or_else(|| {
        Error::data_integrity(format!(
            "message {} references author {} which could not be resolved",
            stored.record.id, stored.record.author_id
        ))
    })
}
