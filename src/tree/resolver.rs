//! Batched child-existence lookup.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::record::MessageId;
use crate::store::{with_deadline, RecordStore};

/// Determine which of `candidates` have at least one child anywhere in the store.
///
/// This is a single store round trip regardless of how many candidates are
/// passed; an empty candidate set returns immediately without touching the
/// store. The result is always a subset of `candidates`, even if the store
/// answers with extra identifiers.
pub async fn resolve_parents_with_children<S>(
    store: &S,
    candidates: &HashSet<MessageId>,
    deadline: Option<Duration>,
) -> Result<HashSet<MessageId>>
where
    S: RecordStore + ?Sized,
{
    if candidates.is_empty() {
        return Ok(HashSet::new());
    }

    let mut parents = with_deadline(
        deadline,
        "fetch_parent_ids_having_children",
        store.fetch_parent_ids_having_children(candidates),
    )
    .await?;
    parents.retain(|id| candidates.contains(id));

    debug!(
        candidates = candidates.len(),
        with_children = parents.len(),
        "resolved child existence"
    );
    Ok(parents)
}
