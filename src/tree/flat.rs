//! Single-level listings with an expand flag.

use std::collections::HashSet;

use crate::error::Result;
use crate::record::{MessageId, StoredMessage};

use super::types::MessageView;
use super::require_author;

/// Build views for one level of siblings without recursing.
///
/// Every view gets an empty child list; `has_children` is true when its
/// identifier is in `with_children`. Output is newest first. The sort is
/// stable, so records already in that order (as stores return them) keep
/// their relative positions, ties included.
///
/// Fails with [`Error::DataIntegrity`](crate::Error::DataIntegrity) if any
/// record's author is unresolved; no partial listing is returned.
pub fn build_level(
    siblings: Vec<StoredMessage>,
    with_children: &HashSet<MessageId>,
) -> Result<Vec<MessageView>> {
    let mut views = siblings
        .into_iter()
        .map(|stored| -> Result<MessageView> {
            let author = require_author(&stored)?;
            let has_children = with_children.contains(&stored.id());
            Ok(MessageView::from_stored(stored, author, has_children))
        })
        .collect::<Result<Vec<_>>>()?;

    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(views)
}
