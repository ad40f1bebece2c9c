//! View types produced by materialization.

use serde::Serialize;

use crate::record::{AuthorSummary, MessageId, StoredMessage, Timestamp};

/// A message rendered for clients, with its nested replies.
///
/// Views are built fresh by every materialization call and owned by the
/// caller afterwards. In flat listings `children` is always empty and
/// `has_children` tells whether there is anything to expand; in a full tree
/// `children` is populated and `has_children` is informational.
///
/// Serializes with the field names web clients expect:
/// `id`, `content`, `createdAt`, `user`, `children`, `hasChildren`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Message identifier
    pub id: MessageId,
    /// Message text
    pub content: String,
    /// Creation time
    pub created_at: Timestamp,
    /// Author display fields
    #[serde(rename = "user")]
    pub author: AuthorSummary,
    /// Direct replies, in display order
    pub children: Vec<MessageView>,
    /// Whether at least one message in the store replies to this one
    pub has_children: bool,
}

impl MessageView {
    /// Create a view with no children from a stored message and its resolved author.
    pub(crate) fn from_stored(
        stored: StoredMessage,
        author: AuthorSummary,
        has_children: bool,
    ) -> Self {
        Self {
            id: stored.record.id,
            content: stored.record.content,
            created_at: stored.record.created_at,
            author,
            children: Vec::new(),
            has_children,
        }
    }

    /// Get the number of direct children currently attached.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Find a view by identifier in this subtree.
    pub fn find(&self, id: MessageId) -> Option<&MessageView> {
        self.iter().find(|view| view.id == id)
    }

    /// Count all views in this subtree, including this one.
    pub fn count_nodes(&self) -> usize {
        self.iter().count()
    }

    /// Get the maximum depth of the subtree (0 if no children attached).
    ///
    /// Uses an explicit stack so arbitrarily deep chains are safe.
    pub fn max_depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((view, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in &view.children {
                stack.push((child, depth + 1));
            }
        }
        deepest
    }

    /// Iterate over this view and all its descendants (depth-first, display order).
    pub fn iter(&self) -> ViewIterator<'_> {
        ViewIterator::new(std::slice::from_ref(self))
    }
}

/// Depth-first iterator over views, yielding each view before its children.
pub struct ViewIterator<'a> {
    stack: Vec<&'a MessageView>,
}

impl<'a> ViewIterator<'a> {
    fn new(roots: &'a [MessageView]) -> Self {
        Self {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for ViewIterator<'a> {
    type Item = &'a MessageView;

    fn next(&mut self) -> Option<Self::Item> {
        let view = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        for child in view.children.iter().rev() {
            self.stack.push(child);
        }
        Some(view)
    }
}

/// A fully materialized discussion: top-level views with all replies nested.
///
/// Serializes as a bare JSON array of top-level views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Forest {
    roots: Vec<MessageView>,
}

impl Forest {
    /// Create a forest from ordered top-level views.
    pub fn new(roots: Vec<MessageView>) -> Self {
        Self { roots }
    }

    /// Get the top-level views.
    pub fn roots(&self) -> &[MessageView] {
        &self.roots
    }

    /// Get the number of top-level views.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Check if the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Get the total number of views across all trees.
    pub fn total_messages(&self) -> usize {
        self.iter_all().count()
    }

    /// Find a view anywhere in the forest.
    pub fn find(&self, id: MessageId) -> Option<&MessageView> {
        self.iter_all().find(|view| view.id == id)
    }

    /// Get the deepest nesting level across all trees.
    pub fn max_depth(&self) -> usize {
        self.roots.iter().map(MessageView::max_depth).max().unwrap_or(0)
    }

    /// Iterate over top-level views.
    pub fn iter(&self) -> impl Iterator<Item = &MessageView> {
        self.roots.iter()
    }

    /// Iterate over every view in the forest (depth-first, display order).
    pub fn iter_all(&self) -> ViewIterator<'_> {
        ViewIterator::new(&self.roots)
    }

    /// Take ownership of the top-level views.
    pub fn into_roots(self) -> Vec<MessageView> {
        self.roots
    }
}

impl IntoIterator for Forest {
    type Item = MessageView;
    type IntoIter = std::vec::IntoIter<MessageView>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.into_iter()
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a MessageView;
    type IntoIter = std::slice::Iter<'a, MessageView>;

    fn into_iter(self) -> Self::IntoIter {
        self.roots.iter()
    }
}
