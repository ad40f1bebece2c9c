//! Eager forest building.
//!
//! Turns the complete, flat record set into fully nested views in one pass
//! over the data, without recursion:
//!
//! 1. Index every record by identifier and create its (unlinked) view
//! 2. Link each record to its parent, or make it a root when it has no
//!    parent or the parent is not in the set
//! 3. Order roots newest first and every child list oldest first
//! 4. Assemble the nested views bottom-up from an explicit traversal order
//!
//! Linking works on slot indices rather than on the views themselves, so the
//! order in which records arrive does not matter: a reply listed before its
//! parent links the same way as one listed after it.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::record::{MessageId, StoredMessage, Timestamp};

use super::require_author;
use super::types::{Forest, MessageView};

/// How many offending identifiers to name in a cycle error.
const MAX_REPORTED_IDS: usize = 8;

/// Build the complete forest from every stored record.
///
/// `with_children` is the batched child-existence answer for the same record
/// set; it only drives the `has_children` flag.
///
/// Roots are ordered by creation time descending and children ascending;
/// both sorts are stable, so equal timestamps keep their input order.
///
/// Fails with [`Error::DataIntegrity`] on an unresolved author, a duplicated
/// identifier, or records that can never reach a root because their parent
/// links form a cycle. Nothing is returned on failure.
pub fn build_forest(
    records: Vec<StoredMessage>,
    with_children: &HashSet<MessageId>,
) -> Result<Forest> {
    if records.is_empty() {
        return Ok(Forest::default());
    }

    let count = records.len();

    // Step 1: Index all records by identifier
    let mut id_to_slot: HashMap<MessageId, usize> = HashMap::with_capacity(count);
    let mut slots: Vec<Option<MessageView>> = Vec::with_capacity(count);
    let mut parents: Vec<Option<MessageId>> = Vec::with_capacity(count);
    let mut created: Vec<Timestamp> = Vec::with_capacity(count);

    for stored in records {
        let author = require_author(&stored)?;
        let id = stored.id();
        if id_to_slot.insert(id, slots.len()).is_some() {
            return Err(Error::data_integrity(format!(
                "message {id} appears more than once in one fetch"
            )));
        }
        parents.push(stored.record.parent_id);
        created.push(stored.created_at());
        let has_children = with_children.contains(&id);
        slots.push(Some(MessageView::from_stored(stored, author, has_children)));
    }

    // Step 2: Link children to parents; unknown parents make roots
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut roots: Vec<usize> = Vec::new();
    let mut orphans = 0usize;

    for (slot, parent) in parents.iter().enumerate() {
        match parent.and_then(|p| id_to_slot.get(&p).copied()) {
            Some(parent_slot) => children[parent_slot].push(slot),
            None => {
                if let Some(missing) = parent {
                    orphans += 1;
                    warn!(
                        id = %view_id(&slots, slot),
                        parent = %missing,
                        "parent not found, rendering message as top-level"
                    );
                }
                roots.push(slot);
            }
        }
    }

    // Step 3: Roots newest first, replies oldest first
    roots.sort_by(|&a, &b| created[b].cmp(&created[a]));
    for replies in &mut children {
        replies.sort_by_key(|&slot| created[slot]);
    }

    // Step 4: Pre-order traversal from the roots. Every descendant comes
    // after its ancestors, so walking it backwards builds children first.
    let mut order: Vec<usize> = Vec::with_capacity(count);
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    while let Some(slot) = stack.pop() {
        order.push(slot);
        stack.extend(children[slot].iter().rev().copied());
    }

    if order.len() != count {
        return Err(cycle_error(&slots, &order));
    }

    for &slot in order.iter().rev() {
        let replies: Vec<MessageView> = children[slot]
            .iter()
            .filter_map(|&child| slots[child].take())
            .collect();
        if let Some(view) = slots[slot].as_mut() {
            view.children = replies;
        }
    }

    let forest = Forest::new(roots.iter().filter_map(|&slot| slots[slot].take()).collect());

    debug!(
        messages = count,
        roots = forest.len(),
        orphans,
        "built message forest"
    );
    Ok(forest)
}

fn view_id(slots: &[Option<MessageView>], slot: usize) -> MessageId {
    slots[slot]
        .as_ref()
        .map(|view| view.id)
        .unwrap_or(MessageId(0))
}

/// Describe the records the traversal never reached.
fn cycle_error(slots: &[Option<MessageView>], reached: &[usize]) -> Error {
    let mut visited = vec![false; slots.len()];
    for &slot in reached {
        visited[slot] = true;
    }

    let mut stranded: Vec<MessageId> = visited
        .iter()
        .enumerate()
        .filter(|(_, seen)| !**seen)
        .map(|(slot, _)| view_id(slots, slot))
        .collect();
    stranded.sort();

    let total = stranded.len();
    let named: Vec<String> = stranded
        .iter()
        .take(MAX_REPORTED_IDS)
        .map(|id| id.to_string())
        .collect();

    Error::data_integrity(format!(
        "{total} message(s) are not reachable from any top-level message (parent cycle): {}{}",
        named.join(", "),
        if total > MAX_REPORTED_IDS { ", ..." } else { "" }
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AuthorId, AuthorSummary, MessageRecord};

    fn make_message(id: u64, parent: Option<u64>, at: i64) -> StoredMessage {
        StoredMessage::new(
            MessageRecord {
                id: MessageId(id),
                content: format!("message {id}"),
                author_id: AuthorId(1),
                parent_id: parent.map(MessageId),
                created_at: Timestamp(at),
            },
            Some(AuthorSummary::new(AuthorId(1), "alice", "alice@example.com")),
        )
    }

    /// Every identifier that some record names as its parent.
    fn parent_set(records: &[StoredMessage]) -> HashSet<MessageId> {
        records.iter().filter_map(|m| m.record.parent_id).collect()
    }

    fn ids(views: &[MessageView]) -> Vec<u64> {
        views.iter().map(|v| v.id.0).collect()
    }

    fn build(records: Vec<StoredMessage>) -> Result<Forest> {
        let with_children = parent_set(&records);
        build_forest(records, &with_children)
    }

    #[test]
    fn test_build_forest_empty() {
        let forest = build(vec![]).unwrap();
        assert!(forest.is_empty());
    }

    #[test]
    fn test_reading_order_scenario() {
        // A(top, t=10), B(parent A, t=20), C(parent A, t=5)
        let forest = build(vec![
            make_message(1, None, 10),
            make_message(2, Some(1), 20),
            make_message(3, Some(1), 5),
        ])
        .unwrap();

        assert_eq!(ids(forest.roots()), vec![1]);
        let a = &forest.roots()[0];
        assert_eq!(ids(&a.children), vec![3, 2]);
        assert!(a.has_children);
        assert!(!a.children[0].has_children);
        assert!(!a.children[1].has_children);
    }

    #[test]
    fn test_roots_descending_children_ascending() {
        let forest = build(vec![
            make_message(1, None, 10),
            make_message(2, None, 30),
            make_message(3, None, 20),
            make_message(4, Some(2), 90),
            make_message(5, Some(2), 40),
            make_message(6, Some(5), 80),
            make_message(7, Some(5), 50),
        ])
        .unwrap();

        assert_eq!(ids(forest.roots()), vec![2, 3, 1]);
        let root = &forest.roots()[0];
        assert_eq!(ids(&root.children), vec![5, 4]);
        assert_eq!(ids(&root.children[0].children), vec![7, 6]);
    }

    #[test]
    fn test_children_listed_before_parent() {
        let forest = build(vec![
            make_message(3, Some(2), 30),
            make_message(2, Some(1), 20),
            make_message(1, None, 10),
        ])
        .unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest.max_depth(), 2);
        assert_eq!(forest.total_messages(), 3);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let forest = build(vec![
            make_message(1, None, 10),
            make_message(2, None, 10),
            make_message(3, Some(1), 50),
            make_message(4, Some(1), 50),
            make_message(5, Some(1), 50),
        ])
        .unwrap();

        assert_eq!(ids(forest.roots()), vec![1, 2]);
        assert_eq!(ids(&forest.roots()[0].children), vec![3, 4, 5]);
    }

    #[test]
    fn test_dangling_parent_becomes_top_level() {
        let forest = build(vec![
            make_message(1, None, 10),
            make_message(2, Some(404), 20),
            make_message(3, Some(2), 30),
        ])
        .unwrap();

        assert_eq!(ids(forest.roots()), vec![2, 1]);
        assert_eq!(ids(&forest.roots()[0].children), vec![3]);
        assert_eq!(forest.total_messages(), 3);
    }

    #[test]
    fn test_flags_come_from_existence_set() {
        let records = vec![make_message(1, None, 10), make_message(2, None, 20)];
        // The store may know of children outside this record set.
        let with_children: HashSet<MessageId> = [MessageId(1)].into_iter().collect();
        let forest = build_forest(records, &with_children).unwrap();

        let one = forest.find(MessageId(1)).unwrap();
        let two = forest.find(MessageId(2)).unwrap();
        assert!(one.has_children);
        assert!(one.children.is_empty());
        assert!(!two.has_children);
    }

    #[test]
    fn test_every_record_appears_once() {
        let records = vec![
            make_message(1, None, 1),
            make_message(2, Some(1), 2),
            make_message(3, Some(1), 3),
            make_message(4, Some(3), 4),
            make_message(5, None, 5),
            make_message(6, Some(99), 6),
            make_message(7, Some(5), 7),
        ];
        let linked = records
            .iter()
            .filter(|m| matches!(m.record.parent_id, Some(p) if p.0 < 10))
            .count();

        let forest = build(records).unwrap();

        let mut seen: Vec<u64> = forest.iter_all().map(|v| v.id.0).collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);

        let attached: usize = forest.iter_all().map(|v| v.child_count()).sum();
        assert_eq!(attached, linked);
    }

    #[test]
    fn test_same_input_same_output() {
        let records = vec![
            make_message(1, None, 10),
            make_message(2, Some(1), 10),
            make_message(3, Some(1), 10),
            make_message(4, None, 10),
        ];
        let first = build(records.clone()).unwrap();
        let second = build(records).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unresolved_author_fails() {
        let mut orphan_author = make_message(2, Some(1), 20);
        orphan_author.author = None;

        let err = build(vec![make_message(1, None, 10), orphan_author]).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn test_duplicate_id_fails() {
        let err = build(vec![make_message(1, None, 10), make_message(1, None, 20)]).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_cycle_fails_instead_of_looping() {
        let err = build(vec![
            make_message(1, None, 10),
            make_message(2, Some(3), 20),
            make_message(3, Some(2), 30),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::DataIntegrity(_)));
        assert!(err.to_string().contains("2 message(s)"));
        assert!(err.to_string().contains("2, 3"));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let err = build(vec![make_message(1, Some(1), 10)]).unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    #[test]
    fn test_build_forest_deeply_nested() {
        const DEPTH: u64 = 1000;

        let mut records = vec![make_message(1, None, 1)];
        for id in 2..=DEPTH {
            records.push(make_message(id, Some(id - 1), id as i64));
        }

        let forest = build(records).unwrap();

        assert_eq!(forest.len(), 1);
        assert_eq!(forest.total_messages(), DEPTH as usize);
        assert_eq!(forest.max_depth(), DEPTH as usize - 1);
        let deepest = forest.find(MessageId(DEPTH)).unwrap();
        assert!(deepest.children.is_empty());
        assert!(!deepest.has_children);
        assert!(forest.find(MessageId(DEPTH - 1)).unwrap().has_children);
    }

    #[test]
    fn test_build_forest_wide_and_deep() {
        const WIDTH: u64 = 10;
        const DEPTH: u64 = 100;

        let mut records = vec![make_message(1, None, 0)];
        for chain in 0..WIDTH {
            for depth in 0..DEPTH {
                let id = 2 + chain * DEPTH + depth;
                let parent = if depth == 0 { 1 } else { id - 1 };
                records.push(make_message(id, Some(parent), (depth * WIDTH + chain) as i64));
            }
        }

        let forest = build(records).unwrap();

        assert_eq!(forest.len(), 1);
        let root = &forest.roots()[0];
        assert_eq!(root.child_count(), WIDTH as usize);
        assert_eq!(forest.total_messages(), (1 + WIDTH * DEPTH) as usize);
        assert_eq!(forest.max_depth(), DEPTH as usize);

        let starts: Vec<i64> = root.children.iter().map(|v| v.created_at.0).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }
}
