//! Feed Reconciliation
//!
//! Array diffing used to keep the feed fresh: counting messages that arrived
//! ahead of the known newest one, and merging batches without duplicating a
//! transaction hash.

use std::collections::HashSet;

use crate::types::Message;

/// Number of messages in `window` that precede the known newest hash
///
/// When the known hash is absent from the window (or nothing is known yet)
/// the whole window counts as new.
pub fn count_new(known_newest: Option<&str>, window: &[Message]) -> usize {
    match known_newest {
        Some(hash) => window
            .iter()
            .position(|m| m.txn_hash == hash)
            .unwrap_or(window.len()),
        None => window.len(),
    }
}

fn known_hashes(messages: &[Message]) -> HashSet<String> {
    messages.iter().map(|m| m.txn_hash.clone()).collect()
}

/// Keep only messages whose hash is neither in `seen` nor earlier in `batch`
fn unseen(seen: &mut HashSet<String>, batch: Vec<Message>) -> Vec<Message> {
    batch
        .into_iter()
        .filter(|m| seen.insert(m.txn_hash.clone()))
        .collect()
}

/// Prepend messages not already present, preserving batch order
///
/// Returns how many messages were added.
pub fn prepend_unique(existing: &mut Vec<Message>, fresh: Vec<Message>) -> usize {
    let mut seen = known_hashes(existing);
    let mut added = unseen(&mut seen, fresh);
    let count = added.len();

    if count > 0 {
        added.append(existing);
        *existing = added;
    }
    count
}

/// Append messages not already present, preserving batch order
///
/// Returns how many messages were added.
pub fn append_unique(existing: &mut Vec<Message>, more: Vec<Message>) -> usize {
    let mut seen = known_hashes(existing);
    let added = unseen(&mut seen, more);
    let count = added.len();
    existing.extend(added);
    count
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn msg(hash: &str) -> Message {
        Message {
            chain_id: 1,
            block_number: 100,
            block_timestamp: 1_700_000_000,
            txn_hash: hash.to_string(),
            sender: "0xsender".to_string(),
            receiver: "0xreceiver".to_string(),
            content: format!("memo {}", hash),
            value: 0.0,
        }
    }

    pub(crate) fn msgs(hashes: &[&str]) -> Vec<Message> {
        hashes.iter().map(|h| msg(h)).collect()
    }

    fn hashes(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.txn_hash.as_str()).collect()
    }

    #[test]
    fn test_count_new_head_matches() {
        assert_eq!(count_new(Some("0xA"), &msgs(&["0xA", "0xB"])), 0);
    }

    #[test]
    fn test_count_new_at_index() {
        assert_eq!(count_new(Some("0xA"), &msgs(&["0xC", "0xA"])), 1);
        assert_eq!(count_new(Some("0xA"), &msgs(&["0xE", "0xD", "0xC", "0xA"])), 3);
    }

    #[test]
    fn test_count_new_no_overlap() {
        // Known head scrolled out of the probe window
        assert_eq!(count_new(Some("0xA"), &msgs(&["0xZ", "0xY", "0xX"])), 3);
        assert_eq!(count_new(None, &msgs(&["0xZ"])), 1);
        assert_eq!(count_new(Some("0xA"), &[]), 0);
    }

    #[test]
    fn test_prepend_unique() {
        let mut list = msgs(&["0xA", "0xB"]);
        let added = prepend_unique(&mut list, msgs(&["0xC", "0xA"]));

        assert_eq!(added, 1);
        assert_eq!(hashes(&list), vec!["0xC", "0xA", "0xB"]);
    }

    #[test]
    fn test_prepend_dedupes_within_batch() {
        let mut list = msgs(&["0xA"]);
        let added = prepend_unique(&mut list, msgs(&["0xC", "0xC", "0xB"]));

        assert_eq!(added, 2);
        assert_eq!(hashes(&list), vec!["0xC", "0xB", "0xA"]);
    }

    #[test]
    fn test_prepend_nothing_new() {
        let mut list = msgs(&["0xA", "0xB"]);
        assert_eq!(prepend_unique(&mut list, msgs(&["0xA"])), 0);
        assert_eq!(hashes(&list), vec!["0xA", "0xB"]);
    }

    #[test]
    fn test_append_unique() {
        let mut list = msgs(&["0xC", "0xA", "0xB"]);
        let added = append_unique(&mut list, msgs(&["0xB", "0xD", "0xE"]));

        assert_eq!(added, 2);
        assert_eq!(hashes(&list), vec!["0xC", "0xA", "0xB", "0xD", "0xE"]);
    }
}
