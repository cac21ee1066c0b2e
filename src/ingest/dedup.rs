// src/ingest/dedup.rs
use std::collections::HashSet;

use crate::ingest::types::Message;

/// Bodies already stored for one symbol, captured before a batch is filtered.
pub type KnownBodies = HashSet<String>;

/// A candidate is new unless a stored message has exactly the same body.
pub fn is_new(candidate: &Message, known: &KnownBodies) -> bool {
    !known.contains(&candidate.body)
}

/// Keep the new messages of `batch` in feed order.
///
/// Only `known` is consulted: two identical bodies inside the same batch are both
/// kept when neither was stored before.
pub fn filter_new<'a>(batch: &'a [Message], known: &KnownBodies) -> Vec<&'a Message> {
    batch.iter().filter(|m| is_new(m, known)).collect()
}
