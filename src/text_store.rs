//! Content-keyed registry of text blocks already placed in the output.

use std::collections::HashMap;

use crate::blocks::TextBlock;

/// Maps `(content, is_metadata)` to the address the block was written at,
/// so that identical texts are stored once and shared by every owner.
#[derive(Debug, Default)]
pub struct TextStore {
    addresses: HashMap<(String, bool), u64>,
}

impl TextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address of an already stored block with the same content and kind.
    pub fn lookup(&self, block: &TextBlock) -> Option<u64> {
        self.addresses
            .get(&(block.text.clone(), block.is_metadata()))
            .copied()
    }

    /// Records that `block` lives at `address`; an existing entry is kept.
    pub fn insert(&mut self, block: &TextBlock, address: u64) -> u64 {
        *self
            .addresses
            .entry((block.text.clone(), block.is_metadata()))
            .or_insert(address)
    }

    /// Number of distinct texts stored.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}
