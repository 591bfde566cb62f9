//! The document root: an ordered set of data blocks.

use tracing::debug;

use crate::name;
use crate::status::{CifError, Result};
use crate::visit::{self, Visitor, Walked};

use super::container::Block;

/// A CIF document: zero or more uniquely named data blocks.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty data block.
    pub fn create_block(&mut self, code: &str) -> Result<&mut Block> {
        let key = name::block_code(code)?;
        if self.blocks.iter().any(|b| b.key() == key) {
            return Err(CifError::DuplicateBlockCode(code.to_string()));
        }
        debug!(block = code, "created block");
        self.blocks.push(Block::new(code, key));
        let last = self.blocks.len() - 1;
        Ok(&mut self.blocks[last])
    }

    /// Look up a block by code (case-insensitive).
    pub fn block(&self, code: &str) -> Option<&Block> {
        let key = name::normalize(code);
        self.blocks.iter().find(|b| b.key() == key)
    }

    pub fn block_mut(&mut self, code: &str) -> Option<&mut Block> {
        let key = name::normalize(code);
        self.blocks.iter_mut().find(|b| b.key() == key)
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Detach a block from the document.
    pub fn remove_block(&mut self, code: &str) -> Option<Block> {
        let key = name::normalize(code);
        let i = self.blocks.iter().position(|b| b.key() == key)?;
        debug!(block = code, "removed block");
        Some(self.blocks.remove(i))
    }

    /// Remove packet-less loops and empty frames throughout the document.
    pub fn prune(&mut self) -> usize {
        self.blocks.iter_mut().map(Block::prune).sum()
    }

    /// Drive `visitor` over the whole document. See [`visit::walk`].
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<Walked> {
        visit::walk(self, visitor)
    }
}
