//! Transactional packet iteration over a user loop.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::status::{CifError, Result};
use crate::value::Value;

use super::loops::Loop;
use super::packet::Packet;

/// Walks a loop's packets in order, staging updates and removals.
///
/// Staged changes reach the loop only through [`close`](Self::close).
/// [`abort`](Self::abort), or simply dropping the iterator, discards them.
/// The loop stays mutably borrowed while the iterator is alive, so no other
/// access can observe a half-applied state.
pub struct PacketIterator<'a> {
    lp: &'a mut Loop,
    next_row: usize,
    current: Option<usize>,
    removed: BTreeSet<usize>,
    updated: BTreeMap<usize, Vec<Value>>,
}

impl<'a> PacketIterator<'a> {
    pub(crate) fn new(lp: &'a mut Loop) -> Self {
        Self {
            lp,
            next_row: 0,
            current: None,
            removed: BTreeSet::new(),
            updated: BTreeMap::new(),
        }
    }

    fn current_row(&self) -> Result<usize> {
        match self.current {
            None => Err(CifError::Misuse("no current packet".into())),
            Some(row) if self.removed.contains(&row) => {
                Err(CifError::Misuse("current packet was already removed".into()))
            }
            Some(row) => Ok(row),
        }
    }

    /// Stage removal of the most recently returned packet.
    pub fn remove(&mut self) -> Result<()> {
        let row = self.current_row()?;
        self.updated.remove(&row);
        self.removed.insert(row);
        Ok(())
    }

    /// Stage new values for the most recently returned packet.
    ///
    /// Items not named in `packet` keep their values. Every name in `packet`
    /// must belong to the loop.
    pub fn update(&mut self, packet: &Packet) -> Result<()> {
        let row = self.current_row()?;
        let mut columns = Vec::with_capacity(packet.len());
        for (i, key) in packet.keys().iter().enumerate() {
            let col = self
                .lp
                .key_index(key)
                .ok_or_else(|| CifError::WrongLoop(packet.names()[i].clone()))?;
            columns.push((col, i));
        }
        let staged = self
            .updated
            .entry(row)
            .or_insert_with(|| self.lp.row(row).to_vec());
        for (col, i) in columns {
            staged[col] = packet.value_at(i).clone();
        }
        Ok(())
    }

    /// Apply staged changes to the loop.
    pub fn close(self) -> Result<()> {
        let updates = self.updated.len();
        let removals = self.removed.len();
        for (row, values) in self.updated {
            self.lp.replace_row(row, values);
        }
        for &row in self.removed.iter().rev() {
            self.lp.remove_row(row);
        }
        debug!(updates, removals, "committed packet iteration");
        Ok(())
    }

    /// Discard staged changes.
    pub fn abort(self) {
        debug!(
            updates = self.updated.len(),
            removals = self.removed.len(),
            "aborted packet iteration"
        );
    }
}

impl Iterator for PacketIterator<'_> {
    type Item = Packet;

    fn next(&mut self) -> Option<Packet> {
        let packet = self.lp.packet(self.next_row)?.to_packet();
        self.current = Some(self.next_row);
        self.next_row += 1;
        Some(packet)
    }
}
