//! Data containers: the item and loop store shared by blocks and frames.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::name;
use crate::status::{CifError, Result};
use crate::value::Value;

use super::iter::PacketIterator;
use super::loops::{ColumnIter, Loop};
use super::packet::Packet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Scalars,
    User(usize),
}

/// Items and loops of one data block or save frame.
///
/// Single-valued items live in a reserved scalar loop that always holds
/// exactly one packet while it has any items. Item names are unique across
/// the whole container.
#[derive(Debug, Clone)]
pub struct Container {
    code: String,
    key: String,
    scalars: Loop,
    loops: Vec<Loop>,
}

impl Container {
    pub(crate) fn new(code: &str, key: String) -> Self {
        Self {
            code: code.to_string(),
            key,
            scalars: Loop::scalars(),
            loops: Vec::new(),
        }
    }

    /// The code as first written.
    pub fn code(&self) -> &str {
        &self.code
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    fn slot(&self, slot: Slot) -> &Loop {
        match slot {
            Slot::Scalars => &self.scalars,
            Slot::User(i) => &self.loops[i],
        }
    }

    fn slot_mut(&mut self, slot: Slot) -> &mut Loop {
        match slot {
            Slot::Scalars => &mut self.scalars,
            Slot::User(i) => &mut self.loops[i],
        }
    }

    /// Find the loop and column holding item key `key`.
    fn locate(&self, key: &str) -> Option<(Slot, usize)> {
        if let Some(col) = self.scalars.key_index(key) {
            return Some((Slot::Scalars, col));
        }
        self.loops
            .iter()
            .enumerate()
            .find_map(|(i, lp)| lp.key_index(key).map(|col| (Slot::User(i), col)))
    }

    pub fn contains_item(&self, name: &str) -> bool {
        self.locate(&name::normalize(name)).is_some()
    }

    /// `true` if the container has no items and no loops.
    pub fn is_empty(&self) -> bool {
        self.scalars.names().is_empty() && self.loops.is_empty()
    }

    /// Create an empty loop declaring `names`.
    ///
    /// The new loop has no packets until one is added, so
    /// [`prune`](Self::prune) would remove it.
    pub fn create_loop(&mut self, category: Option<&str>, names: &[&str]) -> Result<LoopMut<'_>> {
        if names.is_empty() {
            return Err(CifError::NullLoop);
        }
        if category == Some("") {
            return Err(CifError::ReservedLoop);
        }
        let mut keys: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let key = name::item_name(name)?;
            if keys.contains(&key) || self.locate(&key).is_some() {
                return Err(CifError::DuplicateItemName(name.to_string()));
            }
            keys.push(key);
        }
        self.loops.push(Loop::new(
            category.map(str::to_string),
            names.iter().map(|n| n.to_string()).collect(),
            keys,
        ));
        debug!(
            container = %self.code,
            category = category.unwrap_or(""),
            items = names.len(),
            "created loop"
        );
        let slot = Slot::User(self.loops.len() - 1);
        Ok(LoopMut {
            container: self,
            slot,
        })
    }

    /// The loop containing item `name`; scalar items report the scalar loop.
    pub fn get_loop(&self, name: &str) -> Option<&Loop> {
        self.locate(&name::normalize(name))
            .map(|(slot, _)| self.slot(slot))
    }

    /// Values of item `name` across its loop's packets.
    pub fn column(&self, name: &str) -> Option<ColumnIter<'_>> {
        self.get_loop(name)?.column(name)
    }

    /// Mutable handle on the loop containing item `name`.
    pub fn loop_mut(&mut self, name: &str) -> Option<LoopMut<'_>> {
        let (slot, _) = self.locate(&name::normalize(name))?;
        Some(LoopMut {
            container: self,
            slot,
        })
    }

    /// The unique loop with `category`. The empty category names the scalar loop.
    pub fn category_loop(&self, category: &str) -> Result<Option<&Loop>> {
        if category.is_empty() {
            return Ok(Some(&self.scalars));
        }
        let key = name::normalize(category);
        let mut found = self
            .loops
            .iter()
            .filter(|lp| lp.category().is_some_and(|c| name::normalize(c) == key));
        let first = found.next();
        if found.next().is_some() {
            return Err(CifError::CategoryNotUnique(category.to_string()));
        }
        Ok(first)
    }

    /// User loops in creation order.
    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        self.loops.iter()
    }

    /// Every loop, the scalar loop first when it holds items.
    pub fn all_loops(&self) -> impl Iterator<Item = &Loop> {
        let scalars = (!self.scalars.names().is_empty()).then_some(&self.scalars);
        scalars.into_iter().chain(self.loops.iter())
    }

    /// Scalar items in order of addition.
    pub fn items(&self) -> impl Iterator<Item = (&str, &Value)> {
        let values = if self.scalars.is_empty() {
            &[][..]
        } else {
            self.scalars.row(0)
        };
        self.scalars
            .names()
            .iter()
            .map(String::as_str)
            .zip(values.iter())
    }

    /// Detach the loop containing item `name`.
    pub fn remove_loop(&mut self, name: &str) -> Result<Option<Loop>> {
        match self.locate(&name::normalize(name)) {
            None => Ok(None),
            Some((Slot::Scalars, _)) => Err(CifError::ReservedLoop),
            Some((Slot::User(i), _)) => {
                debug!(container = %self.code, item = name, "removed loop");
                Ok(Some(self.loops.remove(i)))
            }
        }
    }

    /// Value of item `name`.
    ///
    /// `Ok(None)` if the item is absent or its loop has no packets. Fails
    /// with [`CifError::Misuse`] if its loop has more than one packet.
    pub fn value(&self, name: &str) -> Result<Option<&Value>> {
        let Some((slot, col)) = self.locate(&name::normalize(name)) else {
            return Ok(None);
        };
        let lp = self.slot(slot);
        match lp.packet_count() {
            0 => Ok(None),
            1 => Ok(Some(&lp.row(0)[col])),
            n => Err(CifError::Misuse(format!("`{name}` has {n} values"))),
        }
    }

    /// Mutable access to the value of item `name`; same rules as [`value`](Self::value).
    pub fn value_mut(&mut self, name: &str) -> Result<Option<&mut Value>> {
        let Some((slot, col)) = self.locate(&name::normalize(name)) else {
            return Ok(None);
        };
        let lp = self.slot_mut(slot);
        match lp.packet_count() {
            0 => Ok(None),
            1 => Ok(Some(lp.value_mut(0, col))),
            n => Err(CifError::Misuse(format!("`{name}` has {n} values"))),
        }
    }

    /// Set item `name` to a copy of `value`.
    ///
    /// An existing scalar is overwritten; an existing looped item takes the
    /// value in every packet. Otherwise a new scalar item is added.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let key = name::item_name(name)?;
        let value = value.into();
        match self.locate(&key) {
            Some((slot, col)) => {
                let lp = self.slot_mut(slot);
                for row in 0..lp.packet_count() {
                    *lp.value_mut(row, col) = value.clone();
                }
            }
            None => {
                trace!(container = %self.code, item = name, "added scalar item");
                self.scalars.push_column(name.to_string(), key, value);
            }
        }
        Ok(())
    }

    /// Remove item `name` from whichever loop holds it.
    ///
    /// A user loop left without any item names is removed too.
    pub fn remove_item(&mut self, name: &str) -> bool {
        let Some((slot, col)) = self.locate(&name::normalize(name)) else {
            return false;
        };
        self.slot_mut(slot).remove_column(col);
        if let Slot::User(i) = slot {
            if self.loops[i].names().is_empty() {
                self.loops.remove(i);
            }
        }
        debug!(container = %self.code, item = name, "removed item");
        true
    }

    /// Remove every user loop that has no packets. Returns the number removed.
    pub fn prune(&mut self) -> usize {
        let before = self.loops.len();
        self.loops.retain(|lp| !lp.is_empty());
        let removed = before - self.loops.len();
        if removed > 0 {
            debug!(container = %self.code, loops = removed, "pruned empty loops");
        }
        removed
    }
}

/// A mutable handle on one loop of a container.
///
/// Dereferences to the [`Loop`] for read access. Operations that would break
/// the scalar loop's one-packet invariant fail with [`CifError::ReservedLoop`].
pub struct LoopMut<'a> {
    container: &'a mut Container,
    slot: Slot,
}

impl LoopMut<'_> {
    fn user_loop(&mut self) -> Result<&mut Loop> {
        match self.slot {
            Slot::Scalars => Err(CifError::ReservedLoop),
            Slot::User(i) => Ok(&mut self.container.loops[i]),
        }
    }

    /// Add item `name` to the loop, setting it to `value` in every packet.
    pub fn add_item(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        if self.slot == Slot::Scalars {
            return Err(CifError::ReservedLoop);
        }
        let key = name::item_name(name)?;
        if self.container.locate(&key).is_some() {
            return Err(CifError::DuplicateItemName(name.to_string()));
        }
        let value = value.into();
        self.user_loop()?.push_column(name.to_string(), key, value);
        Ok(())
    }

    /// Append a copy of `packet`, whose names must match the loop's exactly.
    pub fn add_packet(&mut self, packet: &Packet) -> Result<()> {
        if packet.is_empty() {
            return Err(CifError::InvalidPacket("packet has no items".into()));
        }
        let lp = self.user_loop()?;
        for (i, key) in packet.keys().iter().enumerate() {
            if lp.key_index(key).is_none() {
                return Err(CifError::WrongLoop(packet.names()[i].clone()));
            }
        }
        if packet.len() < lp.names().len() {
            let missing = lp
                .keys()
                .iter()
                .position(|k| packet.key_position(k).is_none())
                .map(|i| lp.names()[i].clone())
                .unwrap_or_default();
            return Err(CifError::PartialPacket(missing));
        }
        let row = lp
            .keys()
            .iter()
            .map(|key| {
                packet
                    .key_position(key)
                    .map(|i| packet.value_at(i).clone())
                    .unwrap_or_default()
            })
            .collect();
        lp.push_row(row);
        trace!(packets = lp.packet_count(), "appended packet");
        Ok(())
    }

    /// Change the loop's category. The empty category is reserved.
    pub fn set_category(&mut self, category: Option<&str>) -> Result<()> {
        if category == Some("") {
            return Err(CifError::ReservedLoop);
        }
        self.user_loop()?.set_category(category.map(str::to_string));
        Ok(())
    }

    /// Begin a transactional pass over the loop's packets.
    pub fn packet_iter(&mut self) -> Result<PacketIterator<'_>> {
        Ok(PacketIterator::new(self.user_loop()?))
    }

    /// Detach the loop from its container.
    pub fn destroy(self) -> Result<Loop> {
        match self.slot {
            Slot::Scalars => Err(CifError::ReservedLoop),
            Slot::User(i) => {
                debug!(container = %self.container.code, "destroyed loop");
                Ok(self.container.loops.remove(i))
            }
        }
    }
}

impl Deref for LoopMut<'_> {
    type Target = Loop;

    fn deref(&self) -> &Loop {
        self.container.slot(self.slot)
    }
}

/// A save frame.
#[derive(Debug, Clone)]
pub struct Frame {
    container: Container,
}

impl Frame {
    pub(crate) fn new(code: &str, key: String) -> Self {
        Self {
            container: Container::new(code, key),
        }
    }
}

impl Deref for Frame {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}

/// A data block: a container that may also hold save frames.
#[derive(Debug, Clone)]
pub struct Block {
    container: Container,
    frames: Vec<Frame>,
}

impl Block {
    pub(crate) fn new(code: &str, key: String) -> Self {
        Self {
            container: Container::new(code, key),
            frames: Vec::new(),
        }
    }

    /// Add an empty save frame.
    pub fn create_frame(&mut self, code: &str) -> Result<&mut Frame> {
        let key = name::frame_code(code)?;
        if self.frames.iter().any(|f| f.key() == key) {
            return Err(CifError::DuplicateFrameCode(code.to_string()));
        }
        debug!(block = %self.code(), frame = code, "created frame");
        self.frames.push(Frame::new(code, key));
        let last = self.frames.len() - 1;
        Ok(&mut self.frames[last])
    }

    pub fn frame(&self, code: &str) -> Option<&Frame> {
        let key = name::normalize(code);
        self.frames.iter().find(|f| f.key() == key)
    }

    pub fn frame_mut(&mut self, code: &str) -> Option<&mut Frame> {
        let key = name::normalize(code);
        self.frames.iter_mut().find(|f| f.key() == key)
    }

    /// Frames in creation order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    pub fn remove_frame(&mut self, code: &str) -> Option<Frame> {
        let key = name::normalize(code);
        let i = self.frames.iter().position(|f| f.key() == key)?;
        debug!(block = %self.code(), frame = code, "removed frame");
        Some(self.frames.remove(i))
    }

    /// Remove packet-less loops here and in every frame, then frames left
    /// empty. Returns the number of loops and frames removed.
    pub fn prune(&mut self) -> usize {
        let mut removed = self.container.prune();
        for frame in &mut self.frames {
            removed += frame.prune();
        }
        let before = self.frames.len();
        self.frames.retain(|f| !f.is_empty());
        removed + before - self.frames.len()
    }
}

impl Deref for Block {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl DerefMut for Block {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}
