//! In-memory CIF document model.
//!
//! A [`Document`] owns its [`Block`]s; a block owns its save [`Frame`]s; both
//! are [`Container`]s of items and [`Loop`]s. Handles into the tree are
//! borrows, so a detached or removed node can never be reached through a
//! stale reference.

pub mod container;
pub mod document;
pub mod iter;
pub mod loops;
pub mod packet;

pub use container::{Block, Container, Frame, LoopMut};
pub use document::Document;
pub use iter::PacketIterator;
pub use loops::{ColumnIter, Loop, PacketRef, Packets};
pub use packet::Packet;
