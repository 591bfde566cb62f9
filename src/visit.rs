//! Handler-driven depth-first traversal of a [`Document`].
//!
//! A [`Visitor`] gets a start and an end callback for every node:
//!
//! ```text
//! document
//! └─ block
//!    ├─ frame ─ loop ─ packet ─ item
//!    └─ loop ─ packet ─ item ─ item (list elements, table entries)
//! ```
//!
//! Each callback returns a [`Traverse`] code steering the walk. Frames are
//! visited before a block's loops, and a container's scalar items (as the
//! reserved loop holding one packet) before its user loops.
//!
//! ```ignore
//! struct CountItems(usize);
//!
//! impl Visitor for CountItems {
//!     fn item_start(&mut self, _: Option<&str>, _: &Value) -> HandlerResult {
//!         self.0 += 1;
//!         Ok(Traverse::Persist)
//!     }
//! }
//!
//! let mut counter = CountItems(0);
//! doc.walk(&mut counter)?;
//! ```

use tracing::debug;

use crate::dom::{Block, Container, Document, Frame, Loop, PacketRef};
use crate::status::{CifError, ClientError, Result};
use crate::value::Value;

/// What the walk should do after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traverse {
    /// Continue into children, then siblings.
    #[default]
    Persist,
    /// Skip this node's children. Its end handler still runs.
    Skip,
    /// Skip this node's children and its remaining siblings; resume at the parent.
    SkipSiblings,
    /// Stop the whole walk without calling any further handlers.
    End,
}

/// A handler's verdict, or a fault that aborts the walk.
pub type HandlerResult = std::result::Result<Traverse, ClientError>;

/// How a walk finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walked {
    /// Every scheduled node was visited.
    Completed,
    /// A handler returned [`Traverse::End`].
    Ended,
}

/// Callbacks for [`walk`]. Every method defaults to [`Traverse::Persist`].
#[allow(unused_variables)]
pub trait Visitor {
    fn document_start(&mut self, doc: &Document) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn document_end(&mut self, doc: &Document) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn block_start(&mut self, block: &Block) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn block_end(&mut self, block: &Block) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn frame_start(&mut self, frame: &Frame) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn frame_end(&mut self, frame: &Frame) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn loop_start(&mut self, lp: &Loop) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn loop_end(&mut self, lp: &Loop) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn packet_start(&mut self, packet: PacketRef<'_>) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn packet_end(&mut self, packet: PacketRef<'_>) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    /// `name` is the item name, the table key for table entries, or `None`
    /// for list elements.
    fn item_start(&mut self, name: Option<&str>, value: &Value) -> HandlerResult {
        Ok(Traverse::Persist)
    }
    fn item_end(&mut self, name: Option<&str>, value: &Value) -> HandlerResult {
        Ok(Traverse::Persist)
    }
}

/// Why the walk is unwinding.
enum Unwind {
    End,
    Fault(ClientError),
}

type Flow<T = ()> = std::result::Result<T, Unwind>;

#[derive(PartialEq, Eq)]
enum Siblings {
    Continue,
    Stop,
}

fn control(result: HandlerResult) -> Flow<Traverse> {
    match result {
        Ok(Traverse::End) => Err(Unwind::End),
        Ok(code) => Ok(code),
        Err(fault) => Err(Unwind::Fault(fault)),
    }
}

/// Run one node: start handler, children if it persisted, then end handler.
fn visit_node<V: Visitor + ?Sized>(
    v: &mut V,
    start: impl FnOnce(&mut V) -> HandlerResult,
    children: impl FnOnce(&mut V) -> Flow,
    end: impl FnOnce(&mut V) -> HandlerResult,
) -> Flow<Siblings> {
    let first = control(start(v))?;
    if first == Traverse::Persist {
        children(v)?;
    }
    let last = control(end(v))?;
    if first == Traverse::SkipSiblings || last == Traverse::SkipSiblings {
        Ok(Siblings::Stop)
    } else {
        Ok(Siblings::Continue)
    }
}

/// Drive `visitor` over `doc` depth-first.
///
/// Returns [`Walked::Ended`] if a handler asked to stop, and
/// [`CifError::Client`] if a handler faulted.
pub fn walk<V: Visitor + ?Sized>(doc: &Document, visitor: &mut V) -> Result<Walked> {
    let outcome = visit_node(
        visitor,
        |v| v.document_start(doc),
        |v| {
            for block in doc.blocks() {
                if walk_block(v, block)? == Siblings::Stop {
                    break;
                }
            }
            Ok(())
        },
        |v| v.document_end(doc),
    );
    match outcome {
        Ok(_) => {
            debug!(blocks = doc.len(), "walk completed");
            Ok(Walked::Completed)
        }
        Err(Unwind::End) => {
            debug!("walk ended by handler");
            Ok(Walked::Ended)
        }
        Err(Unwind::Fault(fault)) => {
            debug!(error = %fault, "walk aborted by handler fault");
            Err(CifError::Client(fault))
        }
    }
}

fn walk_block<V: Visitor + ?Sized>(v: &mut V, block: &Block) -> Flow<Siblings> {
    visit_node(
        v,
        |v| v.block_start(block),
        |v| {
            for frame in block.frames() {
                if walk_frame(v, frame)? == Siblings::Stop {
                    return Ok(());
                }
            }
            walk_loops(v, block)
        },
        |v| v.block_end(block),
    )
}

fn walk_frame<V: Visitor + ?Sized>(v: &mut V, frame: &Frame) -> Flow<Siblings> {
    visit_node(
        v,
        |v| v.frame_start(frame),
        |v| walk_loops(v, frame),
        |v| v.frame_end(frame),
    )
}

fn walk_loops<V: Visitor + ?Sized>(v: &mut V, container: &Container) -> Flow {
    for lp in container.all_loops() {
        let next = visit_node(
            v,
            |v| v.loop_start(lp),
            |v| {
                for packet in lp.packets() {
                    if walk_packet(v, packet)? == Siblings::Stop {
                        break;
                    }
                }
                Ok(())
            },
            |v| v.loop_end(lp),
        )?;
        if next == Siblings::Stop {
            break;
        }
    }
    Ok(())
}

fn walk_packet<V: Visitor + ?Sized>(v: &mut V, packet: PacketRef<'_>) -> Flow<Siblings> {
    visit_node(
        v,
        |v| v.packet_start(packet),
        |v| {
            for (name, value) in packet.iter() {
                if walk_item(v, Some(name), value)? == Siblings::Stop {
                    break;
                }
            }
            Ok(())
        },
        |v| v.packet_end(packet),
    )
}

fn walk_item<V: Visitor + ?Sized>(v: &mut V, name: Option<&str>, value: &Value) -> Flow<Siblings> {
    visit_node(
        v,
        |v| v.item_start(name, value),
        |v| {
            match value {
                Value::List(list) => {
                    for element in list {
                        if walk_item(v, None, element)? == Siblings::Stop {
                            break;
                        }
                    }
                }
                Value::Table(table) => {
                    for (key, entry) in table.iter() {
                        if walk_item(v, Some(key), entry)? == Siblings::Stop {
                            break;
                        }
                    }
                }
                _ => {}
            }
            Ok(())
        },
        |v| v.item_end(name, value),
    )
}
