//! In-memory CIF document model with a handler-driven traversal engine.
//!
//! - [`dom`]: documents, data blocks, save frames, loops, and packets.
//! - [`value`]: strings, numbers with uncertainty, lists, tables, `.` and `?`.
//! - [`visit`]: depth-first traversal steered by [`Visitor`] callbacks.
//! - [`parse`] / [`write`]: CIF 2.0 text reading and writing.
//!
//! ```ignore
//! let mut doc = cifkit::Document::new();
//! let block = doc.create_block("example")?;
//! block.set_value("_cell.length_a", cifkit::NumberFormat::default().number(5.4307, 0.0002)?)?;
//! let mut lp = block.create_loop(Some("atom_site"), &["_atom_site.label", "_atom_site.x"])?;
//! lp.add_packet(&cifkit::Packet::from_items([
//!     ("_atom_site.label", cifkit::Value::from("Si1")),
//!     ("_atom_site.x", cifkit::Value::number_auto(0.125, 0.0, 19)?),
//! ])?)?;
//! let text = cifkit::write(&doc)?;
//! let back = cifkit::parse(&text)?;
//! ```

pub mod config;
pub mod dom;
pub mod name;
pub mod parse;
pub mod status;
pub mod value;
pub mod visit;
pub mod write;

pub use config::{Config, ConfigError, NumberFormat, ParseOptions, WriteOptions};
pub use dom::{
    Block, Container, Document, Frame, Loop, LoopMut, Packet, PacketIterator, PacketRef,
};
pub use parse::{parse, parse_with};
pub use status::{CifError, ClientError, Result, Status, SyntaxCode};
pub use value::{List, Number, Quoting, Table, Value, ValueKind};
pub use visit::{walk, HandlerResult, Traverse, Visitor, Walked};
pub use write::{write, write_with};
