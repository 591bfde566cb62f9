//! The CIF value model.
//!
//! A [`Value`] is one of six kinds: string, number, list, table, the
//! inapplicable marker `.`, or the unknown marker `?`. Owned values are plain
//! `Value`s; values inside documents, lists, tables, and packets are reached
//! through `&Value` / `&mut Value` borrows of their owner's slot.

pub mod collections;
pub mod number;

use std::fmt;

use crate::status::{CifError, Result};

pub use collections::{List, Table};
pub use number::Number;

/// The kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    List,
    Table,
    Inapplicable,
    Unknown,
}

/// How a value was (or should be) delimited in text. Never affects equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Quoting {
    #[default]
    Unquoted,
    Quoted,
}

/// A CIF data value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Character data and its quoting style.
    Str(String, Quoting),
    /// A number with standard uncertainty.
    Number(Number),
    List(List),
    Table(Table),
    /// The inapplicable marker `.`.
    Inapplicable,
    /// The unknown marker `?`.
    Unknown,
}

impl Value {
    /// A fresh value of `kind` with that kind's default content.
    pub fn new(kind: ValueKind) -> Self {
        match kind {
            ValueKind::String => Value::Str(String::new(), Quoting::Unquoted),
            ValueKind::Number => Value::Number(Number::default()),
            ValueKind::List => Value::List(List::new()),
            ValueKind::Table => Value::Table(Table::new()),
            ValueKind::Inapplicable => Value::Inapplicable,
            ValueKind::Unknown => Value::Unknown,
        }
    }

    /// An unquoted string value.
    pub fn text(s: impl Into<String>) -> Self {
        Value::Str(s.into(), Quoting::Unquoted)
    }

    /// A number rendered at an explicit decimal scale.
    pub fn number(value: f64, su: f64, scale: i32, max_leading_zeroes: u32) -> Result<Self> {
        Number::with_scale(value, su, scale, max_leading_zeroes).map(Value::Number)
    }

    /// A number whose precision follows from its uncertainty and `rounding_rule`.
    pub fn number_auto(value: f64, su: f64, rounding_rule: u32) -> Result<Self> {
        Number::auto(value, su, rounding_rule, number::DEFAULT_MAX_LEADING_ZEROES)
            .map(Value::Number)
    }

    /// A list holding copies of `items`.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// A table holding copies of `entries`. Later duplicates overwrite earlier ones.
    pub fn table<'a, I, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<Value>,
    {
        let mut table = Table::new();
        for (key, value) in entries {
            table.set(key, value.into())?;
        }
        Ok(Value::Table(table))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Str(..) => ValueKind::String,
            Value::Number(_) => ValueKind::Number,
            Value::List(_) => ValueKind::List,
            Value::Table(_) => ValueKind::Table,
            Value::Inapplicable => ValueKind::Inapplicable,
            Value::Unknown => ValueKind::Unknown,
        }
    }

    pub fn quoting(&self) -> Quoting {
        match self {
            Value::Str(_, quoting) => *quoting,
            _ => Quoting::Unquoted,
        }
    }

    /// Change the quoting style.
    ///
    /// Quoting a number, `.`, or `?` turns it into a string holding its text,
    /// since a quoted `?` is data rather than the unknown marker. Lists and
    /// tables have no quoting.
    pub fn set_quoting(&mut self, quoting: Quoting) -> Result<()> {
        match self {
            Value::Str(_, q) => *q = quoting,
            Value::List(_) | Value::Table(_) => {
                return Err(CifError::Argument(format!(
                    "{:?} values cannot be quoted",
                    self.kind()
                )))
            }
            _ if quoting == Quoting::Unquoted => {}
            Value::Number(n) => *self = Value::Str(n.text().to_string(), Quoting::Quoted),
            Value::Inapplicable => *self = Value::Str(".".into(), Quoting::Quoted),
            Value::Unknown => *self = Value::Str("?".into(), Quoting::Quoted),
        }
        Ok(())
    }

    /// Reset this value to the default content of `kind`, dropping whatever it held.
    pub fn reinitialize(&mut self, kind: ValueKind) {
        *self = Value::new(kind);
    }

    /// Overwrite `target` with a deep copy of this value.
    pub fn clone_onto(&self, target: &mut Value) {
        target.clone_from(self);
    }

    /// Reset to the unknown marker. Idempotent.
    pub fn clean(&mut self) {
        *self = Value::Unknown;
    }

    /// Returns the string content, or `None` for anything but a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s, _) => Some(s),
            _ => None,
        }
    }

    /// Text form of a scalar: string content or rendered number.
    pub fn to_text(&self) -> Option<&str> {
        match self {
            Value::Str(s, _) => Some(s),
            Value::Number(n) => Some(n.text()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Numeric value. Strings are read with CIF number syntax, so `50.123(4)`
    /// yields `50.123`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.value()),
            Value::Str(s, _) => s.parse::<Number>().ok().map(|n| n.value()),
            _ => None,
        }
    }

    /// Standard uncertainty of a number.
    pub fn su(&self) -> Option<f64> {
        self.as_number().map(Number::su)
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Element count of a list or table.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::List(l) => Some(l.len()),
            Value::Table(t) => Some(t.len()),
            _ => None,
        }
    }

    /// Keys of a table.
    pub fn keys(&self) -> Option<Vec<&str>> {
        self.as_table().map(|t| t.keys().collect())
    }

    /// Returns `true` unless this is `.` or `?`.
    pub fn is_present(&self) -> bool {
        !matches!(self, Value::Inapplicable | Value::Unknown)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Unknown
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a, _), Value::Str(b, _)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a == b,
            (Value::Inapplicable, Value::Inapplicable) => true,
            (Value::Unknown, Value::Unknown) => true,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::text(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<List> for Value {
    fn from(l: List) -> Self {
        Value::List(l)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s, _) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::List(l) => {
                f.write_str("[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Table(t) => {
                f.write_str("{")?;
                for (i, (k, v)) in t.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k:?}:{v}")?;
                }
                f.write_str("}")
            }
            Value::Inapplicable => f.write_str("."),
            Value::Unknown => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_per_kind() {
        assert_eq!(Value::new(ValueKind::String), Value::text(""));
        assert_eq!(Value::new(ValueKind::Number).as_f64(), Some(0.0));
        assert_eq!(Value::new(ValueKind::Number).su(), Some(0.0));
        assert_eq!(Value::new(ValueKind::List).len(), Some(0));
        assert_eq!(Value::new(ValueKind::Table).len(), Some(0));
        assert_eq!(Value::new(ValueKind::Inapplicable).kind(), ValueKind::Inapplicable);
        assert_eq!(Value::default().kind(), ValueKind::Unknown);
    }

    #[test]
    fn clean_is_idempotent() {
        let mut v = Value::list(["a", "b"]);
        v.clean();
        assert_eq!(v, Value::Unknown);
        v.clean();
        assert_eq!(v, Value::Unknown);
    }

    #[test]
    fn reinitialize_replaces_content() {
        let mut v = Value::table([("k", "v")]).unwrap();
        v.reinitialize(ValueKind::List);
        assert_eq!(v.kind(), ValueKind::List);
        assert_eq!(v.len(), Some(0));
    }

    #[test]
    fn clones_are_independent() {
        let original = Value::list(["a"]);
        let mut copy = original.clone();
        copy.as_list_mut().unwrap().push(Value::Unknown);
        assert_eq!(original.len(), Some(1));
        assert_eq!(copy.len(), Some(2));

        let mut target = Value::text("old");
        original.clone_onto(&mut target);
        assert_eq!(target, original);
    }

    #[test]
    fn quoting_does_not_affect_equality() {
        let mut v = Value::text("abc");
        v.set_quoting(Quoting::Quoted).unwrap();
        assert_eq!(v.quoting(), Quoting::Quoted);
        assert_eq!(v, Value::text("abc"));
    }

    #[test]
    fn quoting_a_marker_makes_it_text() {
        let mut v = Value::Unknown;
        v.set_quoting(Quoting::Quoted).unwrap();
        assert_eq!(v.as_str(), Some("?"));

        let mut n = Value::number_auto(1.5, 0.0, 19).unwrap();
        n.set_quoting(Quoting::Unquoted).unwrap();
        assert_eq!(n.kind(), ValueKind::Number);
        n.set_quoting(Quoting::Quoted).unwrap();
        assert_eq!(n, Value::text("1.5"));

        let mut list = Value::list(Vec::<Value>::new());
        assert!(matches!(list.set_quoting(Quoting::Quoted), Err(CifError::Argument(_))));
    }

    #[test]
    fn table_keys_and_lookup() {
        let v = Value::table([
            ("_foo", Value::number_auto(0.05, 0.0, 19).unwrap()),
            ("_bar", Value::text("lorem ipsum")),
        ])
        .unwrap();
        let mut keys = v.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["_bar", "_foo"]);
        let table = v.as_table().unwrap();
        assert_eq!(table.get("_foo").and_then(Value::as_f64), Some(0.05));
        assert_eq!(table.get("_bar").and_then(Value::as_str), Some("lorem ipsum"));
    }

    #[test]
    fn value_parsing() {
        assert_eq!(Value::text("3.14").as_f64(), Some(3.14));
        assert_eq!(Value::text("50.123(4)").as_f64(), Some(50.123));
        assert_eq!(Value::Inapplicable.as_f64(), None);
        assert_eq!(Value::Unknown.as_str(), None);
        assert!(!Value::Unknown.is_present());
        assert!(Value::text("").is_present());
    }

    #[test]
    fn nested_display() {
        let v = Value::list([
            Value::text("a"),
            Value::table([("k", Value::Unknown)]).unwrap(),
            Value::Inapplicable,
        ]);
        assert_eq!(v.to_string(), r#"["a" {"k":?} .]"#);
    }
}
