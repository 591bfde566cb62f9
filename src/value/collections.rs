//! CIF 2.0 aggregate values: lists and tables.

use crate::name;
use crate::status::{CifError, Result};

use super::Value;

/// An ordered sequence of independently owned values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct List {
    elements: Vec<Value>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.elements.get_mut(index)
    }

    /// Replace the element at `index`.
    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let slot = self
            .elements
            .get_mut(index)
            .ok_or(CifError::NoSuchItem(index))?;
        *slot = value;
        Ok(())
    }

    /// Insert before `index`; `index == len()` appends.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<()> {
        if index > self.elements.len() {
            return Err(CifError::NoSuchItem(index));
        }
        self.elements.insert(index, value);
        Ok(())
    }

    pub fn push(&mut self, value: Value) {
        self.elements.push(value);
    }

    /// Remove and discard the element at `index`. Returns `false` if absent.
    pub fn remove(&mut self, index: usize) -> bool {
        self.take(index).is_some()
    }

    /// Remove the element at `index`, handing ownership to the caller.
    pub fn take(&mut self, index: usize) -> Option<Value> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.elements.iter()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    norm: String,
    value: Value,
}

/// A mapping from string keys to independently owned values.
///
/// Keys are unique under normalization and case folding. Entries keep
/// insertion order; overwriting an entry keeps its original key and position.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<Entry>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        let norm = name::normalize(key);
        self.entries.iter().position(|e| e.norm == norm)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.position(key).map(|i| &mut self.entries[i].value)
    }

    /// Set `key` to `value`, overwriting any existing entry.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let norm = name::table_key(key)?;
        match self.entries.iter_mut().find(|e| e.norm == norm) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Entry {
                key: key.to_string(),
                norm,
                value,
            }),
        }
        Ok(())
    }

    /// Remove and discard the entry for `key`. Returns `false` if absent.
    pub fn remove(&mut self, key: &str) -> bool {
        self.take(key).is_some()
    }

    /// Remove the entry for `key`, handing ownership of its value to the caller.
    pub fn take(&mut self, key: &str) -> Option<Value> {
        let i = self.position(key)?;
        Some(self.entries.remove(i).value)
    }

    /// Keys as first inserted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|e| (e.key.as_str(), &e.value))
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|e| {
                other
                    .entries
                    .iter()
                    .find(|o| o.norm == e.norm)
                    .is_some_and(|o| o.value == e.value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_index_operations() {
        let mut list: List = [Value::from("a"), Value::from("b")].into_iter().collect();
        list.insert(1, Value::Unknown).unwrap();
        list.insert(3, Value::Inapplicable).unwrap();
        assert_eq!(list.len(), 4);
        assert_eq!(list.get(1), Some(&Value::Unknown));

        assert!(matches!(list.insert(9, Value::Unknown), Err(CifError::NoSuchItem(9))));
        assert!(matches!(list.set(4, Value::Unknown), Err(CifError::NoSuchItem(4))));

        list.set(0, Value::from("z")).unwrap();
        assert_eq!(list.take(0), Some(Value::from("z")));
        assert!(list.remove(0));
        assert!(!list.remove(5));
        assert_eq!(list.take(5), None);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn table_overwrites_on_duplicate_set() {
        let mut table = Table::new();
        table.set("Key", Value::from("one")).unwrap();
        table.set("KEY", Value::from("two")).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.keys().collect::<Vec<_>>(), vec!["Key"]);
        assert_eq!(table.get("key"), Some(&Value::from("two")));
    }

    #[test]
    fn table_take_and_remove() {
        let mut table = Table::new();
        table.set("a", Value::Unknown).unwrap();
        table.set("b", Value::Inapplicable).unwrap();
        assert_eq!(table.take("A"), Some(Value::Unknown));
        assert!(table.remove("b"));
        assert!(!table.remove("b"));
        assert!(table.is_empty());
    }

    #[test]
    fn table_rejects_control_keys() {
        let mut table = Table::new();
        assert!(matches!(
            table.set("a\u{1}", Value::Unknown),
            Err(CifError::InvalidIndex(_))
        ));
    }

    #[test]
    fn table_equality_ignores_order() {
        let mut a = Table::new();
        a.set("x", Value::from("1")).unwrap();
        a.set("y", Value::from("2")).unwrap();
        let mut b = Table::new();
        b.set("Y", Value::from("2")).unwrap();
        b.set("X", Value::from("1")).unwrap();
        assert_eq!(a, b);
        b.set("x", Value::from("3")).unwrap();
        assert_ne!(a, b);
    }
}
