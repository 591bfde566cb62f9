//! Detached packets: name-to-value maps used to add or update loop rows.

use crate::name;
use crate::status::Result;
use crate::value::Value;

/// A free-standing packet. Names are unique under normalization; every name
/// holds a value (unknown `?` until set).
#[derive(Debug, Clone, Default)]
pub struct Packet {
    names: Vec<String>,
    keys: Vec<String>,
    values: Vec<Value>,
}

impl Packet {
    /// A packet for `names`, each set to the unknown value.
    pub fn new(names: &[&str]) -> Result<Self> {
        let mut packet = Self::default();
        for name in names {
            packet.set(name, Value::Unknown)?;
        }
        Ok(packet)
    }

    /// A packet holding copies of `items`. Later duplicates overwrite earlier ones.
    pub fn from_items<'a, I, V>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Into<Value>,
    {
        let mut packet = Self::default();
        for (name, value) in items {
            packet.set(name, value)?;
        }
        Ok(packet)
    }

    pub(crate) fn from_parts(names: Vec<String>, keys: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            names,
            keys,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.key_position(&name::normalize(name))
    }

    pub(crate) fn key_position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.position(name).map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.position(name).map(|i| &mut self.values[i])
    }

    /// Set item `name`, adding it to the packet if absent.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let key = name::item_name(name)?;
        let value = value.into();
        match self.key_position(&key) {
            Some(i) => self.values[i] = value,
            None => {
                self.names.push(name.to_string());
                self.keys.push(key);
                self.values.push(value);
            }
        }
        Ok(())
    }

    /// Remove item `name`, handing its value to the caller.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let i = self.position(name)?;
        self.names.remove(i);
        self.keys.remove(i);
        Some(self.values.remove(i))
    }

    /// Remove and discard item `name`. Returns `false` if absent.
    pub fn remove(&mut self, name: &str) -> bool {
        self.take(name).is_some()
    }

    /// `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }

    pub(crate) fn value_at(&self, index: usize) -> &Value {
        &self.values[index]
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.keys.iter().zip(&self.values).all(|(key, value)| {
                other
                    .key_position(key)
                    .is_some_and(|i| other.values[i] == *value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::CifError;

    #[test]
    fn new_packet_is_unknown() {
        let p = Packet::new(&["_a", "_b"]).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.get("_A"), Some(&Value::Unknown));
    }

    #[test]
    fn set_adds_or_overwrites() {
        let mut p = Packet::default();
        p.set("_Name", "x").unwrap();
        p.set("_name", "y").unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.names(), &["_Name".to_string()]);
        assert_eq!(p.get("_NAME"), Some(&Value::from("y")));
        assert!(matches!(p.set("bad", "z"), Err(CifError::InvalidItemName(_))));
    }

    #[test]
    fn take_removes_name() {
        let mut p = Packet::from_items([("_a", "1"), ("_b", "2")]).unwrap();
        assert_eq!(p.take("_a"), Some(Value::from("1")));
        assert!(!p.contains("_a"));
        assert!(!p.remove("_a"));
        assert!(p.remove("_b"));
        assert!(p.is_empty());
    }

    #[test]
    fn equality_is_by_map() {
        let a = Packet::from_items([("_a", "1"), ("_b", "2")]).unwrap();
        let b = Packet::from_items([("_B", "2"), ("_A", "1")]).unwrap();
        assert_eq!(a, b);
        let c = Packet::from_items([("_a", "1")]).unwrap();
        assert_ne!(a, c);
    }
}
