//! Loops: named columns with row-major packet storage.

use crate::name;
use crate::value::Value;

use super::packet::Packet;

/// A looped data table: declared item names plus packets, stored row-major.
#[derive(Debug, Clone)]
pub struct Loop {
    category: Option<String>,
    /// Declared item names, as first written.
    names: Vec<String>,
    /// Normalized forms of `names`, same order.
    keys: Vec<String>,
    /// Row-major flat array of values. Length = `names.len() * packet_count()`.
    values: Vec<Value>,
    reserved: bool,
}

impl Loop {
    pub(crate) fn new(category: Option<String>, names: Vec<String>, keys: Vec<String>) -> Self {
        Self {
            category,
            names,
            keys,
            values: Vec::new(),
            reserved: false,
        }
    }

    /// The loop holding a container's single-valued items.
    pub(crate) fn scalars() -> Self {
        Self {
            category: Some(String::new()),
            names: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
            reserved: true,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Declared item names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `true` for the container's scalar item loop.
    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    /// Number of packets (rows) in this loop.
    pub fn packet_count(&self) -> usize {
        if self.names.is_empty() {
            0
        } else {
            self.values.len() / self.names.len()
        }
    }

    /// `true` if the loop has no packets.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Find the column index for a name (normalized, case-insensitive).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.key_index(&name::normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Read-only view of packet `index`.
    pub fn packet(&self, index: usize) -> Option<PacketRef<'_>> {
        (index < self.packet_count()).then(|| PacketRef {
            names: &self.names,
            keys: &self.keys,
            values: self.row(index),
        })
    }

    /// Iterate over packets as read-only views.
    pub fn packets(&self) -> Packets<'_> {
        Packets { lp: self, row: 0 }
    }

    /// Values of item `name` in packet order.
    pub fn column(&self, name: &str) -> Option<ColumnIter<'_>> {
        let col = self.column_index(name)?;
        Some(ColumnIter {
            rows: self.values.chunks_exact(self.names.len()),
            col,
        })
    }

    // --- crate-internal storage operations ---

    pub(crate) fn keys(&self) -> &[String] {
        &self.keys
    }

    pub(crate) fn key_index(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }

    pub(crate) fn set_category(&mut self, category: Option<String>) {
        self.category = category;
    }

    pub(crate) fn row(&self, index: usize) -> &[Value] {
        let stride = self.names.len();
        &self.values[index * stride..(index + 1) * stride]
    }

    pub(crate) fn value_mut(&mut self, row: usize, col: usize) -> &mut Value {
        let stride = self.names.len();
        &mut self.values[row * stride + col]
    }

    /// Append a column, filling existing packets with copies of `fill`.
    ///
    /// The scalar loop always holds exactly one packet, so its first column
    /// creates that packet.
    pub(crate) fn push_column(&mut self, name: String, key: String, fill: Value) {
        let rows = self.packet_count();
        let stride = self.names.len();
        self.names.push(name);
        self.keys.push(key);
        if self.reserved && rows == 0 {
            self.values.push(fill);
            return;
        }
        let mut values = Vec::with_capacity(rows * (stride + 1));
        let mut old = std::mem::take(&mut self.values).into_iter();
        for _ in 0..rows {
            values.extend(old.by_ref().take(stride));
            values.push(fill.clone());
        }
        self.values = values;
    }

    /// Remove column `col` from the schema and from every packet.
    pub(crate) fn remove_column(&mut self, col: usize) {
        let stride = self.names.len();
        self.names.remove(col);
        self.keys.remove(col);
        let old = std::mem::take(&mut self.values);
        self.values = old
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % stride != col)
            .map(|(_, v)| v)
            .collect();
    }

    /// Append a packet whose values are already in column order.
    pub(crate) fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.names.len());
        self.values.extend(row);
    }

    pub(crate) fn replace_row(&mut self, index: usize, row: Vec<Value>) {
        let stride = self.names.len();
        for (slot, value) in self.values[index * stride..(index + 1) * stride]
            .iter_mut()
            .zip(row)
        {
            *slot = value;
        }
    }

    pub(crate) fn remove_row(&mut self, index: usize) {
        let stride = self.names.len();
        self.values.drain(index * stride..(index + 1) * stride);
    }
}

/// A borrowed packet: one row of a [`Loop`].
#[derive(Debug, Clone, Copy)]
pub struct PacketRef<'a> {
    names: &'a [String],
    keys: &'a [String],
    values: &'a [Value],
}

impl<'a> PacketRef<'a> {
    pub fn names(&self) -> &'a [String] {
        self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of item `name` in this packet.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let key = name::normalize(name);
        self.keys
            .iter()
            .position(|k| *k == key)
            .map(|i| &self.values[i])
    }

    /// `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// An owned copy of this packet.
    pub fn to_packet(&self) -> Packet {
        Packet::from_parts(self.names.to_vec(), self.keys.to_vec(), self.values.to_vec())
    }
}

/// Iterator over a loop's packets.
pub struct Packets<'a> {
    lp: &'a Loop,
    row: usize,
}

impl<'a> Iterator for Packets<'a> {
    type Item = PacketRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let packet = self.lp.packet(self.row)?;
        self.row += 1;
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.lp.packet_count() - self.row;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Packets<'_> {}

/// Values of one item, one per packet.
pub struct ColumnIter<'a> {
    rows: std::slice::ChunksExact<'a, Value>,
    col: usize,
}

impl<'a> Iterator for ColumnIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(|row| &row[self.col])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for ColumnIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Loop {
        let names: Vec<String> = ["_a", "_B", "_c"].iter().map(|s| s.to_string()).collect();
        let keys = names.iter().map(|n| name::normalize(n)).collect();
        Loop::new(Some("cat".into()), names, keys)
    }

    fn row(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn rows_and_columns() {
        let mut lp = abc();
        lp.push_row(row(&["1", "2", "3"]));
        lp.push_row(row(&["4", "5", "6"]));
        assert_eq!(lp.packet_count(), 2);
        assert_eq!(lp.column_index("_b"), Some(1));

        let col: Vec<_> = lp.column("_C").unwrap().collect();
        assert_eq!(col, vec![&Value::from("3"), &Value::from("6")]);

        let p = lp.packet(1).unwrap();
        assert_eq!(p.get("_a"), Some(&Value::from("4")));
        assert!(lp.packet(2).is_none());
        assert_eq!(lp.packets().len(), 2);
    }

    #[test]
    fn column_follows_row_edits() {
        let mut lp = abc();
        assert_eq!(lp.column("_a").unwrap().len(), 0);
        lp.push_row(row(&["1", "2", "3"]));
        lp.push_row(row(&["4", "5", "6"]));
        lp.push_row(row(&["7", "8", "9"]));
        lp.remove_row(1);
        let col: Vec<_> = lp.column("_b").unwrap().collect();
        assert_eq!(col, vec![&Value::from("2"), &Value::from("8")]);
        assert!(lp.column("_zz").is_none());
    }

    #[test]
    fn push_column_backfills() {
        let mut lp = abc();
        lp.push_row(row(&["1", "2", "3"]));
        lp.push_row(row(&["4", "5", "6"]));
        lp.push_column("_d".into(), "_d".into(), Value::Inapplicable);
        assert_eq!(lp.names().len(), 4);
        assert_eq!(lp.packet_count(), 2);
        assert_eq!(lp.row(0)[3], Value::Inapplicable);
        assert_eq!(lp.row(1)[0], Value::from("4"));
        assert_eq!(lp.packet(1).unwrap().get("_d"), Some(&Value::Inapplicable));
        assert_eq!(lp.packet(1).unwrap().get("_c"), Some(&Value::from("6")));
    }

    #[test]
    fn remove_column_and_rows() {
        let mut lp = abc();
        lp.push_row(row(&["1", "2", "3"]));
        lp.push_row(row(&["4", "5", "6"]));
        lp.remove_column(1);
        assert_eq!(lp.names(), &["_a".to_string(), "_c".to_string()]);
        assert_eq!(lp.row(1), &row(&["4", "6"])[..]);
        lp.remove_row(0);
        assert_eq!(lp.packet_count(), 1);
        assert_eq!(lp.row(0), &row(&["4", "6"])[..]);
    }

    #[test]
    fn scalar_loop_holds_one_packet() {
        let mut lp = Loop::scalars();
        assert!(lp.is_reserved());
        assert_eq!(lp.packet_count(), 0);
        lp.push_column("_x".into(), "_x".into(), Value::from("1"));
        lp.push_column("_y".into(), "_y".into(), Value::from("2"));
        assert_eq!(lp.packet_count(), 1);
        assert_eq!(lp.row(0), &row(&["1", "2"])[..]);
        lp.remove_column(0);
        lp.remove_column(0);
        assert_eq!(lp.packet_count(), 0);
        assert!(lp.is_empty());
    }
}
