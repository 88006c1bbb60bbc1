//! Ordered label → count tables.
//!
//! The server emits counts as JSON objects. Panels rank entries with ties
//! broken by the server's iteration order, so the table keeps insertion
//! order instead of sorting keys.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Label → count pairs in server iteration order, labels unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    entries: Vec<(String, u64)>,
}

impl CountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a label. An existing label keeps its position.
    pub fn insert(&mut self, label: &str, count: u64) {
        match self.entries.iter_mut().find(|(l, _)| l == label) {
            Some(entry) => entry.1 = count,
            None => self.entries.push((label.to_string(), count)),
        }
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| *c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }
}

impl<'a> FromIterator<(&'a str, u64)> for CountTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut table = CountTable::new();
        for (label, count) in iter {
            table.insert(label, count);
        }
        table
    }
}

impl Serialize for CountTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, count) in &self.entries {
            map.serialize_entry(label, count)?;
        }
        map.end()
    }
}

struct CountTableVisitor;

impl<'de> Visitor<'de> for CountTableVisitor {
    type Value = CountTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of label to non-negative count")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut table = CountTable::new();
        while let Some((label, count)) = access.next_entry::<String, Option<f64>>()? {
            // Counts occasionally arrive as floats or null; negatives are clamped.
            let count = count.unwrap_or(0.0);
            let count = if count.is_finite() && count > 0.0 {
                count as u64
            } else {
                0
            };
            table.insert(&label, count);
        }
        Ok(table)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E> {
        Ok(CountTable::new())
    }
}

impl<'de> Deserialize<'de> for CountTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CountTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_server_order() {
        let table: CountTable =
            serde_json::from_str(r#"{"Persistence": 3, "Execution": 9, "Discovery": 9}"#).unwrap();
        let labels: Vec<&str> = table.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Persistence", "Execution", "Discovery"]);
        assert_eq!(table.total(), 21);
    }

    #[test]
    fn test_duplicate_label_keeps_first_position() {
        let mut table = CountTable::new();
        table.insert("HIGH", 1);
        table.insert("LOW", 2);
        table.insert("HIGH", 7);
        assert_eq!(table.entries(), &[("HIGH".to_string(), 7), ("LOW".to_string(), 2)]);
    }

    #[test]
    fn test_null_and_float_counts() {
        let table: CountTable = serde_json::from_str("null").unwrap();
        assert!(table.is_empty());

        let table: CountTable = serde_json::from_str(r#"{"a": 2.0, "b": -4, "c": null}"#).unwrap();
        assert_eq!(table.get("a"), Some(2));
        assert_eq!(table.get("b"), Some(0));
        assert_eq!(table.get("c"), Some(0));
    }

    #[test]
    fn test_serialize_round_trip_order() {
        let table: CountTable = [("z", 1), ("a", 2)].into_iter().collect();
        assert_eq!(serde_json::to_string(&table).unwrap(), r#"{"z":1,"a":2}"#);
    }
}
