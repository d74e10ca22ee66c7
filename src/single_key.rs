//! Objects with exactly one dynamic key.
//!
//! Some backend payloads are keyed dictionaries of the form
//! `{"<id>": {...}}`, where the key itself is data. [`SingleKeyEntry`] reads
//! and writes that shape.

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A key/value pair serialized as a one-property JSON object.
///
/// Decoding is strict: an empty object or an object with more than one
/// property is rejected.
///
/// # Examples
///
/// ```
/// use netspec::SingleKeyEntry;
///
/// let entry: SingleKeyEntry<u32> = serde_json::from_str(r#"{"a":5}"#).unwrap();
/// assert_eq!(entry.key, "a");
/// assert_eq!(entry.value, 5);
///
/// assert_eq!(serde_json::to_string(&entry).unwrap(), r#"{"a":5}"#);
///
/// assert!(serde_json::from_str::<SingleKeyEntry<u32>>("{}").is_err());
/// assert!(serde_json::from_str::<SingleKeyEntry<u32>>(r#"{"a":1,"b":2}"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingleKeyEntry<V> {
    /// The single property name.
    pub key: String,
    /// The value stored under `key`.
    pub value: V,
}

impl<V> SingleKeyEntry<V> {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, value: V) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Splits the entry into its key and value.
    pub fn into_parts(self) -> (String, V) {
        (self.key, self.value)
    }
}

impl<V: Serialize> Serialize for SingleKeyEntry<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.key, &self.value)?;
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for SingleKeyEntry<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SingleKeyVisitor(PhantomData))
    }
}

struct SingleKeyVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for SingleKeyVisitor<V> {
    type Value = SingleKeyEntry<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with exactly one property")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let (key, value) = map
            .next_entry::<String, V>()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        if map.next_key::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(2, &self));
        }
        Ok(SingleKeyEntry { key, value })
    }
}
