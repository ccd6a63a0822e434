// src/portal/models.rs

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value scraped from the case study page: present, or explicitly
/// unavailable because the expected page structure was absent.
///
/// `Unavailable` serializes as JSON `null` so consumers can tell a missing
/// structure apart from a present-but-empty one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageField<T> {
    Present(T),
    Unavailable,
}

impl<T> PageField<T> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PageField::Unavailable)
    }
}

impl<T: Serialize> Serialize for PageField<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageField::Present(value) => value.serialize(serializer),
            PageField::Unavailable => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PageField<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<T>::deserialize(deserializer)?;
        Ok(value.map_or(PageField::Unavailable, PageField::Present))
    }
}

/// The key/value pairs of the page's impact-metadata definition list
/// (`dt` texts zipped against `dd` texts), in document order.
///
/// Serializes as a JSON object; document order is preserved both ways.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub pairs: Vec<(String, String)>,
}

impl Serialize for PageMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.pairs.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for PageMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = PageMetadata;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of metadata keys to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    pairs.push(entry);
                }
                Ok(PageMetadata { pairs })
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}
