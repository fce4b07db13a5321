//! Response shapes shared by every entity.
//!
//! # Design
//! Entity records themselves live in `entities`; this module holds the
//! envelopes around them. List endpoints answer either with a bare JSON
//! array or with an `items` envelope, and `Page` accepts both so callers
//! never branch on the server's mood.

use serde::{Deserialize, Deserializer, Serialize};

/// One page of a list or search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Page<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire<T> {
            Bare(Vec<T>),
            Envelope {
                #[serde(alias = "Items")]
                items: Vec<T>,
                #[serde(default, alias = "Count")]
                count: Option<u64>,
                #[serde(default, alias = "Next")]
                next: Option<String>,
            },
        }

        Ok(match Wire::<T>::deserialize(deserializer)? {
            Wire::Bare(items) => Page {
                items,
                count: None,
                next: None,
            },
            Wire::Envelope { items, count, next } => Page { items, count, next },
        })
    }
}

/// A key/value pair; many action endpoints answer with a list of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Case-insensitive lookup in a parameter list.
pub fn find_parameter<'a>(params: &'a [Parameter], key: &str) -> Option<&'a serde_json::Value> {
    params
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(key))
        .map(|p| &p.value)
}

/// Column metadata returned by `dbcolumns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DbColumn {
    pub name: String,
    #[serde(default, rename = "Type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

/// Answer of `checktrack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackStatus {
    #[serde(rename = "Tracked")]
    pub tracked: bool,
}
