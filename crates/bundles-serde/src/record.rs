#![forbid(unsafe_code)]

//! Wire records.
//!
//! A serialized bundle is a JSON array of entries:
//!
//! ```json
//! [
//!   {"property": {"kind": "type_safe", "name": "score", "valueType": "i32",
//!                 "permission": "bundles_core::permission::Public"},
//!    "value": 5},
//!   {"property": {"kind": "simple", "name": "title",
//!                 "permission": "bundles_core::permission::Public"},
//!    "valueType": "alloc::string::String",
//!    "value": "hello"}
//! ]
//! ```
//!
//! `valueType` on the entry is only written for simple properties; a
//! type-safe property already names its value type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized property descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyRecord {
    TypeSafe {
        name: String,
        #[serde(rename = "valueType")]
        value_type: String,
        permission: String,
    },
    Simple {
        name: String,
        permission: String,
    },
}

impl PropertyRecord {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::TypeSafe { name, .. } | Self::Simple { name, .. } => name,
        }
    }

    #[must_use]
    pub fn permission(&self) -> &str {
        match self {
            Self::TypeSafe { permission, .. } | Self::Simple { permission, .. } => permission,
        }
    }
}

/// One serialized `(property, value)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub property: PropertyRecord,
    #[serde(rename = "valueType", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    pub value: Value,
}

/// A serialized bundle: its entries in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleRecord {
    pub entries: Vec<EntryRecord>,
}
