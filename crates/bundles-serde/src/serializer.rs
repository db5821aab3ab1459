#![forbid(unsafe_code)]

//! Bundle ↔ record conversion.
//!
//! # Encoding
//!
//! Each entry becomes an [`EntryRecord`]. A type-safe property is written
//! with its declared value type and its value is encoded with that type's
//! codec. A simple property declares nothing, so the entry additionally
//! carries the runtime type name of the value.
//!
//! # Decoding
//!
//! 1. Resolve the permission name through the registry.
//! 2. Resolve the property without touching the registry: a type-safe record
//!    that disagrees with a local registration fails with
//!    `ConflictingPropertyDefinition`; a simple record is rebuilt as is.
//! 3. Pick the value type (declared, else the entry's `valueType`) and decode
//!    the value with its codec.
//! 4. Once every entry has decoded, intern the type-safe properties through
//!    [`PropertyRegistry::register_erased`]. A failing bundle registers
//!    nothing.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Error |
//! |---------|-------|-------|
//! | No codec for a value type | Type not registered in [`TypeCodecs`] | `UnknownType` |
//! | Unknown permission name | Permission never registered locally | `UnknownType` |
//! | Signature clash | Local registration differs from a type-safe record | `ConflictingPropertyDefinition` |
//! | Stored value of the wrong type | Written while type safety was off | `TypeMismatch` |
//! | Simple entry without `valueType` | Hand-edited or foreign data | `MissingValueType` |
//! | Malformed JSON / value shape | Bad input | `Json` |
//!
//! Defaults are not serialized. Decoded type-safe properties carry the
//! default of the local registration; decoded simple properties carry none.

use bundles_core::{
    BundleError, ErasedProperty, PropertyRegistry, PropertySignature, TypeTag,
};
use bundles_runtime::{Bundle, BundleEntry};
use tracing::debug;

use crate::codec::{TypeCodecs, ValueCodec};
use crate::error::SerializeError;
use crate::record::{BundleRecord, EntryRecord, PropertyRecord};

/// Encodes and decodes bundles against a registry and a codec table.
#[derive(Debug, Clone, Copy)]
pub struct BundleSerializer<'a> {
    registry: &'a PropertyRegistry,
    codecs: &'a TypeCodecs,
}

impl<'a> BundleSerializer<'a> {
    #[must_use]
    pub fn new(registry: &'a PropertyRegistry, codecs: &'a TypeCodecs) -> Self {
        Self { registry, codecs }
    }

    pub fn encode(&self, bundle: &Bundle) -> Result<BundleRecord, SerializeError> {
        let entries = bundle
            .entries()
            .map(|entry| self.encode_entry(entry))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(bundle = %bundle.id(), entries = entries.len(), "bundle encoded");
        Ok(BundleRecord { entries })
    }

    pub fn encode_entry(&self, entry: &BundleEntry) -> Result<EntryRecord, SerializeError> {
        let property = entry.property();
        let value = entry.value();
        let name = property.name().to_owned();
        let permission = property.permission().name().to_owned();

        let (record, value_type, tag) = match property.value_type() {
            Some(declared) => (
                PropertyRecord::TypeSafe {
                    name,
                    value_type: declared.name().to_owned(),
                    permission,
                },
                None,
                declared,
            ),
            None => {
                let runtime = value.type_tag();
                (
                    PropertyRecord::Simple { name, permission },
                    Some(runtime.name().to_owned()),
                    runtime,
                )
            }
        };

        let encoded = self
            .codec_for_tag(tag)?
            .encode(value)
            .ok_or_else(|| BundleError::TypeMismatch {
                property: property.name().to_owned(),
                expected: tag,
                found: value.type_tag(),
            })??;
        Ok(EntryRecord {
            property: record,
            value_type,
            value: encoded,
        })
    }

    pub fn decode(&self, record: BundleRecord) -> Result<Bundle, SerializeError> {
        let decoded = record
            .entries
            .into_iter()
            .map(|entry| self.decode_unregistered(entry))
            .collect::<Result<Vec<_>, _>>()?;
        let entries = decoded
            .into_iter()
            .map(|entry| self.intern(entry))
            .collect::<Result<Vec<_>, _>>()?;
        let count = entries.len();
        let bundle = Bundle::from_entries(entries);
        debug!(bundle = %bundle.id(), entries = count, "bundle decoded");
        Ok(bundle)
    }

    pub fn decode_entry(&self, record: EntryRecord) -> Result<BundleEntry, SerializeError> {
        self.intern(self.decode_unregistered(record)?)
    }

    /// Rebuild a property from its record without registering it.
    ///
    /// Type-safe records resolve to the local registration when there is one
    /// (and so carry its default); unseen names resolve to a fresh descriptor
    /// that [`decode`](Self::decode) interns later. Simple records are never
    /// checked against the registry.
    pub fn resolve_property(
        &self,
        record: &PropertyRecord,
    ) -> Result<ErasedProperty, SerializeError> {
        let permission = self
            .registry
            .permission_kind(record.permission())
            .ok_or_else(|| BundleError::UnknownType {
                tag: record.permission().to_owned(),
            })?;

        match record {
            PropertyRecord::TypeSafe {
                name, value_type, ..
            } => {
                let tag = self.codec_for_name(value_type)?.tag();
                let signature = PropertySignature::new(name.clone(), Some(tag), permission);
                match self.registry.lookup(name) {
                    Some(existing) if existing.signature() == &signature => Ok(existing),
                    Some(existing) => Err(BundleError::ConflictingPropertyDefinition {
                        existing: existing.signature().clone(),
                        attempted: signature,
                    }
                    .into()),
                    None => Ok(ErasedProperty::new(signature, None)),
                }
            }
            PropertyRecord::Simple { name, .. } => Ok(ErasedProperty::new(
                PropertySignature::new(name.clone(), None, permission),
                None,
            )),
        }
    }

    fn decode_unregistered(&self, record: EntryRecord) -> Result<BundleEntry, SerializeError> {
        let property = self.resolve_property(&record.property)?;
        let codec = match property.value_type() {
            Some(declared) => self.codec_for_tag(declared)?,
            None => {
                let name = record.value_type.as_deref().ok_or_else(|| {
                    SerializeError::MissingValueType {
                        property: property.name().to_owned(),
                    }
                })?;
                self.codec_for_name(name)?
            }
        };
        let value = codec.decode(record.value)?;
        Ok(BundleEntry::from_parts(property, value))
    }

    fn intern(&self, entry: BundleEntry) -> Result<BundleEntry, SerializeError> {
        if !entry.property().is_type_safe() {
            return Ok(entry);
        }
        let (property, value) = entry.into_parts();
        let property = self
            .registry
            .register_erased(property.signature().clone(), None)?;
        Ok(BundleEntry::from_parts(property, value))
    }

    pub fn to_json_value(&self, bundle: &Bundle) -> Result<serde_json::Value, SerializeError> {
        Ok(serde_json::to_value(self.encode(bundle)?)?)
    }

    pub fn to_json_string(&self, bundle: &Bundle) -> Result<String, SerializeError> {
        Ok(serde_json::to_string(&self.encode(bundle)?)?)
    }

    pub fn to_json_string_pretty(&self, bundle: &Bundle) -> Result<String, SerializeError> {
        Ok(serde_json::to_string_pretty(&self.encode(bundle)?)?)
    }

    pub fn from_json_value(&self, value: serde_json::Value) -> Result<Bundle, SerializeError> {
        self.decode(serde_json::from_value(value)?)
    }

    pub fn from_json_str(&self, json: &str) -> Result<Bundle, SerializeError> {
        self.decode(serde_json::from_str(json)?)
    }

    fn codec_for_tag(&self, tag: TypeTag) -> Result<&'a ValueCodec, BundleError> {
        self.codecs
            .by_tag(tag)
            .ok_or_else(|| BundleError::UnknownType {
                tag: tag.name().to_owned(),
            })
    }

    fn codec_for_name(&self, name: &str) -> Result<&'a ValueCodec, BundleError> {
        self.codecs
            .by_name(name)
            .ok_or_else(|| BundleError::UnknownType {
                tag: name.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bundles_core::{Permission, Property, Public};
    use serde_json::json;

    struct Admin;
    impl Permission for Admin {}

    fn fixture() -> (PropertyRegistry, TypeCodecs) {
        (PropertyRegistry::new(), TypeCodecs::with_std())
    }

    #[test]
    fn type_safe_entry_omits_value_type() {
        let (registry, codecs) = fixture();
        let score: Property<i32> = registry.register_with_default("score", 0).unwrap();
        let bundle = Bundle::build(|b| {
            b.set(&score, 5);
        });
        let json = BundleSerializer::new(&registry, &codecs)
            .to_json_value(&bundle)
            .unwrap();
        assert_eq!(
            json,
            json!([{
                "property": {
                    "kind": "type_safe",
                    "name": "score",
                    "valueType": "i32",
                    "permission": Public.kind().name(),
                },
                "value": 5
            }])
        );
    }

    #[test]
    fn simple_entry_carries_runtime_type() {
        let (registry, codecs) = fixture();
        let title: Property<String> = Property::simple("title");
        let bundle = Bundle::build(|b| {
            b.set(&title, "hi".to_string());
        });
        let record = BundleSerializer::new(&registry, &codecs)
            .encode(&bundle)
            .unwrap();
        let entry = &record.entries[0];
        assert!(matches!(entry.property, PropertyRecord::Simple { .. }));
        assert_eq!(entry.value_type.as_deref(), Some("alloc::string::String"));
        assert_eq!(entry.value, json!("hi"));
    }

    #[test]
    fn unregistered_value_type_fails_to_encode() {
        #[derive(Debug, Clone, PartialEq)]
        struct Opaque;

        let (registry, codecs) = fixture();
        let p: Property<Opaque> = Property::simple("opaque");
        let bundle = Bundle::build(|b| {
            b.set(&p, Opaque);
        });
        let err = BundleSerializer::new(&registry, &codecs)
            .encode(&bundle)
            .unwrap_err();
        assert!(matches!(
            err,
            SerializeError::Bundle(BundleError::UnknownType { .. })
        ));
    }

    #[test]
    fn decode_resolves_registered_permission() {
        let (registry, codecs) = fixture();
        let guarded: Property<u8, Admin> = registry.register("guarded").unwrap();
        let bundle = Bundle::build(|b| {
            b.set(&guarded, 3);
        });
        let serializer = BundleSerializer::new(&registry, &codecs);
        let decoded = serializer
            .from_json_str(&serializer.to_json_string(&bundle).unwrap())
            .unwrap();
        assert_eq!(decoded.get(&guarded).unwrap(), 3);
    }

    #[test]
    fn unknown_permission_is_unknown_type() {
        let (registry, codecs) = fixture();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {"kind": "simple", "name": "x", "permission": "nowhere::Nobody"},
                "valueType": "i32",
                "value": 1
            }]))
            .unwrap_err();
        match err {
            SerializeError::Bundle(BundleError::UnknownType { tag }) => {
                assert_eq!(tag, "nowhere::Nobody");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_value_type_is_unknown_type() {
        let (registry, codecs) = fixture();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {"kind": "simple", "name": "x", "permission": Public.kind().name()},
                "valueType": "my_app::Missing",
                "value": {}
            }]))
            .unwrap_err();
        assert!(matches!(
            err,
            SerializeError::Bundle(BundleError::UnknownType { .. })
        ));
    }

    #[test]
    fn simple_record_without_value_type() {
        let (registry, codecs) = fixture();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {"kind": "simple", "name": "x", "permission": Public.kind().name()},
                "value": 1
            }]))
            .unwrap_err();
        assert!(matches!(err, SerializeError::MissingValueType { .. }));
    }

    #[test]
    fn conflicting_local_registration_is_reported() {
        let (registry, codecs) = fixture();
        let _: Property<bool> = registry.register("score").unwrap();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {
                    "kind": "type_safe",
                    "name": "score",
                    "valueType": "i32",
                    "permission": Public.kind().name(),
                },
                "value": 1
            }]))
            .unwrap_err();
        assert!(matches!(
            err,
            SerializeError::Bundle(BundleError::ConflictingPropertyDefinition { .. })
        ));
    }

    #[test]
    fn decoding_interns_type_safe_properties() {
        let (registry, codecs) = fixture();
        assert!(!registry.contains("fresh"));
        let decoded = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {
                    "kind": "type_safe",
                    "name": "fresh",
                    "valueType": "u64",
                    "permission": Public.kind().name(),
                },
                "value": 12
            }]))
            .unwrap();
        let fresh: Property<u64> = registry.lookup_typed("fresh").unwrap().unwrap();
        assert_eq!(decoded.get(&fresh).unwrap(), 12);
    }

    #[test]
    fn simple_property_sharing_a_registered_name_round_trips() {
        let (registry, codecs) = fixture();
        let registered: Property<String> = registry.register("title").unwrap();
        let alias: Property<String> = Property::simple("title");
        let bundle = Bundle::build(|b| {
            b.set(&alias, "draft".to_string());
        });

        let serializer = BundleSerializer::new(&registry, &codecs);
        let decoded = serializer
            .from_json_str(&serializer.to_json_string(&bundle).unwrap())
            .unwrap();
        assert_eq!(decoded.get(&alias).unwrap(), "draft");
        assert_eq!(decoded.get(&registered).unwrap(), "draft");
        assert!(!decoded.entries().next().unwrap().property().is_type_safe());
    }

    #[test]
    fn failed_decode_registers_nothing() {
        let (registry, codecs) = fixture();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([
                {
                    "property": {
                        "kind": "type_safe",
                        "name": "claimed",
                        "valueType": "i32",
                        "permission": Public.kind().name(),
                    },
                    "value": 1
                },
                {
                    "property": {"kind": "simple", "name": "x", "permission": Public.kind().name()},
                    "valueType": "nope::T",
                    "value": null
                }
            ]))
            .unwrap_err();
        assert!(matches!(
            err,
            SerializeError::Bundle(BundleError::UnknownType { .. })
        ));
        assert!(!registry.contains("claimed"));
        let _: Property<bool> = registry.register("claimed").unwrap();
    }

    #[test]
    fn decode_entry_interns_on_success() {
        let (registry, codecs) = fixture();
        let entry = BundleSerializer::new(&registry, &codecs)
            .decode_entry(
                serde_json::from_value(json!({
                    "property": {
                        "kind": "type_safe",
                        "name": "single",
                        "valueType": "bool",
                        "permission": Public.kind().name(),
                    },
                    "value": true
                }))
                .unwrap(),
            )
            .unwrap();
        assert_eq!(entry.value_as::<bool>(), Some(&true));
        assert_eq!(registry.lookup("single").as_ref(), Some(entry.property()));
    }

    #[test]
    fn malformed_value_is_json_error() {
        let (registry, codecs) = fixture();
        let err = BundleSerializer::new(&registry, &codecs)
            .from_json_value(json!([{
                "property": {"kind": "simple", "name": "x", "permission": Public.kind().name()},
                "valueType": "bool",
                "value": "yes"
            }]))
            .unwrap_err();
        assert!(matches!(err, SerializeError::Json(_)));
    }
}
