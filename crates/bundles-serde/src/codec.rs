#![forbid(unsafe_code)]

//! Value codecs keyed by type tag.
//!
//! Values are stored type-erased, so the serializer needs a way back from a
//! [`TypeTag`] (when encoding) or a type name (when decoding) to concrete
//! serde code. [`TypeCodecs`] is that table: one [`ValueCodec`] per
//! registered type, holding monomorphized encode/decode functions.
//!
//! # Invariants
//!
//! 1. A codec only encodes values of its own type; other values are reported
//!    as a type mismatch, never coerced.
//! 2. Name lookups use the fully qualified type name, so a tag written by one
//!    process resolves in another built from the same sources.

use std::collections::HashMap;
use std::fmt;

use bundles_core::{ErasedValue, PropertyValue, TypeTag};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

type EncodeFn = fn(&ErasedValue) -> Option<Result<Value, serde_json::Error>>;
type DecodeFn = fn(Value) -> Result<ErasedValue, serde_json::Error>;

fn encode_as<T: Serialize + 'static>(
    value: &ErasedValue,
) -> Option<Result<Value, serde_json::Error>> {
    value.downcast_ref::<T>().map(serde_json::to_value)
}

fn decode_as<T: PropertyValue + DeserializeOwned>(
    value: Value,
) -> Result<ErasedValue, serde_json::Error> {
    serde_json::from_value::<T>(value).map(ErasedValue::new)
}

/// Serde bridge for one value type.
#[derive(Clone, Copy)]
pub struct ValueCodec {
    tag: TypeTag,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl ValueCodec {
    #[must_use]
    pub fn of<T: PropertyValue + Serialize + DeserializeOwned>() -> Self {
        Self {
            tag: TypeTag::of::<T>(),
            encode: encode_as::<T>,
            decode: decode_as::<T>,
        }
    }

    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Encode `value`; `None` if it is not of this codec's type.
    #[must_use]
    pub fn encode(&self, value: &ErasedValue) -> Option<Result<Value, serde_json::Error>> {
        (self.encode)(value)
    }

    pub fn decode(&self, value: Value) -> Result<ErasedValue, serde_json::Error> {
        (self.decode)(value)
    }
}

impl fmt::Debug for ValueCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueCodec").field(&self.tag).finish()
    }
}

/// Table of value codecs, looked up by tag or by type name.
#[derive(Debug, Clone, Default)]
pub struct TypeCodecs {
    by_name: HashMap<&'static str, ValueCodec>,
    by_tag: HashMap<TypeTag, ValueCodec>,
}

impl TypeCodecs {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Codecs for `bool`, `char`, the integer and float primitives, `String`
    /// and `Vec<String>`.
    #[must_use]
    pub fn with_std() -> Self {
        let mut codecs = Self::new();
        codecs
            .register::<bool>()
            .register::<char>()
            .register::<i8>()
            .register::<i16>()
            .register::<i32>()
            .register::<i64>()
            .register::<isize>()
            .register::<u8>()
            .register::<u16>()
            .register::<u32>()
            .register::<u64>()
            .register::<usize>()
            .register::<f32>()
            .register::<f64>()
            .register::<String>()
            .register::<Vec<String>>();
        codecs
    }

    /// Add (or replace) the codec for `T`.
    pub fn register<T: PropertyValue + Serialize + DeserializeOwned>(&mut self) -> &mut Self {
        let codec = ValueCodec::of::<T>();
        self.by_name.insert(codec.tag.name(), codec);
        self.by_tag.insert(codec.tag, codec);
        self
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with<T: PropertyValue + Serialize + DeserializeOwned>(mut self) -> Self {
        self.register::<T>();
        self
    }

    #[must_use]
    pub fn by_tag(&self, tag: TypeTag) -> Option<&ValueCodec> {
        self.by_tag.get(&tag)
    }

    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ValueCodec> {
        self.by_name.get(name)
    }

    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.by_tag.contains_key(&TypeTag::of::<T>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}
