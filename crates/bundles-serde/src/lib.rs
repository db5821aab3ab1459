#![forbid(unsafe_code)]

//! JSON serialization for bundles.
//!
//! ```
//! use bundles_core::{Property, PropertyRegistry};
//! use bundles_runtime::Bundle;
//! use bundles_serde::{BundleSerializer, TypeCodecs};
//!
//! let registry = PropertyRegistry::new();
//! let codecs = TypeCodecs::with_std();
//! let score: Property<i32> = registry.register_with_default("score", 0).unwrap();
//!
//! let bundle = Bundle::build(|b| {
//!     b.set(&score, 42);
//! });
//! let serializer = BundleSerializer::new(&registry, &codecs);
//! let json = serializer.to_json_string(&bundle).unwrap();
//! let back = serializer.from_json_str(&json).unwrap();
//! assert_eq!(back.get(&score).unwrap(), 42);
//! ```

pub mod codec;
pub mod error;
pub mod record;
pub mod serializer;

pub use codec::{TypeCodecs, ValueCodec};
pub use error::SerializeError;
pub use record::{BundleRecord, EntryRecord, PropertyRecord};
pub use serializer::BundleSerializer;
