mod coerce;
mod data;
mod engine;
mod error;
mod registry;
mod shape;
mod temporal;
mod value;

#[cfg(test)]
mod test_support;

/// Scalar coercion helpers for integer literals.
pub use coerce::{parse_int_text, parse_uint_text};
/// Destination tree types.
pub use data::{Data, Entries, Instance, Record};
/// Decoder engine entry points and options.
pub use engine::{DecodeOptions, Decoder, Scope, decode};
/// Error and result aliases.
pub use error::{BoxError, DecodeError, Result};
/// Polymorphic factory registry types.
pub use registry::{Factory, Initializer, InterfaceFactory, Registry};
/// Destination shape descriptors.
pub use shape::{Capability, FieldShape, NamedShape, Shape, StructRef, StructShape, TextDecode};
/// Timestamp and duration literal parsing.
pub use temporal::{DOOMSDAY, GENESIS, parse_duration, parse_timestamp};
/// Generic source value types.
pub use value::{Mapping, Value};
