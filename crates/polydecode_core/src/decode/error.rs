use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Boxed error returned by user-supplied hooks and initializers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while decoding a generic value into a shaped destination.
#[derive(Debug, Error)]
pub enum DecodeError {
	/// Source value kind cannot be coerced into the destination shape.
	#[error("expected {expected} but found {found}")]
	BadType {
		/// Accepted source kinds.
		expected: &'static str,
		/// Observed source kind.
		found: String,
	},
	/// Fixed-size destination length differs from source length.
	#[error("array length mismatch: {found} vs. {expected}")]
	LengthMismatch {
		/// Destination array length.
		expected: usize,
		/// Source sequence length.
		found: usize,
	},
	/// Destination shape has no decoding rule.
	#[error("unsupported kind: {kind}")]
	UnsupportedKind {
		/// Shape kind label.
		kind: &'static str,
	},
	/// String is not a boolean literal.
	#[error("invalid bool text: {text}")]
	InvalidBool {
		/// Offending text.
		text: String,
	},
	/// String is not an integer literal for the selected base.
	#[error("invalid integer text {text:?}: {source}")]
	InvalidInt {
		/// Offending text.
		text: String,
		/// Underlying parse failure.
		source: ParseIntError,
	},
	/// String is not a float literal.
	#[error("invalid float text {text:?}: {source}")]
	InvalidFloat {
		/// Offending text.
		text: String,
		/// Underlying parse failure.
		source: ParseFloatError,
	},
	/// No timestamp layout accepted the text.
	#[error("unknown time layout: {text}")]
	UnknownTimeLayout {
		/// Offending text.
		text: String,
	},
	/// Text is neither a duration sentinel nor a valid duration literal.
	#[error("invalid duration: {text}")]
	InvalidDuration {
		/// Offending text.
		text: String,
	},
	/// Source mapping lacks a usable discriminator.
	#[error("missing type key: key={key:?}")]
	MissingDiscriminator {
		/// Discriminator key the factory reads.
		key: String,
	},
	/// Discriminator names neither a registered type nor a registered instance.
	#[error("unknown type {name:?} for {capability}")]
	UnknownType {
		/// Capability the factory serves.
		capability: String,
		/// Discriminator value.
		name: String,
	},
	/// No factory is registered for the destination capability.
	#[error("unregistered type: {capability:?}")]
	UnregisteredType {
		/// Capability identity that was looked up.
		capability: String,
	},
	/// Post-construction initializer rejected a new instance.
	#[error("initialize {type_name} fail: {source}")]
	InitializerFailure {
		/// Concrete type name of the rejected instance.
		type_name: String,
		/// Initializer error.
		source: BoxError,
	},
	/// Text hook rejected its input.
	#[error("decode {type_name} from text fail: {source}")]
	TextHook {
		/// Type exposing the hook.
		type_name: String,
		/// Hook error.
		source: BoxError,
	},
	/// Pointer destination reached without an allocated pointee.
	#[error("nil pointer destination")]
	NilPointer,
	/// Decoder recursion depth exceeded the configured bound.
	#[error("decode depth exceeded (max={max_depth})")]
	DepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Factory registration collided with an existing capability entry.
	#[error("factory already registered for {capability}")]
	DuplicateFactory {
		/// Capability identity of the existing entry.
		capability: String,
	},
	/// Struct reference was never bound or its target was dropped.
	#[error("unresolved struct reference: {name}")]
	UnresolvedStruct {
		/// Referenced type name.
		name: String,
	},
	/// Failure inside a named struct field.
	#[error("field {name}: {source}")]
	Field {
		/// Field name.
		name: String,
		/// Nested failure.
		source: Box<DecodeError>,
	},
	/// Failure at a sequence or array position.
	#[error("index [{index}]: {source}")]
	Index {
		/// Element position.
		index: usize,
		/// Nested failure.
		source: Box<DecodeError>,
	},
	/// Failure decoding a mapping key.
	#[error("map index [{key}] key: {source}")]
	MapKey {
		/// Source key text.
		key: String,
		/// Nested failure.
		source: Box<DecodeError>,
	},
	/// Failure decoding a mapping value.
	#[error("map index [{key}] value: {source}")]
	MapValue {
		/// Source key text.
		key: String,
		/// Nested failure.
		source: Box<DecodeError>,
	},
	/// Failure populating an instance manufactured by a factory.
	#[error("create {name}: {source}")]
	Create {
		/// Discriminator value that selected the type.
		name: String,
		/// Nested failure.
		source: Box<DecodeError>,
	},
}

impl DecodeError {
	pub(crate) fn bad_type(expected: &'static str, found: impl Into<String>) -> Self {
		Self::BadType {
			expected,
			found: found.into(),
		}
	}

	pub(crate) fn in_field(self, name: &str) -> Self {
		Self::Field {
			name: name.to_owned(),
			source: Box::new(self),
		}
	}

	pub(crate) fn at_index(self, index: usize) -> Self {
		Self::Index {
			index,
			source: Box::new(self),
		}
	}

	/// Strip positional context and return the innermost failure.
	pub fn root_cause(&self) -> &DecodeError {
		match self {
			Self::Field { source, .. } | Self::Index { source, .. } | Self::MapKey { source, .. } | Self::MapValue { source, .. } | Self::Create { source, .. } => {
				source.root_cause()
			}
			other => other,
		}
	}
}
