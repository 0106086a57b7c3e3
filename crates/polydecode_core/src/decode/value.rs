use std::collections::BTreeMap;
use std::sync::Arc;

use crate::decode::Instance;

/// String-keyed source mapping; duplicate keys collapse last-write-wins on insert.
pub type Mapping = BTreeMap<Box<str>, Value>;

/// Format-agnostic source tree produced by an external parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Explicit null marker.
	Null,
	/// Boolean scalar.
	Bool(bool),
	/// Signed integer scalar.
	Int(i64),
	/// Unsigned integer scalar.
	Uint(u64),
	/// 64-bit float scalar.
	Float(f64),
	/// UTF-8 string.
	String(Box<str>),
	/// Opaque byte payload.
	Bytes(Vec<u8>),
	/// Ordered list of values.
	Sequence(Vec<Value>),
	/// String-keyed mapping.
	Mapping(Mapping),
	/// Already-typed value carried through the source tree.
	Instance(Arc<Instance>),
}

impl Value {
	/// Short label for the value kind, used in error messages.
	pub fn kind(&self) -> &'static str {
		match self {
			Value::Null => "null",
			Value::Bool(_) => "bool",
			Value::Int(_) => "int",
			Value::Uint(_) => "uint",
			Value::Float(_) => "float",
			Value::String(_) => "string",
			Value::Bytes(_) => "bytes",
			Value::Sequence(_) => "sequence",
			Value::Mapping(_) => "mapping",
			Value::Instance(_) => "instance",
		}
	}

	/// Kind label that also names the type of an instance.
	pub fn describe(&self) -> String {
		match self {
			Value::Instance(instance) => format!("instance({})", instance.type_name()),
			other => other.kind().to_owned(),
		}
	}

	/// Borrow the mapping payload, if any.
	pub fn as_mapping(&self) -> Option<&Mapping> {
		match self {
			Value::Mapping(map) => Some(map),
			_ => None,
		}
	}

	/// Borrow the string payload, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(text) => Some(text),
			_ => None,
		}
	}

	/// Build a mapping from key/value pairs; later duplicates win.
	pub fn mapping<K, I>(entries: I) -> Self
	where
		K: Into<Box<str>>,
		I: IntoIterator<Item = (K, Value)>,
	{
		Value::Mapping(entries.into_iter().map(|(key, value)| (key.into(), value)).collect())
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.into())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(value.into_boxed_str())
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Int(value)
	}
}

impl From<u64> for Value {
	fn from(value: u64) -> Self {
		Value::Uint(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Float(value)
	}
}

impl From<Vec<Value>> for Value {
	fn from(value: Vec<Value>) -> Self {
		Value::Sequence(value)
	}
}

impl From<Instance> for Value {
	fn from(value: Instance) -> Self {
		Value::Instance(Arc::new(value))
	}
}

impl From<serde_json::Value> for Value {
	fn from(value: serde_json::Value) -> Self {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(flag) => Value::Bool(flag),
			serde_json::Value::Number(number) => {
				if let Some(int) = number.as_i64() {
					Value::Int(int)
				} else if let Some(uint) = number.as_u64() {
					Value::Uint(uint)
				} else {
					Value::Float(number.as_f64().unwrap_or(f64::NAN))
				}
			}
			serde_json::Value::String(text) => Value::String(text.into_boxed_str()),
			serde_json::Value::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
			serde_json::Value::Object(map) => Value::Mapping(map.into_iter().map(|(key, item)| (key.into_boxed_str(), Value::from(item))).collect()),
		}
	}
}
