use std::sync::Arc;

use tracing::debug;

use crate::decode::coerce;
use crate::decode::temporal::{parse_duration, parse_timestamp};
use crate::decode::{Capability, Data, DecodeError, NamedShape, Registry, Result, Shape, StructShape, TextDecode, Value};

/// Runtime limits for shape-driven decoding.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
	/// Maximum recursion depth; `None` recurses as deep as the trees go.
	pub max_depth: Option<u32>,
}

impl DecodeOptions {
	/// Options that fail with [`DecodeError::DepthExceeded`] past `max_depth` levels.
	pub fn bounded(max_depth: u32) -> Self {
		Self { max_depth: Some(max_depth) }
	}
}

/// Recursive decoder walking a destination shape and a source value in lock-step.
///
/// Decoders only read the registry, so any number of them may share one
/// populated [`Registry`].
#[derive(Debug, Clone)]
pub struct Decoder<'r> {
	registry: &'r Registry,
	options: DecodeOptions,
}

/// Decoder handle passed to factories, carrying the current nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'d> {
	decoder: &'d Decoder<'d>,
	depth: u32,
}

/// Decode `src` into `dest` with default options.
pub fn decode(registry: &Registry, shape: &Shape, dest: &mut Data, src: &Value) -> Result<()> {
	Decoder::new(registry).decode(shape, dest, src)
}

impl<'r> Decoder<'r> {
	/// Decoder with default options.
	pub fn new(registry: &'r Registry) -> Self {
		Self::with_options(registry, DecodeOptions::default())
	}

	/// Decoder with explicit options.
	pub fn with_options(registry: &'r Registry, options: DecodeOptions) -> Self {
		Self { registry, options }
	}

	/// Registry consulted for interface slots.
	pub fn registry(&self) -> &'r Registry {
		self.registry
	}

	/// Decode `src` into `dest`, allocating null root pointers first.
	///
	/// On failure `dest` keeps whatever was decoded before the failing node.
	pub fn decode(&self, shape: &Shape, dest: &mut Data, src: &Value) -> Result<()> {
		debug!(shape = shape.kind(), source = src.kind(), "decode");
		let mut shape = shape;
		let mut dest = dest;
		while let Shape::Pointer(pointee) = shape {
			dest = dest.pointee_mut(pointee);
			shape = pointee.as_ref();
		}
		self.decode_at(shape, dest, src, 0)
	}

	/// Decode `src` into a fresh zero value of `shape`.
	pub fn decode_new(&self, shape: &Shape, src: &Value) -> Result<Data> {
		let mut dest = shape.zero();
		self.decode(shape, &mut dest, src)?;
		Ok(dest)
	}

	fn decode_at(&self, shape: &Shape, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		if let Some(max_depth) = self.options.max_depth {
			if depth > max_depth {
				return Err(DecodeError::DepthExceeded { max_depth });
			}
		}

		match shape {
			Shape::Timestamp => {
				*dest = Data::Timestamp(parse_timestamp(expect_text(src)?)?);
				Ok(())
			}
			Shape::Duration => {
				*dest = Data::Duration(parse_duration(expect_text(src)?)?);
				Ok(())
			}
			Shape::Bool => {
				*dest = Data::Bool(coerce::to_bool(src)?);
				Ok(())
			}
			Shape::Int => {
				*dest = Data::Int(coerce::to_int(src)?);
				Ok(())
			}
			Shape::Uint => {
				*dest = Data::Uint(coerce::to_uint(src)?);
				Ok(())
			}
			Shape::Float => {
				*dest = Data::Float(coerce::to_float(src)?);
				Ok(())
			}
			Shape::String => {
				*dest = Data::String(coerce::to_string(src)?);
				Ok(())
			}
			Shape::Array { len, elem } => self.decode_array(*len, elem, dest, src, depth),
			Shape::Seq(elem) => self.decode_seq(elem, dest, src, depth),
			Shape::Map { key, value } => self.decode_map(key, value, dest, src, depth),
			Shape::Struct(item) => match item.text() {
				Some(hook) => decode_text(item, hook, dest, src),
				None => self.decode_struct(item, dest, src, depth),
			},
			Shape::Ref(target) => {
				let item = target.get().ok_or_else(|| DecodeError::UnresolvedStruct {
					name: target.name().to_owned(),
				})?;
				self.decode_at(&Shape::Struct(item), dest, src, depth)
			}
			Shape::Named(named) => match named.text() {
				Some(hook) => decode_named_text(named, hook, dest, src),
				None => self.decode_at(named.base(), dest, src, depth),
			},
			Shape::Pointer(pointee) => match dest {
				Data::Pointer(Some(inner)) => self.decode_at(pointee, inner, src, depth + 1),
				_ => Err(DecodeError::NilPointer),
			},
			Shape::Interface(capability) => self.decode_interface(capability, dest, src, depth),
			Shape::Address => Err(DecodeError::UnsupportedKind { kind: shape.kind() }),
		}
	}

	fn decode_array(&self, len: usize, elem: &Shape, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		let items = expect_sequence(src)?;
		if items.len() != len {
			return Err(DecodeError::LengthMismatch {
				expected: len,
				found: items.len(),
			});
		}
		let slots = dest.array_mut(len, elem);
		self.decode_elements(elem, slots, items, depth)
	}

	/// Grows a shorter destination to the source length; a longer one keeps its tail.
	fn decode_seq(&self, elem: &Shape, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		let items = expect_sequence(src)?;
		let slots = dest.seq_mut();
		if slots.len() < items.len() {
			*slots = items.iter().map(|_| elem.zero()).collect();
		}
		self.decode_elements(elem, slots, items, depth)
	}

	fn decode_elements(&self, elem: &Shape, slots: &mut [Data], items: &[Value], depth: u32) -> Result<()> {
		for (index, (slot, item)) in slots.iter_mut().zip(items).enumerate() {
			self.decode_at(elem, slot, item, depth + 1).map_err(|err| err.at_index(index))?;
		}
		Ok(())
	}

	fn decode_map(&self, key: &Shape, value: &Shape, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		match src {
			Value::Sequence(items) if *value == Shape::Bool => self.decode_set(key, dest, items, depth),
			Value::Mapping(map) => {
				let entries = dest.entries_mut();
				for (src_key, src_value) in map {
					let mut dest_key = key.zero();
					self.decode_at(key, &mut dest_key, &Value::String(src_key.clone()), depth + 1)
						.map_err(|err| DecodeError::MapKey {
							key: src_key.to_string(),
							source: Box::new(err),
						})?;
					let mut dest_value = value.zero();
					self.decode_at(value, &mut dest_value, src_value, depth + 1)
						.map_err(|err| DecodeError::MapValue {
							key: src_key.to_string(),
							source: Box::new(err),
						})?;
					entries.insert(dest_key, dest_value);
				}
				Ok(())
			}
			other => Err(DecodeError::bad_type("mapping", other.describe())),
		}
	}

	/// List-shaped source populating a presence set.
	fn decode_set(&self, key: &Shape, dest: &mut Data, items: &[Value], depth: u32) -> Result<()> {
		let entries = dest.entries_mut();
		for (index, item) in items.iter().enumerate() {
			let mut dest_key = key.zero();
			self.decode_at(key, &mut dest_key, item, depth + 1).map_err(|err| err.at_index(index))?;
			entries.insert(dest_key, Data::Bool(true));
		}
		Ok(())
	}

	fn decode_struct(&self, item: &Arc<StructShape>, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		let map = match src {
			Value::Instance(instance) if matches!(&instance.shape, Shape::Struct(other) if other == item) => {
				*dest = instance.data.clone();
				return Ok(());
			}
			Value::Mapping(map) => map,
			other => return Err(DecodeError::bad_type("mapping", other.describe())),
		};

		let record = dest.record_mut(item);
		for (field, slot) in item.fields().iter().zip(record.fields.iter_mut()) {
			let result = if field.embedded {
				match &field.shape {
					Shape::Pointer(pointee) => self.decode_at(pointee, slot.pointee_mut(pointee), src, depth + 1),
					shape => self.decode_at(shape, slot, src, depth + 1),
				}
			} else {
				let Some(value) = map.get(&*field.name) else {
					continue;
				};
				match &field.shape {
					Shape::Pointer(pointee) => self.decode_at(pointee, slot.pointee_mut(pointee), value, depth + 1),
					Shape::Interface(capability) => self.decode_interface(capability, slot, value, depth + 1),
					shape => self.decode_at(shape, slot, value, depth + 1),
				}
			};
			result.map_err(|err| err.in_field(&field.name))?;
		}
		Ok(())
	}

	fn decode_interface(&self, capability: &Arc<Capability>, dest: &mut Data, src: &Value, depth: u32) -> Result<()> {
		if capability.is_empty() {
			*dest = Data::Any(src.clone());
			return Ok(());
		}
		match src {
			Value::Null => {
				*dest = Data::Interface(None);
				Ok(())
			}
			Value::Instance(instance) if capability.is_satisfied_by(&instance.shape) => {
				*dest = Data::Interface(Some(Arc::clone(instance)));
				Ok(())
			}
			Value::Mapping(_) => {
				let scope = Scope { decoder: self, depth };
				let instance = self.registry.create(scope, capability, src)?;
				*dest = Data::Interface(Some(instance));
				Ok(())
			}
			other => Err(DecodeError::bad_type("mapping", other.describe())),
		}
	}
}

impl Scope<'_> {
	/// Decode `src` into `dest` one level below the current node.
	pub fn decode(&self, shape: &Shape, dest: &mut Data, src: &Value) -> Result<()> {
		self.decoder.decode_at(shape, dest, src, self.depth + 1)
	}

	/// Registry the enclosing decoder consults.
	pub fn registry(&self) -> &Registry {
		self.decoder.registry
	}
}

/// Hand raw text to the hook; struct fields are never walked.
fn decode_text(item: &Arc<StructShape>, hook: &dyn TextDecode, dest: &mut Data, src: &Value) -> Result<()> {
	let text = expect_raw_text(src)?;
	let record = dest.record_mut(item);
	hook.decode_text(record, text).map_err(|source| DecodeError::TextHook {
		type_name: item.name().to_owned(),
		source,
	})
}

fn decode_named_text(named: &NamedShape, hook: &dyn TextDecode<Data>, dest: &mut Data, src: &Value) -> Result<()> {
	let text = expect_raw_text(src)?;
	hook.decode_text(dest, text).map_err(|source| DecodeError::TextHook {
		type_name: named.name().to_owned(),
		source,
	})
}

fn expect_raw_text(src: &Value) -> Result<&[u8]> {
	match src {
		Value::String(text) => Ok(text.as_bytes()),
		Value::Bytes(bytes) => Ok(bytes.as_slice()),
		other => Err(DecodeError::bad_type("string/bytes", other.describe())),
	}
}

fn expect_text(src: &Value) -> Result<&str> {
	src.as_str().ok_or_else(|| DecodeError::bad_type("string", src.describe()))
}

fn expect_sequence(src: &Value) -> Result<&[Value]> {
	match src {
		Value::Sequence(items) => Ok(items),
		other => Err(DecodeError::bad_type("array/slice", other.describe())),
	}
}
