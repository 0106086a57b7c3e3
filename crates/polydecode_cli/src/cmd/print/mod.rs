use std::fmt::{self, Write as _};

use polydecode::decode::{DOOMSDAY, Data, GENESIS, Shape, Value};
use time::format_description::well_known::Rfc3339;

/// Output truncation and formatting limits for decoded trees.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
	/// Maximum number of fields printed for a single struct.
	pub max_fields_per_struct: usize,
	/// Maximum number of Unicode scalar values printed for strings.
	pub max_string_len: usize,
	/// Maximum number of elements printed for sequences and maps.
	pub max_array_items: usize,
	/// Maximum recursive print depth for nested containers.
	pub max_print_depth: u32,
}

impl Default for PrintOptions {
	fn default() -> Self {
		Self {
			max_fields_per_struct: 80,
			max_string_len: 200,
			max_array_items: 16,
			max_print_depth: 6,
		}
	}
}

/// Indented rendering of one destination tree.
pub struct DataTree<'a> {
	data: &'a Data,
	options: PrintOptions,
}

impl<'a> DataTree<'a> {
	/// Render `data` with `options`.
	pub fn new(data: &'a Data, options: PrintOptions) -> Self {
		Self { data, options }
	}
}

impl fmt::Display for DataTree<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write_data(f, self.data, 0, 0, self.options)
	}
}

fn write_data(f: &mut fmt::Formatter<'_>, data: &Data, indent: usize, depth: u32, options: PrintOptions) -> fmt::Result {
	let pad = " ".repeat(indent);
	let data = resolve(data);
	if let Some(text) = inline_text(data, options) {
		return writeln!(f, "{pad}{text}");
	}

	match data {
		Data::Array(items) | Data::Seq(items) => {
			if depth >= options.max_print_depth {
				return writeln!(f, "{pad}[... {} items]", items.len());
			}
			writeln!(f, "{pad}[")?;
			for item in items.iter().take(options.max_array_items) {
				write_data(f, item, indent + 2, depth + 1, options)?;
			}
			if items.len() > options.max_array_items {
				writeln!(f, "{pad}  ... {} more", items.len() - options.max_array_items)?;
			}
			writeln!(f, "{pad}]")
		}
		Data::Map(Some(entries)) => {
			if depth >= options.max_print_depth {
				return writeln!(f, "{pad}{{... {} entries}}", entries.len());
			}
			writeln!(f, "{pad}{{")?;
			for (key, value) in entries.iter().take(options.max_array_items) {
				let key = inline_text(resolve(key), options).unwrap_or_else(|| format!("<{}>", key.kind()));
				write!(f, "{pad}  {key} => ")?;
				write_member(f, value, indent, depth, options)?;
			}
			if entries.len() > options.max_array_items {
				writeln!(f, "{pad}  ... {} more", entries.len() - options.max_array_items)?;
			}
			writeln!(f, "{pad}}}")
		}
		Data::Struct(record) => {
			if depth >= options.max_print_depth {
				return writeln!(f, "{pad}{} {{ ... }}", record.type_name());
			}
			writeln!(f, "{pad}{} {{", record.type_name())?;
			for (name, value) in record.fields().take(options.max_fields_per_struct) {
				write!(f, "{pad}  {name} = ")?;
				write_member(f, value, indent, depth, options)?;
			}
			let count = record.fields().count();
			if count > options.max_fields_per_struct {
				writeln!(f, "{pad}  ... {} more fields", count - options.max_fields_per_struct)?;
			}
			writeln!(f, "{pad}}}")
		}
		other => writeln!(f, "{pad}<{}>", other.kind()),
	}
}

fn write_member(f: &mut fmt::Formatter<'_>, value: &Data, indent: usize, depth: u32, options: PrintOptions) -> fmt::Result {
	if inline_text(resolve(value), options).is_some() {
		write_data(f, value, 0, depth + 1, options)
	} else {
		writeln!(f)?;
		write_data(f, value, indent + 4, depth + 1, options)
	}
}

/// Follow allocated pointers and filled interface slots.
fn resolve(data: &Data) -> &Data {
	match data {
		Data::Pointer(Some(inner)) => resolve(inner),
		Data::Interface(Some(instance)) => resolve(&instance.data),
		other => other,
	}
}

fn inline_text(data: &Data, options: PrintOptions) -> Option<String> {
	let text = match data {
		Data::Bool(v) => v.to_string(),
		Data::Int(v) => v.to_string(),
		Data::Uint(v) => v.to_string(),
		Data::Float(v) => v.to_string(),
		Data::String(v) => format!("\"{}\"", truncate(v, options.max_string_len)),
		Data::Timestamp(v) => v.format(&Rfc3339).unwrap_or_else(|_| v.to_string()),
		Data::Duration(v) => duration_text(*v),
		Data::Map(None) | Data::Pointer(None) | Data::Interface(None) => "null".to_owned(),
		Data::Any(value) => value_text(value, options),
		Data::Address(v) => format!("0x{v:016x}"),
		Data::Array(_) | Data::Seq(_) | Data::Map(Some(_)) | Data::Struct(_) | Data::Pointer(Some(_)) | Data::Interface(Some(_)) => return None,
	};
	Some(text)
}

fn duration_text(value: time::Duration) -> String {
	if value.whole_nanoseconds() == i128::from(i64::MIN) {
		GENESIS.to_owned()
	} else if value.whole_nanoseconds() == i128::from(i64::MAX) {
		DOOMSDAY.to_owned()
	} else {
		value.to_string()
	}
}

/// Single-line rendering of a verbatim source value.
fn value_text(value: &Value, options: PrintOptions) -> String {
	let mut out = String::new();
	push_value(&mut out, value, options);
	out
}

fn push_value(out: &mut String, value: &Value, options: PrintOptions) {
	match value {
		Value::Null => out.push_str("null"),
		Value::Bool(v) => out.push_str(if *v { "true" } else { "false" }),
		Value::Int(v) => {
			let _ = write!(out, "{v}");
		}
		Value::Uint(v) => {
			let _ = write!(out, "{v}");
		}
		Value::Float(v) => {
			let _ = write!(out, "{v}");
		}
		Value::String(v) => {
			let _ = write!(out, "\"{}\"", truncate(v, options.max_string_len));
		}
		Value::Bytes(v) => {
			let _ = write!(out, "bytes[{}]", v.len());
		}
		Value::Sequence(items) => {
			out.push('[');
			for (index, item) in items.iter().take(options.max_array_items).enumerate() {
				if index > 0 {
					out.push_str(", ");
				}
				push_value(out, item, options);
			}
			if items.len() > options.max_array_items {
				out.push_str(", ...");
			}
			out.push(']');
		}
		Value::Mapping(map) => {
			out.push('{');
			for (index, (key, item)) in map.iter().take(options.max_array_items).enumerate() {
				if index > 0 {
					out.push_str(", ");
				}
				let _ = write!(out, "{key}: ");
				push_value(out, item, options);
			}
			if map.len() > options.max_array_items {
				out.push_str(", ...");
			}
			out.push('}');
		}
		Value::Instance(instance) => {
			let _ = write!(out, "instance({})", instance.type_name());
		}
	}
}

/// Compact type notation for schema listings.
pub fn shape_label(shape: &Shape) -> String {
	match shape {
		Shape::Array { len, elem } => format!("[{len}]{}", shape_label(elem)),
		Shape::Seq(elem) => format!("[]{}", shape_label(elem)),
		Shape::Map { key, value } if **value == Shape::Bool => format!("set[{}]", shape_label(key)),
		Shape::Map { key, value } => format!("map[{}]{}", shape_label(key), shape_label(value)),
		Shape::Struct(item) => item.name().to_owned(),
		Shape::Ref(target) => target.name().to_owned(),
		Shape::Named(named) => named.name().to_owned(),
		Shape::Pointer(pointee) => format!("*{}", shape_label(pointee)),
		Shape::Interface(capability) if capability.is_empty() => "any".to_owned(),
		Shape::Interface(capability) => capability.name().to_owned(),
		other => other.kind().to_owned(),
	}
}

fn truncate(input: &str, max_len: usize) -> String {
	if input.chars().count() <= max_len {
		return input.to_owned();
	}
	let out: String = input.chars().take(max_len).collect();
	format!("{out}...")
}

#[cfg(test)]
mod tests;
