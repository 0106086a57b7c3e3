use std::collections::HashMap;
use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use crate::decode::{Shape, StructShape, Value};

/// Destination tree mirroring a [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
	/// Boolean scalar.
	Bool(bool),
	/// Signed integer scalar.
	Int(i64),
	/// Unsigned integer scalar.
	Uint(u64),
	/// Float scalar.
	Float(f64),
	/// Owned string.
	String(String),
	/// Point in time.
	Timestamp(OffsetDateTime),
	/// Signed span.
	Duration(Duration),
	/// Fixed-size array elements.
	Array(Vec<Data>),
	/// Growable sequence elements.
	Seq(Vec<Data>),
	/// `None` is an unset map.
	Map(Option<Entries>),
	/// Struct field values.
	Struct(Record),
	/// `None` is a null pointer.
	Pointer(Option<Box<Data>>),
	/// `None` is an empty interface slot.
	Interface(Option<Arc<Instance>>),
	/// Interface slot with an empty capability set, holding the source verbatim.
	Any(Value),
	/// Raw address.
	Address(u64),
}

impl Shape {
	/// Zero value for a destination of this shape.
	pub fn zero(&self) -> Data {
		match self {
			Shape::Bool => Data::Bool(false),
			Shape::Int => Data::Int(0),
			Shape::Uint => Data::Uint(0),
			Shape::Float => Data::Float(0.0),
			Shape::String => Data::String(String::new()),
			Shape::Timestamp => Data::Timestamp(OffsetDateTime::UNIX_EPOCH),
			Shape::Duration => Data::Duration(Duration::ZERO),
			Shape::Array { len, elem } => Data::Array((0..*len).map(|_| elem.zero()).collect()),
			Shape::Seq(_) => Data::Seq(Vec::new()),
			Shape::Map { .. } => Data::Map(None),
			Shape::Struct(item) => Data::Struct(Record::zero(item)),
			Shape::Ref(target) => match target.get() {
				Some(item) => Data::Struct(Record::zero(&item)),
				None => Data::Struct(Record::zero(&Arc::new(StructShape::new(target.name())))),
			},
			Shape::Named(named) => named.base().zero(),
			Shape::Pointer(_) => Data::Pointer(None),
			Shape::Interface(capability) if capability.is_empty() => Data::Any(Value::Null),
			Shape::Interface(_) => Data::Interface(None),
			Shape::Address => Data::Address(0),
		}
	}
}

impl Data {
	/// Borrow a struct record.
	pub fn as_record(&self) -> Option<&Record> {
		match self {
			Data::Struct(record) => Some(record),
			_ => None,
		}
	}

	/// Borrow the instance held by an interface slot.
	pub fn as_instance(&self) -> Option<&Arc<Instance>> {
		match self {
			Data::Interface(Some(instance)) => Some(instance),
			_ => None,
		}
	}

	/// Follow pointers to the first non-pointer value.
	pub fn follow(&self) -> Option<&Data> {
		match self {
			Data::Pointer(Some(inner)) => inner.follow(),
			Data::Pointer(None) => None,
			other => Some(other),
		}
	}

	/// Short label for the data kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Data::Bool(_) => "bool",
			Data::Int(_) => "int",
			Data::Uint(_) => "uint",
			Data::Float(_) => "float",
			Data::String(_) => "string",
			Data::Timestamp(_) => "timestamp",
			Data::Duration(_) => "duration",
			Data::Array(_) => "array",
			Data::Seq(_) => "seq",
			Data::Map(_) => "map",
			Data::Struct(_) => "struct",
			Data::Pointer(_) => "pointer",
			Data::Interface(_) => "interface",
			Data::Any(_) => "any",
			Data::Address(_) => "address",
		}
	}

	pub(crate) fn array_mut(&mut self, len: usize, elem: &Shape) -> &mut Vec<Data> {
		if !matches!(self, Data::Array(items) if items.len() == len) {
			*self = Shape::array(len, elem.clone()).zero();
		}
		match self {
			Data::Array(items) => items,
			_ => unreachable!("array slot reset above"),
		}
	}

	pub(crate) fn seq_mut(&mut self) -> &mut Vec<Data> {
		if !matches!(self, Data::Seq(_)) {
			*self = Data::Seq(Vec::new());
		}
		match self {
			Data::Seq(items) => items,
			_ => unreachable!("sequence slot reset above"),
		}
	}

	/// Map entries, initializing an unset map.
	pub(crate) fn entries_mut(&mut self) -> &mut Entries {
		if !matches!(self, Data::Map(Some(_))) {
			*self = Data::Map(Some(Entries::default()));
		}
		match self {
			Data::Map(Some(entries)) => entries,
			_ => unreachable!("map slot initialized above"),
		}
	}

	pub(crate) fn record_mut(&mut self, shape: &Arc<StructShape>) -> &mut Record {
		if !matches!(self, Data::Struct(record) if record.shape == *shape) {
			*self = Data::Struct(Record::zero(shape));
		}
		match self {
			Data::Struct(record) => record,
			_ => unreachable!("struct slot reset above"),
		}
	}

	/// Pointee of a pointer slot, allocating a zero pointee when null.
	pub(crate) fn pointee_mut(&mut self, pointee: &Shape) -> &mut Data {
		if !matches!(self, Data::Pointer(Some(_))) {
			*self = Data::Pointer(Some(Box::new(pointee.zero())));
		}
		match self {
			Data::Pointer(Some(inner)) => inner.as_mut(),
			_ => unreachable!("pointer slot allocated above"),
		}
	}
}

/// Field values of one struct, index-aligned with its [`StructShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
	shape: Arc<StructShape>,
	pub(crate) fields: Vec<Data>,
}

impl Record {
	/// Zero-valued record of `shape`.
	pub fn zero(shape: &Arc<StructShape>) -> Self {
		Self {
			shape: Arc::clone(shape),
			fields: shape.fields().iter().map(|field| field.shape.zero()).collect(),
		}
	}

	/// Struct type name.
	pub fn type_name(&self) -> &str {
		self.shape.name()
	}

	/// Struct shape.
	pub fn shape(&self) -> &Arc<StructShape> {
		&self.shape
	}

	/// Field name/value pairs in declaration order.
	pub fn fields(&self) -> impl Iterator<Item = (&str, &Data)> {
		self.shape.fields().iter().map(|field| field.name.as_ref()).zip(self.fields.iter())
	}

	/// Look up a field by name, promoting through embedded fields.
	pub fn get(&self, name: &str) -> Option<&Data> {
		if let Some(index) = self.shape.field_index(name) {
			return self.fields.get(index);
		}
		self.shape
			.fields()
			.iter()
			.zip(self.fields.iter())
			.filter(|(field, _)| field.embedded)
			.find_map(|(_, value)| value.follow().and_then(Data::as_record).and_then(|inner| inner.get(name)))
	}

	/// Overwrite a directly declared field; returns `false` for unknown names.
	pub fn set(&mut self, name: &str, value: Data) -> bool {
		match self.shape.field_index(name) {
			Some(index) => {
				self.fields[index] = value;
				true
			}
			None => false,
		}
	}
}

/// Map container; inserting an equal key overwrites the previous entry.
///
/// Scalar, string and temporal keys are indexed by hash; other keys fall back
/// to a scan over the unindexed entries.
#[derive(Debug, Clone, Default)]
pub struct Entries {
	items: Vec<(Data, Data)>,
	index: HashMap<EntryKey, usize>,
	unindexed: Vec<usize>,
}

/// Hashable projection of a key with the same equality as [`Data`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
	Bool(bool),
	Int(i64),
	Uint(u64),
	Float(u64),
	String(Box<str>),
	Instant(i128),
	Span(i128),
}

impl EntryKey {
	/// `Ok(None)` marks a key never equal to anything, such as NaN.
	fn of(key: &Data) -> Result<Option<Self>, ()> {
		let entry = match key {
			Data::Bool(v) => Self::Bool(*v),
			Data::Int(v) => Self::Int(*v),
			Data::Uint(v) => Self::Uint(*v),
			Data::Float(v) if v.is_nan() => return Ok(None),
			Data::Float(v) if *v == 0.0 => Self::Float(0),
			Data::Float(v) => Self::Float(v.to_bits()),
			Data::String(v) => Self::String(v.as_str().into()),
			Data::Timestamp(v) => Self::Instant(v.unix_timestamp_nanos()),
			Data::Duration(v) => Self::Span(v.whole_nanoseconds()),
			_ => return Err(()),
		};
		Ok(Some(entry))
	}
}

impl Entries {
	/// Insert or overwrite, returning the replaced value.
	pub fn insert(&mut self, key: Data, value: Data) -> Option<Data> {
		let position = self.items.len();
		match EntryKey::of(&key) {
			Ok(Some(entry)) => {
				if let Some(&existing) = self.index.get(&entry) {
					return Some(std::mem::replace(&mut self.items[existing].1, value));
				}
				self.index.insert(entry, position);
			}
			Ok(None) => {}
			Err(()) => match self.scan(&key) {
				Some(existing) => return Some(std::mem::replace(&mut self.items[existing].1, value)),
				None => self.unindexed.push(position),
			},
		}
		self.items.push((key, value));
		None
	}

	/// Look up a value by key.
	pub fn get(&self, key: &Data) -> Option<&Data> {
		let position = match EntryKey::of(key) {
			Ok(Some(entry)) => self.index.get(&entry).copied(),
			Ok(None) => None,
			Err(()) => self.scan(key),
		};
		position.map(|position| &self.items[position].1)
	}

	/// Look up a value by string key.
	pub fn get_str(&self, key: &str) -> Option<&Data> {
		self.index.get(&EntryKey::String(key.into())).map(|&position| &self.items[position].1)
	}

	/// Entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&Data, &Data)> {
		self.items.iter().map(|(key, value)| (key, value))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Whether the map has no entries.
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	fn scan(&self, key: &Data) -> Option<usize> {
		self.unindexed.iter().copied().find(|&position| self.items[position].0 == *key)
	}
}

impl PartialEq for Entries {
	fn eq(&self, other: &Self) -> bool {
		self.items == other.items
	}
}

/// Shape-tagged value held by interface slots and carried in source trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
	/// Concrete type of `data`.
	pub shape: Shape,
	/// Instance payload.
	pub data: Data,
}

impl Instance {
	/// Pair a shape with its data.
	pub fn new(shape: Shape, data: Data) -> Self {
		Self { shape, data }
	}

	/// Concrete type name, or the shape kind for unnamed shapes.
	pub fn type_name(&self) -> &str {
		self.shape.type_name().unwrap_or_else(|| self.shape.kind())
	}

	/// Struct record behind any pointer indirection.
	pub fn record(&self) -> Option<&Record> {
		self.data.follow().and_then(Data::as_record)
	}
}

#[cfg(test)]
mod tests {
	use super::{Data, Entries};
	use crate::decode::{Shape, StructShape};

	#[test]
	fn zero_values_follow_shape() {
		assert_eq!(Shape::array(2, Shape::Int).zero(), Data::Array(vec![Data::Int(0), Data::Int(0)]));
		assert_eq!(Shape::map(Shape::String, Shape::Int).zero(), Data::Map(None));
		assert_eq!(Shape::pointer(Shape::Int).zero(), Data::Pointer(None));
		assert!(matches!(Shape::any().zero(), Data::Any(crate::decode::Value::Null)));
	}

	#[test]
	fn record_lookup_promotes_embedded_fields() {
		let inner = Shape::from(StructShape::new("S1").field("Duration", Shape::Duration));
		let outer = Shape::from(StructShape::new("S2").embed("S1", inner).field("Name", Shape::String));
		let data = outer.zero();
		let record = data.as_record().expect("struct zero value");

		assert!(record.get("Name").is_some());
		assert!(record.get("Duration").is_some());
		assert!(record.get("Missing").is_none());
	}

	#[test]
	fn entries_index_scalar_keys_and_scan_the_rest() {
		let mut entries = Entries::default();
		assert!(entries.insert(Data::Float(0.0), Data::Int(1)).is_none());
		assert_eq!(entries.insert(Data::Float(-0.0), Data::Int(2)), Some(Data::Int(1)));
		entries.insert(Data::Float(f64::NAN), Data::Int(3));
		entries.insert(Data::Float(f64::NAN), Data::Int(4));
		assert_eq!(entries.len(), 3);
		assert!(entries.get(&Data::Float(f64::NAN)).is_none());

		let key = Data::Array(vec![Data::Int(1), Data::Int(2)]);
		assert!(entries.insert(key.clone(), Data::Int(5)).is_none());
		assert_eq!(entries.insert(key.clone(), Data::Int(6)), Some(Data::Int(5)));
		assert_eq!(entries.get(&key), Some(&Data::Int(6)));
		assert_eq!(entries.len(), 4);
	}

	#[test]
	fn entries_keep_insertion_order() {
		let mut entries = Entries::default();
		for key in ["b", "a", "c", "a"] {
			entries.insert(Data::String(key.into()), Data::Bool(true));
		}
		let keys: Vec<_> = entries.iter().map(|(key, _)| key.clone()).collect();
		assert_eq!(keys, vec![Data::String("b".into()), Data::String("a".into()), Data::String("c".into())]);
	}

	#[test]
	fn entries_overwrite_equal_keys() {
		let mut entries = Entries::default();
		assert!(entries.insert(Data::String("a".into()), Data::Int(1)).is_none());
		assert_eq!(entries.insert(Data::String("a".into()), Data::Int(2)), Some(Data::Int(1)));
		assert_eq!(entries.len(), 1);
		assert_eq!(entries.get_str("a"), Some(&Data::Int(2)));
	}
}
