use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::decode::{BoxError, Data, Record};

/// Static description of a destination slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
	/// Boolean scalar.
	Bool,
	/// Signed integer scalar.
	Int,
	/// Unsigned integer scalar.
	Uint,
	/// Float scalar.
	Float,
	/// UTF-8 string.
	String,
	/// Point in time parsed from a layout table.
	Timestamp,
	/// Signed nanosecond span.
	Duration,
	/// Fixed-size array.
	Array {
		/// Element count.
		len: usize,
		/// Element shape.
		elem: Box<Shape>,
	},
	/// Growable sequence.
	Seq(Box<Shape>),
	/// Key/value mapping; a `Bool` value makes it a presence set.
	Map {
		/// Key shape.
		key: Box<Shape>,
		/// Value shape.
		value: Box<Shape>,
	},
	/// Named struct type.
	Struct(Arc<StructShape>),
	/// Late-bound reference to a named struct, used to close recursive types.
	Ref(StructRef),
	/// Named non-struct type over an underlying shape.
	Named(Arc<NamedShape>),
	/// Pointer to a pointee shape.
	Pointer(Box<Shape>),
	/// Abstract capability resolved at decode time.
	Interface(Arc<Capability>),
	/// Raw memory address; has no decoding rule.
	Address,
}

impl Shape {
	/// Fixed-size array of `len` elements.
	pub fn array(len: usize, elem: Shape) -> Self {
		Shape::Array { len, elem: Box::new(elem) }
	}

	/// Growable sequence of `elem`.
	pub fn seq(elem: Shape) -> Self {
		Shape::Seq(Box::new(elem))
	}

	/// Mapping from `key` to `value`.
	pub fn map(key: Shape, value: Shape) -> Self {
		Shape::Map {
			key: Box::new(key),
			value: Box::new(value),
		}
	}

	/// Presence set keyed by `key`.
	pub fn set(key: Shape) -> Self {
		Shape::map(key, Shape::Bool)
	}

	/// Pointer to `pointee`.
	pub fn pointer(pointee: Shape) -> Self {
		Shape::Pointer(Box::new(pointee))
	}

	/// Interface slot accepting any value.
	pub fn any() -> Self {
		Shape::Interface(Arc::new(Capability::any()))
	}

	/// Short label for the shape kind.
	pub fn kind(&self) -> &'static str {
		match self {
			Shape::Bool => "bool",
			Shape::Int => "int",
			Shape::Uint => "uint",
			Shape::Float => "float",
			Shape::String => "string",
			Shape::Timestamp => "timestamp",
			Shape::Duration => "duration",
			Shape::Array { .. } => "array",
			Shape::Seq(_) => "seq",
			Shape::Map { .. } => "map",
			Shape::Struct(_) | Shape::Ref(_) => "struct",
			Shape::Named(named) => named.base.kind(),
			Shape::Pointer(_) => "pointer",
			Shape::Interface(_) => "interface",
			Shape::Address => "address",
		}
	}

	/// Nominal type name for structs, pointers to structs, and interfaces.
	pub fn type_name(&self) -> Option<&str> {
		match self {
			Shape::Struct(item) => Some(item.name()),
			Shape::Ref(target) => Some(target.name()),
			Shape::Named(named) => Some(named.name()),
			Shape::Pointer(pointee) => pointee.type_name(),
			Shape::Interface(capability) => Some(capability.name()),
			_ => None,
		}
	}
}

impl From<StructShape> for Shape {
	fn from(value: StructShape) -> Self {
		Shape::Struct(Arc::new(value))
	}
}

impl From<NamedShape> for Shape {
	fn from(value: NamedShape) -> Self {
		Shape::Named(Arc::new(value))
	}
}

impl From<Capability> for Shape {
	fn from(value: Capability) -> Self {
		Shape::Interface(Arc::new(value))
	}
}

/// Hook decoding a destination directly from raw text, bypassing field decoding.
///
/// Struct types receive their [`Record`]; named types receive their [`Data`].
pub trait TextDecode<T: ?Sized = Record>: Send + Sync {
	/// Populate `dest` from `text`.
	fn decode_text(&self, dest: &mut T, text: &[u8]) -> Result<(), BoxError>;
}

impl<T, F> TextDecode<T> for F
where
	T: ?Sized,
	F: Fn(&mut T, &[u8]) -> Result<(), BoxError> + Send + Sync,
{
	fn decode_text(&self, dest: &mut T, text: &[u8]) -> Result<(), BoxError> {
		self(dest, text)
	}
}

/// Named struct type: ordered fields, implemented methods, optional text hook.
///
/// Equality is nominal plus structural (name, fields, methods); the text hook
/// does not participate.
#[derive(Clone)]
pub struct StructShape {
	name: Box<str>,
	fields: Vec<FieldShape>,
	methods: BTreeSet<Box<str>>,
	text: Option<Arc<dyn TextDecode>>,
}

/// One declared struct field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
	/// Field name, also the source mapping key.
	pub name: Box<str>,
	/// Field destination shape.
	pub shape: Shape,
	/// Embedded fields read from the enclosing mapping instead of a nested key.
	pub embedded: bool,
}

impl StructShape {
	/// Start a struct declaration with no fields.
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self {
			name: name.into(),
			fields: Vec::new(),
			methods: BTreeSet::new(),
			text: None,
		}
	}

	/// Append a named field.
	pub fn field(mut self, name: impl Into<Box<str>>, shape: Shape) -> Self {
		self.fields.push(FieldShape {
			name: name.into(),
			shape,
			embedded: false,
		});
		self
	}

	/// Append an embedded field whose members are promoted into this struct.
	pub fn embed(mut self, name: impl Into<Box<str>>, shape: Shape) -> Self {
		self.fields.push(FieldShape {
			name: name.into(),
			shape,
			embedded: true,
		});
		self
	}

	/// Declare that this type implements `method`.
	pub fn method(mut self, method: impl Into<Box<str>>) -> Self {
		self.methods.insert(method.into());
		self
	}

	/// Attach a text hook.
	pub fn text_hook<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut Record, &[u8]) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.text = Some(Arc::new(hook));
		self
	}

	/// Attach a text decoder implemented as a type.
	pub fn text_decoder(mut self, decoder: impl TextDecode + 'static) -> Self {
		self.text = Some(Arc::new(decoder));
		self
	}

	/// Type name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Declared fields in order.
	pub fn fields(&self) -> &[FieldShape] {
		&self.fields
	}

	/// Position of a directly declared field.
	pub fn field_index(&self, name: &str) -> Option<usize> {
		self.fields.iter().position(|field| field.name.as_ref() == name)
	}

	/// Implemented method names.
	pub fn methods(&self) -> impl Iterator<Item = &str> {
		self.methods.iter().map(AsRef::as_ref)
	}

	/// Text hook, if the type decodes from raw text.
	pub fn text(&self) -> Option<&dyn TextDecode> {
		self.text.as_deref()
	}

	fn implements(&self, capability: &Capability) -> bool {
		capability.methods.is_subset(&self.methods)
	}
}

impl PartialEq for StructShape {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.fields == other.fields && self.methods == other.methods
	}
}

impl fmt::Debug for StructShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StructShape")
			.field("name", &self.name)
			.field("fields", &self.fields)
			.field("methods", &self.methods)
			.field("text", &self.text.is_some())
			.finish()
	}
}

/// Reference to a struct that is bound after the struct itself is built.
///
/// The reference holds the target weakly: whoever binds it keeps the struct
/// alive. A reference belongs behind a pointer, sequence or map, since its
/// zero value is the target's zero record.
#[derive(Clone)]
pub struct StructRef {
	name: Box<str>,
	target: Arc<OnceLock<Weak<StructShape>>>,
}

impl StructRef {
	/// Unbound reference to the struct called `name`.
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self {
			name: name.into(),
			target: Arc::new(OnceLock::new()),
		}
	}

	/// Bind the reference; returns `false` when it was already bound.
	pub fn bind(&self, target: &Arc<StructShape>) -> bool {
		self.target.set(Arc::downgrade(target)).is_ok()
	}

	/// Referenced type name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Bound target, if it is still alive.
	pub fn get(&self) -> Option<Arc<StructShape>> {
		self.target.get().and_then(Weak::upgrade)
	}
}

impl PartialEq for StructRef {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name
	}
}

impl fmt::Debug for StructRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("StructRef")
			.field("name", &self.name)
			.field("bound", &self.get().is_some())
			.finish()
	}
}

/// Named type over a non-struct shape, such as a string enum or a custom scalar.
#[derive(Clone)]
pub struct NamedShape {
	name: Box<str>,
	base: Shape,
	methods: BTreeSet<Box<str>>,
	text: Option<Arc<dyn TextDecode<Data>>>,
}

impl NamedShape {
	/// Name `base`.
	pub fn new(name: impl Into<Box<str>>, base: Shape) -> Self {
		Self {
			name: name.into(),
			base,
			methods: BTreeSet::new(),
			text: None,
		}
	}

	/// Declare that this type implements `method`.
	pub fn method(mut self, method: impl Into<Box<str>>) -> Self {
		self.methods.insert(method.into());
		self
	}

	/// Attach a text hook writing the underlying value.
	pub fn text_hook<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut Data, &[u8]) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		self.text = Some(Arc::new(hook));
		self
	}

	/// Type name.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Underlying shape.
	pub fn base(&self) -> &Shape {
		&self.base
	}

	/// Implemented method names.
	pub fn methods(&self) -> impl Iterator<Item = &str> {
		self.methods.iter().map(AsRef::as_ref)
	}

	/// Text hook, if the type decodes from raw text.
	pub fn text(&self) -> Option<&dyn TextDecode<Data>> {
		self.text.as_deref()
	}
}

impl PartialEq for NamedShape {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.base == other.base && self.methods == other.methods
	}
}

impl fmt::Debug for NamedShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NamedShape")
			.field("name", &self.name)
			.field("base", &self.base)
			.field("methods", &self.methods)
			.field("text", &self.text.is_some())
			.finish()
	}
}

/// Capability identity plus the method set a value must implement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
	name: Box<str>,
	methods: BTreeSet<Box<str>>,
}

impl Capability {
	/// Declare a capability.
	pub fn new<I, M>(name: impl Into<Box<str>>, methods: I) -> Self
	where
		I: IntoIterator<Item = M>,
		M: Into<Box<str>>,
	{
		Self {
			name: name.into(),
			methods: methods.into_iter().map(Into::into).collect(),
		}
	}

	/// Capability with an empty method set.
	pub fn any() -> Self {
		Self::new("any", std::iter::empty::<&str>())
	}

	/// Identity used to key the factory registry.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Required method names.
	pub fn methods(&self) -> impl Iterator<Item = &str> {
		self.methods.iter().map(AsRef::as_ref)
	}

	/// Whether any value satisfies this capability.
	pub fn is_empty(&self) -> bool {
		self.methods.is_empty()
	}

	/// Whether values of `shape` can be assigned without a factory.
	pub fn is_satisfied_by(&self, shape: &Shape) -> bool {
		match shape {
			Shape::Struct(item) => item.implements(self),
			Shape::Ref(target) => target.get().is_some_and(|item| item.implements(self)),
			Shape::Named(named) => self.methods.is_subset(&named.methods),
			Shape::Pointer(pointee) => self.is_satisfied_by(pointee),
			Shape::Interface(other) => other.name == self.name || self.methods.is_subset(&other.methods),
			_ => self.is_empty(),
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::{Capability, NamedShape, Shape, StructRef, StructShape};

	#[test]
	fn capability_requires_every_method() {
		let stringer = Capability::new("Stringer", ["String"]);
		let both = Capability::new("StringTexter", ["String", "Text"]);
		let foo = Shape::from(StructShape::new("Foo").method("String"));

		assert!(stringer.is_satisfied_by(&foo));
		assert!(stringer.is_satisfied_by(&Shape::pointer(foo.clone())));
		assert!(!both.is_satisfied_by(&foo));
		assert!(!stringer.is_satisfied_by(&Shape::String));
	}

	#[test]
	fn struct_equality_ignores_text_hook() {
		let plain = StructShape::new("UT").field("text", Shape::String);
		let hooked = plain.clone().text_hook(|_, _| Ok(()));
		assert_eq!(plain, hooked);
		assert_ne!(plain, StructShape::new("UT"));
	}

	#[test]
	fn type_name_sees_through_pointers() {
		let shape = Shape::pointer(StructShape::new("Node").into());
		assert_eq!(shape.type_name(), Some("Node"));
		assert_eq!(Shape::Int.type_name(), None);
	}

	#[test]
	fn struct_ref_binds_once_and_holds_weakly() {
		let target = StructRef::new("Node");
		assert!(target.get().is_none());

		let node = Arc::new(StructShape::new("Node").field("Next", Shape::pointer(Shape::Ref(target.clone()))));
		assert!(target.bind(&node));
		assert!(!target.bind(&node));
		assert!(Arc::ptr_eq(&target.get().expect("bound target"), &node));
		assert_eq!(Shape::Ref(target.clone()).type_name(), Some("Node"));

		drop(node);
		assert!(target.get().is_none());
	}

	#[test]
	fn named_shapes_carry_methods() {
		let level = Shape::from(NamedShape::new("Level", Shape::Int).method("String"));
		assert_eq!(level.type_name(), Some("Level"));
		assert_eq!(level.kind(), "int");
		assert!(Capability::new("Stringer", ["String"]).is_satisfied_by(&level));
		assert!(!Capability::new("Texter", ["Text"]).is_satisfied_by(&level));
	}
}
