//! JSON schema files describing struct types, capabilities and factories.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use polydecode::decode::{Capability, Decoder, Instance, InterfaceFactory, Registry, Shape, StructRef, StructShape, Value};
use serde::Deserialize;
use tracing::debug;

use crate::error::CliError;

/// Raw schema document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
	/// Capability name to required method names.
	#[serde(default)]
	pub capabilities: BTreeMap<String, Vec<String>>,
	/// Struct type declarations by name.
	#[serde(default)]
	pub types: BTreeMap<String, TypeSpec>,
	/// Factory declarations, registered in order.
	#[serde(default)]
	pub factories: Vec<FactorySpec>,
}

/// One struct type declaration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeSpec {
	/// Implemented method names.
	#[serde(default)]
	pub methods: Vec<String>,
	/// Fields in declaration order.
	#[serde(default)]
	pub fields: Vec<FieldSpec>,
}

/// One struct field declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
	/// Field name and source key.
	pub name: String,
	/// Field shape.
	pub shape: ShapeSpec,
	/// Promote the field's members into the enclosing struct.
	#[serde(default)]
	pub embedded: bool,
}

/// One discriminator-keyed factory declaration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorySpec {
	/// Capability the factory serves.
	pub capability: String,
	/// Discriminator key read from source mappings.
	pub type_key: String,
	/// Discriminator to concrete shape.
	#[serde(default)]
	pub types: BTreeMap<String, ShapeSpec>,
	/// Discriminator to shared instance.
	#[serde(default)]
	pub instances: BTreeMap<String, InstanceSpec>,
}

/// Shared instance declaration: a struct type plus the value decoded into it.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceSpec {
	/// Struct type name.
	#[serde(rename = "type")]
	pub type_name: String,
	/// Source value for the instance.
	pub value: serde_json::Value,
}

/// Shape notation: a scalar keyword or a single-key composite object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShapeSpec {
	/// `"int"`, `"string"`, ...
	Scalar(ScalarSpec),
	/// `{"seq": ...}`, `{"struct": "Name"}`, ...
	Composite(CompositeSpec),
}

/// Scalar shape keywords.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarSpec {
	Bool,
	Int,
	Uint,
	Float,
	String,
	Timestamp,
	Duration,
	Any,
}

/// Composite shape constructors.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositeSpec {
	Array { len: usize, elem: Box<ShapeSpec> },
	Seq(Box<ShapeSpec>),
	Map { key: Box<ShapeSpec>, value: Box<ShapeSpec> },
	Set(Box<ShapeSpec>),
	Struct(String),
	Pointer(Box<ShapeSpec>),
	Interface(String),
}

/// Factory summary kept for listing.
#[derive(Debug, Clone)]
pub struct FactoryInfo {
	/// Capability name.
	pub capability: String,
	/// Discriminator key.
	pub type_key: String,
	/// Registered type discriminators with their shapes.
	pub types: Vec<(String, Shape)>,
	/// Registered instance discriminators.
	pub instances: Vec<String>,
}

/// Resolved schema: shapes plus a populated registry.
#[derive(Debug)]
pub struct Schema {
	capabilities: BTreeMap<String, Arc<Capability>>,
	structs: BTreeMap<String, Arc<StructShape>>,
	factories: Vec<FactoryInfo>,
	registry: Registry,
}

impl Schema {
	/// Read and resolve a schema file.
	pub fn load(path: &Path) -> Result<Self, CliError> {
		let bytes = std::fs::read(path).map_err(|source| CliError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let file: SchemaFile = serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
			path: path.to_path_buf(),
			source,
		})?;
		let schema = Self::build(&file)?;
		debug!(
			path = %path.display(),
			types = schema.structs.len(),
			factories = schema.factories.len(),
			"schema loaded"
		);
		Ok(schema)
	}

	/// Resolve every declaration of an already parsed schema document.
	pub fn build(file: &SchemaFile) -> Result<Self, CliError> {
		let mut resolver = Resolver::new(file);
		for name in file.types.keys() {
			resolver.struct_shape(name)?;
		}

		let mut registry = Registry::new();
		let mut factories = Vec::with_capacity(file.factories.len());
		for spec in &file.factories {
			let (factory, info) = resolver.factory(spec, &registry)?;
			registry.register_factory(factory);
			factories.push(info);
		}

		Ok(Self {
			capabilities: resolver.capabilities,
			structs: resolver.structs,
			factories,
			registry,
		})
	}

	/// Shape of a declared struct type.
	pub fn struct_shape(&self, name: &str) -> Result<Shape, CliError> {
		self.structs
			.get(name)
			.map(|item| Shape::Struct(Arc::clone(item)))
			.ok_or_else(|| CliError::UnknownStruct { name: name.to_owned() })
	}

	/// Declared struct types by name.
	pub fn structs(&self) -> impl Iterator<Item = &Arc<StructShape>> {
		self.structs.values()
	}

	/// Declared capabilities by name.
	pub fn capabilities(&self) -> impl Iterator<Item = &Arc<Capability>> {
		self.capabilities.values()
	}

	/// Factories in registration order.
	pub fn factories(&self) -> &[FactoryInfo] {
		&self.factories
	}

	/// Registry populated from the factory declarations.
	pub fn registry(&self) -> &Registry {
		&self.registry
	}
}

/// Resolves struct declarations depth-first.
///
/// A struct that refers back to one still being resolved gets a [`StructRef`],
/// bound once the target is built. The back-reference must sit behind a
/// pointer, sequence or map; a cycle of by-value fields has no finite layout.
struct Resolver<'a> {
	file: &'a SchemaFile,
	capabilities: BTreeMap<String, Arc<Capability>>,
	structs: BTreeMap<String, Arc<StructShape>>,
	/// Structs being resolved, with the indirection depth at which each began.
	resolving: Vec<(String, usize)>,
	indirection: usize,
	unbound: Vec<StructRef>,
}

impl<'a> Resolver<'a> {
	fn new(file: &'a SchemaFile) -> Self {
		let capabilities = file
			.capabilities
			.iter()
			.map(|(name, methods)| (name.clone(), Arc::new(Capability::new(name.as_str(), methods.iter().map(String::as_str)))))
			.collect();
		Self {
			file,
			capabilities,
			structs: BTreeMap::new(),
			resolving: Vec::new(),
			indirection: 0,
			unbound: Vec::new(),
		}
	}

	fn capability(&self, name: &str) -> Result<Arc<Capability>, CliError> {
		self.capabilities
			.get(name)
			.cloned()
			.ok_or_else(|| CliError::UnknownCapability { name: name.to_owned() })
	}

	/// Shape of a struct referenced from a field, closing cycles with a [`StructRef`].
	fn struct_field(&mut self, name: &str) -> Result<Shape, CliError> {
		if let Some(start) = self.resolving.iter().position(|(pending, _)| pending == name) {
			if self.indirection > self.resolving[start].1 {
				let target = StructRef::new(name);
				self.unbound.push(target.clone());
				return Ok(Shape::Ref(target));
			}
			let mut chain: Vec<&str> = self.resolving[start..].iter().map(|(pending, _)| pending.as_str()).collect();
			chain.push(name);
			return Err(CliError::CyclicStruct { chain: chain.join(" -> ") });
		}
		Ok(Shape::Struct(self.struct_shape(name)?))
	}

	fn struct_shape(&mut self, name: &str) -> Result<Arc<StructShape>, CliError> {
		if let Some(item) = self.structs.get(name) {
			return Ok(Arc::clone(item));
		}
		let file = self.file;
		let spec = file.types.get(name).ok_or_else(|| CliError::UnknownStruct { name: name.to_owned() })?;

		self.resolving.push((name.to_owned(), self.indirection));
		let mut item = StructShape::new(name);
		for method in &spec.methods {
			item = item.method(method.as_str());
		}
		for field in &spec.fields {
			let shape = self.shape(&field.shape)?;
			item = if field.embedded {
				item.embed(field.name.as_str(), shape)
			} else {
				item.field(field.name.as_str(), shape)
			};
		}
		self.resolving.pop();

		let item = Arc::new(item);
		self.unbound.retain(|target| {
			if target.name() == name {
				target.bind(&item);
				false
			} else {
				true
			}
		});
		self.structs.insert(name.to_owned(), Arc::clone(&item));
		Ok(item)
	}

	fn shape(&mut self, spec: &ShapeSpec) -> Result<Shape, CliError> {
		let shape = match spec {
			ShapeSpec::Scalar(scalar) => match scalar {
				ScalarSpec::Bool => Shape::Bool,
				ScalarSpec::Int => Shape::Int,
				ScalarSpec::Uint => Shape::Uint,
				ScalarSpec::Float => Shape::Float,
				ScalarSpec::String => Shape::String,
				ScalarSpec::Timestamp => Shape::Timestamp,
				ScalarSpec::Duration => Shape::Duration,
				ScalarSpec::Any => Shape::any(),
			},
			ShapeSpec::Composite(composite) => match composite {
				CompositeSpec::Array { len, elem } => Shape::array(*len, self.shape(elem)?),
				CompositeSpec::Seq(elem) => Shape::seq(self.indirect(elem)?),
				CompositeSpec::Map { key, value } => Shape::map(self.indirect(key)?, self.indirect(value)?),
				CompositeSpec::Set(key) => Shape::set(self.indirect(key)?),
				CompositeSpec::Struct(name) => self.struct_field(name)?,
				CompositeSpec::Pointer(pointee) => Shape::pointer(self.indirect(pointee)?),
				CompositeSpec::Interface(name) => Shape::Interface(self.capability(name)?),
			},
		};
		Ok(shape)
	}

	/// Resolve a shape stored out of line, where a back-reference is allowed.
	fn indirect(&mut self, spec: &ShapeSpec) -> Result<Shape, CliError> {
		self.indirection += 1;
		let shape = self.shape(spec);
		self.indirection -= 1;
		shape
	}

	fn factory(&mut self, spec: &FactorySpec, registry: &Registry) -> Result<(InterfaceFactory, FactoryInfo), CliError> {
		let capability = self.capability(&spec.capability)?;
		let mut factory = InterfaceFactory::new(capability, spec.type_key.as_str());
		let mut info = FactoryInfo {
			capability: spec.capability.clone(),
			type_key: spec.type_key.clone(),
			types: Vec::with_capacity(spec.types.len()),
			instances: Vec::with_capacity(spec.instances.len()),
		};

		for (name, shape) in &spec.types {
			let shape = self.shape(shape)?;
			factory.register_type(name.as_str(), shape.clone());
			info.types.push((name.clone(), shape));
		}

		let decoder = Decoder::new(registry);
		for (name, instance) in &spec.instances {
			let shape = Shape::Struct(self.struct_shape(&instance.type_name)?);
			let data = decoder
				.decode_new(&shape, &Value::from(instance.value.clone()))
				.map_err(|source| CliError::Instance {
					capability: spec.capability.clone(),
					name: name.clone(),
					source,
				})?;
			factory.register_instance(name.as_str(), Instance::new(shape, data));
			info.instances.push(name.clone());
		}

		Ok((factory, info))
	}
}
