use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::decode::{BoxError, Capability, DecodeError, Instance, Result, Scope, Shape, Value};

/// Manufactures concrete instances for one capability.
pub trait Factory: Send + Sync {
	/// Capability whose interface slots this factory fills.
	fn capability(&self) -> &Arc<Capability>;

	/// Build an instance from `src`, a source mapping.
	fn create(&self, scope: Scope<'_>, src: &Value) -> Result<Arc<Instance>>;
}

/// Capability-keyed factory table consulted for interface slots.
///
/// Populate it before decoding: registration needs `&mut Registry`, decoders
/// only borrow it.
#[derive(Default)]
pub struct Registry {
	factories: HashMap<Box<str>, Arc<dyn Factory>>,
}

impl Registry {
	/// Empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `factory` under its capability, replacing any previous entry.
	///
	/// Returns the replaced factory; entries are never merged.
	pub fn register_factory(&mut self, factory: impl Factory + 'static) -> Option<Arc<dyn Factory>> {
		let factory: Arc<dyn Factory> = Arc::new(factory);
		let name: Box<str> = factory.capability().name().into();
		let previous = self.factories.insert(name.clone(), factory);
		if previous.is_some() {
			warn!(capability = %name, "factory replaced");
		} else {
			debug!(capability = %name, "factory registered");
		}
		previous
	}

	/// Register `factory` unless its capability already has one.
	pub fn try_register_factory(&mut self, factory: impl Factory + 'static) -> Result<()> {
		let name = factory.capability().name();
		if self.factories.contains_key(name) {
			return Err(DecodeError::DuplicateFactory { capability: name.to_owned() });
		}
		self.register_factory(factory);
		Ok(())
	}

	/// Factory registered for `capability`.
	pub fn factory(&self, capability: &str) -> Option<&Arc<dyn Factory>> {
		self.factories.get(capability)
	}

	/// Registered capability names, sorted.
	pub fn capabilities(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.factories.keys().map(AsRef::as_ref).collect();
		names.sort_unstable();
		names
	}

	/// Number of registered factories.
	pub fn len(&self) -> usize {
		self.factories.len()
	}

	/// Whether no factory is registered.
	pub fn is_empty(&self) -> bool {
		self.factories.is_empty()
	}

	/// Drop every factory.
	pub fn clear(&mut self) {
		self.factories.clear();
	}

	pub(crate) fn create(&self, scope: Scope<'_>, capability: &Capability, src: &Value) -> Result<Arc<Instance>> {
		let factory = self.factory(capability.name()).ok_or_else(|| DecodeError::UnregisteredType {
			capability: capability.name().to_owned(),
		})?;
		factory.create(scope, src)
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry").field("capabilities", &self.capabilities()).finish()
	}
}

/// Post-construction hook run on every instance a factory builds.
pub type Initializer = Arc<dyn Fn(&mut Instance) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Factory selecting a concrete type by a discriminator key in the source mapping.
///
/// Named instances take precedence over types and are shared, not copied.
pub struct InterfaceFactory {
	capability: Arc<Capability>,
	type_key: Box<str>,
	types: HashMap<Box<str>, Shape>,
	instances: HashMap<Box<str>, Arc<Instance>>,
	initializer: Option<Initializer>,
}

impl InterfaceFactory {
	/// Factory for `capability` reading the discriminator from `type_key`.
	pub fn new(capability: impl Into<Arc<Capability>>, type_key: impl Into<Box<str>>) -> Self {
		Self {
			capability: capability.into(),
			type_key: type_key.into(),
			types: HashMap::new(),
			instances: HashMap::new(),
			initializer: None,
		}
	}

	/// Run `initializer` on every newly built instance.
	pub fn with_initializer<F>(mut self, initializer: F) -> Self
	where
		F: Fn(&mut Instance) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
	{
		self.initializer = Some(Arc::new(initializer));
		self
	}

	/// Associate `name` with a concrete shape, returning the replaced shape.
	pub fn register_type(&mut self, name: impl Into<Box<str>>, shape: Shape) -> Option<Shape> {
		self.types.insert(name.into(), shape)
	}

	/// Associate `name` with a shared instance, returning the replaced one.
	pub fn register_instance(&mut self, name: impl Into<Box<str>>, instance: impl Into<Arc<Instance>>) -> Option<Arc<Instance>> {
		self.instances.insert(name.into(), instance.into())
	}

	/// Discriminator key.
	pub fn type_key(&self) -> &str {
		&self.type_key
	}

	/// Registered types, sorted by discriminator.
	pub fn types(&self) -> Vec<(&str, &Shape)> {
		let mut types: Vec<(&str, &Shape)> = self.types.iter().map(|(name, shape)| (name.as_ref(), shape)).collect();
		types.sort_unstable_by_key(|(name, _)| *name);
		types
	}

	/// Registered instances, sorted by discriminator.
	pub fn instances(&self) -> Vec<(&str, &Arc<Instance>)> {
		let mut instances: Vec<(&str, &Arc<Instance>)> = self.instances.iter().map(|(name, item)| (name.as_ref(), item)).collect();
		instances.sort_unstable_by_key(|(name, _)| *name);
		instances
	}

	fn build(&self, scope: Scope<'_>, name: &str, shape: &Shape, src: &Value) -> Result<Instance> {
		let mut data = shape.zero();
		let decoded = match shape {
			Shape::Pointer(pointee) => scope.decode(pointee, data.pointee_mut(pointee), src),
			shape => scope.decode(shape, &mut data, src),
		};
		decoded.map_err(|err| DecodeError::Create {
			name: name.to_owned(),
			source: Box::new(err),
		})?;
		Ok(Instance::new(shape.clone(), data))
	}
}

impl Factory for InterfaceFactory {
	fn capability(&self) -> &Arc<Capability> {
		&self.capability
	}

	fn create(&self, scope: Scope<'_>, src: &Value) -> Result<Arc<Instance>> {
		let Some(data) = src.as_mapping() else {
			return Err(DecodeError::bad_type("mapping", src.describe()));
		};
		let name = match data.get(&*self.type_key) {
			Some(Value::String(name)) if !name.is_empty() => name.as_ref(),
			_ => {
				return Err(DecodeError::MissingDiscriminator {
					key: self.type_key.to_string(),
				});
			}
		};

		if let Some(instance) = self.instances.get(name) {
			trace!(capability = self.capability.name(), name, "shared instance");
			return Ok(Arc::clone(instance));
		}
		let shape = self.types.get(name).ok_or_else(|| DecodeError::UnknownType {
			capability: self.capability.name().to_owned(),
			name: name.to_owned(),
		})?;
		trace!(capability = self.capability.name(), name, "building instance");

		let mut instance = self.build(scope, name, shape, src)?;
		if let Some(initializer) = &self.initializer {
			initializer(&mut instance).map_err(|source| DecodeError::InitializerFailure {
				type_name: instance.type_name().to_owned(),
				source,
			})?;
		}
		Ok(Arc::new(instance))
	}
}

#[cfg(test)]
mod tests;
