use std::sync::Arc;

use crate::decode::{Capability, InterfaceFactory, Registry, Shape, StructShape, Value};

pub(crate) fn stringer() -> Arc<Capability> {
	Arc::new(Capability::new("Stringer", ["String"]))
}

pub(crate) fn foo() -> Shape {
	StructShape::new("Foo").field("Msg", Shape::String).method("String").into()
}

pub(crate) fn bar() -> Shape {
	StructShape::new("Bar").field("Duration", Shape::Duration).method("String").into()
}

pub(crate) fn stringer_factory() -> InterfaceFactory {
	let mut factory = InterfaceFactory::new(stringer(), "type");
	factory.register_type("foo", foo());
	factory.register_type("bar", bar());
	factory
}

pub(crate) fn stringer_registry() -> Registry {
	let mut registry = Registry::new();
	registry.register_factory(stringer_factory());
	registry
}

pub(crate) fn map(entries: &[(&str, Value)]) -> Value {
	Value::mapping(entries.iter().map(|(key, value)| (*key, value.clone())))
}
