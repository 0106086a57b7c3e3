use std::sync::Arc;

use crate::decode::test_support::{bar, foo, map, stringer, stringer_factory, stringer_registry};
use crate::decode::{Data, DecodeError, Instance, InterfaceFactory, Record, Registry, Shape, Value, decode};

fn decode_stringer(registry: &Registry, src: &Value) -> Result<Data, DecodeError> {
	let shape = Shape::Interface(stringer());
	let mut dest = shape.zero();
	decode(registry, &shape, &mut dest, src).map(|()| dest)
}

#[test]
fn discriminator_selects_registered_type() {
	let registry = stringer_registry();
	let src = map(&[("type", "foo".into()), ("Msg", "hi".into())]);

	let dest = decode_stringer(&registry, &src).expect("foo decodes");
	let instance = dest.as_instance().expect("slot filled");
	assert_eq!(instance.type_name(), "Foo");
	let record = instance.record().expect("foo is a struct");
	assert_eq!(record.get("Msg"), Some(&Data::String("hi".into())));
}

#[test]
fn created_instance_fields_use_full_coercion() {
	let registry = stringer_registry();
	let src = map(&[("type", "bar".into()), ("Duration", "1m30s".into())]);

	let dest = decode_stringer(&registry, &src).expect("bar decodes");
	let record = dest.as_instance().and_then(|instance| instance.record()).expect("bar record");
	assert_eq!(record.get("Duration"), Some(&Data::Duration(time::Duration::seconds(90))));
}

#[test]
fn registered_instance_is_shared_not_copied() {
	let mut factory = stringer_factory();
	let Shape::Struct(item) = foo() else {
		panic!("foo is a struct shape");
	};
	let record = Record::zero(&item);
	let singleton = Arc::new(Instance::new(foo(), Data::Struct(record)));
	factory.register_instance("singleton", Arc::clone(&singleton));
	// instances win over types sharing the discriminator
	factory.register_instance("foo", Arc::clone(&singleton));
	let mut registry = Registry::new();
	registry.register_factory(factory);

	for name in ["singleton", "foo"] {
		let src = map(&[("type", name.into()), ("Msg", "ignored".into())]);
		let dest = decode_stringer(&registry, &src).expect("instance resolves");
		let instance = dest.as_instance().expect("slot filled");
		assert!(Arc::ptr_eq(instance, &singleton), "{name} should return the shared instance");
	}
}

#[test]
fn pointer_registered_type_allocates_pointee() {
	let mut factory = InterfaceFactory::new(stringer(), "type");
	factory.register_type("foo", Shape::pointer(foo()));
	let mut registry = Registry::new();
	registry.register_factory(factory);

	let src = map(&[("type", "foo".into()), ("Msg", "via pointer".into())]);
	let dest = decode_stringer(&registry, &src).expect("pointer type decodes");
	let instance = dest.as_instance().expect("slot filled");
	assert!(matches!(instance.data, Data::Pointer(Some(_))));
	assert_eq!(instance.type_name(), "Foo");
	assert_eq!(instance.record().and_then(|record| record.get("Msg")), Some(&Data::String("via pointer".into())));
}

#[test]
fn bad_discriminators_leave_destination_unchanged() {
	let registry = stringer_registry();
	let shape = Shape::Interface(stringer());

	for src in [
		map(&[("Msg", "hi".into())]),
		map(&[("type", "".into())]),
		map(&[("type", Value::Int(3))]),
	] {
		let mut dest = shape.zero();
		let err = decode(&registry, &shape, &mut dest, &src).expect_err("discriminator rejected");
		assert!(matches!(err, DecodeError::MissingDiscriminator { ref key } if key == "type"), "{err}");
		assert_eq!(dest, Data::Interface(None));
	}

	let mut dest = shape.zero();
	let err = decode(&registry, &shape, &mut dest, &map(&[("type", "baz".into())])).expect_err("unknown name");
	assert!(matches!(err, DecodeError::UnknownType { ref name, .. } if name == "baz"));
	assert_eq!(dest, Data::Interface(None));
}

#[test]
fn unregistered_capability_is_reported() {
	let registry = Registry::new();
	let err = decode_stringer(&registry, &map(&[("type", "foo".into())])).expect_err("no factory");
	assert_eq!(err.to_string(), "unregistered type: \"Stringer\"");
}

#[test]
fn field_failure_names_the_discriminator() {
	let registry = stringer_registry();
	let src = map(&[("type", "bar".into()), ("Duration", "soon".into())]);

	let err = decode_stringer(&registry, &src).expect_err("bad duration");
	assert!(matches!(err, DecodeError::Create { ref name, .. } if name == "bar"));
	assert!(matches!(err.root_cause(), DecodeError::InvalidDuration { .. }));
}

#[test]
fn initializer_runs_after_population() {
	let factory = stringer_factory().with_initializer(|instance| {
		let Data::Struct(record) = &mut instance.data else {
			return Err("expected struct".into());
		};
		match record.get("Msg") {
			Some(Data::String(text)) if text.is_empty() => Err("empty message".into()),
			Some(Data::String(text)) => {
				let upper = text.to_uppercase();
				record.set("Msg", Data::String(upper));
				Ok(())
			}
			_ => Ok(()),
		}
	});
	let mut registry = Registry::new();
	registry.register_factory(factory);

	let dest = decode_stringer(&registry, &map(&[("type", "foo".into()), ("Msg", "hi".into())])).expect("initializer accepts");
	let record = dest.as_instance().and_then(|instance| instance.record()).expect("record");
	assert_eq!(record.get("Msg"), Some(&Data::String("HI".into())));

	let err = decode_stringer(&registry, &map(&[("type", "foo".into())])).expect_err("initializer rejects");
	assert_eq!(err.to_string(), "initialize Foo fail: empty message");
}

#[test]
fn register_factory_replaces_previous_entry() {
	let mut registry = stringer_registry();
	let mut only_bar = InterfaceFactory::new(stringer(), "kind");
	only_bar.register_type("bar", bar());

	let previous = registry.register_factory(only_bar).expect("previous factory returned");
	assert_eq!(previous.capability().name(), "Stringer");
	assert_eq!(registry.len(), 1);

	let err = decode_stringer(&registry, &map(&[("type", "foo".into())])).expect_err("old key gone");
	assert!(matches!(err, DecodeError::MissingDiscriminator { ref key } if key == "kind"));
	decode_stringer(&registry, &map(&[("kind", "bar".into()), ("Duration", "1s".into())])).expect("new factory used");
}

#[test]
fn try_register_rejects_duplicates() {
	let mut registry = Registry::new();
	registry.try_register_factory(stringer_factory()).expect("first registration");
	let err = registry.try_register_factory(stringer_factory()).expect_err("duplicate");
	assert!(matches!(err, DecodeError::DuplicateFactory { ref capability } if capability == "Stringer"));
	assert_eq!(registry.capabilities(), vec!["Stringer"]);
}

#[test]
fn clear_empties_registry() {
	let mut registry = stringer_registry();
	assert!(!registry.is_empty());
	registry.clear();
	assert!(registry.is_empty());
	assert!(registry.factory("Stringer").is_none());
}

#[test]
fn factory_listing_is_sorted() {
	let factory = stringer_factory();
	let names: Vec<&str> = factory.types().into_iter().map(|(name, _)| name).collect();
	assert_eq!(names, vec!["bar", "foo"]);
	assert_eq!(factory.type_key(), "type");
	assert!(factory.instances().is_empty());
}
