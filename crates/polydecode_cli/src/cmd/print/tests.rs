use std::sync::Arc;

use polydecode::decode::{Capability, Data, Decoder, NamedShape, Registry, Shape, StructRef, StructShape, Value};

use super::{DataTree, PrintOptions, shape_label};

fn outer() -> Shape {
	let embed = Shape::from(StructShape::new("Embed").field("I", Shape::Int));
	StructShape::new("Outer")
		.field("Name", Shape::String)
		.field("Inner", embed)
		.field("Tags", Shape::seq(Shape::String))
		.field("Next", Shape::pointer(Shape::Int))
		.into()
}

fn decoded_outer() -> Data {
	let registry = Registry::new();
	let src = Value::mapping([
		("Name", Value::from("x")),
		("Inner", Value::mapping([("I", Value::Int(1))])),
		("Tags", Value::from(vec![Value::from("a")])),
	]);
	Decoder::new(&registry).decode_new(&outer(), &src).expect("outer decodes")
}

#[test]
fn nested_containers_render_on_their_own_lines() {
	let rendered = DataTree::new(&decoded_outer(), PrintOptions::default()).to_string();
	let expected = "Outer {\n  Name = \"x\"\n  Inner = \n    Embed {\n      I = 1\n    }\n  Tags = \n    [\n      \"a\"\n    ]\n  Next = null\n}\n";
	assert_eq!(rendered, expected);
}

#[test]
fn depth_limit_collapses_nested_structs() {
	let options = PrintOptions {
		max_print_depth: 1,
		..PrintOptions::default()
	};
	let rendered = DataTree::new(&decoded_outer(), options).to_string();
	assert!(rendered.contains("    Embed { ... }\n"), "{rendered}");
	assert!(rendered.contains("    [... 1 items]\n"), "{rendered}");
}

#[test]
fn long_strings_and_fields_are_truncated() {
	let options = PrintOptions {
		max_fields_per_struct: 1,
		max_string_len: 3,
		..PrintOptions::default()
	};
	let registry = Registry::new();
	let data = Decoder::new(&registry)
		.decode_new(&outer(), &Value::mapping([("Name", Value::from("abcdef"))]))
		.expect("outer decodes");

	let rendered = DataTree::new(&data, options).to_string();
	assert_eq!(rendered, "Outer {\n  Name = \"abc...\"\n  ... 3 more fields\n}\n");
}

#[test]
fn verbatim_values_render_inline() {
	let value = Value::mapping([("k", Value::from(vec![Value::Int(1), Value::Null]))]);
	let rendered = DataTree::new(&Data::Any(value), PrintOptions::default()).to_string();
	assert_eq!(rendered, "{k: [1, null]}\n");
}

#[test]
fn duration_sentinels_render_by_name() {
	let rendered = DataTree::new(&Data::Duration(time::Duration::nanoseconds(i64::MAX)), PrintOptions::default()).to_string();
	assert_eq!(rendered, "doomsday\n");
	let rendered = DataTree::new(&Data::Duration(time::Duration::nanoseconds(i64::MIN)), PrintOptions::default()).to_string();
	assert_eq!(rendered, "genesis\n");
}

#[test]
fn shape_labels_are_compact() {
	let stringer = Shape::Interface(Arc::new(Capability::new("Stringer", ["String"])));
	assert_eq!(shape_label(&Shape::array(2, Shape::Int)), "[2]int");
	assert_eq!(shape_label(&Shape::seq(Shape::pointer(stringer))), "[]*Stringer");
	assert_eq!(shape_label(&Shape::set(Shape::String)), "set[string]");
	assert_eq!(shape_label(&Shape::map(Shape::String, Shape::any())), "map[string]any");
	assert_eq!(shape_label(&outer()), "Outer");
	assert_eq!(shape_label(&Shape::pointer(Shape::Ref(StructRef::new("Node")))), "*Node");
	assert_eq!(shape_label(&NamedShape::new("Level", Shape::Int).into()), "Level");
}
