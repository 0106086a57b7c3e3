use std::path::PathBuf;

use crate::cmd::print::shape_label;
use crate::error::CliError;
use crate::schema::Schema;

/// Print the types, capabilities and factories declared by a schema file.
pub fn run(path: PathBuf) -> Result<(), CliError> {
	let schema = Schema::load(&path)?;

	println!("path: {}", path.display());
	println!("capabilities: {}", schema.capabilities().count());
	for capability in schema.capabilities() {
		println!("  {} [{}]", capability.name(), capability.methods().collect::<Vec<_>>().join(", "));
	}

	println!("types: {}", schema.structs().count());
	for item in schema.structs() {
		let methods: Vec<&str> = item.methods().collect();
		if methods.is_empty() {
			println!("  {}", item.name());
		} else {
			println!("  {} [{}]", item.name(), methods.join(", "));
		}
		for field in item.fields() {
			let marker = if field.embedded { " (embedded)" } else { "" };
			println!("    {} {}{}", field.name, shape_label(&field.shape), marker);
		}
	}

	println!("factories: {}", schema.factories().len());
	for info in schema.factories() {
		println!("  {} key={}", info.capability, info.type_key);
		for (name, shape) in &info.types {
			println!("    type {} -> {}", name, shape_label(shape));
		}
		for name in &info.instances {
			println!("    instance {}", name);
		}
	}

	Ok(())
}
