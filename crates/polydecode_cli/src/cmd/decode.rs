use std::path::PathBuf;

use polydecode::decode::{DecodeOptions, Decoder, Value};

use crate::cmd::print::{DataTree, PrintOptions};
use crate::error::CliError;
use crate::schema::Schema;

/// Decode a JSON document into a schema struct type and print the result.
pub fn run(schema_path: PathBuf, input: PathBuf, type_name: String, max_depth: Option<u32>) -> Result<(), CliError> {
	let schema = Schema::load(&schema_path)?;
	let shape = schema.struct_shape(&type_name)?;

	let bytes = std::fs::read(&input).map_err(|source| CliError::Read {
		path: input.clone(),
		source,
	})?;
	let document: serde_json::Value = serde_json::from_slice(&bytes).map_err(|source| CliError::Json {
		path: input.clone(),
		source,
	})?;

	let options = DecodeOptions { max_depth };
	let data = Decoder::with_options(schema.registry(), options).decode_new(&shape, &Value::from(document))?;

	println!("path: {}", input.display());
	println!("type: {type_name}");
	println!("decoded:");
	print!("{}", DataTree::new(&data, PrintOptions::default()));

	Ok(())
}
