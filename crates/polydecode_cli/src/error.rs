use std::path::PathBuf;

use polydecode::decode::DecodeError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
	/// Input or schema file could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Read {
		/// File path.
		path: PathBuf,
		/// Underlying IO failure.
		source: std::io::Error,
	},
	/// File contents are not valid JSON for the expected document.
	#[error("invalid json in {}: {source}", path.display())]
	Json {
		/// File path.
		path: PathBuf,
		/// Parser failure.
		source: serde_json::Error,
	},
	/// Shape references an undeclared struct type.
	#[error("unknown struct type: {name}")]
	UnknownStruct {
		/// Referenced name.
		name: String,
	},
	/// Shape or factory references an undeclared capability.
	#[error("unknown capability: {name}")]
	UnknownCapability {
		/// Referenced name.
		name: String,
	},
	/// Struct types reference each other in a loop.
	#[error("cyclic struct reference: {chain}")]
	CyclicStruct {
		/// Reference chain, ending at the repeated type.
		chain: String,
	},
	/// Factory instance value failed to decode into its type.
	#[error("instance {name} for {capability}: {source}")]
	Instance {
		/// Capability the factory serves.
		capability: String,
		/// Instance discriminator.
		name: String,
		/// Decode failure.
		source: DecodeError,
	},
	/// Input document failed to decode.
	#[error(transparent)]
	Decode(#[from] DecodeError),
}
