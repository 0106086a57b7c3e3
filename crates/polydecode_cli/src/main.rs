#![allow(missing_docs)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod error;
mod schema;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "polydecode", about = "Schema-driven decoding of JSON documents")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Schema {
		path: PathBuf,
	},
	Decode {
		schema: PathBuf,
		input: PathBuf,
		#[arg(long = "type")]
		type_name: String,
		#[arg(long)]
		max_depth: Option<u32>,
	},
}

fn main() {
	init_tracing();
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), CliError> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Schema { path } => cmd::schema::run(path),
		Commands::Decode {
			schema,
			input,
			type_name,
			max_depth,
		} => cmd::decode::run(schema, input, type_name, max_depth),
	}
}

fn init_tracing() {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.try_init();
}
