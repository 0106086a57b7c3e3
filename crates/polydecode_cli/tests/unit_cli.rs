#![allow(missing_docs)]

use std::process::{Command, Output};

use polydecode_testkit::fixture_path;

fn run_polydecode(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_polydecode"))
		.args(args)
		.env_remove("RUST_LOG")
		.output()
		.expect("polydecode command executes")
}

fn fixture(name: &str) -> String {
	fixture_path(name).display().to_string()
}

fn stdout_of(output: &Output) -> String {
	assert!(
		output.status.success(),
		"polydecode failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	String::from_utf8(output.stdout.clone()).expect("stdout should be utf-8")
}

#[test]
fn schema_command_lists_declarations() {
	let stdout = stdout_of(&run_polydecode(&["schema", &fixture("stringers.schema.json")]));

	assert!(stdout.contains("capabilities: 2\n"), "{stdout}");
	assert!(stdout.contains("  Stringer [String]\n"), "{stdout}");
	assert!(stdout.contains("types: 6\n"), "{stdout}");
	assert!(stdout.contains("    EmbedB *Embed\n"), "{stdout}");
	assert!(stdout.contains("    Embed Embed (embedded)\n"), "{stdout}");
	assert!(stdout.contains("  Stringer key=type\n"), "{stdout}");
	assert!(stdout.contains("    type Bar -> *Bar\n"), "{stdout}");
	assert!(stdout.contains("    instance Instance\n"), "{stdout}");
}

#[test]
fn decode_command_prints_polymorphic_slots() {
	let stdout = stdout_of(&run_polydecode(&[
		"decode",
		&fixture("stringers.schema.json"),
		&fixture("holder.json"),
		"--type",
		"Holder",
	]));

	assert!(stdout.contains("type: Holder\n"), "{stdout}");
	assert!(stdout.contains("  Stringer1 = \n    Foo {\n      Text = \"hello\"\n    }\n"), "{stdout}");
	assert!(stdout.contains("  Instance = \n    Foo {\n      Text = \"instance\"\n    }\n"), "{stdout}");
	assert!(stdout.contains("  Texter = null\n"), "{stdout}");
}

#[test]
fn decode_command_coerces_sample_document() {
	let stdout = stdout_of(&run_polydecode(&[
		"decode",
		&fixture("stringers.schema.json"),
		&fixture("sample.json"),
		"--type",
		"Sample",
	]));

	assert!(stdout.contains("  IntHex = 268435455\n"), "{stdout}");
	assert!(stdout.contains("  IntOct = 493\n"), "{stdout}");
	assert!(stdout.contains("  FloatA = 0.125\n"), "{stdout}");
	assert!(stdout.contains("  TimeA = 2020-01-02T15:04:05"), "{stdout}");
	assert!(stdout.contains("  Extra = {nested: [true, null]}\n"), "{stdout}");
}

#[test]
fn decode_failures_exit_nonzero_with_context() {
	let output = run_polydecode(&[
		"decode",
		&fixture("stringers.schema.json"),
		&fixture("unknown_type.json"),
		"--type",
		"Holder",
	]);

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("error: field Stringer1: unknown type \"unknown\" for Stringer"), "{stderr}");
}

#[test]
fn max_depth_bounds_decoding() {
	let output = run_polydecode(&[
		"decode",
		&fixture("stringers.schema.json"),
		&fixture("holder.json"),
		"--type",
		"Holder",
		"--max-depth",
		"1",
	]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("decode depth exceeded (max=1)"));
}

#[test]
fn unknown_type_name_is_reported() {
	let output = run_polydecode(&[
		"decode",
		&fixture("stringers.schema.json"),
		&fixture("holder.json"),
		"--type",
		"Nope",
	]);

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("error: unknown struct type: Nope"));
}
