//! Scalar coercion rules: one source value in, one destination scalar out.

use crate::decode::{DecodeError, Result, Value};

pub(crate) fn to_bool(src: &Value) -> Result<bool> {
	match src {
		Value::Bool(flag) => Ok(*flag),
		Value::String(text) => parse_bool_text(text),
		other => Err(DecodeError::bad_type("bool/string", other.describe())),
	}
}

pub(crate) fn to_int(src: &Value) -> Result<i64> {
	match src {
		Value::Int(value) => Ok(*value),
		Value::Uint(value) => Ok(*value as i64),
		Value::Float(value) => Ok(*value as i64),
		Value::String(text) => parse_int_text(text),
		other => Err(DecodeError::bad_type("int/string", other.describe())),
	}
}

pub(crate) fn to_uint(src: &Value) -> Result<u64> {
	match src {
		Value::Int(value) => Ok(*value as u64),
		Value::Uint(value) => Ok(*value),
		Value::Float(value) => Ok(*value as u64),
		Value::String(text) => parse_uint_text(text),
		other => Err(DecodeError::bad_type("int/string", other.describe())),
	}
}

pub(crate) fn to_float(src: &Value) -> Result<f64> {
	match src {
		Value::Int(value) => Ok(*value as f64),
		Value::Uint(value) => Ok(*value as f64),
		Value::Float(value) => Ok(*value),
		Value::String(text) => parse_float_text(text),
		other => Err(DecodeError::bad_type("int/float/string", other.describe())),
	}
}

pub(crate) fn to_string(src: &Value) -> Result<String> {
	match src {
		Value::String(text) => Ok(text.to_string()),
		other => Err(DecodeError::bad_type("string", other.describe())),
	}
}

/// Parse a signed integer: `0x` prefix is hex, other leading `0` is octal.
pub fn parse_int_text(text: &str) -> Result<i64> {
	let (digits, radix) = split_radix(text);
	i64::from_str_radix(digits, radix).map_err(|source| DecodeError::InvalidInt {
		text: text.to_owned(),
		source,
	})
}

/// Unsigned counterpart of [`parse_int_text`]; a sign of either kind is rejected.
pub fn parse_uint_text(text: &str) -> Result<u64> {
	let (digits, radix) = split_radix(text);
	// u64::from_str_radix takes a leading '+'; swap in an invalid digit.
	let digits = if digits.starts_with('+') { "-" } else { digits };
	u64::from_str_radix(digits, radix).map_err(|source| DecodeError::InvalidInt {
		text: text.to_owned(),
		source,
	})
}

fn split_radix(text: &str) -> (&str, u32) {
	if text == "0" {
		("0", 10)
	} else if let Some(hex) = text.strip_prefix("0x") {
		(hex, 16)
	} else if let Some(octal) = text.strip_prefix('0') {
		(octal, 8)
	} else {
		(text, 10)
	}
}

fn parse_bool_text(text: &str) -> Result<bool> {
	match text {
		"1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
		"0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
		_ => Err(DecodeError::InvalidBool { text: text.to_owned() }),
	}
}

fn parse_float_text(text: &str) -> Result<f64> {
	match text {
		"Inf" | "+Inf" => return Ok(f64::INFINITY),
		"-Inf" => return Ok(f64::NEG_INFINITY),
		"NaN" => return Ok(f64::NAN),
		_ => {}
	}
	let (number, scale) = match percentage_digits(text) {
		Some(number) => (number, 100.0),
		None => (text, 1.0),
	};
	number.parse::<f64>().map(|value| value / scale).map_err(|source| DecodeError::InvalidFloat {
		text: text.to_owned(),
		source,
	})
}

/// Numeric part of `<digits>[.<digits>]%`.
fn percentage_digits(text: &str) -> Option<&str> {
	let number = text.strip_suffix('%')?;
	let (whole, fraction) = match number.split_once('.') {
		Some((whole, fraction)) => (whole, Some(fraction)),
		None => (number, None),
	};
	let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|byte| byte.is_ascii_digit());
	(all_digits(whole) && fraction.is_none_or(all_digits)).then_some(number)
}
