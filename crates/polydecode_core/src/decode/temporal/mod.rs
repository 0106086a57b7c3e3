use std::ops::Range;

use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::decode::{DecodeError, Result};

/// Duration literal for the most negative representable span.
pub const GENESIS: &str = "genesis";
/// Duration literal for the most positive representable span.
pub const DOOMSDAY: &str = "doomsday";

/// One accepted timestamp layout; `sample` fixes the text width it accepts.
struct TimeLayout {
	sample: &'static str,
	parse: fn(&str) -> Option<OffsetDateTime>,
}

const TIME_LAYOUTS: &[TimeLayout] = &[
	TimeLayout {
		sample: "2006-01-02:15:04:05",
		parse: parse_compact,
	},
	TimeLayout {
		sample: "2006-01-02:15:04:05-0700",
		parse: parse_compact_offset,
	},
	TimeLayout {
		sample: "Mon Jan  2 15:04:05 2006",
		parse: parse_ansic,
	},
	TimeLayout {
		sample: "Mon Jan  2 15:04:05 MST 2006",
		parse: parse_unix_date,
	},
	TimeLayout {
		sample: "Mon Jan 02 15:04:05 -0700 2006",
		parse: parse_ruby,
	},
	TimeLayout {
		sample: "02 Jan 06 15:04 MST",
		parse: parse_rfc822,
	},
	TimeLayout {
		sample: "02 Jan 06 15:04 -0700",
		parse: parse_rfc822_offset,
	},
	TimeLayout {
		sample: "Monday, 02-Jan-06 15:04:05 MST",
		parse: parse_rfc850,
	},
	TimeLayout {
		sample: "Mon, 02 Jan 2006 15:04:05 MST",
		parse: parse_rfc1123,
	},
	TimeLayout {
		sample: "Mon, 02 Jan 2006 15:04:05 -0700",
		parse: parse_rfc2822,
	},
	TimeLayout {
		sample: "2006-01-02T15:04:05Z",
		parse: parse_rfc3339,
	},
	TimeLayout {
		sample: "2006-01-02T15:04:05+07:00",
		parse: parse_rfc3339,
	},
	TimeLayout {
		sample: "2006-01-02T15:04:05.999999999+07:00",
		parse: parse_rfc3339,
	},
	TimeLayout {
		sample: "3:04PM",
		parse: parse_kitchen,
	},
	TimeLayout {
		sample: "Jan  2 15:04:05",
		parse: parse_stamp,
	},
	TimeLayout {
		sample: "Jan  2 15:04:05.000",
		parse: parse_stamp_milli,
	},
	TimeLayout {
		sample: "Jan  2 15:04:05.000000",
		parse: parse_stamp_micro,
	},
	TimeLayout {
		sample: "Jan  2 15:04:05.000000000",
		parse: parse_stamp_nano,
	},
];

/// Parse a timestamp with the first layout of matching width that accepts it.
pub fn parse_timestamp(text: &str) -> Result<OffsetDateTime> {
	TIME_LAYOUTS
		.iter()
		.filter(|layout| layout.sample.len() == text.len())
		.find_map(|layout| (layout.parse)(text))
		.ok_or_else(|| DecodeError::UnknownTimeLayout { text: text.to_owned() })
}

/// Parse a duration literal or one of the [`GENESIS`]/[`DOOMSDAY`] sentinels.
pub fn parse_duration(text: &str) -> Result<Duration> {
	match text {
		GENESIS => Ok(Duration::nanoseconds(i64::MIN)),
		DOOMSDAY => Ok(Duration::nanoseconds(i64::MAX)),
		_ => parse_nanos(text)
			.map(Duration::nanoseconds)
			.ok_or_else(|| DecodeError::InvalidDuration { text: text.to_owned() }),
	}
}

fn parse_compact(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year]-[month]-[day]:[hour]:[minute]:[second]");
	PrimitiveDateTime::parse(text, &format).ok().map(PrimitiveDateTime::assume_utc)
}

fn parse_compact_offset(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year]-[month]-[day]:[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]");
	OffsetDateTime::parse(text, &format).ok()
}

fn parse_ansic(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[weekday repr:short] [month repr:short] [day padding:space] [hour]:[minute]:[second] [year]");
	PrimitiveDateTime::parse(text, &format).ok().map(PrimitiveDateTime::assume_utc)
}

fn parse_ruby(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]");
	OffsetDateTime::parse(text, &format).ok()
}

fn parse_unix_date(text: &str) -> Option<OffsetDateTime> {
	parse_ansic(&strip_zone(text, 19..23)?)
}

fn parse_rfc822(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[day] [month repr:short] [year] [hour]:[minute]");
	let text = expand_year(&strip_zone(text, 15..19)?, 7)?;
	PrimitiveDateTime::parse(&text, &format).ok().map(PrimitiveDateTime::assume_utc)
}

fn parse_rfc822_offset(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[day] [month repr:short] [year] [hour]:[minute] [offset_hour sign:mandatory][offset_minute]");
	OffsetDateTime::parse(&expand_year(text, 7)?, &format).ok()
}

fn parse_rfc850(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[weekday], [day]-[month repr:short]-[year] [hour]:[minute]:[second]");
	let text = expand_year(&strip_zone(text, 26..30)?, 15)?;
	PrimitiveDateTime::parse(&text, &format).ok().map(PrimitiveDateTime::assume_utc)
}

fn parse_rfc1123(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second]");
	PrimitiveDateTime::parse(&strip_zone(text, 25..29)?, &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

fn parse_rfc2822(text: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(text, &Rfc2822).ok()
}

fn parse_rfc3339(text: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(text, &Rfc3339).ok()
}

/// Clock-only layouts land on January 1st of year zero.
fn parse_kitchen(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year]-[month]-[day] [hour repr:12 padding:none]:[minute][period]");
	PrimitiveDateTime::parse(&format!("0000-01-01 {text}"), &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

fn parse_stamp(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year] [month repr:short] [day padding:space] [hour]:[minute]:[second]");
	PrimitiveDateTime::parse(&format!("0000 {text}"), &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

fn parse_stamp_milli(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year] [month repr:short] [day padding:space] [hour]:[minute]:[second].[subsecond digits:3]");
	PrimitiveDateTime::parse(&format!("0000 {text}"), &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

fn parse_stamp_micro(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year] [month repr:short] [day padding:space] [hour]:[minute]:[second].[subsecond digits:6]");
	PrimitiveDateTime::parse(&format!("0000 {text}"), &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

fn parse_stamp_nano(text: &str) -> Option<OffsetDateTime> {
	let format = format_description!("[year] [month repr:short] [day padding:space] [hour]:[minute]:[second].[subsecond digits:9]");
	PrimitiveDateTime::parse(&format!("0000 {text}"), &format)
		.ok()
		.map(PrimitiveDateTime::assume_utc)
}

/// Cut a space-led zone abbreviation out of `text`; abbreviations read as UTC.
fn strip_zone(text: &str, zone: Range<usize>) -> Option<String> {
	let abbreviation = text.get(zone.clone())?.strip_prefix(' ')?;
	if !abbreviation.bytes().all(|byte| byte.is_ascii_uppercase()) {
		return None;
	}
	Some(format!("{}{}", &text[..zone.start], &text[zone.end..]))
}

/// Widen the two-digit year at `at`: 69 and above are 19xx, the rest 20xx.
fn expand_year(text: &str, at: usize) -> Option<String> {
	let digits = text.get(at..at + 2)?;
	if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	}
	let century = if digits >= "69" { "19" } else { "20" };
	Some(format!("{}{century}{}", &text[..at], &text[at..]))
}

/// Nanoseconds of `[-+]?(<digits>[.<digits>]<unit>)+`, or bare `0`.
fn parse_nanos(text: &str) -> Option<i64> {
	let (negative, mut rest) = match text.as_bytes().first() {
		Some(b'-') => (true, &text[1..]),
		Some(b'+') => (false, &text[1..]),
		_ => (false, text),
	};
	if rest == "0" {
		return Some(0);
	}
	if rest.is_empty() {
		return None;
	}

	let mut total: u64 = 0;
	while !rest.is_empty() {
		let (whole, tail) = split_digits(rest);
		let (fraction, tail) = match tail.strip_prefix('.') {
			Some(after) => split_digits(after),
			None => ("", tail),
		};
		if whole.is_empty() && fraction.is_empty() {
			return None;
		}

		let unit_end = tail.find(|c: char| c == '.' || c.is_ascii_digit()).unwrap_or(tail.len());
		let (unit, next) = tail.split_at(unit_end);
		let scale = unit_nanos(unit)?;

		let whole = if whole.is_empty() { 0 } else { whole.parse::<u64>().ok()? };
		let mut nanos = whole.checked_mul(scale)?;
		if !fraction.is_empty() {
			nanos = nanos.checked_add(fraction_nanos(fraction, scale))?;
		}
		total = total.checked_add(nanos)?;
		if total > 1 << 63 {
			return None;
		}
		rest = next;
	}

	if negative {
		i64::try_from(-i128::from(total)).ok()
	} else {
		i64::try_from(total).ok()
	}
}

fn split_digits(text: &str) -> (&str, &str) {
	let end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(text.len());
	text.split_at(end)
}

/// Scaled fractional part; digits beyond u64 precision are dropped.
fn fraction_nanos(fraction: &str, scale: u64) -> u64 {
	let mut value: u64 = 0;
	let mut divisor = 1.0_f64;
	for digit in fraction.bytes() {
		if value > (u64::MAX - 9) / 10 {
			break;
		}
		value = value * 10 + u64::from(digit - b'0');
		divisor *= 10.0;
	}
	(value as f64 * (scale as f64 / divisor)) as u64
}

fn unit_nanos(unit: &str) -> Option<u64> {
	match unit {
		"ns" => Some(1),
		"us" | "\u{b5}s" | "\u{3bc}s" => Some(1_000),
		"ms" => Some(1_000_000),
		"s" => Some(1_000_000_000),
		"m" => Some(60 * 1_000_000_000),
		"h" => Some(60 * 60 * 1_000_000_000),
		_ => None,
	}
}
