//! Order-preserving string encoding of floating point numbers.
//!
//! Every value maps to 16 lowercase hex digits such that for any two
//! non-NaN values `a < b` implies `encode(a) < encode(b)` byte-wise.
//! NaN collapses to a single canonical encoding.

use chrono::{DateTime, NaiveDateTime};

/// Width in chars of every encoded number.
pub const ENCODED_WIDTH: usize = 16;

const SIGN_BIT: u64 = 1 << 63;

pub fn encode(value: f64) -> String {
    let v = if value.is_nan() {
        f64::NAN
    } else if value == 0.0 {
        0.0
    } else {
        value
    };
    let bits = v.to_bits();
    let sortable = if bits & SIGN_BIT == 0 {
        bits | SIGN_BIT
    } else {
        !bits
    };
    format!("{:016x}", sortable)
}

/// Parses an XSD numeric lexical form. Unparseable input yields NaN.
pub fn parse_numeric(lexical: &str) -> f64 {
    let s = lexical.trim();
    match s {
        "INF" | "+INF" => f64::INFINITY,
        "-INF" => f64::NEG_INFINITY,
        _ => s.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Milliseconds since the Unix epoch for an `xsd:dateTime` lexical form.
/// Values without a timezone are read as UTC. Unparseable input yields NaN.
pub fn parse_date_time(lexical: &str) -> f64 {
    let s = lexical.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_millis() as f64;
    }
    match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => naive.and_utc().timestamp_millis() as f64,
        Err(_) => f64::NAN,
    }
}

pub fn encode_numeric(lexical: &str) -> String {
    encode(parse_numeric(lexical))
}

pub fn encode_date_time(lexical: &str) -> String {
    encode(parse_date_time(lexical))
}
