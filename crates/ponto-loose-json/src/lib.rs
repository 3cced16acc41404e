#![warn(missing_docs)]
//! # ponto-loose-json
//!
//! ## Purpose
//! Decodes the JSON-like payloads returned by the timekeeping API.
//!
//! ## Responsibilities
//! - Parse payloads with bare object keys, single-quoted strings, trailing
//!   commas and raw `new Date(...)` constructor calls.
//! - Keep date constructors as a distinct [`LooseValue::Date`] variant.
//! - Lower parsed values into `serde_json::Value`, turning each date into the
//!   opaque string `"new Date(a,b,...)"`, so typed decoding goes through serde.
//! - Write values back into the loose form with [`encode_loose`].
//!
//! ## Data flow
//! Raw response body -> [`parse_loose`] -> [`LooseValue`] ->
//! [`LooseValue::into_json`] -> serde structs. Date fields use
//! [`deserialize_date_marker`] to recover a `NaiveDateTime`.
//!
//! ## Ownership and lifetimes
//! Parsed values own their strings; nothing borrows from the response body.
//!
//! ## Error model
//! Grammar violations, malformed dates and shape mismatches return
//! [`DecodeError`].
//!
//! ## Example
//! ```rust
//! use ponto_loose_json::{LooseValue, parse_loose};
//!
//! let value = parse_loose("{useCracha:true,dtTimeEvent:new Date(2023,5,1,10,30,0)}").unwrap();
//! let LooseValue::Object(fields) = value else { panic!("object expected") };
//! assert!(matches!(fields[1].1, LooseValue::Date(_)));
//! ```

mod date;
mod parser;

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;

pub use date::{DateArgs, deserialize_date_marker, is_date_marker};

/// Maximum array/object nesting accepted by the parser.
pub const MAX_DEPTH: usize = 128;

/// One parsed loose-JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum LooseValue {
    /// `null`.
    Null,
    /// `true` / `false`.
    Bool(bool),
    /// Integer or floating point literal.
    Number(Number),
    /// Quoted string.
    String(String),
    /// `[ ... ]`.
    Array(Vec<LooseValue>),
    /// `{ ... }` in source order; duplicate keys are kept.
    Object(Vec<(String, LooseValue)>),
    /// `new Date(...)` pseudo-constructor.
    Date(DateArgs),
}

impl LooseValue {
    /// Returns the last value stored under `key` when `self` is an object.
    pub fn get(&self, key: &str) -> Option<&LooseValue> {
        match self {
            LooseValue::Object(fields) => fields
                .iter()
                .rev()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Lowers into a strict JSON value.
    ///
    /// Dates become their marker string; duplicate keys keep the last value.
    pub fn into_json(self) -> Value {
        match self {
            LooseValue::Null => Value::Null,
            LooseValue::Bool(flag) => Value::Bool(flag),
            LooseValue::Number(number) => Value::Number(number),
            LooseValue::String(text) => Value::String(text),
            LooseValue::Array(items) => {
                Value::Array(items.into_iter().map(LooseValue::into_json).collect())
            }
            LooseValue::Object(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    map.insert(key, value.into_json());
                }
                Value::Object(map)
            }
            LooseValue::Date(args) => Value::String(args.marker()),
        }
    }
}

/// Parses a loose-JSON document.
///
/// # Errors
/// Returns a [`DecodeError`] describing the first grammar violation.
pub fn parse_loose(raw: &str) -> Result<LooseValue, DecodeError> {
    parser::Parser::new(raw).parse_document()
}

/// Parses a loose-JSON document and lowers it into strict JSON.
///
/// # Errors
/// Returns a [`DecodeError`] when the document is malformed.
pub fn parse_loose_json(raw: &str) -> Result<Value, DecodeError> {
    parse_loose(raw).map(LooseValue::into_json)
}

/// Parses a loose-JSON document straight into a typed value.
///
/// # Errors
/// Returns [`DecodeError::Shape`] when the parsed value does not match `T`.
pub fn decode_loose<T: DeserializeOwned>(raw: &str) -> Result<T, DecodeError> {
    let json = parse_loose_json(raw)?;
    serde_json::from_value(json).map_err(DecodeError::Shape)
}

/// Writes a JSON value in loose form.
///
/// Strings holding a canonical date marker are written as raw
/// `new Date(...)` calls, so `parse_loose_json(&encode_loose(v)) == v`.
pub fn encode_loose(value: &Value) -> String {
    let mut out = String::new();
    write_loose(value, &mut out);
    out
}

fn write_loose(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_loose(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_loose(item, out);
            }
            out.push('}');
        }
        Value::String(text) if date::is_canonical_marker(text) => out.push_str(text),
        leaf => out.push_str(&leaf.to_string()),
    }
}

/// Loose-JSON decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Input ended inside a value.
    #[error("unexpected end of input at byte {offset}, expected {expected}")]
    UnexpectedEnd {
        /// Byte offset where input ended.
        offset: usize,
        /// What the grammar expected next.
        expected: &'static str,
    },
    /// A character the grammar does not allow at this position.
    #[error("unexpected character {found:?} at byte {offset}, expected {expected}")]
    UnexpectedChar {
        /// Byte offset of the offending character.
        offset: usize,
        /// Offending character.
        found: char,
        /// What the grammar expected instead.
        expected: &'static str,
    },
    /// Bare word that is not a literal or `new Date`.
    #[error("unknown bare word {word:?} at byte {offset}")]
    UnknownWord {
        /// Byte offset of the word.
        offset: usize,
        /// The word itself.
        word: String,
    },
    /// Malformed escape inside a string.
    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape {
        /// Byte offset of the backslash.
        offset: usize,
    },
    /// Numeric literal that does not parse.
    #[error("invalid number {literal:?} at byte {offset}")]
    InvalidNumber {
        /// Byte offset of the literal.
        offset: usize,
        /// Literal text.
        literal: String,
    },
    /// Nesting deeper than [`MAX_DEPTH`].
    #[error("nesting deeper than {MAX_DEPTH} levels at byte {offset}")]
    TooDeep {
        /// Byte offset of the container that crossed the limit.
        offset: usize,
    },
    /// Non-whitespace after the top-level value.
    #[error("trailing characters at byte {offset}")]
    TrailingCharacters {
        /// Byte offset of the first trailing character.
        offset: usize,
    },
    /// Date marker that is malformed or names an impossible instant.
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// Parsed value does not match the expected payload shape.
    #[error("payload shape mismatch: {0}")]
    Shape(#[from] serde_json::Error),
}
