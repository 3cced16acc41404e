//! Recursive-descent parser for the loose-JSON grammar.
//!
//! ```text
//! value   := object | array | string | number | "true" | "false" | "null" | date
//! object  := "{" (key ":" value ("," key ":" value)* ","?)? "}"
//! key     := string | identifier
//! array   := "[" (value ("," value)* ","?)? "]"
//! string  := '"' chars '"' | "'" chars "'"
//! date    := "new" "Date" "(" (integer ("," integer)*)? ")"
//! ```

use serde_json::Number;

use crate::date::DateArgs;
use crate::{DecodeError, LooseValue, MAX_DEPTH};

pub(crate) struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    pub(crate) fn parse_document(mut self) -> Result<LooseValue, DecodeError> {
        // Some endpoints prepend a byte-order mark.
        self.eat_char('\u{feff}');
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(DecodeError::TrailingCharacters { offset: self.pos });
        }
        Ok(value)
    }

    fn parse_value(&mut self) -> Result<LooseValue, DecodeError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(self.end("a value")),
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some(quote @ ('"' | '\'')) => self.parse_string(quote).map(LooseValue::String),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                self.parse_number().map(LooseValue::Number)
            }
            Some(c) if is_identifier_start(c) => self.parse_word(),
            Some(found) => Err(DecodeError::UnexpectedChar {
                offset: self.pos,
                found,
                expected: "a value",
            }),
        }
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<LooseValue, DecodeError>,
    ) -> Result<LooseValue, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn parse_object(&mut self) -> Result<LooseValue, DecodeError> {
        self.expect_char('{', "'{'")?;
        let mut fields = Vec::new();

        loop {
            self.skip_whitespace();
            if self.eat_char('}') {
                return Ok(LooseValue::Object(fields));
            }

            let key = match self.peek() {
                Some(quote @ ('"' | '\'')) => self.parse_string(quote)?,
                Some(c) if is_identifier_start(c) => self.take_identifier().to_string(),
                Some(found) => {
                    return Err(DecodeError::UnexpectedChar {
                        offset: self.pos,
                        found,
                        expected: "an object key or '}'",
                    });
                }
                None => return Err(self.end("an object key or '}'")),
            };

            self.skip_whitespace();
            self.expect_char(':', "':' after object key")?;
            let value = self.parse_value()?;
            fields.push((key, value));

            self.skip_whitespace();
            if self.eat_char(',') {
                continue;
            }
            self.expect_char('}', "',' or '}'")?;
            return Ok(LooseValue::Object(fields));
        }
    }

    fn parse_array(&mut self) -> Result<LooseValue, DecodeError> {
        self.expect_char('[', "'['")?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.eat_char(']') {
                return Ok(LooseValue::Array(items));
            }

            items.push(self.parse_value()?);

            self.skip_whitespace();
            if self.eat_char(',') {
                continue;
            }
            self.expect_char(']', "',' or ']'")?;
            return Ok(LooseValue::Array(items));
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, DecodeError> {
        self.expect_char(quote, "a quote")?;
        let mut out = String::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(self.end("a closing quote"));
            };
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let escape_at = self.pos - 1;
                    let escaped = self.bump().ok_or_else(|| self.end("an escape character"))?;
                    match escaped {
                        '"' | '\'' | '\\' | '/' => out.push(escaped),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000c}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => out.push(self.parse_unicode_escape(escape_at)?),
                        _ => return Err(DecodeError::InvalidEscape { offset: escape_at }),
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn parse_unicode_escape(&mut self, escape_at: usize) -> Result<char, DecodeError> {
        let high = self.read_hex4(escape_at)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high).ok_or(DecodeError::InvalidEscape { offset: escape_at });
        }

        // High surrogate: a `\uXXXX` low surrogate must follow.
        if !(self.eat_char('\\') && self.eat_char('u')) {
            return Err(DecodeError::InvalidEscape { offset: escape_at });
        }
        let low = self.read_hex4(escape_at)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(DecodeError::InvalidEscape { offset: escape_at });
        }
        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(combined).ok_or(DecodeError::InvalidEscape { offset: escape_at })
    }

    fn read_hex4(&mut self, escape_at: usize) -> Result<u32, DecodeError> {
        let digits = self
            .input
            .get(self.pos..self.pos + 4)
            .filter(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or(DecodeError::InvalidEscape { offset: escape_at })?;
        let value = u32::from_str_radix(digits, 16)
            .map_err(|_| DecodeError::InvalidEscape { offset: escape_at })?;
        self.pos += 4;
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Number, DecodeError> {
        let start = self.pos;
        self.eat_char('-');
        self.take_while(|c| c.is_ascii_digit());
        if self.eat_char('.') {
            self.take_while(|c| c.is_ascii_digit());
        }
        if self.eat_char('e') || self.eat_char('E') {
            if !self.eat_char('+') {
                self.eat_char('-');
            }
            self.take_while(|c| c.is_ascii_digit());
        }

        let literal = &self.input[start..self.pos];
        let invalid = || DecodeError::InvalidNumber {
            offset: start,
            literal: literal.to_string(),
        };

        if let Ok(integer) = literal.parse::<i64>() {
            return Ok(Number::from(integer));
        }
        if let Ok(unsigned) = literal.parse::<u64>() {
            return Ok(Number::from(unsigned));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(invalid)
    }

    fn parse_word(&mut self) -> Result<LooseValue, DecodeError> {
        let start = self.pos;
        match self.take_identifier() {
            "true" => Ok(LooseValue::Bool(true)),
            "false" => Ok(LooseValue::Bool(false)),
            "null" => Ok(LooseValue::Null),
            "new" => self.parse_date_call(),
            word => Err(DecodeError::UnknownWord {
                offset: start,
                word: word.to_string(),
            }),
        }
    }

    fn parse_date_call(&mut self) -> Result<LooseValue, DecodeError> {
        self.skip_whitespace();
        let start = self.pos;
        let constructor = self.take_identifier();
        if constructor != "Date" {
            return Err(DecodeError::UnknownWord {
                offset: start,
                word: format!("new {constructor}"),
            });
        }

        self.skip_whitespace();
        self.expect_char('(', "'(' after new Date")?;
        let mut components = Vec::new();

        self.skip_whitespace();
        if self.eat_char(')') {
            return Ok(LooseValue::Date(DateArgs::new(components)));
        }

        loop {
            self.skip_whitespace();
            let offset = self.pos;
            let number = self.parse_number()?;
            let component = number.as_i64().ok_or_else(|| DecodeError::InvalidNumber {
                offset,
                literal: number.to_string(),
            })?;
            components.push(component);

            self.skip_whitespace();
            if self.eat_char(',') {
                continue;
            }
            self.expect_char(')', "',' or ')' in new Date")?;
            return Ok(LooseValue::Date(DateArgs::new(components)));
        }
    }

    fn take_identifier(&mut self) -> &'a str {
        let start = self.pos;
        if self.peek().is_some_and(is_identifier_start) {
            self.bump();
            self.take_while(is_identifier_continue);
        }
        let input = self.input;
        &input[start..self.pos]
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect_char(
        &mut self,
        expected: char,
        description: &'static str,
    ) -> Result<(), DecodeError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(found) => Err(DecodeError::UnexpectedChar {
                offset: self.pos,
                found,
                expected: description,
            }),
            None => Err(self.end(description)),
        }
    }

    fn end(&self, expected: &'static str) -> DecodeError {
        DecodeError::UnexpectedEnd {
            offset: self.pos,
            expected,
        }
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
