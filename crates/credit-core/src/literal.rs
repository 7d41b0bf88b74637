//! Literal-only decoder for textual action payloads
//!
//! Some exports ship `actionData` as the printed form of a mapping, e.g.
//! `{'amount': '2000000000', 'assetSymbol': 'USDC'}`, instead of a JSON object.
//! This module turns that text back into a [`serde_json::Value`].
//!
//! Only literal values are accepted: mappings, sequences, tuples, sets,
//! strings, numbers, `True`/`False`/`None` (and their JSON spellings).
//! Names, calls and operators other than a unary sign are rejected, so
//! decoding untrusted text can never execute anything.

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Maximum container nesting accepted before the input is rejected.
pub const MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unexpected character {found:?} at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },

    #[error("unsupported name {name:?} at offset {offset}")]
    UnsupportedName { name: String, offset: usize },

    #[error("unhashable mapping key at offset {offset}")]
    InvalidKey { offset: usize },

    #[error("nesting too deep at offset {offset}")]
    TooDeep { offset: usize },

    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

type Result<T> = std::result::Result<T, LiteralError>;

/// Parse a single literal value from `input`.
pub fn parse_literal(input: &str) -> Result<Value> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(LiteralError::TrailingInput { offset: parser.pos });
    }
    Ok(value)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn unexpected(&self, found: char, offset: usize) -> LiteralError {
        LiteralError::UnexpectedChar { found, offset }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_whitespace();
        let offset = self.pos;
        match self.peek() {
            None => Err(LiteralError::UnexpectedEnd),
            Some('{') => self.nested(Self::parse_braced),
            Some('[') => self.nested(|p| p.parse_sequence(']')),
            Some('(') => self.nested(|p| p.parse_sequence(')')),
            Some('\'') | Some('"') => self.parse_strings(false),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(self.unexpected(c, offset)),
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(LiteralError::TooDeep { offset: self.pos });
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    /// `[...]` or `(...)`. A parenthesized single value without a trailing
    /// comma is just that value, as in `(5)`.
    fn parse_sequence(&mut self, close: char) -> Result<Value> {
        self.bump();
        let mut items = Vec::new();
        let mut saw_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                break;
            }
            items.push(self.parse_value()?);
            self.skip_whitespace();
            let offset = self.pos;
            match self.bump() {
                Some(',') => saw_comma = true,
                Some(c) if c == close => break,
                Some(c) => return Err(self.unexpected(c, offset)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }

        if close == ')' && items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    /// `{}` is an empty mapping; `{k: v, ...}` a mapping; `{a, b}` a set,
    /// returned as a sequence.
    fn parse_braced(&mut self) -> Result<Value> {
        self.bump();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Value::Object(Map::new()));
        }

        let mut key_offset = self.pos;
        let first = self.parse_value()?;
        self.skip_whitespace();

        if self.peek() != Some(':') {
            return self.parse_set_tail(first);
        }

        let mut map = Map::new();
        let mut key = first;
        loop {
            self.bump(); // ':'
            let value = self.parse_value()?;
            map.insert(key_to_string(key, key_offset)?, value);

            self.skip_whitespace();
            let offset = self.pos;
            match self.bump() {
                Some('}') => break,
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some('}') {
                        self.bump();
                        break;
                    }
                    key_offset = self.pos;
                    key = self.parse_value()?;
                    self.skip_whitespace();
                    let offset = self.pos;
                    match self.peek() {
                        Some(':') => {}
                        Some(c) => return Err(self.unexpected(c, offset)),
                        None => return Err(LiteralError::UnexpectedEnd),
                    }
                }
                Some(c) => return Err(self.unexpected(c, offset)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
        Ok(Value::Object(map))
    }

    fn parse_set_tail(&mut self, first: Value) -> Result<Value> {
        let mut items = vec![first];
        loop {
            self.skip_whitespace();
            let offset = self.pos;
            match self.bump() {
                Some('}') => break,
                Some(',') => {
                    self.skip_whitespace();
                    if self.peek() == Some('}') {
                        self.bump();
                        break;
                    }
                    items.push(self.parse_value()?);
                }
                Some(c) => return Err(self.unexpected(c, offset)),
                None => return Err(LiteralError::UnexpectedEnd),
            }
        }
        Ok(Value::Array(items))
    }

    /// One or more adjacent string literals, concatenated.
    fn parse_strings(&mut self, raw: bool) -> Result<Value> {
        let mut out = self.parse_quoted(raw)?;
        loop {
            let save = self.pos;
            self.skip_whitespace();
            match self.peek() {
                Some('\'') | Some('"') => out.push_str(&self.parse_quoted(false)?),
                _ => {
                    self.pos = save;
                    break;
                }
            }
        }
        Ok(Value::String(out))
    }

    fn parse_quoted(&mut self, raw: bool) -> Result<String> {
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            Some(c) => return Err(self.unexpected(c, self.pos - c.len_utf8())),
            None => return Err(LiteralError::UnexpectedEnd),
        };

        let mut out = String::new();
        loop {
            let offset = self.pos;
            match self.bump() {
                None => return Err(LiteralError::UnexpectedEnd),
                Some(c) if c == quote => return Ok(out),
                Some('\n') => return Err(self.unexpected('\n', offset)),
                Some('\\') if raw => {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                }
                Some('\\') => self.parse_escape(&mut out, offset)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String, offset: usize) -> Result<()> {
        let c = self.bump().ok_or(LiteralError::UnexpectedEnd)?;
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '\\' | '\'' | '"' => out.push(c),
            '\n' => {}
            'x' => out.push(self.read_hex(2, offset)?),
            'u' => out.push(self.read_hex(4, offset)?),
            'U' => out.push(self.read_hex(8, offset)?),
            // Unknown escapes keep their backslash.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_hex(&mut self, digits: usize, offset: usize) -> Result<char> {
        let text = self
            .src
            .get(self.pos..self.pos + digits)
            .filter(|t| t.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or(LiteralError::InvalidEscape { offset })?;
        let code =
            u32::from_str_radix(text, 16).map_err(|_| LiteralError::InvalidEscape { offset })?;
        self.pos += digits;
        char::from_u32(code).ok_or(LiteralError::InvalidEscape { offset })
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        let mut negative = false;
        if let Some(sign @ ('+' | '-')) = self.peek() {
            negative = sign == '-';
            self.bump();
            self.skip_whitespace();
        }

        let body_start = self.pos;
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(prev, 'e' | 'E')
                && !self.src[body_start..self.pos].starts_with("0x")
                && !self.src[body_start..self.pos].starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                prev = c;
                self.pos += 1;
            } else {
                break;
            }
        }

        let body = &self.src[body_start..self.pos];
        let invalid = || LiteralError::InvalidNumber {
            text: self.src[start..self.pos].to_string(),
            offset: start,
        };

        match body.chars().next() {
            Some(c) if c.is_ascii_digit() || c == '.' => {}
            _ => return Err(invalid()),
        }
        if body.starts_with('_') || body.ends_with('_') || body.contains("__") {
            return Err(invalid());
        }

        let digits: String = body.chars().filter(|c| *c != '_').collect();
        let lower = digits.to_ascii_lowercase();

        let radix = match lower.get(..2) {
            Some("0x") => Some(16),
            Some("0o") => Some(8),
            Some("0b") => Some(2),
            _ => None,
        };

        if let Some(radix) = radix {
            let magnitude = u128::from_str_radix(&lower[2..], radix).map_err(|_| invalid())?;
            return Ok(integer_value(magnitude, negative));
        }

        if lower.contains(['.', 'e']) {
            let float: f64 = lower.parse().map_err(|_| invalid())?;
            return Ok(float_value(if negative { -float } else { float }));
        }

        if !lower.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        // `007` is not a literal; `0` and `000` are.
        if lower.starts_with('0') && !lower.trim_start_matches('0').is_empty() {
            return Err(invalid());
        }
        match lower.parse::<u128>() {
            Ok(magnitude) => Ok(integer_value(magnitude, negative)),
            Err(_) => {
                let float: f64 = lower.parse().map_err(|_| invalid())?;
                Ok(float_value(if negative { -float } else { float }))
            }
        }
    }

    fn parse_name(&mut self) -> Result<Value> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        let name = &self.src[start..self.pos];

        match name {
            "True" | "true" => return Ok(Value::Bool(true)),
            "False" | "false" => return Ok(Value::Bool(false)),
            "None" | "null" => return Ok(Value::Null),
            _ => {}
        }

        // String prefixes: u'..', b'..', r'..', rb'..'
        if matches!(self.peek(), Some('\'') | Some('"')) {
            let prefix = name.to_ascii_lowercase();
            if matches!(prefix.as_str(), "u" | "b" | "r" | "rb" | "br") {
                return self.parse_strings(prefix.contains('r'));
            }
        }

        Err(LiteralError::UnsupportedName {
            name: name.to_string(),
            offset: start,
        })
    }
}

fn integer_value(magnitude: u128, negative: bool) -> Value {
    if negative {
        if magnitude <= i64::MAX as u128 + 1 {
            Value::from((-(magnitude as i128)) as i64)
        } else {
            float_value(-(magnitude as f64))
        }
    } else if magnitude <= u64::MAX as u128 {
        Value::from(magnitude as u64)
    } else {
        float_value(magnitude as f64)
    }
}

/// Non-finite floats have no JSON representation and decode to null.
fn float_value(float: f64) -> Value {
    Number::from_f64(float).map(Value::Number).unwrap_or(Value::Null)
}

fn key_to_string(key: Value, offset: usize) -> Result<String> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(true) => Ok("True".to_string()),
        Value::Bool(false) => Ok("False".to_string()),
        Value::Null => Ok("None".to_string()),
        Value::Array(_) | Value::Object(_) => Err(LiteralError::InvalidKey { offset }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_python_style_mapping() {
        let value = parse_literal("{'amount': '2000000000', 'assetSymbol': 'USDC', 'type': 'Deposit'}")
            .unwrap();
        assert_eq!(
            value,
            json!({"amount": "2000000000", "assetSymbol": "USDC", "type": "Deposit"})
        );
    }

    #[test]
    fn test_json_text_is_accepted() {
        let value = parse_literal(r#"{"amount": 1500000, "nested": {"ok": true, "v": null}}"#).unwrap();
        assert_eq!(value, json!({"amount": 1500000, "nested": {"ok": true, "v": null}}));
    }

    #[test]
    fn test_python_constants_and_containers() {
        let value = parse_literal("{'a': True, 'b': False, 'c': None, 'd': (1, 2), 'e': [3,], 'f': (4,)}")
            .unwrap();
        assert_eq!(
            value,
            json!({"a": true, "b": false, "c": null, "d": [1, 2], "e": [3], "f": [4]})
        );
    }

    #[test]
    fn test_parenthesized_value_is_not_a_tuple() {
        assert_eq!(parse_literal("(5)").unwrap(), json!(5));
        assert_eq!(parse_literal("()").unwrap(), json!([]));
    }

    #[test]
    fn test_set_becomes_sequence() {
        assert_eq!(parse_literal("{1, 2, 3}").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_non_string_keys_are_stringified() {
        assert_eq!(
            parse_literal("{1: 'a', True: 'b', None: 'c'}").unwrap(),
            json!({"1": "a", "True": "b", "None": "c"})
        );
        assert!(matches!(
            parse_literal("{[1]: 'a'}"),
            Err(LiteralError::InvalidKey { offset: 1 })
        ));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_literal("-42").unwrap(), json!(-42));
        assert_eq!(parse_literal("1_000_000").unwrap(), json!(1_000_000));
        assert_eq!(parse_literal("0x10").unwrap(), json!(16));
        assert_eq!(parse_literal("0b101").unwrap(), json!(5));
        assert_eq!(parse_literal("2.5e3").unwrap(), json!(2500.0));
        assert_eq!(parse_literal("1e-2").unwrap(), json!(0.01));
        assert_eq!(parse_literal(".5").unwrap(), json!(0.5));
        assert_eq!(
            parse_literal("18446744073709551615").unwrap(),
            json!(u64::MAX)
        );
        assert_eq!(
            parse_literal("-9223372036854775808").unwrap(),
            json!(i64::MIN)
        );
        assert!(parse_literal("100000000000000000000000").unwrap().is_f64());
        assert!(parse_literal("1__0").is_err());
        assert_eq!(parse_literal("000").unwrap(), json!(0));
        assert_eq!(parse_literal("007.5").unwrap(), json!(7.5));
        assert!(matches!(
            parse_literal("{'amount': 007}"),
            Err(LiteralError::InvalidNumber { offset: 11, .. })
        ));
        assert!(parse_literal("12abc").is_err());
    }

    #[test]
    fn test_string_escapes_and_concatenation() {
        assert_eq!(parse_literal(r#"'it\'s'"#).unwrap(), json!("it's"));
        assert_eq!(parse_literal(r#""a\tb\x41é""#).unwrap(), json!("a\tbAé"));
        assert_eq!(parse_literal("'ab' \"cd\"").unwrap(), json!("abcd"));
        assert_eq!(parse_literal(r"r'\d+'").unwrap(), json!("\\d+"));
        assert_eq!(parse_literal("u'wallet'").unwrap(), json!("wallet"));
        assert!(matches!(
            parse_literal(r"'\x4'"),
            Err(LiteralError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn test_rejects_code() {
        assert!(matches!(
            parse_literal("__import__('os').system('ls')"),
            Err(LiteralError::UnsupportedName { .. })
        ));
        assert!(matches!(
            parse_literal("{'amount': 1 + 2}"),
            Err(LiteralError::UnexpectedChar { found: '+', .. })
        ));
        assert!(parse_literal("{'amount': open('x')}").is_err());
        assert!(parse_literal("lambda: 0").is_err());
    }

    #[test]
    fn test_truncated_and_trailing_input() {
        assert_eq!(parse_literal("{'amount': 1"), Err(LiteralError::UnexpectedEnd));
        assert_eq!(parse_literal("'open"), Err(LiteralError::UnexpectedEnd));
        assert_eq!(parse_literal(""), Err(LiteralError::UnexpectedEnd));
        assert_eq!(
            parse_literal("{} {}"),
            Err(LiteralError::TrailingInput { offset: 3 })
        );
    }

    #[test]
    fn test_depth_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1) + &"]".repeat(MAX_DEPTH + 1);
        assert!(matches!(parse_literal(&deep), Err(LiteralError::TooDeep { .. })));

        let ok = "[".repeat(MAX_DEPTH) + &"]".repeat(MAX_DEPTH);
        assert!(parse_literal(&ok).is_ok());
    }
}
