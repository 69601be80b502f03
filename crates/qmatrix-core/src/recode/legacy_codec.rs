//! Codec for the legacy serialized answer grid
//!
//! Grammar (byte oriented, string lengths count bytes):
//!
//! ```text
//! value := "N;" | "b:" (0|1) ";" | "i:" int ";" | "d:" float ";"
//!        | "s:" len ":\"" bytes "\";" | "a:" count ":{" (key value)* "}"
//! key   := "i:" int ";" | "s:" len ":\"" bytes "\";"
//! ```
//!
//! Object payloads are rejected.

use std::collections::HashMap;

use crate::errors::{RestoreError, Result};

const MAX_DEPTH: usize = 32;

/// Array key: integer or string
///
/// String keys holding a canonical decimal integer are folded to `Int`, the
/// same way the legacy writer normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LegacyKey {
    Int(i64),
    Str(String),
}

impl LegacyKey {
    pub fn from_text(text: &str) -> Self {
        match text.parse::<i64>() {
            Ok(n) if n.to_string() == text => LegacyKey::Int(n),
            _ => LegacyKey::Str(text.to_string()),
        }
    }
}

impl std::fmt::Display for LegacyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegacyKey::Int(n) => write!(f, "{}", n),
            LegacyKey::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegacyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(LegacyArray),
}

/// Insertion-ordered associative array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyArray {
    entries: Vec<(LegacyKey, LegacyValue)>,
    /// Position of each key in `entries`
    index: HashMap<LegacyKey, usize>,
}

impl LegacyArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; an existing key keeps its position
    pub fn insert(&mut self, key: LegacyKey, value: LegacyValue) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &LegacyKey) -> Option<&LegacyValue> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LegacyKey, &LegacyValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(LegacyKey, LegacyValue)> for LegacyArray {
    fn from_iter<T: IntoIterator<Item = (LegacyKey, LegacyValue)>>(iter: T) -> Self {
        let mut array = LegacyArray::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

/// Decode a serialized value
///
/// # Errors
///
/// Returns `InvalidLegacyState` on malformed input, trailing bytes, object
/// payloads or nesting deeper than the codec accepts.
pub fn parse(input: &str) -> Result<LegacyValue> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let value = parser.value(0)?;
    if parser.pos != parser.input.len() {
        return Err(parser.error("trailing data"));
    }
    Ok(value)
}

/// Encode a value in the legacy format
pub fn serialize(value: &LegacyValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_key(out: &mut String, key: &LegacyKey) {
    match key {
        LegacyKey::Int(n) => out.push_str(&format!("i:{};", n)),
        LegacyKey::Str(s) => write_str(out, s),
    }
}

fn write_str(out: &mut String, s: &str) {
    out.push_str(&format!("s:{}:\"{}\";", s.len(), s));
}

fn write_value(out: &mut String, value: &LegacyValue) {
    match value {
        LegacyValue::Null => out.push_str("N;"),
        LegacyValue::Bool(b) => out.push_str(if *b { "b:1;" } else { "b:0;" }),
        LegacyValue::Int(n) => out.push_str(&format!("i:{};", n)),
        LegacyValue::Float(f) => {
            let repr = if f.is_nan() {
                "NAN".to_string()
            } else if *f == f64::INFINITY {
                "INF".to_string()
            } else if *f == f64::NEG_INFINITY {
                "-INF".to_string()
            } else {
                f.to_string()
            };
            out.push_str(&format!("d:{};", repr));
        }
        LegacyValue::Str(s) => write_str(out, s),
        LegacyValue::Array(array) => {
            out.push_str(&format!("a:{}:{{", array.len()));
            for (key, value) in array.iter() {
                write_key(out, key);
                write_value(out, value);
            }
            out.push('}');
        }
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> RestoreError {
        RestoreError::InvalidLegacyState {
            reason: format!("{} at byte {}", reason, self.pos),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    /// Text up to (not including) `delim`; consumes the delimiter
    fn until(&mut self, delim: u8) -> Result<&'a str> {
        let input = self.input;
        let start = self.pos;
        let len = input[start..]
            .iter()
            .position(|b| *b == delim)
            .ok_or_else(|| self.error(&format!("missing '{}'", delim as char)))?;
        self.pos = start + len + 1;
        std::str::from_utf8(&input[start..start + len]).map_err(|_| self.error("invalid utf-8"))
    }

    fn int(&mut self, delim: u8) -> Result<i64> {
        let text = self.until(delim)?;
        text.parse::<i64>()
            .map_err(|_| self.error(&format!("invalid integer '{}'", text)))
    }

    fn length(&mut self) -> Result<usize> {
        let n = self.int(b':')?;
        usize::try_from(n).map_err(|_| self.error("negative length"))
    }

    /// Body of `s:<len>:"...";` after the `s:` tag
    fn string_body(&mut self) -> Result<String> {
        let len = self.length()?;
        self.expect(b'"')?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or_else(|| self.error("string length out of range"))?;
        let text = std::str::from_utf8(&self.input[self.pos..end])
            .map_err(|_| self.error("invalid utf-8"))?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        self.expect(b';')?;
        Ok(text)
    }

    fn tag(&mut self) -> Result<u8> {
        let tag = self.peek().ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(tag)
    }

    fn key(&mut self) -> Result<LegacyKey> {
        match self.tag()? {
            b'i' => {
                self.expect(b':')?;
                Ok(LegacyKey::Int(self.int(b';')?))
            }
            b's' => {
                self.expect(b':')?;
                Ok(LegacyKey::from_text(&self.string_body()?))
            }
            other => Err(self.error(&format!("unsupported key type '{}'", other as char))),
        }
    }

    fn value(&mut self, depth: usize) -> Result<LegacyValue> {
        match self.tag()? {
            b'N' => {
                self.expect(b';')?;
                Ok(LegacyValue::Null)
            }
            b'b' => {
                self.expect(b':')?;
                match self.int(b';')? {
                    0 => Ok(LegacyValue::Bool(false)),
                    1 => Ok(LegacyValue::Bool(true)),
                    _ => Err(self.error("invalid boolean")),
                }
            }
            b'i' => {
                self.expect(b':')?;
                Ok(LegacyValue::Int(self.int(b';')?))
            }
            b'd' => {
                self.expect(b':')?;
                let text = self.until(b';')?;
                text.parse::<f64>()
                    .map(LegacyValue::Float)
                    .map_err(|_| self.error(&format!("invalid float '{}'", text)))
            }
            b's' => {
                self.expect(b':')?;
                Ok(LegacyValue::Str(self.string_body()?))
            }
            b'a' => {
                if depth >= MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.expect(b':')?;
                let count = self.length()?;
                self.expect(b'{')?;
                let mut array = LegacyArray::new();
                for _ in 0..count {
                    let key = self.key()?;
                    let value = self.value(depth + 1)?;
                    array.insert(key, value);
                }
                self.expect(b'}')?;
                Ok(LegacyValue::Array(array))
            }
            other => Err(self.error(&format!("unsupported value type '{}'", other as char))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_grid() {
        let value = parse(r#"a:1:{i:1;a:2:{i:2;s:1:"x";i:3;b:1;}}"#).unwrap();
        let LegacyValue::Array(rows) = value else {
            panic!("expected array");
        };
        let Some(LegacyValue::Array(row)) = rows.get(&LegacyKey::Int(1)) else {
            panic!("expected row 1");
        };
        assert_eq!(
            row.get(&LegacyKey::Int(2)),
            Some(&LegacyValue::Str("x".to_string()))
        );
        assert_eq!(row.get(&LegacyKey::Int(3)), Some(&LegacyValue::Bool(true)));
    }

    #[test]
    fn test_serialize_reproduces_input() {
        let input = r#"a:2:{i:4;a:1:{i:9;s:2:"on";}s:3:"abc";a:2:{i:0;N;i:1;d:0.5;}}"#;
        assert_eq!(serialize(&parse(input).unwrap()), input);
    }

    #[test]
    fn test_numeric_string_keys_fold_to_int() {
        let value = parse(r#"a:1:{s:2:"12";i:1;}"#).unwrap();
        assert_eq!(serialize(&value), "a:1:{i:12;i:1;}");
        assert_eq!(LegacyKey::from_text("012"), LegacyKey::Str("012".to_string()));
    }

    #[test]
    fn test_string_length_counts_bytes() {
        let value = LegacyValue::Str("é".to_string());
        let encoded = serialize(&value);
        assert_eq!(encoded, "s:2:\"é\";");
        assert_eq!(parse(&encoded).unwrap(), value);
    }

    #[test]
    fn test_rejects_malformed_input() {
        for input in [
            "",
            "a:1:{i:1;}",
            "s:5:\"ab\";",
            "i:1;extra",
            "O:8:\"stdClass\":0:{}",
            "b:2;",
        ] {
            let err = parse(input).unwrap_err();
            assert!(
                matches!(err, RestoreError::InvalidLegacyState { .. }),
                "input {:?} gave {:?}",
                input,
                err
            );
        }
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut array = LegacyArray::new();
        array.insert(LegacyKey::Int(0), LegacyValue::Int(1));
        array.insert(LegacyKey::Int(5), LegacyValue::Int(2));
        array.insert(LegacyKey::Int(0), LegacyValue::Int(3));
        assert_eq!(serialize(&LegacyValue::Array(array)), "a:2:{i:0;i:3;i:5;i:2;}");
    }

    #[test]
    fn test_wide_array_keeps_order_and_lookup() {
        let n = 20_000;
        let body: String = (0..n).rev().map(|i| format!("i:{};i:{};", i, i * 2)).collect();
        let input = format!("a:{}:{{{}}}", n, body);

        let LegacyValue::Array(array) = parse(&input).unwrap() else {
            panic!("expected array");
        };
        assert_eq!(array.len(), n);
        let first = array.iter().next().map(|(k, _)| k.clone());
        assert_eq!(first, Some(LegacyKey::Int(n as i64 - 1)));
        assert_eq!(array.get(&LegacyKey::Int(7)), Some(&LegacyValue::Int(14)));
        assert_eq!(array.get(&LegacyKey::Str("x".to_string())), None);
        assert_eq!(serialize(&LegacyValue::Array(array)), input);
    }
}
