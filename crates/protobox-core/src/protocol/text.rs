//! Text format scanning, decoding scopes and encoding.
//!
//! The grammar is the usual protobuf text form: `name: value` pairs,
//! nested messages in `{ ... }` or `< ... >`, optional `,`/`;` separators,
//! `#` line comments and `[type-url]` keys for the verbose Any syntax.

use crate::error::{ProtoboxError, Result};
use crate::message::{Message, MessageType};
use crate::options::DecodeOptions;
use crate::registry::Registry;

fn malformed(msg: impl Into<String>) -> ProtoboxError {
    ProtoboxError::MalformedText(msg.into())
}

/// Byte-level tokenizer over text-format input.
#[derive(Debug)]
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            src: text.as_bytes(),
            pos: 0,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.src.get(self.pos) {
            match c {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'#' => {
                    while let Some(&c) = self.src.get(self.pos) {
                        self.pos += 1;
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Next significant byte, without consuming it.
    pub fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.src.get(self.pos).copied()
    }

    pub fn at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Consume `c` if it is the next significant byte.
    pub fn try_consume(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, c: u8) -> Result<()> {
        if self.try_consume(c) {
            return Ok(());
        }
        let found = self.describe_next();
        Err(malformed(format!(
            "expected '{}' at offset {}, found {found}",
            c as char, self.pos
        )))
    }

    fn describe_next(&mut self) -> String {
        match self.peek() {
            Some(c) => format!("'{}'", c as char),
            None => "end of input".into(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> Result<&'a str> {
        let bytes = self
            .src
            .get(start..end)
            .ok_or_else(|| malformed("token out of bounds"))?;
        std::str::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8: {e}")))
    }

    /// Scan an optional `[type-url]` token.
    pub fn next_type_url(&mut self) -> Result<Option<String>> {
        if !self.try_consume(b'[') {
            return Ok(None);
        }
        self.skip_whitespace();
        let start = self.pos;
        while let Some(&c) = self.src.get(self.pos) {
            if c == b']' || c.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        let url = self.slice(start, self.pos)?.to_owned();
        self.expect(b']')?;
        if url.is_empty() {
            return Err(malformed("empty type url in '[...]'"));
        }
        Ok(Some(url))
    }

    pub fn next_identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        match self.src.get(self.pos) {
            Some(c) if c.is_ascii_alphabetic() || *c == b'_' => self.pos += 1,
            _ => {
                return Err(malformed(format!(
                    "expected field name at offset {start}, found {}",
                    self.describe_next()
                )))
            }
        }
        while let Some(&c) = self.src.get(self.pos) {
            if !(c.is_ascii_alphanumeric() || c == b'_') {
                break;
            }
            self.pos += 1;
        }
        Ok(self.slice(start, self.pos)?.to_owned())
    }

    /// One or more adjacent quoted strings, concatenated, escapes resolved.
    pub fn next_bytes(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut quote = match self.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(malformed(format!(
                    "expected quoted string, found {}",
                    self.describe_next()
                )))
            }
        };
        loop {
            self.pos += 1;
            self.read_quoted_body(quote, &mut out)?;
            match self.peek() {
                Some(q @ (b'"' | b'\'')) => quote = q,
                _ => return Ok(out),
            }
        }
    }

    pub fn next_string(&mut self) -> Result<String> {
        let bytes = self.next_bytes()?;
        String::from_utf8(bytes).map_err(|e| malformed(format!("invalid UTF-8 in string: {e}")))
    }

    fn next_byte(&mut self) -> Result<u8> {
        let c = self
            .src
            .get(self.pos)
            .copied()
            .ok_or_else(|| malformed("unterminated string"))?;
        self.pos += 1;
        Ok(c)
    }

    fn read_quoted_body(&mut self, quote: u8, out: &mut Vec<u8>) -> Result<()> {
        loop {
            let c = self.next_byte()?;
            match c {
                _ if c == quote => return Ok(()),
                b'\n' => return Err(malformed("newline in string")),
                b'\\' => self.read_escape(out)?,
                _ => out.push(c),
            }
        }
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let c = self.next_byte()?;
        let b = match c {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0c,
            b'v' => 0x0b,
            b'\\' | b'\'' | b'"' | b'?' => c,
            b'x' => {
                let mut v = 0u8;
                let mut digits = 0;
                while digits < 2 {
                    match self.src.get(self.pos).and_then(|d| (*d as char).to_digit(16)) {
                        Some(d) => {
                            v = v * 16 + d as u8;
                            self.pos += 1;
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    return Err(malformed("\\x escape without hex digits"));
                }
                v
            }
            b'0'..=b'7' => {
                let mut v = u32::from(c - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match self.src.get(self.pos) {
                        Some(d @ b'0'..=b'7') => {
                            v = v * 8 + u32::from(d - b'0');
                            self.pos += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                u8::try_from(v).map_err(|_| malformed("octal escape out of range"))?
            }
            other => {
                return Err(malformed(format!("unknown escape '\\{}'", other as char)));
            }
        };
        out.push(b);
        Ok(())
    }

    fn next_scalar_token(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(&c) = self.src.get(self.pos) {
            if !(c.is_ascii_alphanumeric() || matches!(c, b'-' | b'+' | b'.' | b'_')) {
                break;
            }
            self.pos += 1;
        }
        if start == self.pos {
            return Err(malformed(format!(
                "expected scalar value, found {}",
                self.describe_next()
            )));
        }
        self.slice(start, self.pos)
    }

    pub fn next_i64(&mut self) -> Result<i64> {
        let tok = self.next_scalar_token()?;
        let (neg, digits) = match tok.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, tok),
        };
        let magnitude = parse_unsigned(digits).ok_or_else(|| malformed(format!("invalid integer {tok:?}")))?;
        let value = if neg {
            0i64.checked_sub_unsigned(magnitude)
        } else {
            i64::try_from(magnitude).ok()
        };
        value.ok_or_else(|| malformed(format!("integer out of range: {tok}")))
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let tok = self.next_scalar_token()?;
        parse_unsigned(tok).ok_or_else(|| malformed(format!("invalid unsigned integer {tok:?}")))
    }

    pub fn next_f64(&mut self) -> Result<f64> {
        let tok = self.next_scalar_token()?;
        let lower = tok.to_ascii_lowercase();
        let v = match lower.as_str() {
            "inf" | "infinity" => f64::INFINITY,
            "-inf" | "-infinity" => f64::NEG_INFINITY,
            "nan" => f64::NAN,
            _ => lower
                .strip_suffix('f')
                .unwrap_or(&lower)
                .parse::<f64>()
                .map_err(|_| malformed(format!("invalid float {tok:?}")))?,
        };
        Ok(v)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.next_scalar_token()? {
            "true" | "True" | "t" | "1" => Ok(true),
            "false" | "False" | "f" | "0" => Ok(false),
            other => Err(malformed(format!("invalid bool {other:?}"))),
        }
    }
}

fn parse_unsigned(tok: &str) -> Option<u64> {
    if let Some(hex) = tok.strip_prefix("0x").or_else(|| tok.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }
    if tok.len() > 1 && tok.starts_with('0') {
        return u64::from_str_radix(tok.get(1..)?, 8).ok();
    }
    tok.parse::<u64>().ok()
}

/// Text decoding state: the scanner plus the stack of open message scopes.
///
/// Each scope remembers the terminator matching the delimiter that opened it,
/// so `{ ... }` and `< ... >` nest independently.
pub struct TextDecoder<'a> {
    scanner: Scanner<'a>,
    registry: &'a Registry,
    options: DecodeOptions,
    scopes: Vec<u8>,
}

impl<'a> TextDecoder<'a> {
    pub fn new(text: &'a str, registry: &'a Registry, options: DecodeOptions) -> Self {
        Self {
            scanner: Scanner::new(text),
            registry,
            options,
            scopes: Vec::new(),
        }
    }

    /// Registry consulted for verbose Any type URLs.
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Number of open message scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn next_type_url(&mut self) -> Result<Option<String>> {
        self.scanner.next_type_url()
    }

    /// Next field name in the current scope.
    ///
    /// Returns `None` at the end of the scope: the scope's terminator is
    /// consumed, or end of input is reached at top level.
    pub fn next_field_name(&mut self) -> Result<Option<String>> {
        if !self.scanner.try_consume(b',') {
            self.scanner.try_consume(b';');
        }
        match self.scopes.last().copied() {
            None => {
                if self.scanner.at_end() {
                    return Ok(None);
                }
            }
            Some(term) => {
                if self.scanner.try_consume(term) {
                    self.scopes.pop();
                    return Ok(None);
                }
                if self.scanner.at_end() {
                    return Err(malformed(format!(
                        "expected '{}' before end of input",
                        term as char
                    )));
                }
            }
        }
        if self.scanner.peek() == Some(b'[') {
            return Err(malformed("unexpected '[' where a field name was expected"));
        }
        self.scanner.next_identifier().map(Some)
    }

    /// Open a nested message scope (`{` or `<`, optionally preceded by `:`).
    pub fn begin_object(&mut self) -> Result<()> {
        self.scanner.try_consume(b':');
        let term = if self.scanner.try_consume(b'{') {
            b'}'
        } else if self.scanner.try_consume(b'<') {
            b'>'
        } else {
            return Err(malformed(format!(
                "expected '{{' or '<', found {}",
                self.scanner.describe_next()
            )));
        };
        if self.scopes.len() >= self.options.message_depth_limit {
            return Err(malformed(format!(
                "message nesting exceeds depth limit {}",
                self.options.message_depth_limit
            )));
        }
        self.scopes.push(term);
        Ok(())
    }

    /// Decode a nested message field value into `msg`.
    pub fn decode_nested<M: Message + ?Sized>(&mut self, msg: &mut M) -> Result<()> {
        self.begin_object()?;
        msg.decode_text(self)
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.scanner.expect(b':')?;
        self.scanner.next_string()
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        self.scanner.expect(b':')?;
        self.scanner.next_bytes()
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.scanner.expect(b':')?;
        self.scanner.next_i64()
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let v = self.read_i64()?;
        i32::try_from(v).map_err(|_| malformed(format!("int32 out of range: {v}")))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.scanner.expect(b':')?;
        self.scanner.next_u64()
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.scanner.expect(b':')?;
        self.scanner.next_f64()
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.scanner.expect(b':')?;
        self.scanner.next_bool()
    }

    /// Ensure every scope closed and the input is exhausted.
    pub fn finish(mut self) -> Result<()> {
        if let Some(term) = self.scopes.last() {
            return Err(malformed(format!("unclosed scope, expected '{}'", *term as char)));
        }
        if !self.scanner.at_end() {
            return Err(malformed(format!(
                "unexpected {} after message",
                self.scanner.describe_next()
            )));
        }
        Ok(())
    }
}

/// Decode `text` into a fresh `M` using the global registry.
pub fn decode_text<M: MessageType>(text: &str) -> Result<M> {
    decode_text_with(text, Registry::global(), DecodeOptions::default())
}

pub fn decode_text_with<M: MessageType>(
    text: &str,
    registry: &Registry,
    options: DecodeOptions,
) -> Result<M> {
    let mut dec = TextDecoder::new(text, registry, options);
    let mut msg = M::default();
    msg.decode_text(&mut dec)?;
    dec.finish()?;
    Ok(msg)
}

/// Single-line text format writer.
#[derive(Debug, Default)]
pub struct TextEncoder {
    out: String,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn token(&mut self, s: &str) {
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(s);
    }

    fn key(&mut self, name: &str) {
        self.token(name);
        self.out.push(':');
    }

    pub fn put_string(&mut self, name: &str, value: &str) {
        self.put_bytes(name, value.as_bytes());
    }

    pub fn put_bytes(&mut self, name: &str, value: &[u8]) {
        self.key(name);
        self.out.push(' ');
        self.out.push('"');
        escape_bytes(value, &mut self.out);
        self.out.push('"');
    }

    pub fn put_i64(&mut self, name: &str, value: i64) {
        self.key(name);
        self.out.push_str(&format!(" {value}"));
    }

    pub fn put_u64(&mut self, name: &str, value: u64) {
        self.key(name);
        self.out.push_str(&format!(" {value}"));
    }

    pub fn put_f64(&mut self, name: &str, value: f64) {
        self.key(name);
        let s = if value.is_nan() {
            "nan".to_owned()
        } else if value.is_infinite() {
            if value > 0.0 { "inf" } else { "-inf" }.to_owned()
        } else {
            format!("{value:?}")
        };
        self.out.push(' ');
        self.out.push_str(&s);
    }

    pub fn put_bool(&mut self, name: &str, value: bool) {
        self.key(name);
        self.out.push_str(if value { " true" } else { " false" });
    }

    /// Open `name {`.
    pub fn start_object(&mut self, name: &str) {
        self.token(name);
        self.out.push_str(" {");
    }

    /// Open the verbose Any form `[url] {`.
    pub fn start_type_url(&mut self, url: &str) {
        self.token(&format!("[{url}]"));
        self.out.push_str(" {");
    }

    pub fn end_object(&mut self) {
        self.token("}");
    }

    pub fn finish(self) -> String {
        self.out
    }
}

fn escape_bytes(value: &[u8], out: &mut String) {
    // UTF-8 sequences pass through untouched; stray bytes become octal.
    let mut rest = value;
    while !rest.is_empty() {
        let (valid, invalid) = match std::str::from_utf8(rest) {
            Ok(s) => (s, &[][..]),
            Err(e) => {
                let (ok, bad) = rest.split_at(e.valid_up_to());
                // Bytes before valid_up_to() are valid UTF-8.
                (std::str::from_utf8(ok).unwrap_or_default(), bad)
            }
        };
        for ch in valid.chars() {
            match ch {
                '"' => out.push_str("\\\""),
                '\'' => out.push_str("\\'"),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                    out.push_str(&format!("\\{:03o}", c as u32));
                }
                c => out.push(c),
            }
        }
        match invalid.split_first() {
            Some((b, tail)) => {
                out.push_str(&format!("\\{:03o}", b));
                rest = tail;
            }
            None => rest = &[],
        }
    }
}

/// Encode `msg` as single-line text.
pub fn encode_text<M: Message + ?Sized>(msg: &M) -> Result<String> {
    let mut enc = TextEncoder::new();
    msg.encode_text(&mut enc)?;
    Ok(enc.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn scanner_strings_and_escapes() {
        let mut s = Scanner::new(r#" "a\n\x41\101" 'b' "#);
        assert_eq!(s.next_bytes().unwrap(), b"a\nAAb".to_vec());
        assert!(s.at_end());
    }

    #[test]
    fn scanner_rejects_unterminated_string() {
        let mut s = Scanner::new("\"abc");
        assert_eq!(s.next_bytes().unwrap_err().code().as_str(), "MALFORMED_TEXT");
    }

    #[test]
    fn scanner_numbers() {
        let mut s = Scanner::new("-42 0x1f 017 1.5 inf 9223372036854775808");
        assert_eq!(s.next_i64().unwrap(), -42);
        assert_eq!(s.next_u64().unwrap(), 31);
        assert_eq!(s.next_u64().unwrap(), 15);
        assert_eq!(s.next_f64().unwrap(), 1.5);
        assert!(s.next_f64().unwrap().is_infinite());
        assert!(s.next_i64().is_err());
    }

    #[test]
    fn scanner_type_url_and_comments() {
        let mut s = Scanner::new("# comment\n [type.googleapis.com/pkg.Foo] {");
        assert_eq!(
            s.next_type_url().unwrap().as_deref(),
            Some("type.googleapis.com/pkg.Foo")
        );
        assert!(s.try_consume(b'{'));
        assert!(Scanner::new("[]").next_type_url().is_err());
        assert!(Scanner::new("name").next_type_url().unwrap().is_none());
    }

    #[test]
    fn scopes_match_their_terminators() {
        let registry = Registry::new();
        let mut dec = TextDecoder::new("< a: 1 } >", &registry, DecodeOptions::default());
        dec.begin_object().unwrap();
        assert_eq!(dec.next_field_name().unwrap().as_deref(), Some("a"));
        assert_eq!(dec.read_i64().unwrap(), 1);
        // '}' does not close a '<' scope.
        assert!(dec.next_field_name().is_err());
    }

    #[test]
    fn depth_limit_enforced() {
        let registry = Registry::new();
        let options = DecodeOptions {
            message_depth_limit: 2,
        };
        let mut dec = TextDecoder::new("{{{", &registry, options);
        dec.begin_object().unwrap();
        dec.begin_object().unwrap();
        assert!(dec.begin_object().is_err());
    }

    #[test]
    fn encoder_escapes() {
        let mut enc = TextEncoder::new();
        enc.put_bytes("value", b"a\"b\n\xff");
        enc.put_i64("n", -3);
        enc.start_object("inner");
        enc.put_bool("ok", true);
        enc.end_object();
        assert_eq!(enc.finish(), r#"value: "a\"b\n\377" n: -3 inner { ok: true }"#);
    }
}
