use super::{Error, ErrorKind, Result};
use crate::value::{Array, Object, Value};

const NUMBER_CHARS: &[u8] = b"-+.eE0123456789";

/// Deepest array/object nesting the reader accepts.
const MAX_DEPTH: usize = 256;

/// Cursor over the input text. Positions are byte offsets.
pub(super) struct Reader<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn error(&self, kind: ErrorKind) -> Error {
        Error::Syntax {
            kind,
            index: self.pos,
        }
    }

    /// Skips whitespace and returns the next byte, if any.
    pub fn skip_ws(&mut self) -> Option<u8> {
        while let Some(&b) = self.bytes.get(self.pos) {
            if !matches!(b, b' ' | b'\t' | b'\r' | b'\n') {
                return Some(b);
            }
            self.pos += 1;
        }
        None
    }

    fn expect(&mut self, byte: u8, kind: ErrorKind) -> Result<()> {
        if self.bytes.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(kind))
        }
    }

    /// Fails unless only whitespace remains.
    pub fn finish(&mut self) -> Result<()> {
        match self.skip_ws() {
            None => Ok(()),
            Some(_) => Err(self.error(ErrorKind::FailedToReachEnd)),
        }
    }

    pub fn value(&mut self) -> Result<Value> {
        match self.skip_ws() {
            None => Err(self.error(ErrorKind::ExpectedStart)),
            Some(b'{') => self.nested(|r| r.object().map(Value::Object)),
            Some(b'[') => self.nested(|r| r.array().map(Value::Array)),
            Some(b'"') => self.string().map(Value::String),
            Some(b) if NUMBER_CHARS.contains(&b) && b != b'e' && b != b'E' => self.number(),
            Some(_) => self.literal(),
        }
    }

    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> Result<Value>) -> Result<Value> {
        if self.depth == MAX_DEPTH {
            return Err(self.error(ErrorKind::TooDeep));
        }
        self.depth += 1;
        let value = parse(self);
        self.depth -= 1;
        value
    }

    fn literal(&mut self) -> Result<Value> {
        let rest = &self.bytes[self.pos..];
        let (value, len) = if rest.starts_with(b"true") {
            (Value::Boolean(true), 4)
        } else if rest.starts_with(b"false") {
            (Value::Boolean(false), 5)
        } else if rest.starts_with(b"null") {
            (Value::Null, 4)
        } else {
            return Err(self.error(ErrorKind::UnexpectedValueStart));
        };
        self.pos += len;
        Ok(value)
    }

    fn object(&mut self) -> Result<Object> {
        self.expect(b'{', ErrorKind::ExpectedBraceOpen)?;
        let mut object = Object::new();
        loop {
            match self.skip_ws() {
                None => return Err(self.error(ErrorKind::ExpectedBraceClose)),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(object);
                }
                Some(_) => {}
            }

            let key = self.string()?;
            self.skip_ws();
            self.expect(b':', ErrorKind::ExpectedColon)?;
            let value = self.value()?;
            // first occurrence wins
            object.entry(key).or_insert(value);

            match self.skip_ws() {
                None => return Err(self.error(ErrorKind::ExpectedCommaOrBraceClose)),
                Some(b'}') => {}
                Some(_) => self.expect(b',', ErrorKind::ExpectedComma)?,
            }
        }
    }

    fn array(&mut self) -> Result<Array> {
        self.expect(b'[', ErrorKind::ExpectedBracketOpen)?;
        let mut array = Array::new();
        loop {
            match self.skip_ws() {
                None => return Err(self.error(ErrorKind::ExpectedBracketClose)),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(array);
                }
                Some(_) => {}
            }

            array.push(self.value()?);

            match self.skip_ws() {
                None => return Err(self.error(ErrorKind::ExpectedCommaOrBracketClose)),
                Some(b']') => {}
                Some(_) => self.expect(b',', ErrorKind::ExpectedComma)?,
            }
        }
    }

    /// The whole run of number characters must parse, as an integer when it
    /// has no fraction or exponent and as a real otherwise.
    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        let len = self.bytes[start..]
            .iter()
            .take_while(|b| NUMBER_CHARS.contains(b))
            .count();
        let run = &self.text[start..start + len];

        let value = if run.contains(['.', 'e', 'E']) {
            run.parse::<f64>()
                .ok()
                .filter(|r| r.is_finite())
                .map(Value::Real)
        } else {
            run.parse::<i64>().ok().map(Value::Integer)
        };

        match value {
            Some(value) => {
                self.pos += len;
                Ok(value)
            }
            None => Err(self.error(ErrorKind::InvalidNumber)),
        }
    }

    fn string(&mut self) -> Result<String> {
        self.expect(b'"', ErrorKind::ExpectedQuoteOpen)?;
        let mut out = String::new();
        let mut start = self.pos;
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(self.error(ErrorKind::ExpectedQuoteClose)),
                Some(b'"') => {
                    out.push_str(&self.text[start..self.pos]);
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.text[start..self.pos]);
                    self.escape(&mut out)?;
                    start = self.pos;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Decodes one escape sequence starting at the backslash.
    fn escape(&mut self, out: &mut String) -> Result<()> {
        let at = self.pos;
        let invalid = Error::Syntax {
            kind: ErrorKind::InvalidString,
            index: at,
        };
        let Some(&b) = self.bytes.get(at + 1) else {
            return Err(Error::Syntax {
                kind: ErrorKind::ExpectedQuoteClose,
                index: self.bytes.len(),
            });
        };
        self.pos += 2;

        let c = match b {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.hex4().ok_or(Error::Syntax {
                    kind: ErrorKind::InvalidString,
                    index: at,
                })?;
                let code = match high {
                    0xD800..=0xDBFF => {
                        let bytes = self.bytes;
                        if bytes.get(self.pos..self.pos + 2) != Some(b"\\u".as_slice()) {
                            return Err(invalid);
                        }
                        self.pos += 2;
                        match self.hex4() {
                            Some(low @ 0xDC00..=0xDFFF) => {
                                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                            }
                            _ => return Err(invalid),
                        }
                    }
                    0xDC00..=0xDFFF => return Err(invalid),
                    code => code,
                };
                char::from_u32(code).ok_or(invalid)?
            }
            _ => return Err(invalid),
        };
        out.push(c);
        Ok(())
    }

    fn hex4(&mut self) -> Option<u32> {
        let bytes = self.bytes;
        let digits = bytes.get(self.pos..self.pos + 4)?;
        let mut code = 0;
        for &d in digits {
            code = code * 16 + (d as char).to_digit(16)?;
        }
        self.pos += 4;
        Some(code)
    }
}
