use super::{Error, Mode, Result};
use crate::value::{Array, Object, Real, Value};

const INDENT: &str = "    ";

pub(super) struct Writer<'a> {
    out: &'a mut String,
    mode: Mode,
    depth: usize,
}

impl<'a> Writer<'a> {
    pub fn new(out: &'a mut String, mode: Mode) -> Self {
        Self {
            out,
            mode,
            depth: 0,
        }
    }

    pub fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Integer(i) => self.out.push_str(&i.to_string()),
            Value::Real(r) => {
                if !r.is_finite() {
                    return Err(Error::NonFinite(*r));
                }
                self.out.push_str(&format_real(*r));
            }
            Value::String(s) => escape_into(self.out, s),
            Value::Array(array) => self.array(array)?,
            Value::Object(object) => self.object(object)?,
        }
        Ok(())
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    fn array(&mut self, array: &Array) -> Result<()> {
        if array.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }

        self.out.push('[');
        self.depth += 1;
        for (i, item) in array.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if self.mode == Mode::Readable {
                self.newline();
            }
            self.value(item)?;
        }
        self.depth -= 1;
        if self.mode == Mode::Readable {
            self.newline();
        }
        self.out.push(']');
        Ok(())
    }

    fn object(&mut self, object: &Object) -> Result<()> {
        if object.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }

        self.out.push('{');
        self.depth += 1;
        for (i, (key, item)) in object.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            if self.mode == Mode::Readable {
                self.newline();
            }
            escape_into(self.out, key);
            self.out.push_str(match self.mode {
                Mode::Compact => ":",
                Mode::Readable => ": ",
            });
            self.value(item)?;
        }
        self.depth -= 1;
        if self.mode == Mode::Readable {
            self.newline();
        }
        self.out.push('}');
        Ok(())
    }
}

/// Appends `s` as a quoted JSON string.
fn escape_into(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '/' => out.push_str("\\/"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Formats a finite real like C's `%.16g`.
///
/// Sixteen significant digits, trailing zeros removed, exponent notation when
/// the decimal exponent is below -4 or at least 16.
pub(crate) fn format_real(r: Real) -> String {
    const PRECISION: i32 = 16;

    let sci = format!("{:.*e}", (PRECISION - 1) as usize, r);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let fixed = format!("{:.*}", (PRECISION - 1 - exponent) as usize, r);
        trim_fraction(&fixed).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::super::{ErrorKind, read, write};
    use super::*;
    use crate::value::Type;

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(1.0), "1");
        assert_eq!(format_real(3.14), "3.14");
        assert_eq!(format_real(-2.5), "-2.5");
        assert_eq!(format_real(0.1 + 0.2), "0.3");
        assert_eq!(format_real(1e20), "1e+20");
        assert_eq!(format_real(1.5e-7), "1.5e-07");
        assert_eq!(format_real(0.0001), "0.0001");
        assert_eq!(format_real(123456789012345.0), "123456789012345");
        assert_eq!(format_real(1e16), "1e+16");
        #[allow(clippy::excessive_precision)]
        let pi = 3.141592653589793238;
        assert_eq!(format_real(pi), "3.141592653589793");
    }

    #[test]
    fn test_compact() {
        let value = read(r#"{"b": [1, 2.5, "x"], "a": null, "c": {"d": true}}"#).unwrap();
        assert_eq!(
            write(&value, Mode::Compact).unwrap(),
            r#"{"a":null,"b":[1,2.5,"x"],"c":{"d":true}}"#
        );
    }

    #[test]
    fn test_readable() {
        let mut value = Value::new(Type::Object);
        value["list"] = Value::from(vec![1, 2]);
        value["empty"] = Value::new(Type::Array);
        value["obj"] = Value::new(Type::Object);
        value["obj"]["k"] = "v".into();

        let expected = "{\n    \"empty\": [],\n    \"list\": [\n        1,\n        2\n    ],\n    \"obj\": {\n        \"k\": \"v\"\n    }\n}";
        assert_eq!(write(&value, Mode::Readable).unwrap(), expected);
        assert_eq!(write(&Value::new(Type::Object), Mode::Readable).unwrap(), "{}");
        assert_eq!(write(&Value::from(7), Mode::Readable).unwrap(), "7");
    }

    #[test]
    fn test_string_escapes() {
        let value = Value::from("q\"b\\s/\u{8}\u{c}\n\r\t\u{1}\u{1f}é");
        assert_eq!(
            write(&value, Mode::Compact).unwrap(),
            r#""q\"b\\s\/\b\f\n\r\t\u0001\u001Fé""#
        );
        assert_eq!(read(&write(&value, Mode::Compact).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_non_finite() {
        let err = write(&Value::from(f64::NAN), Mode::Compact).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert!(write(&Value::from(vec![f64::INFINITY]), Mode::Compact).is_err());
    }
}
