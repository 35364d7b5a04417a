//! Codec - 引数と結果の JSON encode / decode
//!
//! wire 形式は既存の worker と byte 単位で互換にします。
//! - 要素の区切りは `", "`、キーと値の区切りは `": "`
//! - `' '..='~'` 以外の文字は `\uXXXX`（BMP 外は surrogate pair）
//! - 浮動小数点は最短表現。指数が -4 未満か 16 以上なら `1e+16` / `1.5e-07` 形式
//! - キーワード引数の順序は保持
//!
//! 例: `[[77, 2], {"label": "café"}]`

use std::io;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::ser::Formatter;

use crate::domain::Args;
pub use crate::domain::errors::CodecError;

/// Proxy から Scheduler に渡される引数の serializer
pub type ArgsSerializer = fn(&Args) -> Result<String, CodecError>;

/// Proxy から Scheduler に渡される結果の deserializer
pub type ResultDeserializer = fn(&str) -> Result<Value, CodecError>;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, WireFormatter);
    value.serialize(&mut ser).map_err(CodecError::Encode)?;
    // WireFormatter は ASCII しか書かない
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

pub fn serialize_args(args: &Args) -> Result<String, CodecError> {
    encode(args)
}

pub fn deserialize_args(input: &str) -> Result<Args, CodecError> {
    decode(input)
}

pub fn serialize_result<T: Serialize + ?Sized>(result: &T) -> Result<String, CodecError> {
    encode(result)
}

pub fn deserialize_result(text: &str) -> Result<Value, CodecError> {
    decode(text)
}

struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_f32<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f32) -> io::Result<()> {
        self.write_f64(writer, f64::from(value))
    }

    fn write_f64<W: ?Sized + io::Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if (' '..='~').contains(&ch) {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// 有限の f64 を最短表現で書く（非有限値は serde_json が null にする）
fn float_repr(value: f64) -> String {
    let sci = format!("{:e}", value);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();

    if (-4..16).contains(&exponent) {
        let point = exponent + 1;
        if point <= 0 {
            format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
        } else {
            let point = point as usize;
            if point >= digits.len() {
                format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..point], &digits[point..])
            }
        }
    } else {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{sign}{head}e{exp_sign}{:02}", exponent.unsigned_abs())
        } else {
            format!("{sign}{head}.{tail}e{exp_sign}{:02}", exponent.unsigned_abs())
        }
    }
}
