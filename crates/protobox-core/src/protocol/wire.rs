//! Binary wire primitives (panic-free).
//!
//! Parsing rules:
//! - Never index (`buf[0]`) — always use `Buf` and `remaining()` checks.
//! - Never `unwrap()` / `expect()` / `panic!()` in production paths.

use bytes::{Buf, BufMut, Bytes};

use crate::error::{ProtoboxError, Result};

/// Longest valid varint encoding of a u64.
const MAX_VARINT_LEN: usize = 10;

/// Wire type carried in the low three bits of a field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    fn from_bits(bits: u64) -> Result<Self> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            other => Err(ProtoboxError::BinaryDecoding(format!(
                "invalid wire type {other}"
            ))),
        }
    }

    fn bits(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}

pub fn encode_varint(mut v: u64, buf: &mut impl BufMut) {
    while v >= 0x80 {
        buf.put_u8((v as u8) | 0x80);
        v >>= 7;
    }
    buf.put_u8(v as u8);
}

pub fn decode_varint(buf: &mut impl Buf) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ProtoboxError::BinaryDecoding("truncated varint".into()));
        }
        let byte = buf.get_u8();
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ProtoboxError::BinaryDecoding("varint too long".into()))
}

pub fn encode_key(field: u32, wire_type: WireType, buf: &mut impl BufMut) {
    encode_varint((u64::from(field) << 3) | wire_type.bits(), buf);
}

/// Decode a field key into `(field number, wire type)`.
pub fn decode_key(buf: &mut impl Buf) -> Result<(u32, WireType)> {
    let key = decode_varint(buf)?;
    let wire_type = WireType::from_bits(key & 0x7)?;
    let field = u32::try_from(key >> 3)
        .map_err(|_| ProtoboxError::BinaryDecoding(format!("field number out of range: {key}")))?;
    if field == 0 {
        return Err(ProtoboxError::BinaryDecoding("field number 0 is reserved".into()));
    }
    Ok((field, wire_type))
}

pub fn encode_bytes_field(field: u32, value: &[u8], buf: &mut impl BufMut) {
    encode_key(field, WireType::LengthDelimited, buf);
    encode_varint(value.len() as u64, buf);
    buf.put_slice(value);
}

pub fn encode_string_field(field: u32, value: &str, buf: &mut impl BufMut) {
    encode_bytes_field(field, value.as_bytes(), buf);
}

pub fn encode_varint_field(field: u32, value: u64, buf: &mut impl BufMut) {
    encode_key(field, WireType::Varint, buf);
    encode_varint(value, buf);
}

pub fn encode_double_field(field: u32, value: f64, buf: &mut impl BufMut) {
    encode_key(field, WireType::Fixed64, buf);
    buf.put_f64_le(value);
}

/// Read a length prefix and split that many bytes off `buf` (zero-copy).
pub fn decode_length_delimited(buf: &mut Bytes) -> Result<Bytes> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len)
        .map_err(|_| ProtoboxError::BinaryDecoding("length prefix overflows usize".into()))?;
    if buf.remaining() < len {
        return Err(ProtoboxError::BinaryDecoding(format!(
            "length-delimited field wants {len} bytes, {} remain",
            buf.remaining()
        )));
    }
    Ok(buf.copy_to_bytes(len))
}

pub fn decode_string(buf: &mut Bytes) -> Result<String> {
    let raw = decode_length_delimited(buf)?;
    String::from_utf8(raw.to_vec())
        .map_err(|e| ProtoboxError::BinaryDecoding(format!("invalid UTF-8 in string field: {e}")))
}

pub fn decode_double(buf: &mut Bytes) -> Result<f64> {
    if buf.remaining() < 8 {
        return Err(ProtoboxError::BinaryDecoding("truncated fixed64".into()));
    }
    Ok(buf.get_f64_le())
}

/// Check that a known field arrived with the wire type its schema expects.
pub fn check_wire_type(field: u32, expected: WireType, actual: WireType) -> Result<()> {
    if expected != actual {
        return Err(ProtoboxError::BinaryDecoding(format!(
            "field {field}: expected wire type {expected:?}, got {actual:?}"
        )));
    }
    Ok(())
}

/// Skip the value of an unknown field.
pub fn skip_field(wire_type: WireType, buf: &mut Bytes) -> Result<()> {
    match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
        }
        WireType::Fixed64 => skip_exact(buf, 8)?,
        WireType::Fixed32 => skip_exact(buf, 4)?,
        WireType::LengthDelimited => {
            decode_length_delimited(buf)?;
        }
        WireType::StartGroup | WireType::EndGroup => {
            return Err(ProtoboxError::BinaryDecoding("groups are not supported".into()));
        }
    }
    Ok(())
}

fn skip_exact(buf: &mut Bytes, n: usize) -> Result<()> {
    if buf.remaining() < n {
        return Err(ProtoboxError::BinaryDecoding(format!("truncated fixed{}", n * 8)));
    }
    buf.advance(n);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn varint_known_encodings() {
        let mut buf = BytesMut::new();
        encode_varint(300, &mut buf);
        assert_eq!(&buf[..], &[0xac, 0x02]);

        let mut buf = BytesMut::new();
        encode_varint(u64::MAX, &mut buf);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        assert_eq!(decode_varint(&mut buf.freeze()).unwrap(), u64::MAX);
    }

    #[test]
    fn truncated_varint_is_error() {
        let mut buf = Bytes::from_static(&[0x80, 0x80]);
        let err = decode_varint(&mut buf).unwrap_err();
        assert_eq!(err.code().as_str(), "BINARY_DECODING");
    }

    #[test]
    fn overlong_varint_is_error() {
        let mut buf = Bytes::from_static(&[0xff; 11]);
        assert!(decode_varint(&mut buf).is_err());
    }

    #[test]
    fn key_rejects_field_zero_and_bad_wire_type() {
        assert!(decode_key(&mut Bytes::from_static(&[0x00])).is_err());
        assert!(decode_key(&mut Bytes::from_static(&[0x0e])).is_err());
        assert_eq!(
            decode_key(&mut Bytes::from_static(&[0x12])).unwrap(),
            (2, WireType::LengthDelimited)
        );
    }

    #[test]
    fn length_delimited_bounds_checked() {
        let mut buf = Bytes::from_static(&[0x05, b'a', b'b']);
        assert!(decode_length_delimited(&mut buf).is_err());

        let mut buf = Bytes::from_static(&[0x02, b'h', b'i', 0x01]);
        assert_eq!(decode_string(&mut buf).unwrap(), "hi");
        assert_eq!(buf.remaining(), 1);
    }

    #[test]
    fn skip_unknown_fields() {
        let mut out = BytesMut::new();
        encode_varint_field(7, 150, &mut out);
        encode_double_field(8, 1.5, &mut out);
        encode_string_field(9, "skip me", &mut out);
        let mut buf = out.freeze();
        while buf.has_remaining() {
            let (_, wt) = decode_key(&mut buf).unwrap();
            skip_field(wt, &mut buf).unwrap();
        }
    }
}
