//! Wire encodings for the data carried inside BMP/TLV fields.
//!
//! Every marker type here implements [Encoding] for the handful of Rust types
//! that actually appear in [crate::ZvtSerializerImpl] fields. The marker is
//! selected per-field via `#[zvt_bmp(encoding = ...)]` /
//! `#[zvt_tlv(encoding = ...)]`; `Default` is used when no encoding is given.
use crate::{Tag, ZVTError, ZVTResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Encodes/decodes the payload of a single field.
///
/// Implementations that are handed a byte slice via [crate::ZvtSerializerImpl]
/// are always given exactly the bytes the surrounding [crate::length::Length]
/// determined belong to this field - so well behaved implementations consume
/// all of `bytes` and return an empty remainder.
pub trait Encoding<T> {
    fn decode(bytes: &[u8]) -> ZVTResult<(T, &[u8])>;
    fn encode(input: &T) -> Vec<u8>;
}

/// The "no special encoding" marker - raw bytes, or whatever the natural wire
/// representation of the type is.
pub struct Default;

impl Encoding<u8> for Default {
    fn decode(bytes: &[u8]) -> ZVTResult<(u8, &[u8])> {
        let (first, rest) = bytes.split_first().ok_or(ZVTError::IncompleteData)?;
        Ok((*first, rest))
    }

    fn encode(input: &u8) -> Vec<u8> {
        vec![*input]
    }
}

impl Encoding<u16> for Default {
    // The only two call sites for this (the Adpu length-escape and the
    // PartialReversal sentinel 0xffff) are little-endian on the wire.
    fn decode(bytes: &[u8]) -> ZVTResult<(u16, &[u8])> {
        if bytes.len() < 2 {
            return Err(ZVTError::IncompleteData);
        }
        let value = u16::from_le_bytes(bytes[0..2].try_into().unwrap());
        Ok((value, &bytes[2..]))
    }

    fn encode(input: &u16) -> Vec<u8> {
        input.to_le_bytes().to_vec()
    }
}

impl Encoding<Tag> for Default {
    // Tags are usually one byte. A two-byte tag is signalled by the low 5
    // bits of the first byte all being set (see the TLV tag rule, 0x1f).
    fn decode(bytes: &[u8]) -> ZVTResult<(Tag, &[u8])> {
        let (&first, rest) = bytes.split_first().ok_or(ZVTError::IncompleteData)?;
        if first & 0x1f == 0x1f {
            let (&second, rest) = rest.split_first().ok_or(ZVTError::IncompleteData)?;
            Ok((Tag(u16::from_be_bytes([first, second])), rest))
        } else {
            Ok((Tag(first as u16), rest))
        }
    }

    fn encode(input: &Tag) -> Vec<u8> {
        if input.0 > 0xff {
            input.0.to_be_bytes().to_vec()
        } else {
            vec![input.0 as u8]
        }
    }
}

impl Encoding<Vec<u8>> for Default {
    fn decode(bytes: &[u8]) -> ZVTResult<(Vec<u8>, &[u8])> {
        Ok((bytes.to_vec(), &bytes[bytes.len()..]))
    }

    fn encode(input: &Vec<u8>) -> Vec<u8> {
        input.clone()
    }
}

impl Encoding<String> for Default {
    // Text fields without an explicit encoding are rendered in the PT's
    // native code page, CodePage437. [crate::ZvtClient]'s configured encoding
    // is applied on top of this when the text is handed to a subscriber.
    fn decode(bytes: &[u8]) -> ZVTResult<(String, &[u8])> {
        Ok((
            yore::code_pages::CP437.decode(bytes),
            &bytes[bytes.len()..],
        ))
    }

    fn encode(input: &String) -> Vec<u8> {
        yore::code_pages::CP437.encode(input).unwrap_or_default()
    }
}

fn bcd_digit(byte: u8) -> ZVTResult<u8> {
    let hi = byte >> 4;
    let lo = byte & 0x0f;
    if hi > 9 || lo > 9 {
        return Err(ZVTError::InvalidDigit(byte));
    }
    Ok(hi * 10 + lo)
}

fn to_bcd_digit(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

impl Encoding<NaiveDateTime> for Default {
    // 5 packed-BCD bytes: YY MM DD HH MM (no seconds, no century).
    fn decode(bytes: &[u8]) -> ZVTResult<(NaiveDateTime, &[u8])> {
        if bytes.len() < 5 {
            return Err(ZVTError::IncompleteData);
        }
        let year = 2000 + bcd_digit(bytes[0])? as i32;
        let month = bcd_digit(bytes[1])? as u32;
        let day = bcd_digit(bytes[2])? as u32;
        let hour = bcd_digit(bytes[3])? as u32;
        let minute = bcd_digit(bytes[4])? as u32;
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ZVTError::NonImplemented)?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ZVTError::NonImplemented)?;
        Ok((date.and_time(time), &bytes[5..]))
    }

    fn encode(input: &NaiveDateTime) -> Vec<u8> {
        vec![
            to_bcd_digit((input.year() % 100) as u8),
            to_bcd_digit(input.month() as u8),
            to_bcd_digit(input.day() as u8),
            to_bcd_digit(input.hour() as u8),
            to_bcd_digit(input.minute() as u8),
        ]
    }
}

/// Always two bytes, big-endian. Used for the Adpu control field (class,
/// instr) and for the handful of TLV fields specified as big-endian
/// (e.g. `max_len_adpu`).
pub struct BigEndian;

impl Encoding<Tag> for BigEndian {
    fn decode(bytes: &[u8]) -> ZVTResult<(Tag, &[u8])> {
        if bytes.len() < 2 {
            return Err(ZVTError::IncompleteData);
        }
        Ok((
            Tag(u16::from_be_bytes(bytes[0..2].try_into().unwrap())),
            &bytes[2..],
        ))
    }

    fn encode(input: &Tag) -> Vec<u8> {
        input.0.to_be_bytes().to_vec()
    }
}

impl Encoding<u16> for BigEndian {
    fn decode(bytes: &[u8]) -> ZVTResult<(u16, &[u8])> {
        if bytes.len() < 2 {
            return Err(ZVTError::IncompleteData);
        }
        Ok((
            u16::from_be_bytes(bytes[0..2].try_into().unwrap()),
            &bytes[2..],
        ))
    }

    fn encode(input: &u16) -> Vec<u8> {
        input.to_be_bytes().to_vec()
    }
}

/// Packed BCD, two digits per byte, high nibble first.
///
/// This is the encoding used by [crate::ZvtSerializerImpl] for every BCD
/// field; it is deliberately forgiving (it masks every nibble instead of
/// failing) since the surrounding [crate::length::Length] (usually
/// [crate::length::Fixed]) already fixes the byte width. Callers that need a
/// validating, checked conversion should use [crate::bcd] instead.
pub struct Bcd;

impl Encoding<usize> for Bcd {
    fn decode(bytes: &[u8]) -> ZVTResult<(usize, &[u8])> {
        let mut value: usize = 0;
        for &byte in bytes {
            value = value * 100 + ((byte >> 4) & 0xf) as usize * 10 + (byte & 0xf) as usize;
        }
        Ok((value, &bytes[bytes.len()..]))
    }

    fn encode(input: &usize) -> Vec<u8> {
        let mut digits = Vec::new();
        let mut v = *input;
        while v > 0 {
            digits.push((v % 10) as u8);
            v /= 10;
        }
        if digits.is_empty() {
            digits.push(0);
        }
        if digits.len() % 2 == 1 {
            digits.push(0);
        }
        digits.reverse();
        digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect()
    }
}

/// Renders bytes as a lower-case hex string. Used for fields that are
/// logically opaque binary blobs (track-2 data, UUIDs, ATS, ...) but are
/// represented as [String] in the packet structs for convenience.
pub struct Hex;

impl Encoding<String> for Hex {
    fn decode(bytes: &[u8]) -> ZVTResult<(String, &[u8])> {
        Ok((hex::encode(bytes), &bytes[bytes.len()..]))
    }

    fn encode(input: &String) -> Vec<u8> {
        hex::decode(input).unwrap_or_default()
    }
}

/// Plain UTF-8 text.
pub struct Utf8;

impl Encoding<String> for Utf8 {
    fn decode(bytes: &[u8]) -> ZVTResult<(String, &[u8])> {
        Ok((String::from_utf8_lossy(bytes).into_owned(), &bytes[bytes.len()..]))
    }

    fn encode(input: &String) -> Vec<u8> {
        input.as_bytes().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd_round_trip() {
        let (value, rest) = Bcd::decode(&[0x01, 0x23]).unwrap();
        assert_eq!(value, 123);
        assert!(rest.is_empty());
        assert_eq!(Bcd::encode(&123usize), vec![0x01, 0x23]);
    }

    #[test]
    fn tag_single_byte() {
        let (tag, rest) = Default::decode(&[0x87, 0xaa]).unwrap();
        assert_eq!(tag, Tag(0x87));
        assert_eq!(rest, &[0xaa]);
        assert_eq!(<Default as Encoding<Tag>>::encode(&Tag(0x87)), vec![0x87]);
    }

    #[test]
    fn tag_two_byte_tlv_extension() {
        let (tag, rest) = Default::decode(&[0x1f, 0x4c, 0xaa]).unwrap();
        assert_eq!(tag, Tag(0x1f4c));
        assert_eq!(rest, &[0xaa]);
    }

    #[test]
    fn hex_round_trip() {
        let (value, rest) = Hex::decode(&[0xab, 0xcd]).unwrap();
        assert_eq!(value, "abcd");
        assert!(rest.is_empty());
        assert_eq!(Hex::encode(&"abcd".to_string()), vec![0xab, 0xcd]);
    }

    #[test]
    fn u16_is_little_endian() {
        assert_eq!(<Default as Encoding<u16>>::encode(&0x0102), vec![0x02, 0x01]);
    }

    #[test]
    fn big_endian_u16() {
        assert_eq!(<BigEndian as Encoding<u16>>::encode(&0x0102), vec![0x01, 0x02]);
    }
}
