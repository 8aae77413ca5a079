//! Splits one whole application package, as delivered by a
//! [crate::link::LinkChannel], into its control field and payload (§4.4).
//!
//! This is deliberately a pure function over an already-complete buffer: the
//! byte-level job of knowing *how many bytes* make up one package (reading
//! the length byte, following the `0xff` escape into a two-byte little-endian
//! length) is the transport's job - see [crate::logging::PacketWriter] - not
//! this parser's. A [crate::link::LinkChannel] implementation is expected to
//! hand this parser a buffer that already starts at the control field and
//! ends at the last payload byte, with nothing left over.
use zvt_builder::{ZVTError, ZVTResult};

/// A parsed package: the two control-field bytes and a borrow of the payload
/// that follows the length field.
#[derive(Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub control_field: [u8; 2],
    pub payload: &'a [u8],
}

/// Parses `buf` as `CCRC || APRC || LEN || payload`.
///
/// Fails with [ZVTError::ShortFrame] if `buf` doesn't even contain the
/// three-byte header. The single-byte length-escape path (`LEN == 0xff`
/// followed by a two-byte little-endian length) is accepted on receipt even
/// though the core only ever *emits* commands on the single-byte path (§4.2);
/// [ZVTError::LengthMismatch] is returned if the declared length disagrees
/// with what's actually in `buf`.
pub fn parse(buf: &[u8]) -> ZVTResult<Frame<'_>> {
    if buf.len() < 3 {
        return Err(ZVTError::ShortFrame);
    }
    let control_field = [buf[0], buf[1]];

    let (declared_len, payload) = if buf[2] == 0xff {
        if buf.len() < 5 {
            return Err(ZVTError::ShortFrame);
        }
        let len = u16::from_le_bytes([buf[3], buf[4]]) as usize;
        (len, &buf[5..])
    } else {
        (buf[2] as usize, &buf[3..])
    };

    if declared_len != payload.len() {
        return Err(ZVTError::LengthMismatch);
    }

    Ok(Frame {
        control_field,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_short_frame() {
        let buf = [0x06, 0x01, 0x02, 0xaa, 0xbb];
        let frame = parse(&buf).unwrap();
        assert_eq!(frame.control_field, [0x06, 0x01]);
        assert_eq!(frame.payload, &[0xaa, 0xbb]);
    }

    #[test]
    fn parses_an_empty_payload() {
        let buf = [0x06, 0x02, 0x00];
        let frame = parse(&buf).unwrap();
        assert_eq!(frame.control_field, [0x06, 0x02]);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn parses_the_length_escape() {
        let mut buf = vec![0x06, 0x01, 0xff, 0x03, 0x00];
        buf.extend_from_slice(&[1, 2, 3]);
        let frame = parse(&buf).unwrap();
        assert_eq!(frame.control_field, [0x06, 0x01]);
        assert_eq!(frame.payload, &[1, 2, 3]);
    }

    #[test]
    fn rejects_short_frames() {
        assert_eq!(parse(&[0x06, 0x01]), Err(ZVTError::ShortFrame));
        assert_eq!(parse(&[]), Err(ZVTError::ShortFrame));
    }

    #[test]
    fn rejects_length_mismatch() {
        let buf = [0x06, 0x01, 0x05, 0xaa, 0xbb];
        assert_eq!(parse(&buf), Err(ZVTError::LengthMismatch));
    }

    #[test]
    fn parse_is_the_inverse_of_serialize() {
        // round-trips serialize(p) -> parse -> same control field/payload,
        // for every length in the single-byte range (§8 invariant).
        for len in [0usize, 1, 42, 254] {
            let payload = vec![0xab; len];
            let mut wire = vec![0x06, 0x01, len as u8];
            wire.extend_from_slice(&payload);
            let frame = parse(&wire).unwrap();
            assert_eq!(frame.control_field, [0x06, 0x01]);
            assert_eq!(frame.payload, payload.as_slice());
        }
    }
}
