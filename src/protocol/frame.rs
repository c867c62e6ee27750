//! Frame encoding and decoding for the Yacode protocol.
//!
//! The wire format wraps a command code and a UTF-8 text payload:
//! ```text
//! ┌────────┬─────────────┬───────────────┬───────────────┬────────┐
//! │  0x02  │ kind (BE)   │ length (BE)   │   payload     │  0x03  │
//! │ 1 byte │  2 bytes    │   4 bytes     │ length bytes  │ 1 byte │
//! └────────┴─────────────┴───────────────┴───────────────┴────────┘
//! ```
//!
//! One socket read is expected to carry exactly one frame; there is no
//! reassembly across reads.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::protocol::command::CommandKind;
use crate::protocol::message::ProtocolMessage;

/// Start-of-frame marker.
pub const FRAME_START: u8 = 0x02;

/// End-of-frame marker.
pub const FRAME_END: u8 = 0x03;

/// Header size (marker + kind + length).
pub const HEADER_SIZE: usize = 7;

/// Smallest possible frame (header + end marker, empty payload).
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + 1;

/// Encodes a message into a wire frame.
#[must_use]
pub fn encode(message: &ProtocolMessage) -> Bytes {
    let payload = message.payload().as_bytes();

    let mut buf = BytesMut::with_capacity(MIN_FRAME_SIZE + payload.len());
    buf.put_u8(FRAME_START);
    buf.put_u16(message.kind().code());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    buf.put_u8(FRAME_END);
    buf.freeze()
}

/// Decodes a frame, explaining why the buffer was rejected.
///
/// Bytes after the end marker are ignored.
///
/// # Errors
///
/// Returns a [`FrameError`] if the buffer does not hold a complete frame.
pub fn decode_frame(buf: &[u8]) -> Result<ProtocolMessage, FrameError> {
    if buf.len() < MIN_FRAME_SIZE {
        return Err(FrameError::TooShort {
            needed: MIN_FRAME_SIZE,
            got: buf.len(),
        });
    }

    if buf[0] != FRAME_START {
        return Err(FrameError::BadMarker(buf[0]));
    }

    let code = u16::from_be_bytes([buf[1], buf[2]]);
    let kind = CommandKind::from_code(code).ok_or(FrameError::UnknownCommand(code))?;

    let length = u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]) as usize;
    let body = &buf[HEADER_SIZE..];
    // The end marker must follow the payload, so `length` must leave one byte.
    if body.len() <= length {
        return Err(FrameError::Incomplete {
            expected: length,
            got: body.len().min(length),
        });
    }

    if body[length] != FRAME_END {
        return Err(FrameError::MissingTerminator);
    }

    let trailing = body.len() - length - 1;
    if trailing > 0 {
        tracing::debug!("ignoring {} bytes after end of frame", trailing);
    }

    let payload = std::str::from_utf8(&body[..length]).map_err(|_| FrameError::InvalidUtf8)?;
    Ok(ProtocolMessage::new(kind, payload))
}

/// Decodes a frame, returning `None` for anything that is not a valid frame.
///
/// A `None` means the read was noise; it is not an error condition.
#[must_use]
pub fn decode(buf: &[u8]) -> Option<ProtocolMessage> {
    match decode_frame(buf) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::debug!("discarding unrecognized read ({} bytes): {}", buf.len(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode(&ProtocolMessage::new(CommandKind::StartPrinting, "ok"));

        assert_eq!(frame[0], FRAME_START);
        assert_eq!(&frame[1..3], &[0x01, 0x01]);
        assert_eq!(&frame[3..7], &[0, 0, 0, 2]);
        assert_eq!(&frame[7..9], b"ok");
        assert_eq!(frame[9], FRAME_END);
        assert_eq!(frame.len(), MIN_FRAME_SIZE + 2);
    }

    #[test]
    fn test_roundtrip_all_kinds() {
        let payloads = [
            "",
            "status",
            r#"{"template":"100.ym","note":"quote \" brace } comma , tab \t"}"#,
            r#"[{"template_name":"라벨.ym"}]"#,
        ];
        for kind in CommandKind::ALL {
            for payload in payloads {
                let message = ProtocolMessage::new(kind, payload);
                let decoded = decode(&encode(&message));
                assert_eq!(decoded, Some(message));
            }
        }
    }

    #[test]
    fn test_decode_truncated_header() {
        let frame = encode(&ProtocolMessage::new(CommandKind::SystemStatus, "{}"));
        assert_eq!(decode(&frame[..5]), None);
        assert_eq!(
            decode_frame(&frame[..5]),
            Err(FrameError::TooShort {
                needed: MIN_FRAME_SIZE,
                got: 5
            })
        );
        assert_eq!(decode(&[]), None);
    }

    #[test]
    fn test_decode_bad_marker() {
        let mut frame = encode(&ProtocolMessage::new(CommandKind::SystemStatus, "{}")).to_vec();
        frame[0] = 0x3c;
        assert_eq!(decode_frame(&frame), Err(FrameError::BadMarker(0x3c)));
        assert_eq!(decode(&frame), None);
    }

    #[test]
    fn test_decode_unknown_command() {
        let mut frame = encode(&ProtocolMessage::new(CommandKind::SystemStatus, "{}")).to_vec();
        frame[1] = 0x7f;
        frame[2] = 0x7f;
        assert_eq!(decode_frame(&frame), Err(FrameError::UnknownCommand(0x7f7f)));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let frame = encode(&ProtocolMessage::new(CommandKind::GetPrintingLog, "[1,2,3]"));
        let cut = &frame[..frame.len() - 3];
        assert!(matches!(
            decode_frame(cut),
            Err(FrameError::Incomplete { expected: 7, .. })
        ));
    }

    #[test]
    fn test_decode_missing_terminator() {
        let mut frame = encode(&ProtocolMessage::new(CommandKind::GetPrintingLog, "[]")).to_vec();
        let last = frame.len() - 1;
        frame[last] = b'!';
        assert_eq!(decode_frame(&frame), Err(FrameError::MissingTerminator));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let frame = [FRAME_START, 0x00, 0x01, 0, 0, 0, 2, 0xff, 0xfe, FRAME_END];
        assert_eq!(decode_frame(&frame), Err(FrameError::InvalidUtf8));
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut frame = encode(&ProtocolMessage::new(CommandKind::TestInformation, "x")).to_vec();
        frame.extend_from_slice(b"junk");
        let decoded = decode(&frame).unwrap();
        assert_eq!(decoded.kind(), CommandKind::TestInformation);
        assert_eq!(decoded.payload(), "x");
    }
}
