//! Message framing
//!
//! A TCP read returns an arbitrary slice of the byte stream, so message
//! boundaries must be explicit: one JSON document per `\n`-terminated line.
//! [`read_frame`] buffers partial reads until the delimiter arrives and
//! yields exactly one frame per call; [`write_frame`] appends the delimiter
//! and flushes so peers see messages promptly.
//!
//! Frames are handed around as [`Bytes`] so a broadcast fan-out clones a
//! reference count, not the payload.

use std::io;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Default cap on a single frame's length in bytes
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

/// Read one frame from the stream.
///
/// Blank lines are skipped. Returns `Ok(None)` on a clean end of stream.
/// A frame longer than `max_len` is a protocol violation surfaced as an
/// `InvalidData` I/O error.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> io::Result<Option<Bytes>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();

        // Cap one past the limit so an oversized frame is detectable without
        // buffering it whole.
        let n = (&mut *reader)
            .take(max_len as u64 + 1)
            .read_until(b'\n', &mut buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }

            if buf.is_empty() {
                continue;
            }

            return Ok(Some(Bytes::from(buf)));
        }

        // No delimiter: either the frame is over the cap, or the peer closed
        // mid-line. The trailing partial line is surfaced as-is and left to
        // the decoder.
        if buf.len() > max_len {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                ProtocolError::FrameTooLarge(buf.len()),
            ));
        }

        return Ok(Some(Bytes::from(buf)));
    }
}

/// Write one frame, delimiter included, and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(payload).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Decode a frame into a message type.
pub fn decode<T>(frame: &[u8]) -> Result<T, ProtocolError>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(frame).map_err(ProtocolError::from)
}

/// Encode a message into a frame payload (without the delimiter).
pub fn encode<T>(message: &T) -> Result<Bytes, ProtocolError>
where
    T: Serialize,
{
    let encoded = serde_json::to_vec(message).map_err(ProtocolError::from)?;
    Ok(Bytes::from(encoded))
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use super::*;
    use crate::protocol::message::Registration;

    #[tokio::test]
    async fn test_roundtrip_over_duplex() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let mut reader = BufReader::new(reader);

        let payload = encode(&Registration::new("a", "floor1")).unwrap();
        write_frame(&mut writer, &payload).await.unwrap();
        drop(writer);

        let frame = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .expect("expected one frame");
        let reg: Registration = decode(&frame).unwrap();

        assert_eq!(reg, Registration::new("a", "floor1"));
        assert!(read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_frame_split_across_reads() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"client_id\":\"a\",")
            .read(b"\"vlan_id\":\"floor1\"}\n")
            .build();
        let mut reader = BufReader::new(mock);

        let frame = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .expect("expected one frame");
        let reg: Registration = decode(&frame).unwrap();

        assert_eq!(reg.client_id, "a");
        assert_eq!(reg.vlan_id, "floor1");
    }

    #[tokio::test]
    async fn test_two_frames_in_one_read() {
        let mock = tokio_test::io::Builder::new()
            .read(b"{\"msg\":\"first\"}\n{\"msg\":\"second\"}\n")
            .build();
        let mut reader = BufReader::new(mock);

        let first = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .unwrap();
        let second = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(&first[..], br#"{"msg":"first"}"#);
        assert_eq!(&second[..], br#"{"msg":"second"}"#);
    }

    #[tokio::test]
    async fn test_blank_lines_skipped() {
        let mock = tokio_test::io::Builder::new()
            .read(b"\n\r\n{\"msg\":\"hi\"}\n")
            .build();
        let mut reader = BufReader::new(mock);

        let frame = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(&frame[..], br#"{"msg":"hi"}"#);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let mut line = vec![b'x'; 64];
        line.push(b'\n');
        let mock = tokio_test::io::Builder::new().read(&line).build();
        let mut reader = BufReader::new(mock);

        let err = read_frame(&mut reader, 16).await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_frame_at_exact_cap_accepted() {
        let mut line = vec![b'x'; 16];
        line.push(b'\n');
        let mock = tokio_test::io::Builder::new().read(&line).build();
        let mut reader = BufReader::new(mock);

        let frame = read_frame(&mut reader, 16).await.unwrap().unwrap();

        assert_eq!(frame.len(), 16);
    }

    #[tokio::test]
    async fn test_partial_line_at_eof_surfaced() {
        let mock = tokio_test::io::Builder::new().read(b"{\"msg\":\"hi\"}").build();
        let mut reader = BufReader::new(mock);

        let frame = read_frame(&mut reader, DEFAULT_MAX_FRAME_LEN)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(&frame[..], br#"{"msg":"hi"}"#);
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let result = decode::<Registration>(b"not json");
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }
}
