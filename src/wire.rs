//! Frame codec for the peer wire protocol
//!
//! Every exchange is built out of frames with a fixed layout:
//!
//! ```text
//! +----------------+----------------+-----------------------+
//! | msg type (4B)  | length (4B BE) | UTF-8 payload (len B)  |
//! +----------------+----------------+-----------------------+
//! ```
//!
//! `msg type` is 4 ASCII bytes, `length` is a big-endian `u32` byte count of
//! the payload that follows. This mirrors the struct layout a prior Python
//! implementation used (`struct.pack("!4sL%ds", ...)`) byte for byte, so the
//! two are wire-compatible.
//!
//! A frame read is either the start of a new exchange or a continuation of
//! one already underway. Reaching end-of-stream exactly on a frame boundary
//! is the normal way a connection ends and is reported as `Ok(None)`.
//! Reaching end-of-stream partway through a frame is a protocol violation
//! and is reported as `Err`.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Upper bound on a single payload, defending against a peer claiming an
/// absurd length and forcing an equally absurd allocation. Not part of the
/// wire format itself — a frame over this bound is simply treated the same
/// as any other malformed frame.
pub const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

/// Read `buf.len()` bytes, distinguishing a clean end-of-stream (no bytes
/// read yet) from a truncated one (some bytes read, then EOF).
///
/// Returns `Ok(true)` if the buffer was filled, `Ok(false)` if EOF was hit
/// before any byte of this read was consumed.
async fn fill_or_eof<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed mid-frame",
            ));
        }
        filled += n;
    }
    Ok(true)
}

/// Read one frame off `reader`.
///
/// Returns `Ok(None)` if the stream ended cleanly before a new frame began.
/// Returns `Err(Error::ProtocolParse)` if the stream ended partway through a
/// frame, the length exceeds [`MAX_PAYLOAD_LEN`], or either the type or the
/// payload is not valid UTF-8.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<(String, String)>> {
    let mut type_buf = [0u8; 4];
    let got_type = fill_or_eof(reader, &mut type_buf)
        .await
        .map_err(|e| Error::protocol_parse(e.to_string()))?;
    if !got_type {
        return Ok(None);
    }

    let msg_type = std::str::from_utf8(&type_buf)
        .map_err(|_| Error::protocol_parse("message type is not valid ASCII"))?
        .to_string();

    let mut len_buf = [0u8; 4];
    if !fill_or_eof(reader, &mut len_buf)
        .await
        .map_err(|e| Error::protocol_parse(e.to_string()))?
    {
        return Err(Error::protocol_parse(
            "connection closed after message type but before length",
        ));
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_PAYLOAD_LEN {
        return Err(Error::protocol_parse(format!(
            "declared payload length {} exceeds maximum {}",
            len, MAX_PAYLOAD_LEN
        )));
    }

    let mut payload_buf = vec![0u8; len as usize];
    if len > 0
        && !fill_or_eof(reader, &mut payload_buf)
            .await
            .map_err(|e| Error::protocol_parse(e.to_string()))?
    {
        return Err(Error::protocol_parse(
            "connection closed before the declared payload was fully received",
        ));
    }

    let payload = String::from_utf8(payload_buf)
        .map_err(|_| Error::protocol_parse("payload is not valid UTF-8"))?;

    Ok(Some((msg_type, payload)))
}

/// Write one frame to `writer` and flush it.
///
/// `msg_type` must be exactly 4 bytes; this is an invariant of the types we
/// construct ourselves, not something a caller can get from the network, so
/// it is checked with an assertion rather than a recoverable error.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg_type: &str,
    payload: &str,
) -> Result<()> {
    assert_eq!(msg_type.len(), 4, "message type must be exactly 4 bytes");

    writer.write_all(msg_type.as_bytes()).await?;
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn round_trips_a_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "PING", "hello").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (msg_type, payload) = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(msg_type, "PING");
        assert_eq!(payload, "hello");
    }

    #[tokio::test]
    async fn round_trips_an_empty_payload() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "PING", "").await.unwrap();

        let mut cursor = Cursor::new(buf);
        let (msg_type, payload) = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(msg_type, "PING");
        assert_eq!(payload, "");
    }

    #[tokio::test]
    async fn clean_eof_before_any_frame_is_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let result = read_frame(&mut cursor).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        // a full type plus a length field, but no payload bytes even though
        // the length claims five are coming
        let mut buf = Vec::new();
        buf.extend_from_slice(b"PING");
        buf.extend_from_slice(&5u32.to_be_bytes());

        let mut cursor = Cursor::new(buf);
        let result = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn truncated_type_is_an_error() {
        let mut cursor = Cursor::new(vec![b'P', b'I']);
        let result = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn oversized_length_is_rejected_without_allocating() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"INFR");
        buf.extend_from_slice(&(MAX_PAYLOAD_LEN + 1).to_be_bytes());

        let mut cursor = Cursor::new(buf);
        let result = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[should_panic(expected = "exactly 4 bytes")]
    async fn write_frame_rejects_short_type() {
        let mut buf = Vec::new();
        let _ = write_frame(&mut buf, "BAD", "x").await;
    }
}
