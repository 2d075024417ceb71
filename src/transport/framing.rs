use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

const LENGTH_PREFIX_BYTES: usize = 4;

/// Maximum payload size accepted from the wire, guarding against a
/// corrupted or hostile length prefix driving an unbounded allocation.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Prepends a 4-byte big-endian length prefix to `payload`.
///
/// Grounded on spec.md §6.1.
pub fn encode_frame(payload: &[u8]) -> Result<BytesMut> {
    if payload.len() > MAX_FRAME_LEN as usize {
        return Err(Error::TransportFatal(format!(
            "frame of {} bytes exceeds max {MAX_FRAME_LEN}",
            payload.len()
        )));
    }
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_BYTES + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.put_slice(payload);
    Ok(buf)
}

/// Incremental length-prefixed frame parser over a byte stream that may
/// arrive split across many reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pulls one complete frame's payload out of the buffer, if enough
    /// bytes have accumulated. Call repeatedly after each `feed` — more
    /// than one frame may be ready at once.
    ///
    /// Splitting the 4-byte length prefix itself across reads is not
    /// supported: a call that finds a nonempty buffer holding fewer than
    /// `LENGTH_PREFIX_BYTES` is fatal, per spec.md §6.1. Only an empty
    /// buffer (nothing fed yet) is a benign "no frame ready".
    pub fn try_decode(&mut self) -> Result<Option<BytesMut>> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        if self.buffer.len() < LENGTH_PREFIX_BYTES {
            return Err(Error::TransportFatal(format!(
                "length prefix split across reads: {} of {LENGTH_PREFIX_BYTES} bytes buffered",
                self.buffer.len()
            )));
        }
        let len = u32::from_be_bytes(self.buffer[..LENGTH_PREFIX_BYTES].try_into().unwrap());
        if len > MAX_FRAME_LEN {
            return Err(Error::TransportFatal(format!(
                "peer announced frame of {len} bytes, exceeds max {MAX_FRAME_LEN}"
            )));
        }
        let total = LENGTH_PREFIX_BYTES + len as usize;
        if self.buffer.len() < total {
            return Ok(None);
        }
        self.buffer.advance(LENGTH_PREFIX_BYTES);
        Ok(Some(self.buffer.split_to(len as usize)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_single_frame() {
        let frame = encode_frame(b"hello").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.feed(&frame);
        let decoded = decoder.try_decode().unwrap().unwrap();
        assert_eq!(&decoded[..], b"hello");
    }

    #[test]
    fn handles_payload_split_across_reads() {
        let frame = encode_frame(b"partial-payload").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.feed(&frame[..6]);
        assert!(decoder.try_decode().unwrap().is_none());
        decoder.feed(&frame[6..]);
        let decoded = decoder.try_decode().unwrap().unwrap();
        assert_eq!(&decoded[..], b"partial-payload");
    }

    /// S6: a connection that delivers fewer than the 4 length-prefix bytes
    /// on its first read is fatal — the prefix itself must not be split
    /// across reads.
    #[test]
    fn length_prefix_split_across_reads_is_fatal() {
        let frame = encode_frame(b"partial-payload").unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.feed(&frame[..3]);
        assert!(matches!(decoder.try_decode(), Err(Error::TransportFatal(_))));
    }

    #[test]
    fn empty_buffer_is_not_fatal() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.try_decode().unwrap().is_none());
    }

    #[test]
    fn decodes_back_to_back_frames_fed_together() {
        let mut combined = encode_frame(b"one").unwrap();
        combined.extend_from_slice(&encode_frame(b"two").unwrap());
        let mut decoder = FrameDecoder::new();
        decoder.feed(&combined);
        assert_eq!(&decoder.try_decode().unwrap().unwrap()[..], b"one");
        assert_eq!(&decoder.try_decode().unwrap().unwrap()[..], b"two");
    }

    #[test]
    fn rejects_oversized_announced_length() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&(MAX_FRAME_LEN + 1).to_be_bytes());
        assert!(decoder.try_decode().is_err());
    }
}
