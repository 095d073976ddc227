/*!
 * Decoder for the catalog's binary subtitle container.
 *
 * A container starts with the `NP` marker and a 4 byte header. The rest is
 * scrambled with a repeating 8 byte XOR key followed by a nibble swap of every
 * byte. Once descrambled, the first 4 bytes are a little-endian CRC-32 of the
 * remainder, and the remainder is a raw deflate stream (no zlib or gzip header)
 * holding the caption text.
 *
 * Payloads without the marker are plain text in UTF-8 or Windows-1250.
 */

use std::io::{Read, Write};

use encoding_rs::WINDOWS_1250;
use flate2::Compression;
use flate2::Crc;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use log::{debug, warn};

use crate::errors::PayloadError;

/// Marker opening every scrambled container
pub const CONTAINER_MAGIC: &[u8; 2] = b"NP";

/// Length of the container header, marker included
pub const CONTAINER_HEADER_LEN: usize = 4;

/// Repeating XOR key of the container
pub const CONTAINER_KEY: [u8; 8] = [0x5E, 0x34, 0x45, 0x43, 0x52, 0x45, 0x54, 0x5F];

const CHECKSUM_LEN: usize = 4;

/// How a payload was delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Scrambled, checksummed and deflated container
    Encrypted,
    /// Caption text sent as is
    PlainText,
}

/// Raw bytes as received from the download endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePayload {
    /// Bytes after transport decoding
    pub bytes: Vec<u8>,
    /// Kind inferred from the leading marker
    pub kind: PayloadKind,
}

impl SubtitlePayload {
    /// Wrap received bytes, inferring the payload kind
    pub fn new(bytes: Vec<u8>) -> Self {
        let kind = if bytes.starts_with(CONTAINER_MAGIC) {
            PayloadKind::Encrypted
        } else {
            PayloadKind::PlainText
        };
        Self { bytes, kind }
    }

    /// Decode the payload into caption text
    pub fn decode(&self) -> Result<String, PayloadError> {
        decode(&self.bytes)
    }
}

/// Decode raw payload bytes into caption text.
///
/// Checksum and decompression failures are reported as errors so the caller
/// can move on to another subtitle. Plain text never fails once non-empty.
pub fn decode(raw: &[u8]) -> Result<String, PayloadError> {
    if raw.is_empty() {
        return Err(PayloadError::NoPayload);
    }

    if !raw.starts_with(CONTAINER_MAGIC) {
        return Ok(decode_text(raw));
    }

    if raw.len() <= CONTAINER_HEADER_LEN {
        return Err(PayloadError::NoPayload);
    }

    let mut body = raw[CONTAINER_HEADER_LEN..].to_vec();
    descramble(&mut body);

    if body.len() < CHECKSUM_LEN {
        return Err(PayloadError::Truncated(raw.len()));
    }

    let (stored, compressed) = body.split_at(CHECKSUM_LEN);
    let expected = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
    let actual = crc32(compressed);
    if expected != actual {
        warn!("Subtitle container checksum mismatch ({:08x} != {:08x})", expected, actual);
        return Err(PayloadError::Checksum { expected, actual });
    }

    let inflated = inflate_raw(compressed)?;
    debug!("Decoded container: {} -> {} bytes", raw.len(), inflated.len());

    Ok(String::from_utf8_lossy(&inflated).into_owned())
}

/// Decode plain caption bytes: UTF-8 first, then Windows-1250, then lossy UTF-8
pub fn decode_text(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    if let Some(text) = WINDOWS_1250.decode_without_bom_handling_and_without_replacement(bytes) {
        debug!("Payload decoded as Windows-1250");
        return text.into_owned();
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Build a container around `text`.
///
/// This is the exact inverse of [`decode`] and is used to produce fixtures.
pub fn encode_container(text: &str) -> std::io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;

    let mut body = Vec::with_capacity(CHECKSUM_LEN + compressed.len());
    body.extend_from_slice(&crc32(&compressed).to_le_bytes());
    body.extend_from_slice(&compressed);
    scramble(&mut body);

    let mut container = Vec::with_capacity(CONTAINER_HEADER_LEN + body.len());
    container.extend_from_slice(CONTAINER_MAGIC);
    container.extend_from_slice(&[0u8; CONTAINER_HEADER_LEN - 2]);
    container.extend_from_slice(&body);
    Ok(container)
}

/// XOR with the key, then swap nibbles
fn descramble(data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        let mixed = *byte ^ CONTAINER_KEY[i % CONTAINER_KEY.len()];
        *byte = mixed.rotate_left(4);
    }
}

/// Swap nibbles, then XOR with the key
fn scramble(data: &mut [u8]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte = byte.rotate_left(4) ^ CONTAINER_KEY[i % CONTAINER_KEY.len()];
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

fn inflate_raw(compressed: &[u8]) -> Result<Vec<u8>, PayloadError> {
    let mut decoder = DeflateDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PayloadError::Decompress(e.to_string()))?;
    Ok(out)
}
