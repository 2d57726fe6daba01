//! Chunk codec for the legacy design file container.
//!
//! A stored design is a single chunk: a 5-byte header (encoding byte plus
//! little-endian decoded length) followed by the encoded payload. Four
//! encodings exist; design files on disk use [`Encoding::Rotate`], but the
//! decoder accepts all four so foreign files remain readable.
//!
//! The RLE scheme is tag-driven. A tag byte >= 0x80 means "repeat the next
//! byte `257 - tag` times"; a tag < 0x80 means "copy the next `tag + 1`
//! bytes verbatim". `RleCompressed` runs a back-reference pass over the RLE
//! output: 0xFF introduces a literal byte, any other tag packs a copy length
//! (bits 0..=2, length 1..=8) and a negative offset (bits 3..=7, offset
//! `(tag >> 3) - 32`, range -32..=-1) into a single byte.

use std::fmt;

/// Payload transforms understood by the chunk container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Payload stored verbatim.
    None,
    /// Run-length encoding only.
    Rle,
    /// Run-length encoding followed by a back-reference pass.
    RleCompressed,
    /// Per-byte left rotation with a cycling rotation count.
    Rotate,
}

impl Encoding {
    pub fn as_u8(self) -> u8 {
        match self {
            Encoding::None => 0,
            Encoding::Rle => 1,
            Encoding::RleCompressed => 2,
            Encoding::Rotate => 3,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Encoding::None),
            1 => Some(Encoding::Rle),
            2 => Some(Encoding::RleCompressed),
            3 => Some(Encoding::Rotate),
            _ => None,
        }
    }
}

/// Errors raised while decoding a chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkError {
    /// Input shorter than the 5-byte chunk header.
    TruncatedHeader,
    /// The header's encoding byte is not one of the four known codes.
    UnknownEncoding(u8),
    /// The payload ended in the middle of a tag's operands.
    TruncatedPayload,
    /// The header promises more data than the caller's limit allows.
    TooLarge { decoded: u32, max: u32 },
    /// The payload decoded to a different length than the header declared.
    LengthMismatch { header: u32, actual: usize },
    /// A back-reference pointed before the start of the output.
    BadBackReference,
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::TruncatedHeader => write!(f, "chunk header truncated"),
            ChunkError::UnknownEncoding(code) => write!(f, "unknown chunk encoding {code}"),
            ChunkError::TruncatedPayload => write!(f, "chunk payload truncated"),
            ChunkError::TooLarge { decoded, max } => {
                write!(f, "chunk declares {decoded} decoded bytes, limit is {max}")
            }
            ChunkError::LengthMismatch { header, actual } => {
                write!(f, "chunk decoded to {actual} bytes, header declared {header}")
            }
            ChunkError::BadBackReference => write!(f, "back-reference before start of output"),
        }
    }
}

impl std::error::Error for ChunkError {}

const CHUNK_HEADER_SIZE: usize = 5;

// RLE tag limits: a literal block tag spans 1..=125 bytes encoded as
// tag + 1, and a run tag covers 3..=125 repeats encoded as 257 - count.
const RLE_MAX_BLOCK: usize = 125;
const RLE_MIN_RUN: usize = 3;

// ---------------------------------------------------------------------------
// Chunk container
// ---------------------------------------------------------------------------

/// Encode `data` as a complete chunk: header plus transformed payload.
pub fn encode_chunk(encoding: Encoding, data: &[u8]) -> Vec<u8> {
    let payload = match encoding {
        Encoding::None => data.to_vec(),
        Encoding::Rle => encode_rle(data),
        Encoding::RleCompressed => encode_back_references(&encode_rle(data)),
        Encoding::Rotate => encode_rotate(data),
    };
    let mut out = Vec::with_capacity(CHUNK_HEADER_SIZE + payload.len());
    out.push(encoding.as_u8());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

/// Decode a complete chunk, refusing anything that would expand beyond
/// `max_decoded` bytes.
pub fn decode_chunk(input: &[u8], max_decoded: u32) -> Result<Vec<u8>, ChunkError> {
    if input.len() < CHUNK_HEADER_SIZE {
        return Err(ChunkError::TruncatedHeader);
    }
    let encoding =
        Encoding::from_u8(input[0]).ok_or(ChunkError::UnknownEncoding(input[0]))?;
    let declared = u32::from_le_bytes([input[1], input[2], input[3], input[4]]);
    if declared > max_decoded {
        return Err(ChunkError::TooLarge { decoded: declared, max: max_decoded });
    }
    let payload = &input[CHUNK_HEADER_SIZE..];
    let data = match encoding {
        Encoding::None => payload.to_vec(),
        Encoding::Rle => decode_rle(payload, declared as usize)?,
        Encoding::RleCompressed => {
            let rle = decode_back_references(payload)?;
            decode_rle(&rle, declared as usize)?
        }
        Encoding::Rotate => decode_rotate(payload),
    };
    if data.len() != declared as usize {
        return Err(ChunkError::LengthMismatch { header: declared, actual: data.len() });
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// RLE pass
// ---------------------------------------------------------------------------

fn encode_rle(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        // Measure the run starting here.
        let mut run = 1;
        while i + run < data.len() && data[i + run] == data[i] && run < RLE_MAX_BLOCK {
            run += 1;
        }
        if run >= RLE_MIN_RUN {
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }
        // Gather literals until the next worthwhile run or the block limit.
        let start = i;
        let mut end = i + run;
        while end < data.len() && end - start < RLE_MAX_BLOCK {
            let mut next_run = 1;
            while end + next_run < data.len()
                && data[end + next_run] == data[end]
                && next_run < RLE_MIN_RUN
            {
                next_run += 1;
            }
            if next_run >= RLE_MIN_RUN {
                break;
            }
            end += next_run;
        }
        let end = end.min(start + RLE_MAX_BLOCK).min(data.len());
        out.push((end - start - 1) as u8);
        out.extend_from_slice(&data[start..end]);
        i = end;
    }
    out
}

fn decode_rle(payload: &[u8], size_hint: usize) -> Result<Vec<u8>, ChunkError> {
    let mut out = Vec::with_capacity(size_hint);
    let mut i = 0;
    while i < payload.len() {
        let tag = payload[i];
        i += 1;
        if tag >= 0x80 {
            let count = 257 - tag as usize;
            let byte = *payload.get(i).ok_or(ChunkError::TruncatedPayload)?;
            i += 1;
            out.extend(std::iter::repeat(byte).take(count));
        } else {
            let count = tag as usize + 1;
            if i + count > payload.len() {
                return Err(ChunkError::TruncatedPayload);
            }
            out.extend_from_slice(&payload[i..i + count]);
            i += count;
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Back-reference pass (RleCompressed only)
// ---------------------------------------------------------------------------

fn encode_back_references(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        // Longest match within the last 32 bytes of already-emitted input.
        let mut best_len = 0usize;
        let mut best_offset = 0isize;
        let window_start = i.saturating_sub(32);
        for candidate in window_start..i {
            let mut len = 0;
            while len < 8 && i + len < data.len() && data[candidate + len] == data[i + len] {
                len += 1;
            }
            if len > best_len {
                best_len = len;
                best_offset = candidate as isize - i as isize;
            }
        }
        if best_len >= 2 {
            // Tag 0xFF is reserved for literals: offset -1 with length 8
            // would produce it, so shorten that one match.
            if best_len == 8 && best_offset == -1 {
                best_len = 7;
            }
            let tag = ((best_len - 1) as u8) | (((best_offset + 32) as u8) << 3);
            out.push(tag);
            i += best_len;
        } else {
            out.push(0xFF);
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

fn decode_back_references(payload: &[u8]) -> Result<Vec<u8>, ChunkError> {
    let mut out: Vec<u8> = Vec::with_capacity(payload.len());
    let mut i = 0;
    while i < payload.len() {
        let tag = payload[i];
        i += 1;
        if tag == 0xFF {
            let byte = *payload.get(i).ok_or(ChunkError::TruncatedPayload)?;
            i += 1;
            out.push(byte);
        } else {
            let len = (tag & 0x07) as usize + 1;
            let offset = ((tag >> 3) as isize) - 32;
            let Some(start) = out.len().checked_add_signed(offset) else {
                return Err(ChunkError::BadBackReference);
            };
            for k in 0..len {
                // Copies may overlap the bytes just written.
                let byte = out[start + k];
                out.push(byte);
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Rotation pass
// ---------------------------------------------------------------------------

fn encode_rotate(data: &[u8]) -> Vec<u8> {
    let mut code = 1u32;
    data.iter()
        .map(|&b| {
            let rotated = b.rotate_left(code);
            code = (code + 2) & 7;
            rotated
        })
        .collect()
}

fn decode_rotate(payload: &[u8]) -> Vec<u8> {
    let mut code = 1u32;
    payload
        .iter()
        .map(|&b| {
            let original = b.rotate_right(code);
            code = (code + 2) & 7;
            original
        })
        .collect()
}
