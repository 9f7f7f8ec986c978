//! Content identifiers as exchanged with the node.
//!
//! On the wire a CID is `{"/": "bafy…"}`. We keep the text form and decode the
//! binary layout only when a caller needs the multihash digest (CommR).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cid {
    #[serde(rename = "/")]
    text: String,
}

/// The decoded fields of a CIDv1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CidParts {
    pub version: u64,
    pub codec: u64,
    pub hash_code: u64,
    pub digest: Vec<u8>,
}

impl Cid {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_defined(&self) -> bool {
        !self.text.is_empty()
    }

    /// Encode a CIDv1 in its base32 text form.
    pub fn from_parts(parts: &CidParts) -> Self {
        let mut bytes = Vec::with_capacity(parts.digest.len() + 12);
        write_uvarint(&mut bytes, parts.version);
        write_uvarint(&mut bytes, parts.codec);
        write_uvarint(&mut bytes, parts.hash_code);
        write_uvarint(&mut bytes, parts.digest.len() as u64);
        bytes.extend_from_slice(&parts.digest);
        Self::new(format!("b{}", encode_base32(&bytes)))
    }

    /// Decode a base32 (`b`-prefixed) CIDv1.
    pub fn decode(&self) -> Result<CidParts, AppError> {
        let invalid = |why: &str| AppError::format(format!("invalid cid '{}': {why}", self.text));

        if !self.is_defined() {
            return Err(AppError::format("undefined cid"));
        }
        let body = self
            .text
            .strip_prefix('b')
            .ok_or_else(|| invalid("only base32 CIDv1 is supported"))?;
        let bytes = decode_base32(body).ok_or_else(|| invalid("bad base32"))?;

        let mut cursor = bytes.as_slice();
        let version = read_uvarint(&mut cursor).ok_or_else(|| invalid("truncated version"))?;
        if version != 1 {
            return Err(invalid("not a CIDv1"));
        }
        let codec = read_uvarint(&mut cursor).ok_or_else(|| invalid("truncated codec"))?;
        let hash_code = read_uvarint(&mut cursor).ok_or_else(|| invalid("truncated multihash code"))?;
        let len = read_uvarint(&mut cursor).ok_or_else(|| invalid("truncated multihash length"))? as usize;
        if cursor.len() != len {
            return Err(invalid("multihash length mismatch"));
        }

        Ok(CidParts {
            version,
            codec,
            hash_code,
            digest: cursor.to_vec(),
        })
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn write_uvarint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn read_uvarint(cursor: &mut &[u8]) -> Option<u64> {
    let bytes: &[u8] = *cursor;
    let mut value = 0u64;
    for (i, &byte) in bytes.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            *cursor = &bytes[i + 1..];
            return Some(value);
        }
    }
    None
}

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// RFC 4648 base32, lowercase, unpadded (the multibase `b` alphabet).
fn encode_base32(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 8 / 5 + 1);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for &b in bytes {
        buffer = (buffer << 8) | u32::from(b);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 31) as usize] as char);
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 31) as usize] as char);
    }
    out
}

fn decode_base32(text: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut buffer = 0u32;
    let mut bits = 0u32;
    for c in text.bytes() {
        let value = match c {
            b'a'..=b'z' => c - b'a',
            b'2'..=b'7' => c - b'2' + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    Some(out)
}
