//! Word-aligned parameter encoding.
//!
//! Every signed value is laid out as one or more 32-byte big-endian words,
//! the same layout typed-data signers use. Dynamic values (byte strings,
//! arrays) are represented by the Keccak hash of their contents, so the
//! encoding of a parameter tuple has a fixed shape and cannot be made
//! ambiguous by moving bytes between neighbouring fields.

use crate::config::WORD_LENGTH;
use crate::crypto::hash::keccak256;
use crate::types::{Address, Digest};

/// Builder for word-aligned encodings.
#[derive(Debug, Default, Clone)]
pub struct WordEncoder {
    buf: Vec<u8>,
}

impl WordEncoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(8 * WORD_LENGTH),
        }
    }

    /// Append a raw 32-byte word.
    pub fn word(mut self, word: &[u8; WORD_LENGTH]) -> Self {
        self.buf.extend_from_slice(word);
        self
    }

    /// Append an unsigned integer, left-padded to 32 bytes.
    pub fn uint(mut self, value: u128) -> Self {
        self.buf.extend_from_slice(&[0u8; WORD_LENGTH - 16]);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Append a `u64`, left-padded to 32 bytes.
    pub fn uint64(self, value: u64) -> Self {
        self.uint(u128::from(value))
    }

    /// Append an address, left-padded to 32 bytes.
    pub fn address(mut self, address: &Address) -> Self {
        self.buf.extend_from_slice(&[0u8; WORD_LENGTH - 20]);
        self.buf.extend_from_slice(address.as_bytes());
        self
    }

    /// Append the hash of a dynamic byte string.
    pub fn bytes(self, data: &[u8]) -> Self {
        let hash = keccak256(data);
        self.word(&hash)
    }

    /// Append the hash of an address array (each element word-encoded).
    pub fn address_array(self, items: &[Address]) -> Self {
        let inner = items
            .iter()
            .fold(WordEncoder::new(), |enc, a| enc.address(a))
            .finish();
        self.bytes(&inner)
    }

    /// Append the hash of an integer array (each element word-encoded).
    pub fn uint_array(self, items: &[u128]) -> Self {
        let inner = items
            .iter()
            .fold(WordEncoder::new(), |enc, v| enc.uint(*v))
            .finish();
        self.bytes(&inner)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Keccak hash of everything appended so far.
    pub fn hash(&self) -> Digest {
        keccak256(&self.buf)
    }
}
