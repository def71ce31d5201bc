//! HPACK (RFC 7541) header-block codec: a bounded dynamic table shared by a
//! resumable encoder and decoder.
//!
//! The decoder accepts its input in arbitrarily small pieces across
//! repeated `decode` calls and picks its parse back up exactly where the
//! last call left off; the encoder is a synchronous, single-pass writer.
//! Both share the same `DynamicTable`/static table lookup machinery.

use std::fmt;

mod static_table;
mod dynamic_table;
mod table;
mod integer;
mod string;
mod huffman;
mod encoder;
mod decoder;

pub use dynamic_table::DynamicTable;
pub use table::HeaderTable;
pub use integer::{decode_integer_oneshot, encode_integer, IntegerDecoder};
pub use string::{decode_string_oneshot, encode_string, HuffmanMode, StringDecoder};
pub use huffman::{HuffmanDecoder, HuffmanEncoder};
pub use encoder::Encoder;
pub use decoder::{DecodeEvent, Decoder};

use crate::{HeaderName, HeaderValue};

/// A single decoded or to-be-encoded header field.
pub type Header = (HeaderName, HeaderValue);

/// Whether, and how, a header field that isn't already in the dynamic table
/// should be added to it when encoded.
///
/// Maps directly onto the three literal wire forms (RFC 7541 6.2):
/// incremental indexing, without indexing, and never indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionHint {
    /// Literal with Incremental Indexing: insert into the dynamic table.
    UseCache,
    /// Literal without Indexing: do not insert, but intermediaries may.
    NoCache,
    /// Literal Never Indexed: do not insert, and the bit marking this as
    /// sensitive MUST survive re-encoding by any intermediary.
    NoCacheNoIndex,
}

/// Either side's progress indicator for a resumable parse: either more
/// input is required, or a value of `T` is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<T> {
    Pending,
    Ready(T),
}

/// Errors the HPACK codec can raise. Any of these, once raised from
/// `Decoder::decode`, poisons the decoder: an invalid header block must
/// permanently fail the connection's compression context, since the
/// dynamic table may be left referencing partially-applied state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpackError {
    /// An indexed field referenced index 0, or an index beyond the
    /// combined static+dynamic table.
    InvalidIndex,
    /// A Dynamic Table Size Update exceeded the protocol maximum the
    /// decoder was configured to enforce.
    InvalidMaxDynamicSize,
    /// A prefixed integer's encoded representation would overflow 64 bits.
    OversizedInteger,
    /// A Huffman-encoded string's padding was longer than 7 bits, or was
    /// not composed only of 1 bits.
    InvalidHuffmanPadding,
    /// The EOS symbol appeared as a regular code inside a Huffman string.
    HuffmanEosInString,
    /// The decoder has already returned an error and must not be reused.
    Poisoned,
}

impl HpackError {
    #[inline]
    pub fn description_str(&self) -> &'static str {
        match self {
            HpackError::InvalidIndex => "hpack index out of bounds",
            HpackError::InvalidMaxDynamicSize => "dynamic table size update exceeds protocol maximum",
            HpackError::OversizedInteger => "hpack integer encoding exceeds 64 bits",
            HpackError::InvalidHuffmanPadding => "invalid huffman padding",
            HpackError::HuffmanEosInString => "huffman eos symbol inside string",
            HpackError::Poisoned => "hpack decoder is poisoned by a previous error",
        }
    }
}

impl fmt::Display for HpackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description_str())
    }
}

impl std::error::Error for HpackError {}

pub(crate) fn header_cost(name: &HeaderName, value: &HeaderValue) -> usize {
    name.bytes_len() + value.bytes_len() + 32
}

/// RFC 7541's assumed initial dynamic table size, used before a peer's
/// `SETTINGS_HEADER_TABLE_SIZE` has been observed.
pub const DEFAULT_SETTINGS_HEADER_TABLE_SIZE: usize = 4_096;
