// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh
//
// RFC 7541 5.2 string literals: one flag bit, a prefix-7 length, then that
// many octets of raw or Huffman data. Resumable the same way `IntegerDecoder`
// is: `StringDecoder::resume` picks up wherever the last call left off.

use super::huffman::{HuffmanDecoder, HuffmanEncoder};
use super::integer::{encode_integer, IntegerDecoder};
use super::{HpackError, Progress};

/// Controls whether the encoder Huffman-encodes a literal string value.
/// Indexing decisions (whether a header is added to the dynamic table) are
/// orthogonal to this and live in `CompressionHint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HuffmanMode {
    /// Encode both ways and keep whichever is shorter; ties favor raw.
    Smallest,
    /// Always send the string raw.
    Never,
    /// Always Huffman-encode, even if that's larger.
    Always,
}

#[derive(Debug, Clone)]
enum State {
    Init,
    Length { huffman: bool, decoder: IntegerDecoder },
    Value { huffman: bool, remaining: usize, scratch: Vec<u8> },
}

/// Resumable decoder for a single RFC 7541 5.2 string literal.
#[derive(Debug, Clone)]
pub struct StringDecoder {
    state: State,
}

impl StringDecoder {
    pub fn new() -> StringDecoder {
        StringDecoder { state: State::Init }
    }

    /// Feeds as much of `input` as is available. Returns `Pending` if the
    /// string isn't complete yet; call `resume` again on the same decoder
    /// once more bytes arrive. On `Ready`, the decoder is reset and may be
    /// reused for the next string in the header block.
    pub fn resume(&mut self, input: &mut &[u8]) -> Result<Progress<Vec<u8>>, HpackError> {
        loop {
            match &mut self.state {
                State::Init => {
                    let Some(&first) = input.first() else {
                        return Ok(Progress::Pending);
                    };
                    let huffman = first & 0x80 != 0;
                    self.state = State::Length { huffman, decoder: IntegerDecoder::new(7) };
                }
                State::Length { huffman, decoder } => {
                    let huffman = *huffman;
                    match decoder.resume(input)? {
                        Progress::Pending => return Ok(Progress::Pending),
                        Progress::Ready(len) => {
                            let remaining = len as usize;
                            self.state = State::Value {
                                huffman,
                                remaining,
                                scratch: Vec::with_capacity(remaining),
                            };
                        }
                    }
                }
                State::Value { huffman, remaining, scratch } => {
                    if *remaining > 0 {
                        let take = (*remaining).min(input.len());
                        scratch.extend_from_slice(&input[..take]);
                        *input = &input[take..];
                        *remaining -= take;
                        if *remaining > 0 {
                            return Ok(Progress::Pending);
                        }
                    }
                    let huffman = *huffman;
                    let raw = std::mem::take(scratch);
                    self.state = State::Init;
                    let value = if huffman { HuffmanDecoder::decode(&raw)? } else { raw };
                    return Ok(Progress::Ready(value));
                }
            }
        }
    }
}

impl Default for StringDecoder {
    fn default() -> Self {
        StringDecoder::new()
    }
}

/// Encodes `value` as an RFC 7541 5.2 string literal, appending it to `out`.
pub fn encode_string(value: &[u8], mode: HuffmanMode, out: &mut Vec<u8>) {
    let use_huffman = match mode {
        HuffmanMode::Never => false,
        HuffmanMode::Always => true,
        HuffmanMode::Smallest => HuffmanEncoder::encoded_len(value) < value.len(),
    };
    if use_huffman {
        let mut encoded = Vec::new();
        HuffmanEncoder::encode(value, &mut encoded);
        encode_integer(encoded.len() as u64, 7, 0x80, out);
        out.extend_from_slice(&encoded);
    } else {
        encode_integer(value.len() as u64, 7, 0x00, out);
        out.extend_from_slice(value);
    }
}

/// Decodes a single string literal assuming the whole representation is
/// already available. Convenience wrapper for call sites (tests, fixtures)
/// that don't need resumability.
pub fn decode_string_oneshot(buf: &[u8]) -> Result<(Vec<u8>, usize), HpackError> {
    let mut decoder = StringDecoder::new();
    let mut cursor = buf;
    let start_len = cursor.len();
    match decoder.resume(&mut cursor)? {
        Progress::Ready(value) => Ok((value, start_len - cursor.len())),
        Progress::Pending => Err(HpackError::OversizedInteger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip() {
        let mut out = Vec::new();
        encode_string(b"custom-key", HuffmanMode::Never, &mut out);
        let (value, consumed) = decode_string_oneshot(&out).unwrap();
        assert_eq!(value, b"custom-key");
        assert_eq!(consumed, out.len());
    }

    #[test]
    fn huffman_round_trip() {
        let mut out = Vec::new();
        encode_string(b"www.example.com", HuffmanMode::Always, &mut out);
        assert_eq!(out[0] & 0x80, 0x80);
        let (value, _) = decode_string_oneshot(&out).unwrap();
        assert_eq!(value, b"www.example.com");
    }

    #[test]
    fn smallest_mode_picks_shorter_encoding() {
        let mut out = Vec::new();
        encode_string(b"www.example.com", HuffmanMode::Smallest, &mut out);
        // Huffman-encodes this string to 12 octets vs 15 raw, so Smallest
        // should have chosen Huffman (flag bit set).
        assert_eq!(out[0] & 0x80, 0x80);
    }

    #[test]
    fn resumes_across_arbitrary_splits() {
        let mut encoded = Vec::new();
        encode_string(b"www.example.com", HuffmanMode::Always, &mut encoded);
        for split in 0..=encoded.len() {
            let (first, second) = encoded.split_at(split);
            let mut decoder = StringDecoder::new();
            let mut cursor = first;
            let result = decoder.resume(&mut cursor).unwrap();
            let value = match result {
                Progress::Ready(v) => v,
                Progress::Pending => {
                    let mut cursor = second;
                    match decoder.resume(&mut cursor).unwrap() {
                        Progress::Ready(v) => v,
                        Progress::Pending => panic!("split {split} never completed"),
                    }
                }
            };
            assert_eq!(value, b"www.example.com");
        }
    }
}
