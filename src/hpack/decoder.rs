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
// `webparse`'s `http::http2::hpack::decoder::Decoder::decode`/`decode_with_cb`
// require the entire header block in one buffer. This rebuilds decoding as
// the nested resumable state machine aws-c-http models in
// `struct hpack_progress_entry` (private/hpack.h): `Init` classifies the
// leading octet into one of `Indexed`/`LiteralBegin`/`DynamicTableResize`,
// each of which delegates to the (already-resumable) integer/string codecs
// and returns to `Init` once a full entry has been produced.

use log::{debug, trace};

use crate::{HeaderName, HeaderValue};

use super::integer::IntegerDecoder;
use super::string::StringDecoder;
use super::table::HeaderTable;
use super::{CompressionHint, Header, HpackError, Progress};

/// What a single `Decoder::decode` call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Not enough input to complete the entry currently being parsed.
    Ongoing,
    /// A complete header field, and the indexing behavior it was decoded
    /// with (relevant if the caller re-encodes it downstream, e.g. a proxy).
    HeaderField(Header, CompressionHint),
    /// A Dynamic Table Size Update was applied; carries the new size.
    DynamicTableResize(usize),
}

#[derive(Debug, Clone)]
enum State {
    Init,
    Indexed { decoder: IntegerDecoder },
    LiteralIndex { compression: CompressionHint, decoder: IntegerDecoder },
    LiteralName { compression: CompressionHint, decoder: StringDecoder },
    LiteralValue { compression: CompressionHint, name: HeaderName, decoder: StringDecoder },
    SizeUpdate { decoder: IntegerDecoder },
}

/// Fully resumable HPACK header-block decoder. A single `decode` call
/// consumes as much of `input` as is needed to produce one entry (or less,
/// if `input` runs out first); the caller keeps calling `decode` with fresh
/// input until the block is exhausted.
///
/// Any error poisons the decoder: RFC 7541 treats a malformed header block
/// as a connection-fatal error, since the dynamic table may have been left
/// partially updated. Every subsequent `decode` call returns `Poisoned`
/// without touching state.
#[derive(Debug, Clone)]
pub struct Decoder {
    table: HeaderTable,
    protocol_max_size: usize,
    state: State,
    saw_header_field_this_block: bool,
    poisoned: bool,
}

impl Decoder {
    pub fn new() -> Decoder {
        Decoder::with_protocol_max_size(super::DEFAULT_SETTINGS_HEADER_TABLE_SIZE)
    }

    /// `protocol_max_size` is the `SETTINGS_HEADER_TABLE_SIZE` this endpoint
    /// advertised to its peer; Dynamic Table Size Updates above it are a
    /// protocol error (RFC 7541 6.3).
    pub fn with_protocol_max_size(protocol_max_size: usize) -> Decoder {
        Decoder {
            table: HeaderTable::new(),
            protocol_max_size,
            state: State::Init,
            saw_header_field_this_block: false,
            poisoned: false,
        }
    }

    pub fn dynamic_table(&self) -> &super::DynamicTable {
        self.table.dynamic_table()
    }

    /// Raise (or lower) the protocol maximum enforced on incoming Dynamic
    /// Table Size Updates, e.g. after sending a new `SETTINGS_HEADER_TABLE_SIZE`.
    pub fn set_protocol_max_size(&mut self, new_max: usize) {
        self.protocol_max_size = new_max;
    }

    /// Must be called once before feeding the first octet of a new header
    /// block (i.e. a new set of HEADERS/CONTINUATION frames), so the decoder
    /// can enforce that any Dynamic Table Size Update precedes every header
    /// field in that block.
    pub fn start_header_block(&mut self) {
        self.saw_header_field_this_block = false;
    }

    /// Advances the parse by as much of `input` as is needed to produce one
    /// entry, consuming the used prefix. Call repeatedly, feeding whatever
    /// bytes are available, until `input` is empty and the last result
    /// wasn't `Ongoing`.
    pub fn decode(&mut self, input: &mut &[u8]) -> Result<DecodeEvent, HpackError> {
        if self.poisoned {
            return Err(HpackError::Poisoned);
        }
        match self.step(input) {
            Ok(event) => {
                if matches!(event, DecodeEvent::HeaderField(..)) {
                    self.saw_header_field_this_block = true;
                }
                Ok(event)
            }
            Err(e) => {
                debug!("hpack decoder poisoned: {}", e);
                self.poisoned = true;
                Err(e)
            }
        }
    }

    fn step(&mut self, input: &mut &[u8]) -> Result<DecodeEvent, HpackError> {
        loop {
            match &mut self.state {
                State::Init => {
                    let Some(&first) = input.first() else {
                        return Ok(DecodeEvent::Ongoing);
                    };
                    if first & 0x80 != 0 {
                        self.state = State::Indexed { decoder: IntegerDecoder::new(7) };
                    } else if first & 0x40 != 0 {
                        self.state = State::LiteralIndex {
                            compression: CompressionHint::UseCache,
                            decoder: IntegerDecoder::new(6),
                        };
                    } else if first & 0x20 != 0 {
                        if self.saw_header_field_this_block {
                            return Err(HpackError::InvalidMaxDynamicSize);
                        }
                        self.state = State::SizeUpdate { decoder: IntegerDecoder::new(5) };
                    } else if first & 0x10 != 0 {
                        self.state = State::LiteralIndex {
                            compression: CompressionHint::NoCacheNoIndex,
                            decoder: IntegerDecoder::new(4),
                        };
                    } else {
                        self.state = State::LiteralIndex {
                            compression: CompressionHint::NoCache,
                            decoder: IntegerDecoder::new(4),
                        };
                    }
                }
                State::Indexed { decoder } => match decoder.resume(input)? {
                    Progress::Pending => return Ok(DecodeEvent::Ongoing),
                    Progress::Ready(index) => {
                        if index == 0 {
                            return Err(HpackError::InvalidIndex);
                        }
                        let (name, value) = self.table.get(index as usize)?;
                        trace!("hpack decode: indexed field at {}", index);
                        let event =
                            DecodeEvent::HeaderField((name.clone(), value.clone()), CompressionHint::UseCache);
                        self.state = State::Init;
                        return Ok(event);
                    }
                },
                State::LiteralIndex { compression, decoder } => {
                    let compression = *compression;
                    match decoder.resume(input)? {
                        Progress::Pending => return Ok(DecodeEvent::Ongoing),
                        Progress::Ready(name_index) => {
                            if name_index == 0 {
                                self.state =
                                    State::LiteralName { compression, decoder: StringDecoder::new() };
                            } else {
                                let (name, _) = self.table.get(name_index as usize)?;
                                let name = name.clone();
                                self.state =
                                    State::LiteralValue { compression, name, decoder: StringDecoder::new() };
                            }
                        }
                    }
                }
                State::LiteralName { compression, decoder } => {
                    let compression = *compression;
                    match decoder.resume(input)? {
                        Progress::Pending => return Ok(DecodeEvent::Ongoing),
                        Progress::Ready(name_bytes) => {
                            let name = HeaderName::Value(name_bytes);
                            self.state =
                                State::LiteralValue { compression, name, decoder: StringDecoder::new() };
                        }
                    }
                }
                State::LiteralValue { compression, name, decoder } => {
                    let compression = *compression;
                    match decoder.resume(input)? {
                        Progress::Pending => return Ok(DecodeEvent::Ongoing),
                        Progress::Ready(value_bytes) => {
                            let name = name.clone();
                            let value = HeaderValue::Value(value_bytes);
                            if compression == CompressionHint::UseCache {
                                trace!("hpack decode: literal with incremental indexing");
                                self.table.add_header(name.clone(), value.clone());
                            }
                            let event = DecodeEvent::HeaderField((name, value), compression);
                            self.state = State::Init;
                            return Ok(event);
                        }
                    }
                }
                State::SizeUpdate { decoder } => match decoder.resume(input)? {
                    Progress::Pending => return Ok(DecodeEvent::Ongoing),
                    Progress::Ready(new_size) => {
                        let new_size = new_size as usize;
                        if new_size > self.protocol_max_size {
                            return Err(HpackError::InvalidMaxDynamicSize);
                        }
                        debug!("hpack decode: dynamic table resize to {}", new_size);
                        self.table.set_max_dynamic_size(new_size);
                        self.state = State::Init;
                        return Ok(DecodeEvent::DynamicTableResize(new_size));
                    }
                },
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hpack::Encoder;

    fn decode_all(decoder: &mut Decoder, mut input: &[u8]) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        loop {
            let before = input.len();
            let event = decoder.decode(&mut input).unwrap();
            let made_progress = input.len() != before;
            let is_ongoing = matches!(event, DecodeEvent::Ongoing);
            events.push(event);
            if input.is_empty() && (is_ongoing || !made_progress) {
                break;
            }
        }
        events
    }

    #[test]
    fn static_table_hit_decodes_to_method_get() {
        let mut decoder = Decoder::new();
        let events = decode_all(&mut decoder, &[0x82]);
        assert_eq!(
            events,
            vec![DecodeEvent::HeaderField(
                (HeaderName::from_static(":method"), HeaderValue::from_static("GET")),
                CompressionHint::UseCache
            )]
        );
    }

    #[test]
    fn illegal_zero_index_is_protocol_error() {
        let mut decoder = Decoder::new();
        let mut input: &[u8] = &[0x80];
        assert_eq!(decoder.decode(&mut input).unwrap_err(), HpackError::InvalidIndex);
    }

    #[test]
    fn out_of_bounds_index_is_protocol_error() {
        let mut decoder = Decoder::new();
        let mut input: &[u8] = &[0xFF, 0x00];
        // index 61 + 127 = way beyond static+empty-dynamic table.
        let err = loop {
            match decoder.decode(&mut input) {
                Ok(DecodeEvent::Ongoing) if !input.is_empty() => continue,
                Ok(DecodeEvent::Ongoing) => break HpackError::InvalidIndex, // shouldn't happen
                Ok(_) => panic!("expected error"),
                Err(e) => break e,
            }
        };
        assert_eq!(err, HpackError::InvalidIndex);
    }

    #[test]
    fn poisoned_after_error_rejects_further_calls() {
        let mut decoder = Decoder::new();
        let mut input: &[u8] = &[0x80];
        assert!(decoder.decode(&mut input).is_err());
        let mut next: &[u8] = &[0x82];
        assert_eq!(decoder.decode(&mut next).unwrap_err(), HpackError::Poisoned);
    }

    #[test]
    fn size_update_after_header_field_in_same_block_errors() {
        let mut decoder = Decoder::new();
        decoder.start_header_block();
        let mut input: &[u8] = &[0x82, 0x20];
        decoder.decode(&mut input).unwrap();
        assert_eq!(decoder.decode(&mut input).unwrap_err(), HpackError::InvalidMaxDynamicSize);
    }

    #[test]
    fn oversized_table_size_update_is_rejected() {
        let mut decoder = Decoder::with_protocol_max_size(100);
        let mut input: &[u8] = &[0x3F, 0x85, 0x01]; // prefix-5 value 200
        assert_eq!(
            decoder.decode(&mut input).unwrap_err(),
            HpackError::InvalidMaxDynamicSize
        );
    }

    #[test]
    fn encoder_and_decoder_round_trip_mixed_hints() {
        let mut encoder = Encoder::new();
        let headers = vec![
            (
                (HeaderName::from_static(":method"), HeaderValue::from_static("GET")),
                CompressionHint::UseCache,
            ),
            (
                (HeaderName::try_from(b"x-custom".to_vec()).unwrap(), HeaderValue::try_from(b"value".to_vec()).unwrap()),
                CompressionHint::NoCacheNoIndex,
            ),
        ];
        let mut out = Vec::new();
        encoder.encode_header_block(headers.clone(), &mut out);

        let mut decoder = Decoder::new();
        decoder.start_header_block();
        let events = decode_all(&mut decoder, &out);
        let decoded: Vec<(Header, CompressionHint)> = events
            .into_iter()
            .filter_map(|e| match e {
                DecodeEvent::HeaderField(h, hint) => Some((h, hint)),
                _ => None,
            })
            .collect();
        assert_eq!(decoded, headers);
    }

    #[test]
    fn resume_across_arbitrary_byte_splits() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.encode_header_block(
            [(
                (HeaderName::from_static(":authority"), HeaderValue::try_from("example.com".to_string()).unwrap()),
                CompressionHint::UseCache,
            )],
            &mut out,
        );

        for split in 0..=out.len() {
            let mut decoder = Decoder::new();
            decoder.start_header_block();
            let (first, second) = out.split_at(split);
            let mut cursor = first;
            let mut header_field = None;
            loop {
                match decoder.decode(&mut cursor).unwrap() {
                    DecodeEvent::HeaderField(h, _) => {
                        header_field = Some(h);
                        break;
                    }
                    DecodeEvent::Ongoing => {
                        if cursor.is_empty() {
                            break;
                        }
                    }
                    DecodeEvent::DynamicTableResize(_) => continue,
                }
            }
            if header_field.is_none() {
                let mut cursor = second;
                loop {
                    match decoder.decode(&mut cursor).unwrap() {
                        DecodeEvent::HeaderField(h, _) => {
                            header_field = Some(h);
                            break;
                        }
                        DecodeEvent::Ongoing => {
                            if cursor.is_empty() {
                                break;
                            }
                        }
                        DecodeEvent::DynamicTableResize(_) => continue,
                    }
                }
            }
            let (name, value) = header_field.unwrap_or_else(|| panic!("split {split} never completed"));
            assert_eq!(name, HeaderName::from_static(":authority"));
            assert_eq!(value.as_string().unwrap(), "example.com");
        }
    }
}
