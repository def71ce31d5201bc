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
// Fills in the real body of `http::http2::hpack::encoder::Encoder::encode_header_into`,
// whose match arms were stubs (`find_header` was called but nothing was
// emitted). The dynamic-table-size-update bookkeeping (`last_value`/
// `smallest_value`/`pending`) is grounded on aws-c-http's
// `struct aws_hpack_encoder.dynamic_table_size_update` (private/hpack.h).

use log::trace;

use crate::{HeaderName, HeaderValue};

use super::integer::encode_integer;
use super::string::{encode_string, HuffmanMode};
use super::table::HeaderTable;
use super::{CompressionHint, Header};

#[derive(Debug, Clone, Copy)]
struct PendingSizeUpdate {
    last_value: usize,
    smallest_value: usize,
    pending: bool,
}

impl PendingSizeUpdate {
    fn none() -> PendingSizeUpdate {
        PendingSizeUpdate { last_value: 0, smallest_value: 0, pending: false }
    }

    fn record(&mut self, new_max: usize) {
        if self.pending {
            self.smallest_value = self.smallest_value.min(new_max);
        } else {
            self.smallest_value = new_max;
            self.pending = true;
        }
        self.last_value = new_max;
    }
}

/// Serializes header lists into HPACK header blocks, maintaining the
/// encoder-side dynamic table that must track the decoder's.
#[derive(Debug, Clone)]
pub struct Encoder {
    table: HeaderTable,
    huffman_mode: HuffmanMode,
    size_update: PendingSizeUpdate,
}

impl Encoder {
    pub fn new() -> Encoder {
        Encoder {
            table: HeaderTable::new(),
            huffman_mode: HuffmanMode::Smallest,
            size_update: PendingSizeUpdate::none(),
        }
    }

    pub fn with_dynamic_table_size(max_size: usize) -> Encoder {
        Encoder {
            table: HeaderTable::with_max_dynamic_size(max_size),
            huffman_mode: HuffmanMode::Smallest,
            size_update: PendingSizeUpdate::none(),
        }
    }

    pub fn set_huffman_mode(&mut self, mode: HuffmanMode) {
        self.huffman_mode = mode;
    }

    pub fn dynamic_table(&self) -> &HeaderTable {
        &self.table
    }

    /// Records that the dynamic table's maximum size should change before
    /// the next header block is sent. May be called more than once between
    /// blocks (e.g. SETTINGS changed twice); the block will then carry two
    /// Dynamic Table Size Update entries, smallest first, per RFC 7541 6.3.
    pub fn update_max_table_size(&mut self, new_max: usize) {
        self.size_update.record(new_max);
    }

    /// Serializes `headers` into a single HPACK header block, appended to
    /// `out`. Any pending table-size updates are emitted first.
    pub fn encode_header_block<I>(&mut self, headers: I, out: &mut Vec<u8>)
    where
        I: IntoIterator<Item = (Header, CompressionHint)>,
    {
        self.emit_pending_size_update(out);
        for (header, hint) in headers {
            self.encode_header(header, hint, out);
        }
    }

    fn emit_pending_size_update(&mut self, out: &mut Vec<u8>) {
        if !self.size_update.pending {
            return;
        }
        let PendingSizeUpdate { last_value, smallest_value, .. } = self.size_update;
        if smallest_value != last_value {
            encode_integer(smallest_value as u64, 5, 0x20, out);
            self.table.set_max_dynamic_size(smallest_value);
        }
        encode_integer(last_value as u64, 5, 0x20, out);
        self.table.set_max_dynamic_size(last_value);
        self.size_update = PendingSizeUpdate::none();
    }

    fn encode_header(&mut self, header: Header, hint: CompressionHint, out: &mut Vec<u8>) {
        let (name, value) = header;
        match self.table.find_header(&name, &value) {
            Some((index, true)) => {
                trace!("hpack encode: indexed field at {}", index);
                encode_integer(index as u64, 7, 0x80, out);
            }
            Some((name_index, false)) => {
                self.encode_literal(Some(name_index), &name, &value, hint, out);
            }
            None => {
                self.encode_literal(None, &name, &value, hint, out);
            }
        }
    }

    fn encode_literal(
        &mut self,
        name_index: Option<usize>,
        name: &HeaderName,
        value: &HeaderValue,
        hint: CompressionHint,
        out: &mut Vec<u8>,
    ) {
        let (prefix_size, starting_bits) = match hint {
            CompressionHint::UseCache => (6, 0x40),
            CompressionHint::NoCache => (4, 0x00),
            CompressionHint::NoCacheNoIndex => (4, 0x10),
        };
        match name_index {
            Some(index) => encode_integer(index as u64, prefix_size, starting_bits, out),
            None => {
                out.push(starting_bits);
                encode_string(name.as_bytes(), self.huffman_mode, out);
            }
        }
        encode_string(value.as_bytes(), self.huffman_mode, out);

        if hint == CompressionHint::UseCache {
            trace!("hpack encode: inserting into dynamic table");
            self.table.add_header(name.clone(), value.clone());
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &'static str, value: &'static str) -> Header {
        (HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    #[test]
    fn static_table_hit_is_one_octet() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.encode_header_block([(h(":method", "GET"), CompressionHint::UseCache)], &mut out);
        assert_eq!(out, vec![0x82]);
    }

    #[test]
    fn literal_incremental_with_new_name_inserts_into_table() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.set_huffman_mode(HuffmanMode::Never);
        encoder.encode_header_block(
            [(h("custom-key", "custom-header"), CompressionHint::UseCache)],
            &mut out,
        );
        assert_eq!(out[0], 0x40);
        assert_eq!(encoder.dynamic_table().dynamic_table().len(), 1);
        assert_eq!(encoder.dynamic_table().dynamic_table().size(), 10 + 13 + 32);
    }

    #[test]
    fn never_indexed_hint_uses_prefix_four_bit_one_pattern() {
        let mut encoder = Encoder::new();
        let mut out = Vec::new();
        encoder.set_huffman_mode(HuffmanMode::Never);
        encoder.encode_header_block(
            [(h("custom-key", "custom-header"), CompressionHint::NoCacheNoIndex)],
            &mut out,
        );
        assert_eq!(out[0] & 0xF0, 0x10);
        assert_eq!(encoder.dynamic_table().dynamic_table().len(), 0);
    }

    #[test]
    fn two_size_updates_emit_smallest_then_final() {
        let mut encoder = Encoder::new();
        encoder.update_max_table_size(100);
        encoder.update_max_table_size(4096);
        let mut out = Vec::new();
        encoder.encode_header_block(std::iter::empty(), &mut out);
        // First update: 5-bit prefix integer, smallest=100 doesn't fit in
        // 5 bits (max 30), so it spans two octets; same for 4096.
        assert_eq!(out[0] & 0xE0, 0x20);
        assert_eq!(encoder.dynamic_table().max_dynamic_size(), 4096);
    }

    #[test]
    fn single_size_update_emits_once() {
        let mut encoder = Encoder::new();
        encoder.update_max_table_size(0);
        let mut out = Vec::new();
        encoder.encode_header_block(std::iter::empty(), &mut out);
        assert_eq!(out, vec![0x20]);
    }
}
