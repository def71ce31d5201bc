// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh

use crate::{HeaderName, HeaderValue};

use super::dynamic_table::DynamicTable;
use super::static_table::{self, STATIC_HASH, STATIC_NAME_HASH, STATIC_TABLE_LEN};
use super::HpackError;

/// The combined static+dynamic 1-indexed header table a single HPACK
/// encoder or decoder instance works against. Static entries occupy
/// indices `1..=STATIC_TABLE_LEN`; dynamic entries begin immediately after
/// and shift as the dynamic table evicts and inserts.
#[derive(Debug, Clone)]
pub struct HeaderTable {
    pub(crate) dynamic: DynamicTable,
}

impl HeaderTable {
    pub fn new() -> HeaderTable {
        HeaderTable { dynamic: DynamicTable::new() }
    }

    pub fn with_max_dynamic_size(max_size: usize) -> HeaderTable {
        HeaderTable { dynamic: DynamicTable::with_max_size(max_size) }
    }

    pub fn dynamic_table(&self) -> &DynamicTable {
        &self.dynamic
    }

    pub fn set_max_dynamic_size(&mut self, new_max_size: usize) {
        self.dynamic.resize(new_max_size);
    }

    pub fn max_dynamic_size(&self) -> usize {
        self.dynamic.max_size()
    }

    pub fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.dynamic.insert(name, value);
    }

    /// Resolve a 1-based combined index to the (name, value) it names.
    pub fn get(&self, index: usize) -> Result<(&HeaderName, &HeaderValue), HpackError> {
        if index == 0 {
            return Err(HpackError::InvalidIndex);
        }
        if index <= STATIC_TABLE_LEN {
            return static_table::get(index).ok_or(HpackError::InvalidIndex);
        }
        let dynamic_index = index - STATIC_TABLE_LEN - 1;
        self.dynamic.get(dynamic_index).ok_or(HpackError::InvalidIndex)
    }

    /// Find the smallest index matching `(name, value)`, preferring an
    /// exact value match over a name-only match, and preferring the static
    /// table (fixed, lower indices) when both tables offer the same kind of
    /// match.
    pub fn find_header(&self, name: &HeaderName, value: &HeaderValue) -> Option<(usize, bool)> {
        let static_exact = STATIC_HASH.get(name).and_then(|m| m.get(value)).copied();
        let static_name = STATIC_NAME_HASH.get(name).copied();
        let (dynamic_idx, dynamic_exact) = match self.dynamic.find(name, value) {
            Some((idx, exact)) => (Some(idx), exact),
            None => (None, false),
        };

        let exact = match (static_exact, dynamic_exact.then_some(dynamic_idx).flatten()) {
            (Some(s), Some(d)) => Some(s.min(d)),
            (Some(s), None) => Some(s),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };
        if let Some(idx) = exact {
            return Some((idx, true));
        }

        let name_only = match (static_name, dynamic_idx) {
            (Some(s), Some(d)) => Some(s.min(d)),
            (Some(s), None) => Some(s),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        };
        name_only.map(|idx| (idx, false))
    }
}

impl Default for HeaderTable {
    fn default() -> Self {
        HeaderTable::new()
    }
}
