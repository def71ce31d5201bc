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
// Adapted from `hpack::header_index::HeaderIndex`: same FIFO-by-octet-cost
// table, but now also keeps a reverse-lookup index so that encoding a
// header that is already in the table doesn't require a linear scan.

use std::collections::{HashMap, VecDeque};

use log::debug;

use crate::{HeaderName, HeaderValue};

use super::header_cost;
use super::static_table::STATIC_TABLE_LEN;
use super::DEFAULT_SETTINGS_HEADER_TABLE_SIZE;

/// The bounded, FIFO-evicted per-connection header cache (RFC 7541 2.3.2).
///
/// Entries are stored newest-first; dynamic index 1 (i.e. combined index
/// `STATIC_TABLE_LEN + 1`) always names the most recently inserted header.
#[derive(Debug, Clone)]
pub struct DynamicTable {
    table: VecDeque<(HeaderName, HeaderValue)>,
    size: usize,
    max_size: usize,
    /// (name, value) -> smallest combined index carrying that exact pair.
    reverse_exact: HashMap<(HeaderName, HeaderValue), usize>,
    /// name -> smallest combined index carrying that name.
    reverse_name: HashMap<HeaderName, usize>,
}

impl DynamicTable {
    pub fn new() -> DynamicTable {
        DynamicTable::with_max_size(DEFAULT_SETTINGS_HEADER_TABLE_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> DynamicTable {
        DynamicTable {
            table: VecDeque::new(),
            size: 0,
            max_size,
            reverse_exact: HashMap::new(),
            reverse_name: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Current occupied size in octets, per the RFC's accounting rule.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Returns the (name, value) stored at the given *dynamic* index, where
    /// dynamic index 0 is the newest entry.
    pub fn get(&self, dynamic_index: usize) -> Option<(&HeaderName, &HeaderValue)> {
        self.table.get(dynamic_index).map(|(n, v)| (n, v))
    }

    /// Insert a new entry at the front, evicting from the back until the
    /// table fits `max_size`. A single entry larger than `max_size` simply
    /// empties the table (RFC 7541 4.4).
    pub fn insert(&mut self, name: HeaderName, value: HeaderValue) {
        self.size += header_cost(&name, &value);
        self.table.push_front((name, value));
        self.evict_to_fit();
        self.rebuild_reverse_indices();
    }

    /// Change the maximum size, evicting as necessary. May be called with a
    /// larger or smaller bound than the current one.
    pub fn resize(&mut self, new_max_size: usize) {
        self.max_size = new_max_size;
        self.evict_to_fit();
        debug!("hpack dynamic table resized to {} (occupied {})", new_max_size, self.size);
        self.rebuild_reverse_indices();
    }

    fn evict_to_fit(&mut self) {
        while self.size > self.max_size {
            match self.table.pop_back() {
                Some((name, value)) => self.size -= header_cost(&name, &value),
                None => {
                    debug_assert!(self.size == 0, "dynamic table size desynced from its contents");
                    self.size = 0;
                    break;
                }
            }
        }
    }

    fn rebuild_reverse_indices(&mut self) {
        self.reverse_exact.clear();
        self.reverse_name.clear();
        for (pos, (name, value)) in self.table.iter().enumerate() {
            let combined = STATIC_TABLE_LEN + 1 + pos;
            self.reverse_exact
                .entry((name.clone(), value.clone()))
                .or_insert(combined);
            self.reverse_name.entry(name.clone()).or_insert(combined);
        }
    }

    /// Look up a (name, value) pair against just this table, returning a
    /// combined-space index and whether the value also matched exactly.
    pub fn find(&self, name: &HeaderName, value: &HeaderValue) -> Option<(usize, bool)> {
        if let Some(&idx) = self.reverse_exact.get(&(name.clone(), value.clone())) {
            return Some((idx, true));
        }
        self.reverse_name.get(name).map(|&idx| (idx, false))
    }
}

impl Default for DynamicTable {
    fn default() -> Self {
        DynamicTable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
        (HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    #[test]
    fn insert_tracks_cost() {
        let mut table = DynamicTable::with_max_size(1000);
        let (n, v) = h("custom-key", "custom-header");
        table.insert(n, v);
        assert_eq!(table.size(), 10 + 13 + 32);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn eviction_is_fifo_by_cost() {
        let mut table = DynamicTable::with_max_size(100);
        let (n1, v1) = h("a", "11111111111111111111111"); // cost 1+23+32=56
        let (n2, v2) = h("b", "11111111111111111111111"); // cost 56
        table.insert(n1, v1);
        table.insert(n2, v2);
        // total would be 112 > 100, oldest evicted
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().0, &HeaderName::from_static("b"));
    }

    #[test]
    fn oversized_entry_empties_table() {
        let mut table = DynamicTable::with_max_size(40);
        let (n, v) = h("custom-key", "custom-header");
        table.insert(n, v);
        assert_eq!(table.len(), 0);
        assert_eq!(table.size(), 0);
    }

    #[test]
    fn exact_match_beats_name_only() {
        let mut table = DynamicTable::with_max_size(1000);
        let (n1, v1) = h("x", "one");
        let (n2, v2) = h("x", "two");
        table.insert(n1, v1);
        table.insert(n2, v2);
        let (idx, exact) = table
            .find(&HeaderName::from_static("x"), &HeaderValue::from_static("two"))
            .unwrap();
        assert!(exact);
        assert_eq!(idx, STATIC_TABLE_LEN + 1); // newest entry, dynamic index 0
    }
}
