// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::{HeaderName, HeaderValue};

/// (HPACK, Appendix A)
static STATIC_TABLE_RAW: &[(&str, &str)] = &[
    (":authority", ""),
    (":method", "GET"),
    (":method", "POST"),
    (":path", "/"),
    (":path", "/index.html"),
    (":scheme", "http"),
    (":scheme", "https"),
    (":status", "200"),
    (":status", "204"),
    (":status", "206"),
    (":status", "304"),
    (":status", "400"),
    (":status", "404"),
    (":status", "500"),
    ("accept-charset", ""),
    ("accept-encoding", "gzip, deflate"),
    ("accept-language", ""),
    ("accept-ranges", ""),
    ("accept", ""),
    ("access-control-allow-origin", ""),
    ("age", ""),
    ("allow", ""),
    ("authorization", ""),
    ("cache-control", ""),
    ("content-disposition", ""),
    ("content-encoding", ""),
    ("content-language", ""),
    ("content-length", ""),
    ("content-location", ""),
    ("content-range", ""),
    ("content-type", ""),
    ("cookie", ""),
    ("date", ""),
    ("etag", ""),
    ("expect", ""),
    ("expires", ""),
    ("from", ""),
    ("host", ""),
    ("if-match", ""),
    ("if-modified-since", ""),
    ("if-none-match", ""),
    ("if-range", ""),
    ("if-unmodified-since", ""),
    ("last-modified", ""),
    ("link", ""),
    ("location", ""),
    ("max-forwards", ""),
    ("proxy-authenticate", ""),
    ("proxy-authorization", ""),
    ("range", ""),
    ("referer", ""),
    ("refresh", ""),
    ("retry-after", ""),
    ("server", ""),
    ("set-cookie", ""),
    ("strict-transport-security", ""),
    ("transfer-encoding", ""),
    ("user-agent", ""),
    ("vary", ""),
    ("via", ""),
    ("www-authenticate", ""),
];

pub const STATIC_TABLE_LEN: usize = STATIC_TABLE_RAW.len();

lazy_static! {
    pub(crate) static ref STATIC_TABLE: Vec<(HeaderName, HeaderValue)> = STATIC_TABLE_RAW
        .iter()
        .map(|&(name, value)| (HeaderName::from_static(name), HeaderValue::from_static(value)))
        .collect();

    /// name -> (value -> 1-based index). Used for exact (name, value) hits.
    pub(crate) static ref STATIC_HASH: HashMap<HeaderName, HashMap<HeaderValue, usize>> = {
        let mut h: HashMap<HeaderName, HashMap<HeaderValue, usize>> = HashMap::new();
        for (idx, &(name, value)) in STATIC_TABLE_RAW.iter().enumerate() {
            h.entry(HeaderName::from_static(name))
                .or_insert_with(HashMap::new)
                .insert(HeaderValue::from_static(value), idx + 1);
        }
        h
    };

    /// name -> smallest 1-based index carrying that name, regardless of
    /// value. Used for name-only literal indexing.
    pub(crate) static ref STATIC_NAME_HASH: HashMap<HeaderName, usize> = {
        let mut h: HashMap<HeaderName, usize> = HashMap::new();
        for (idx, &(name, _)) in STATIC_TABLE_RAW.iter().enumerate() {
            h.entry(HeaderName::from_static(name)).or_insert(idx + 1);
        }
        h
    };
}

pub(crate) fn get(index: usize) -> Option<(&'static HeaderName, &'static HeaderValue)> {
    STATIC_TABLE.get(index - 1).map(|(n, v)| (n, v))
}
