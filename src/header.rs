// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh

use std::hash::{Hash, Hasher};

use crate::{Error, Helper};

/// The name half of a header field.
///
/// HPACK treats header names as opaque byte sequences; `Stand` avoids an
/// allocation for the names that come from the static table or from a
/// `&'static str` literal at a call site, `Value` owns bytes read off the
/// wire or built at runtime. Equality and hashing compare the underlying
/// bytes, not the variant, so a `Stand` and a `Value` carrying the same name
/// are the same key in the dynamic table's lookup indices.
#[derive(Debug, Clone)]
pub enum HeaderName {
    Stand(&'static str),
    Value(Vec<u8>),
}

impl HeaderName {
    pub fn from_static(s: &'static str) -> HeaderName {
        HeaderName::Stand(s)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HeaderName::Stand(s) => s.as_bytes(),
            HeaderName::Value(v) => v,
        }
    }

    pub fn bytes_len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn as_string(&self) -> String {
        match self {
            HeaderName::Stand(s) => s.to_string(),
            HeaderName::Value(v) => String::from_utf8_lossy(v).to_string(),
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for HeaderName {}

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl TryFrom<&'static str> for HeaderName {
    type Error = Error;

    fn try_from(value: &'static str) -> Result<Self, Self::Error> {
        if !value.bytes().all(Helper::is_token) {
            return Err(Error::InvalidArgument("header name"));
        }
        Ok(HeaderName::Stand(value))
    }
}

impl TryFrom<String> for HeaderName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(HeaderName::Value(value.into_bytes()))
    }
}

impl TryFrom<Vec<u8>> for HeaderName {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(HeaderName::Value(value))
    }
}

impl<'a> From<&'a HeaderName> for Vec<u8> {
    fn from(value: &'a HeaderName) -> Self {
        value.as_bytes().to_vec()
    }
}
