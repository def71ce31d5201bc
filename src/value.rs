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

/// The value half of a header field. Like `HeaderName`, this is an opaque
/// byte sequence as far as HPACK is concerned: no charset validation is
/// performed here, that belongs to whatever protocol layer sits above this
/// crate.
#[derive(Debug, Clone)]
pub enum HeaderValue {
    Stand(&'static str),
    Value(Vec<u8>),
}

impl HeaderValue {
    pub fn from_static(s: &'static str) -> HeaderValue {
        HeaderValue::Stand(s)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            HeaderValue::Stand(s) => s.as_bytes(),
            HeaderValue::Value(v) => v,
        }
    }

    pub fn bytes_len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn as_string(&self) -> Option<String> {
        match self {
            HeaderValue::Stand(s) => Some(s.to_string()),
            HeaderValue::Value(v) => String::from_utf8(v.clone()).ok(),
        }
    }
}

impl PartialEq for HeaderValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for HeaderValue {}

impl Hash for HeaderValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl TryInto<usize> for &HeaderValue {
    type Error = Error;

    fn try_into(self) -> Result<usize, Error> {
        let bytes = self.as_bytes();
        if bytes.is_empty() {
            return Err(Error::InvalidArgument("empty integer header value"));
        }
        let mut result = 0usize;
        for b in bytes {
            if !Helper::is_digit(*b) {
                return Err(Error::InvalidArgument("non-digit header value"));
            }
            match result.overflowing_mul(10) {
                (u, false) => result = u + (b - Helper::DIGIT_0) as usize,
                (_, true) => return Err(Error::InvalidArgument("integer header value overflow")),
            }
        }
        Ok(result)
    }
}

impl TryInto<String> for &HeaderValue {
    type Error = Error;

    fn try_into(self) -> Result<String, Error> {
        match self {
            HeaderValue::Stand(s) => Ok(s.to_string()),
            HeaderValue::Value(v) => Ok(String::from_utf8_lossy(v).to_string()),
        }
    }
}

impl TryFrom<&'static str> for HeaderValue {
    type Error = Error;

    fn try_from(value: &'static str) -> Result<Self, Self::Error> {
        Ok(HeaderValue::Stand(value))
    }
}

impl TryFrom<String> for HeaderValue {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(HeaderValue::Value(value.into_bytes()))
    }
}

impl TryFrom<Vec<u8>> for HeaderValue {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(HeaderValue::Value(value))
    }
}
