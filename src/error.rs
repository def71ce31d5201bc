// Copyright 2022 - 2023 Wenmeng See the COPYRIGHT
// file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
//
// Author: tickbh

use std::{convert::Infallible, fmt, result};

use crate::hpack::HpackError;
use crate::stream_manager::ManagerError;

/// Top-level error type, aggregating the HPACK codec's and the stream
/// manager's own error enums the way `webparse::WebError` aggregates
/// `HttpError`/`Http2Error`/`WsError`.
#[derive(Debug)]
pub enum Error {
    Hpack(HpackError),
    Manager(ManagerError),
    /// A caller passed something this crate cannot accept, tagged with the
    /// field that was wrong.
    InvalidArgument(&'static str),
    Io(std::io::Error),
}

impl Error {
    #[inline]
    fn description_str(&self) -> &'static str {
        match self {
            Error::Hpack(e) => e.description_str(),
            Error::Manager(e) => e.description_str(),
            Error::InvalidArgument(_) => "invalid argument",
            Error::Io(_) => "io error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(field) => write!(f, "invalid argument: {}", field),
            _ => f.write_str(self.description_str()),
        }
    }
}

impl std::error::Error for Error {}

impl From<HpackError> for Error {
    fn from(e: HpackError) -> Self {
        Error::Hpack(e)
    }
}

impl From<ManagerError> for Error {
    fn from(e: ManagerError) -> Self {
        Error::Manager(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        Error::InvalidArgument("infallible")
    }
}

pub type Result<T> = result::Result<T, Error>;
