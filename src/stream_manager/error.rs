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
// Grounded on aws-c-http's AWS_ERROR_HTTP2_STREAM_MANAGER* codes
// (http2_stream_manager.c), collapsed to the variants this crate's
// acquire/release path can actually raise.

use std::fmt;

/// Errors raised by the stream manager and reported through the relevant
/// `on_acquired`/`on_complete` callback, never by panicking.
#[derive(Debug, Clone)]
pub enum ManagerError {
    /// `acquire_stream` was called after (or racing) the last `release`.
    ShuttingDown,
    /// The underlying `ConnectionManager` failed to hand back a connection.
    ConnectionAcquireFailed(String),
    /// A downstream allocation or connection slot could not be obtained.
    ResourceExhausted,
    /// The manager or a connection was asked to do something that doesn't
    /// apply in its current state.
    InvalidState(&'static str),
}

impl ManagerError {
    #[inline]
    pub fn description_str(&self) -> &'static str {
        match self {
            ManagerError::ShuttingDown => "stream manager is shutting down",
            ManagerError::ConnectionAcquireFailed(_) => "connection acquire failed",
            ManagerError::ResourceExhausted => "resource exhausted",
            ManagerError::InvalidState(_) => "invalid state",
        }
    }
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerError::ConnectionAcquireFailed(reason) => {
                write!(f, "connection acquire failed: {}", reason)
            }
            ManagerError::InvalidState(what) => write!(f, "invalid state: {}", what),
            _ => f.write_str(self.description_str()),
        }
    }
}

impl std::error::Error for ManagerError {}
