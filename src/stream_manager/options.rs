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
// Plain option structs built with setter methods: explicit structs rather
// than a config-file/env crate. `bootstrap`/`socket_options`/
// `tls_connection_options` from `aws_http2_stream_manager_options` collapse
// into `connector`, the injected `ConnectionManager` trait object.

use std::sync::Arc;

use super::error::ManagerError;
use super::traits::{ConnectionManager, Header, Message, Stream};

/// Construction options for a `StreamManager`.
pub struct StreamManagerOptions {
    pub(crate) connector: Arc<dyn ConnectionManager>,
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) max_connections: usize,
    pub(crate) initial_window_size: Option<u32>,
    pub(crate) enable_read_back_pressure: bool,
    pub(crate) shutdown_complete_callback: Option<Box<dyn FnOnce() + Send>>,
}

impl StreamManagerOptions {
    pub fn new(connector: Arc<dyn ConnectionManager>, host: impl Into<String>, port: u16, max_connections: usize) -> Self {
        StreamManagerOptions {
            connector,
            host: host.into(),
            port,
            max_connections,
            initial_window_size: None,
            enable_read_back_pressure: false,
            shutdown_complete_callback: None,
        }
    }

    pub fn initial_window_size(mut self, size: u32) -> Self {
        self.initial_window_size = Some(size);
        self
    }

    pub fn enable_read_back_pressure(mut self, enable: bool) -> Self {
        self.enable_read_back_pressure = enable;
        self
    }

    pub fn shutdown_complete_callback(mut self, callback: Box<dyn FnOnce() + Send>) -> Self {
        self.shutdown_complete_callback = Some(callback);
        self
    }
}

/// A single stream request plus the callbacks that observe it.
pub struct AcquireStreamOptions {
    pub(crate) request: Box<dyn Message>,
    pub(crate) on_response_headers: Option<Box<dyn FnMut(Header) + Send>>,
    pub(crate) on_response_header_block_done: Option<Box<dyn FnMut() + Send>>,
    pub(crate) on_response_body: Option<Box<dyn FnMut(Vec<u8>) + Send>>,
    pub(crate) on_complete: Option<Box<dyn FnMut(Option<ManagerError>) + Send>>,
    pub(crate) on_acquired: Box<dyn FnMut(Result<Arc<dyn Stream>, ManagerError>) + Send>,
}

impl AcquireStreamOptions {
    pub fn new(
        request: Box<dyn Message>,
        on_acquired: Box<dyn FnMut(Result<Arc<dyn Stream>, ManagerError>) + Send>,
    ) -> Self {
        AcquireStreamOptions {
            request,
            on_response_headers: None,
            on_response_header_block_done: None,
            on_response_body: None,
            on_complete: None,
            on_acquired,
        }
    }

    pub fn on_response_headers(mut self, callback: Box<dyn FnMut(Header) + Send>) -> Self {
        self.on_response_headers = Some(callback);
        self
    }

    pub fn on_response_header_block_done(mut self, callback: Box<dyn FnMut() + Send>) -> Self {
        self.on_response_header_block_done = Some(callback);
        self
    }

    pub fn on_response_body(mut self, callback: Box<dyn FnMut(Vec<u8>) + Send>) -> Self {
        self.on_response_body = Some(callback);
        self
    }

    pub fn on_complete(mut self, callback: Box<dyn FnMut(Option<ManagerError>) + Send>) -> Self {
        self.on_complete = Some(callback);
        self
    }
}
