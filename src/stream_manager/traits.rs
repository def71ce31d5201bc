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
// The manager drives everything below the header-block through these three
// trait-object seams instead of aws-c-http's vtables
// (`aws_http_connection_manager_system_vtable`,
// `aws_channel_task`/`aws_event_loop`). `Connection` is explicitly opaque:
// frame-layer concerns (DATA, SETTINGS, GOAWAY, flow control) are someone
// else's business, so `make_request` creates *and* activates the stream as
// one atomic call, guaranteeing `on_complete` fires exactly once.

use std::sync::Arc;

use crate::stream_manager::error::ManagerError;
use crate::{HeaderName, HeaderValue};

/// A single response header, as delivered to `on_response_headers`.
pub type Header = (HeaderName, HeaderValue);

/// An outgoing request. Opaque to this crate beyond its header list; framing
/// and body encoding belong to the `Connection` collaborator.
pub trait Message: Send {
    fn headers(&self) -> Vec<Header>;
    fn body(&self) -> Option<&[u8]> {
        None
    }
}

/// The event loop a `Connection` is bound to. Used to schedule the
/// request-creation task on the connection's own thread, so it never races
/// with that connection's shutdown.
pub trait EventLoop: Send + Sync {
    fn schedule_task_now(&self, task: Box<dyn FnOnce() + Send>);
}

/// A live HTTP/2 stream handle returned by `Connection::make_request`.
pub trait Stream: Send + Sync {}

/// Callbacks wired to one stream's lifetime. `on_complete` is guaranteed by
/// the `Connection` implementation to fire exactly once: synchronously (with
/// an error) if `make_request` itself returns `Err`, or asynchronously when
/// the stream naturally finishes.
pub struct StreamCallbacks {
    pub on_response_headers: Option<Box<dyn FnMut(Header) + Send>>,
    pub on_response_header_block_done: Option<Box<dyn FnMut() + Send>>,
    pub on_response_body: Option<Box<dyn FnMut(Vec<u8>) + Send>>,
    pub on_complete: Box<dyn FnMut(Option<ManagerError>) + Send>,
}

/// An opaque, already-connected HTTP/2 connection: "a connection that
/// already speaks the wire protocol". Shared between the
/// manager and the underlying I/O channel via `Arc`.
pub trait Connection: Send + Sync {
    /// Streams currently open on this connection, for load-balancing.
    fn open_stream_count(&self) -> u32;
    /// The peer's advertised `SETTINGS_MAX_CONCURRENT_STREAMS`, or `u32::MAX`
    /// if unknown.
    fn concurrent_stream_limit(&self) -> u32;
    fn event_loop(&self) -> Arc<dyn EventLoop>;
    /// Creates and activates a stream for `request`, wiring `callbacks` to
    /// fire as the response arrives.
    fn make_request(
        &self,
        request: Box<dyn Message>,
        callbacks: StreamCallbacks,
    ) -> Result<Arc<dyn Stream>, ManagerError>;
}

/// Provisions and retires `Connection`s for a `(host, port)`. Connection
/// bootstrapping/TLS/ALPN are this trait's business, not the manager's.
pub trait ConnectionManager: Send + Sync {
    /// Asks for one more connection. `on_acquired` MUST be invoked exactly
    /// once, possibly synchronously before this call returns.
    fn acquire_connection(
        &self,
        on_acquired: Box<dyn FnOnce(Result<Arc<dyn Connection>, ManagerError>) + Send>,
    );
    /// Returns a connection to the pool (or closes it, at the manager's
    /// discretion).
    fn release_connection(&self, connection: Arc<dyn Connection>);
    /// Begins shutting down every connection this manager has provisioned.
    /// `on_shutdown_complete` MUST be invoked exactly once, after
    /// `connections_acquiring == 0` and every live connection has been
    /// released back through `release_connection`.
    fn shutdown(&self, on_shutdown_complete: Box<dyn FnOnce() + Send>);
}
