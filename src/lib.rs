//! HTTP/2 core: an HPACK (RFC 7541) header-block codec and a stream
//! manager that multiplexes stream acquisitions across a connection pool.
//!
//! Connection bootstrapping, TLS/ALPN negotiation, HTTP/1.1 framing, and
//! HTTP/2 frame-layer concerns beyond the header block (DATA, SETTINGS,
//! GOAWAY, flow control, priority) are out of scope: the stream manager
//! drives them through the `Connection`/`ConnectionManager`/`EventLoop`
//! trait-object seams in [`stream_manager`].

mod error;
mod header;
mod helper;
pub mod hpack;
pub mod stream_manager;
mod value;

pub use error::{Error, Result};
pub use header::HeaderName;
pub use helper::Helper;
pub use value::HeaderValue;

pub use hpack::{CompressionHint, DecodeEvent, Decoder, DynamicTable, Encoder, Header, HeaderTable, HpackError};
pub use stream_manager::{
    AcquireStreamOptions, Connection, ConnectionManager, EventLoop, ManagerError, Message, Stream,
    StreamCallbacks, StreamManager, StreamManagerOptions,
};
