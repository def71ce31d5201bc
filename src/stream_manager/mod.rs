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
// Grounded on aws-c-http's `aws_http2_stream_manager`
// (source/http2_stream_manager.c): one mutex-guarded `SyncedData`, a
// transaction built under lock and executed after it, connection selection
// by best-fit packing, and a two-phase shutdown driven by an external
// refcount. Departs from that source in two places: new-connection sizing
// uses ceiling division rather than
// `pending_count / assume_max_concurrent_stream + 1`, and a connection
// acquire failure fails `min(pending_count, connections_acquiring)` pending
// records rather than the full pending list.

mod error;
mod options;
mod pending;
mod traits;

pub use error::ManagerError;
pub use options::{AcquireStreamOptions, StreamManagerOptions};
pub use traits::{Connection, ConnectionManager, EventLoop, Header, Message, Stream, StreamCallbacks};

use std::cmp::Reverse;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, trace, warn};

use pending::{drain_onto_connections, ManagedConnection, PendingStreamAcquisition, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ManagerState {
    Ready,
    ShuttingDown,
}

struct SyncedData {
    state: ManagerState,
    connections: Vec<ManagedConnection>,
    pending_acquisitions: VecDeque<PendingStreamAcquisition>,
    connections_acquiring: usize,
    open_stream_count: usize,
    assume_max_concurrent_stream: u32,
}

/// Multiplexes stream acquisitions across a pool of HTTP/2 connections to
/// one `(host, port)`, provisioned through an injected `ConnectionManager`.
///
/// Returned wrapped in `Arc` because every asynchronous collaborator
/// (connection acquisition, stream completion) calls back into the manager
/// from another thread; this is this crate's equivalent of the source's
/// manual refcounted `struct aws_http2_stream_manager *` passed through as
/// `void *user_data`.
pub struct StreamManager {
    connector: Arc<dyn ConnectionManager>,
    #[allow(dead_code)]
    host: String,
    #[allow(dead_code)]
    port: u16,
    max_connections: usize,
    synced: Mutex<SyncedData>,
    external_ref: AtomicUsize,
    shutdown_complete_callback: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl StreamManager {
    /// Constructs a manager in `Ready` with an external refcount of one;
    /// the caller's first `release` is the one that can trigger shutdown.
    pub fn new(options: StreamManagerOptions) -> Arc<StreamManager> {
        Arc::new(StreamManager {
            connector: options.connector,
            host: options.host,
            port: options.port,
            max_connections: options.max_connections.max(1),
            synced: Mutex::new(SyncedData {
                state: ManagerState::Ready,
                connections: Vec::new(),
                pending_acquisitions: VecDeque::new(),
                connections_acquiring: 0,
                open_stream_count: 0,
                assume_max_concurrent_stream: u32::MAX,
            }),
            external_ref: AtomicUsize::new(1),
            shutdown_complete_callback: Mutex::new(options.shutdown_complete_callback),
        })
    }

    pub fn acquire(&self) {
        self.external_ref.fetch_add(1, Ordering::SeqCst);
    }

    pub fn release(self: &Arc<Self>) {
        if self.external_ref.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.on_zero_external_ref();
        }
    }

    /// Enqueues a stream acquisition. Never blocks on I/O; may briefly block
    /// on the internal lock.
    pub fn acquire_stream(self: &Arc<Self>, options: AcquireStreamOptions) {
        let mut txn = Transaction::new();
        {
            let mut synced = self.synced.lock().unwrap();
            if synced.state == ManagerState::ShuttingDown {
                txn.failed.push((
                    PendingStreamAcquisition { options, connection: None },
                    ManagerError::ShuttingDown,
                ));
            } else {
                synced
                    .pending_acquisitions
                    .push_back(PendingStreamAcquisition { options, connection: None });
                self.build_transaction_synced(&mut synced, &mut txn);
            }
        }
        self.execute_transaction(txn);
    }

    /// Current count of streams opened and not yet completed. Exposed for
    /// tests and diagnostics.
    pub fn open_stream_count(&self) -> usize {
        self.synced.lock().unwrap().open_stream_count
    }

    fn on_zero_external_ref(self: &Arc<Self>) {
        debug!("stream manager external refcount reached zero, shutting down");
        let mut txn = Transaction::new();
        {
            let mut synced = self.synced.lock().unwrap();
            synced.state = ManagerState::ShuttingDown;
            self.build_transaction_synced(&mut synced, &mut txn);
        }
        self.execute_transaction(txn);
    }

    /// Selects a connection for as many pending records as the current
    /// inventory can hold, then (if still `Ready`) sizes and requests new
    /// connections for the remainder, then (if `ShuttingDown`) fails every
    /// record still without a connection.
    fn build_transaction_synced(&self, synced: &mut SyncedData, txn: &mut Transaction) {
        let ready = drain_onto_connections(
            &mut synced.pending_acquisitions,
            &mut synced.connections,
            Self::select_connection,
        );
        // Reserve the slot the moment a connection is chosen, not once the
        // request actually succeeds: selection must see it as unavailable
        // to the next pending record in this same pass.
        synced.open_stream_count += ready.len();
        txn.ready.extend(ready);

        match synced.state {
            ManagerState::Ready => {
                let pending_count = synced.pending_acquisitions.len();
                if pending_count > 0 {
                    let per_connection = synced.assume_max_concurrent_stream.max(1) as usize;
                    // Ceiling division: see module doc above.
                    let desired = (pending_count + per_connection - 1) / per_connection;
                    let have = synced.connections.len() + synced.connections_acquiring;
                    let room = self.max_connections.saturating_sub(have);
                    let request = desired.saturating_sub(synced.connections_acquiring).min(room);
                    if request > 0 {
                        synced.connections_acquiring += request;
                        txn.new_connections += request;
                    }
                }
            }
            ManagerState::ShuttingDown => {
                while let Some(pending) = synced.pending_acquisitions.pop_front() {
                    txn.failed.push((pending, ManagerError::ShuttingDown));
                }
                let mut still_open = Vec::with_capacity(synced.connections.len());
                for managed in synced.connections.drain(..) {
                    if managed.open_stream_count == 0 {
                        txn.connections_to_release.push(managed.connection);
                    } else {
                        still_open.push(ManagedConnection { doomed: true, ..managed });
                    }
                }
                synced.connections = still_open;
                if Self::should_destroy_synced(synced) {
                    txn.should_destroy = true;
                }
            }
        }
    }

    /// Best-fit packing: prefer the connection with the most in-use streams
    /// that still has spare capacity, so idle connections free up sooner.
    /// Ties broken by insertion order (earliest connection wins).
    fn select_connection(connections: &[ManagedConnection]) -> Option<usize> {
        connections
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.doomed && c.open_stream_count < c.connection.concurrent_stream_limit())
            .max_by_key(|(idx, c)| (c.open_stream_count, Reverse(*idx)))
            .map(|(idx, _)| idx)
    }

    fn should_destroy_synced(synced: &SyncedData) -> bool {
        synced.state == ManagerState::ShuttingDown
            && synced.connections_acquiring == 0
            && synced.open_stream_count == 0
            && synced.pending_acquisitions.is_empty()
    }

    /// Called back by the `ConnectionManager` once per `acquire_connection`.
    fn on_connection_acquired(self: &Arc<Self>, result: Result<Arc<dyn Connection>, ManagerError>) {
        let mut txn = Transaction::new();
        {
            let mut synced = self.synced.lock().unwrap();
            let connections_acquiring_before = synced.connections_acquiring;
            synced.connections_acquiring = synced.connections_acquiring.saturating_sub(1);
            match result {
                Ok(connection) => {
                    trace!("stream manager acquired a connection");
                    synced.assume_max_concurrent_stream =
                        synced.assume_max_concurrent_stream.min(connection.concurrent_stream_limit());
                    synced.connections.push(ManagedConnection {
                        connection,
                        open_stream_count: 0,
                        doomed: synced.state == ManagerState::ShuttingDown,
                    });
                }
                Err(err) => {
                    warn!("connection acquire failed: {}", err);
                    // Conservative: fail only as many pending records as we
                    // had connections in flight, rather than the whole
                    // pending list, so one bad connection doesn't cascade
                    // into failing requests a different in-flight
                    // connection would have served.
                    let to_fail = synced.pending_acquisitions.len().min(connections_acquiring_before);
                    for _ in 0..to_fail {
                        if let Some(pending) = synced.pending_acquisitions.pop_front() {
                            txn.failed.push((pending, err.clone()));
                        }
                    }
                }
            }
            self.build_transaction_synced(&mut synced, &mut txn);
        }
        self.execute_transaction(txn);
    }

    /// Called once a scheduled stream finishes, successfully or not.
    fn on_stream_completed(self: &Arc<Self>, connection: Arc<dyn Connection>, _result: Option<ManagerError>) {
        let mut txn = Transaction::new();
        {
            let mut synced = self.synced.lock().unwrap();
            synced.open_stream_count = synced.open_stream_count.saturating_sub(1);
            let mut release_index = None;
            for (idx, managed) in synced.connections.iter_mut().enumerate() {
                if Arc::ptr_eq(&managed.connection, &connection) {
                    managed.open_stream_count = managed.open_stream_count.saturating_sub(1);
                    if managed.open_stream_count == 0 && (managed.doomed || synced.state == ManagerState::ShuttingDown) {
                        release_index = Some(idx);
                    }
                    break;
                }
            }
            if let Some(idx) = release_index {
                let managed = synced.connections.remove(idx);
                txn.connections_to_release.push(managed.connection);
            }
            self.build_transaction_synced(&mut synced, &mut txn);
        }
        self.execute_transaction(txn);
    }

    /// Runs the side effects a transaction accumulated. NEVER called with
    /// the lock held.
    fn execute_transaction(self: &Arc<Self>, txn: Transaction) {
        for (pending, err) in txn.failed {
            Self::fail_pending(pending, err);
        }
        for connection in txn.connections_to_release {
            self.connector.release_connection(connection);
        }
        for pending in txn.ready {
            self.schedule_make_request(pending);
        }
        for _ in 0..txn.new_connections {
            self.request_connection();
        }
        if txn.should_destroy {
            self.start_destroy();
        }
    }

    fn fail_pending(mut pending: PendingStreamAcquisition, err: ManagerError) {
        (pending.options.on_acquired)(Err(err));
    }

    fn request_connection(self: &Arc<Self>) {
        let manager = Arc::clone(self);
        self.connector.acquire_connection(Box::new(move |result| {
            manager.on_connection_acquired(result);
        }));
    }

    /// Schedules request creation onto the chosen connection's event loop,
    /// so it never races with that connection's own shutdown.
    fn schedule_make_request(self: &Arc<Self>, pending: PendingStreamAcquisition) {
        let connection = pending
            .connection
            .clone()
            .expect("stream manager internal bug: connection not decided before scheduling");
        let event_loop = connection.event_loop();
        let manager = Arc::clone(self);
        event_loop.schedule_task_now(Box::new(move || {
            manager.run_make_request_task(connection, pending);
        }));
    }

    fn run_make_request_task(self: &Arc<Self>, connection: Arc<dyn Connection>, mut pending: PendingStreamAcquisition) {
        let request = pending.options.request;
        let mut on_acquired = pending.options.on_acquired;
        let mut on_complete = pending.options.on_complete.take();
        let manager = Arc::clone(self);
        let conn_for_complete = Arc::clone(&connection);

        let callbacks = StreamCallbacks {
            on_response_headers: pending.options.on_response_headers.take(),
            on_response_header_block_done: pending.options.on_response_header_block_done.take(),
            on_response_body: pending.options.on_response_body.take(),
            on_complete: Box::new(move |outcome| {
                if let Some(cb) = on_complete.as_mut() {
                    cb(outcome.clone());
                }
                manager.on_stream_completed(Arc::clone(&conn_for_complete), outcome);
            }),
        };

        match connection.make_request(request, callbacks) {
            Ok(stream) => {
                on_acquired(Ok(stream));
            }
            Err(err) => {
                // The slot this record reserved at selection time is still
                // held; release it the same way a real stream completing
                // with an error would.
                warn!("make_request failed: {}", err);
                on_acquired(Err(err.clone()));
                self.on_stream_completed(connection, Some(err));
            }
        }
    }

    fn start_destroy(self: &Arc<Self>) {
        debug!("stream manager releasing underlying connection manager");
        let manager = Arc::clone(self);
        self.connector.shutdown(Box::new(move || {
            manager.on_connector_shutdown_complete();
        }));
    }

    fn on_connector_shutdown_complete(&self) {
        debug!("stream manager finished shutdown");
        if let Some(callback) = self.shutdown_complete_callback.lock().unwrap().take() {
            callback();
        }
    }
}
