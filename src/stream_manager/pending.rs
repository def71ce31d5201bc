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
// `PendingStreamAcquisition` mirrors aws-c-http's
// `aws_h2_sm_pending_stream_acquisition`; `Transaction` mirrors
// `aws_http2_stream_management_transaction`. The pending list is a plain
// `VecDeque` rather than an intrusive linked list: an O(n) scan over the
// small pending set is acceptable.

use std::collections::VecDeque;
use std::sync::Arc;

use super::error::ManagerError;
use super::options::AcquireStreamOptions;
use super::traits::Connection;

/// One connection this manager has provisioned, plus the local bookkeeping
/// the selection policy needs. Mirrors `aws_h2_sm_connection`.
pub(crate) struct ManagedConnection {
    pub(crate) connection: Arc<dyn Connection>,
    pub(crate) open_stream_count: u32,
    /// Set once the manager has decided to retire this connection (shutdown
    /// in progress); it is released as soon as its last stream completes.
    pub(crate) doomed: bool,
}

/// A request awaiting (or assigned) a connection. Destroyed when its stream
/// completes or its acquisition fails.
pub(crate) struct PendingStreamAcquisition {
    pub(crate) options: AcquireStreamOptions,
    pub(crate) connection: Option<Arc<dyn Connection>>,
}

/// The batch of side effects one lock-protected state mutation produced.
/// Built while holding the manager's mutex; executed after it is released,
/// so that no user callback or downstream call ever happens with the lock
/// held.
#[derive(Default)]
pub(crate) struct Transaction {
    pub(crate) ready: Vec<PendingStreamAcquisition>,
    pub(crate) failed: Vec<(PendingStreamAcquisition, ManagerError)>,
    pub(crate) connections_to_release: Vec<Arc<dyn Connection>>,
    pub(crate) new_connections: usize,
    pub(crate) should_destroy: bool,
}

impl Transaction {
    pub(crate) fn new() -> Transaction {
        Transaction::default()
    }
}

/// Drains `queue` (FIFO) as long as `pick` can find a connection, consuming
/// exactly one of that connection's spare slots per pending record.
pub(crate) fn drain_onto_connections<F>(
    queue: &mut VecDeque<PendingStreamAcquisition>,
    connections: &mut [ManagedConnection],
    mut pick: F,
) -> Vec<PendingStreamAcquisition>
where
    F: FnMut(&[ManagedConnection]) -> Option<usize>,
{
    let mut ready = Vec::new();
    while let Some(idx) = pick(connections) {
        let Some(mut pending) = queue.pop_front() else {
            break;
        };
        connections[idx].open_stream_count += 1;
        pending.connection = Some(Arc::clone(&connections[idx].connection));
        ready.push(pending);
    }
    ready
}
