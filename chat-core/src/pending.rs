//! Acknowledgement correlation table.
//!
//! Each outgoing request that expects an acknowledgement is registered here
//! and receives a fresh id. When the acknowledgement with that id arrives,
//! the registered slot is taken out of the table. A slot can be taken at
//! most once, so a duplicated or forged acknowledgement never completes a
//! request twice.
//!
//! The table is generic over the slot type: `chat-client` stores oneshot
//! senders, tests store plain values.

use std::collections::HashMap;

/// Pending acknowledgements keyed by request id.
#[derive(Debug)]
pub struct PendingAcks<S> {
    /// Next id to hand out.
    next_id: u64,
    /// Requests sent but not yet acknowledged.
    pending: HashMap<u64, S>,
}

impl<S> PendingAcks<S> {
    /// Create an empty table. The first id handed out is 0.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: HashMap::new(),
        }
    }

    /// Register a slot and return the id to send with the request.
    pub fn register(&mut self, slot: S) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(id, slot);
        id
    }

    /// Remove and return the slot for `id`.
    ///
    /// Returns `None` if the id is unknown or was already completed.
    pub fn complete(&mut self, id: u64) -> Option<S> {
        self.pending.remove(&id)
    }

    /// Check if a request is still awaiting its acknowledgement.
    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Check if nothing is outstanding.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop slots for which `keep` returns false.
    ///
    /// Used to discard requests whose caller has gone away.
    pub fn retain(&mut self, mut keep: impl FnMut(&S) -> bool) {
        self.pending.retain(|_, slot| keep(slot));
    }
}

impl<S> Default for PendingAcks<S> {
    fn default() -> Self {
        Self::new()
    }
}
