//! Request sequencing for overlapping fetches.
//!
//! Every fetch takes a ticket from a monotonically increasing counter. When
//! its response arrives it is applied only if no newer fetch has been issued
//! since; older responses are dropped so a slow request can never overwrite
//! fresher data.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ClientError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn latest(&self) -> Option<RequestTicket> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(RequestTicket(n)),
        }
    }
}

/// What happened to a fetch response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Snapshot replaced.
    Applied,
    /// A newer request was issued; response dropped.
    Stale,
    /// Request failed; previous snapshot kept, error recorded.
    Failed,
}

/// Latest-wins holder for one immutable snapshot.
///
/// The snapshot is replaced wholesale on success and left untouched on
/// failure, so previously loaded data stays visible.
#[derive(Debug)]
pub struct GatedSnapshot<T: ?Sized> {
    gate: RequestGate,
    current: Arc<T>,
    last_error: Option<String>,
}

impl<T: ?Sized> GatedSnapshot<T> {
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            gate: RequestGate::new(),
            current: initial,
            last_error: None,
        }
    }

    pub fn begin(&self) -> RequestTicket {
        self.gate.issue()
    }

    pub fn current(&self) -> Arc<T> {
        Arc::clone(&self.current)
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    /// User-facing message of the latest failed fetch, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply(&mut self, ticket: RequestTicket, result: Result<Arc<T>, ClientError>) -> ApplyOutcome {
        if !self.gate.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.sequence(),
                latest = self.gate.latest().map(|t| t.sequence()),
                "discarding stale response"
            );
            return ApplyOutcome::Stale;
        }

        match result {
            Ok(snapshot) => {
                self.current = snapshot;
                self.last_error = None;
                ApplyOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(ticket = ticket.sequence(), error = %e, "fetch failed; keeping previous snapshot");
                self.last_error = Some(e.user_message());
                ApplyOutcome::Failed
            }
        }
    }
}
