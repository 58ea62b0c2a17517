use ps_api_types::{OperationKind, PendingOperation, TxPhase};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// In-flight operations, at most one per kind.
///
/// Unrelated kinds never block each other. The lock is never held across an
/// await.
#[derive(Default)]
pub struct PendingSet {
    inner: Mutex<BTreeMap<OperationKind, TxPhase>>,
}

impl PendingSet {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<OperationKind, TxPhase>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `kind`, or `None` if it is already in flight.
    pub fn try_begin(&self, kind: OperationKind) -> Option<PendingGuard<'_>> {
        let mut inner = self.lock();
        if inner.contains_key(&kind) {
            return None;
        }
        inner.insert(kind, TxPhase::Submitting);
        debug!(%kind, "operation started");
        Some(PendingGuard { set: self, kind })
    }

    pub fn is_pending(&self, kind: OperationKind) -> bool {
        self.lock().contains_key(&kind)
    }

    pub fn any(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn phase(&self, kind: OperationKind) -> Option<TxPhase> {
        self.lock().get(&kind).copied()
    }

    pub fn operations(&self) -> Vec<PendingOperation> {
        self.lock()
            .iter()
            .map(|(kind, phase)| PendingOperation {
                kind: *kind,
                phase: *phase,
            })
            .collect()
    }
}

/// Releases its kind when dropped, whichever way the operation ends.
pub struct PendingGuard<'a> {
    set: &'a PendingSet,
    kind: OperationKind,
}

impl PendingGuard<'_> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn advance(&self, phase: TxPhase) {
        self.set.lock().insert(self.kind, phase);
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.set.lock().remove(&self.kind);
        debug!(kind = %self.kind, "operation finished");
    }
}
