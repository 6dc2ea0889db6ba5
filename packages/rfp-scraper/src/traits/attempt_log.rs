//! Attempt-log trait: write-only audit trail of tier invocations.

use std::sync::Arc;

use crate::types::attempt::AttemptRecord;

/// Sink for [`AttemptRecord`]s.
///
/// `record` is infallible by signature: implementations swallow their own
/// failures (reporting them through `tracing`) so the orchestrator never sees
/// them. Implementations must be safe to call from concurrent pipeline runs.
pub trait AttemptLog: Send + Sync {
    fn record(&self, attempt: AttemptRecord);
}

impl<L: AttemptLog + ?Sized> AttemptLog for Arc<L> {
    fn record(&self, attempt: AttemptRecord) {
        (**self).record(attempt)
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAttemptLog;

impl AttemptLog for NoopAttemptLog {
    fn record(&self, _attempt: AttemptRecord) {}
}
