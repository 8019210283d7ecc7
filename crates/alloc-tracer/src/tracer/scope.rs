//! Scoped traces that end when their guard goes away.

use super::{AllocationTracer, TraceResult};
use crate::utils::error::TracerError;
use log::warn;

/// Owns one trace for the duration of a scope
///
/// **Public** - returned by `AllocationTracer::scoped`
///
/// The guard only ever tears down the trace it started. If that trace was
/// already stopped and another one started, dropping the guard leaves the new
/// trace alone.
#[must_use = "dropping the guard ends the trace immediately"]
#[derive(Debug)]
pub struct TraceGuard<'a> {
    tracer: &'a AllocationTracer,
    epoch: u64,
    finished: bool,
}

impl<'a> TraceGuard<'a> {
    pub(super) fn new(tracer: &'a AllocationTracer, epoch: u64) -> Self {
        Self {
            tracer,
            epoch,
            finished: false,
        }
    }

    /// End the trace and return its result
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - the trace was stopped before the guard finished it
    pub fn finish(mut self) -> Result<TraceResult, TracerError> {
        self.finished = true;
        self.tracer.finish_epoch(self.epoch)
    }
}

impl Drop for TraceGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let torn_down = self.tracer.abandon_epoch(self.epoch);
        if torn_down && std::thread::panicking() {
            warn!("Trace ended by panic; its result is discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tracer::{AllocationTracer, TracerState};
    use crate::utils::error::TracerError;

    #[test]
    fn test_drop_stops_trace() {
        let tracer = AllocationTracer::new();
        {
            let _guard = tracer.scoped().unwrap();
            assert_eq!(tracer.state(), TracerState::Running);
        }
        assert_eq!(tracer.state(), TracerState::Idle);
    }

    #[test]
    fn test_guard_leaves_newer_trace_alone() {
        let tracer = AllocationTracer::new();
        let guard = tracer.scoped().unwrap();
        tracer.stop().unwrap();
        tracer.start().unwrap();

        drop(guard);
        assert_eq!(tracer.state(), TracerState::Running);
    }

    #[test]
    fn test_finish_after_manual_stop() {
        let tracer = AllocationTracer::new();
        let guard = tracer.scoped().unwrap();
        tracer.stop().unwrap();

        assert!(matches!(
            guard.finish(),
            Err(TracerError::NotRunning { .. })
        ));
    }
}
