//! The allocation tracer: state machine plus the tables it drives.
//!
//! An [`AllocationTracer`] is an explicit handle rather than process-wide state,
//! so independent tracers can coexist (one per test, for instance). All of its
//! state sits behind one lock: events from several threads are serialized, and
//! a snapshot is a consistent copy taken under the same lock.
//!
//! # Example
//! ```ignore
//! let tracer = AllocationTracer::new();
//! tracer.setup(&["path", "line", "class"])?;
//! let result = tracer.trace(|| run_workload(&tracer))?;
//! for (key, stats) in result.iter() {
//!     println!("{key}\t{}", stats.count);
//! }
//! ```

mod scope;
mod snapshot;
mod state;

pub use scope::TraceGuard;
pub use snapshot::{header_for, TraceResult};
pub use state::TracerState;

use crate::aggregator::{
    build_key, parse_key_fields, AggregationTable, CountTable, KeyField, LifetimeSnapshot,
    LifetimeTable, PathInterner, ShadowRecord, ShadowStore, TypeCounters,
};
use crate::event::{AllocationEvent, AllocationObserver, ClassId, ClassRegistry, FreeEvent, ObjectId};
use crate::utils::config::{TracerConfig, DEFAULT_KEY_FIELDS};
use crate::utils::error::TracerError;
use log::{debug, trace};
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything guarded by the tracer lock
#[derive(Debug)]
struct TracerInner {
    state: TracerState,

    /// Bumped on every start; lets a scope guard recognize its own trace
    epoch: u64,

    fields: Vec<KeyField>,
    paths: PathInterner,
    classes: ClassRegistry,
    table: AggregationTable,
    shadow: ShadowStore,
    lifetime: LifetimeTable,
    counters: TypeCounters,

    /// Completed collection cycles
    generation: u64,
}

impl TracerInner {
    fn new() -> Self {
        Self {
            state: TracerState::Idle,
            epoch: 0,
            fields: DEFAULT_KEY_FIELDS.to_vec(),
            paths: PathInterner::new(),
            classes: ClassRegistry::new(),
            table: AggregationTable::new(),
            shadow: ShadowStore::new(),
            lifetime: LifetimeTable::new(),
            counters: TypeCounters::new(),
            generation: 0,
        }
    }

    fn require_active(&self, operation: &'static str) -> Result<(), TracerError> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(TracerError::NotRunning {
                operation,
                state: self.state,
            })
        }
    }

    fn reset_tables(&mut self) {
        self.table.clear();
        self.shadow.clear();
        self.paths.clear();
        self.lifetime.clear();
    }

    /// Copy the table, counting live objects that already became old
    fn snapshot(&self) -> TraceResult {
        let mut rows = self.table.snapshot();

        for (_, record) in self.shadow.iter().filter(|(_, record)| record.became_old) {
            if let Some(row) = rows.get_mut(&record.key) {
                if row.old_count < row.count {
                    row.old_count += 1;
                }
            }
        }

        TraceResult::new(self.fields.clone(), rows)
    }

    /// Stop-equivalent teardown: drop live bookkeeping and go idle
    fn teardown(&mut self) {
        if !self.shadow.is_empty() {
            debug!(
                "Discarding {} live shadow records at end of trace",
                self.shadow.len()
            );
        }
        self.shadow.clear();
        self.state = TracerState::Idle;
    }
}

/// Allocation tracer handle
///
/// **Public** - main entry point of the library
///
/// Cheap to share by reference across threads; every method takes `&self`.
#[derive(Debug)]
pub struct AllocationTracer {
    inner: Mutex<TracerInner>,
}

impl Default for AllocationTracer {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationTracer {
    /// Create an idle tracer keyed by `[path, line]`
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TracerInner::new()),
        }
    }

    /// Create an idle tracer from configuration
    ///
    /// # Errors
    /// * `TracerError::Configuration` - unknown or repeated key name
    pub fn with_config(config: &TracerConfig) -> Result<Self, TracerError> {
        let tracer = Self::new();
        tracer.setup(&config.keys)?;
        tracer.lifetime_table_setup(config.lifetime_table);
        Ok(tracer)
    }

    /// Choose the aggregation key fields
    ///
    /// An empty list restores the default `[path, line]`. Allowed while a trace
    /// is running; only events observed afterwards use the new shape.
    ///
    /// # Errors
    /// * `TracerError::Configuration` - unknown or repeated field name
    pub fn setup<S: AsRef<str>>(&self, names: &[S]) -> Result<(), TracerError> {
        let fields = parse_key_fields(names)?;
        let mut inner = self.inner.lock();
        debug!(
            "Key fields set to [{}]",
            fields
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        inner.fields = fields;
        Ok(())
    }

    /// Currently configured key fields
    pub fn key_fields(&self) -> Vec<KeyField> {
        self.inner.lock().fields.clone()
    }

    /// Column names: key fields then the fixed statistic columns
    pub fn header(&self) -> Vec<&'static str> {
        header_for(&self.inner.lock().fields)
    }

    pub fn state(&self) -> TracerState {
        self.inner.lock().state
    }

    /// Begin a trace, discarding the previous trace's tables
    ///
    /// # Errors
    /// * `TracerError::AlreadyRunning` - a trace is running or paused; it is left untouched
    pub fn start(&self) -> Result<(), TracerError> {
        self.start_epoch().map(|_| ())
    }

    fn start_epoch(&self) -> Result<u64, TracerError> {
        let mut inner = self.inner.lock();
        if inner.state.is_active() {
            return Err(TracerError::AlreadyRunning);
        }

        inner.reset_tables();
        inner.epoch += 1;
        inner.state = TracerState::Running;
        debug!("Trace {} started", inner.epoch);

        Ok(inner.epoch)
    }

    /// Stop recording without ending the trace
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - not currently running
    pub fn pause(&self) -> Result<(), TracerError> {
        let mut inner = self.inner.lock();
        if inner.state != TracerState::Running {
            return Err(TracerError::NotRunning {
                operation: "pause",
                state: inner.state,
            });
        }

        inner.state = TracerState::Paused;
        debug!("Trace {} paused", inner.epoch);
        Ok(())
    }

    /// Continue a paused trace
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - not currently paused
    pub fn resume(&self) -> Result<(), TracerError> {
        let mut inner = self.inner.lock();
        if inner.state != TracerState::Paused {
            return Err(TracerError::NotRunning {
                operation: "resume",
                state: inner.state,
            });
        }

        inner.state = TracerState::Running;
        debug!("Trace {} resumed", inner.epoch);
        Ok(())
    }

    /// End the trace and return its final result
    ///
    /// Objects still alive keep their `count` contribution but never report an
    /// age or size.
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - no trace is running or paused
    pub fn stop(&self) -> Result<TraceResult, TracerError> {
        let mut inner = self.inner.lock();
        inner.require_active("stop")?;

        let result = inner.snapshot();
        inner.teardown();
        debug!("Trace {} stopped with {} rows", inner.epoch, result.len());

        Ok(result)
    }

    /// Snapshot of the running trace; the trace keeps going
    ///
    /// # Errors
    /// * `TracerError::NotRunning` - no trace is running or paused
    pub fn result(&self) -> Result<TraceResult, TracerError> {
        let inner = self.inner.lock();
        inner.require_active("read result")?;
        Ok(inner.snapshot())
    }

    /// Drop all rows and live bookkeeping without changing state
    pub fn clear(&self) {
        self.inner.lock().reset_tables();
    }

    /// Start a trace tied to the returned guard
    ///
    /// Dropping the guard without calling [`TraceGuard::finish`] tears the trace
    /// down, including during a panic.
    ///
    /// # Errors
    /// * `TracerError::AlreadyRunning` - a trace is already running or paused
    pub fn scoped(&self) -> Result<TraceGuard<'_>, TracerError> {
        let epoch = self.start_epoch()?;
        Ok(TraceGuard::new(self, epoch))
    }

    /// Trace one unit of work
    ///
    /// Starts a trace, runs `work`, and returns the result taken when `work`
    /// completes. The trace is torn down on every exit path.
    ///
    /// # Errors
    /// * `TracerError::AlreadyRunning` - called while a trace is active
    /// * `TracerError::NotRunning` - `work` ended the trace itself
    pub fn trace<F>(&self, work: F) -> Result<TraceResult, TracerError>
    where
        F: FnOnce(),
    {
        self.trace_with(work).map(|((), result)| result)
    }

    /// Trace one unit of work and keep its return value
    ///
    /// Fallible work returns its own `Result` as `R`; the trace result is
    /// produced either way.
    ///
    /// # Example
    /// ```ignore
    /// let (outcome, result) = tracer.trace_with(|| load_records(&path))?;
    /// let records = outcome?;
    /// ```
    ///
    /// # Errors
    /// Same as [`AllocationTracer::trace`]
    pub fn trace_with<F, R>(&self, work: F) -> Result<(R, TraceResult), TracerError>
    where
        F: FnOnce() -> R,
    {
        let guard = self.scoped()?;
        let value = work();
        let result = guard.finish()?;
        Ok((value, result))
    }

    /// Snapshot and teardown for a guard's own trace
    fn finish_epoch(&self, epoch: u64) -> Result<TraceResult, TracerError> {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch {
            return Err(TracerError::NotRunning {
                operation: "finish trace",
                state: inner.state,
            });
        }
        inner.require_active("finish trace")?;

        let result = inner.snapshot();
        inner.teardown();
        Ok(result)
    }

    /// Teardown for a guard dropped before finishing
    fn abandon_epoch(&self, epoch: u64) -> bool {
        let mut inner = self.inner.lock();
        if inner.epoch != epoch || !inner.state.is_active() {
            return false;
        }
        inner.teardown();
        true
    }

    /// Enable or disable the lifetime histogram
    ///
    /// Disabling discards what was collected. Takes effect for frees observed
    /// from now on, even mid-trace.
    pub fn lifetime_table_setup(&self, enabled: bool) {
        self.inner.lock().lifetime.set_enabled(enabled);
    }

    /// Drain the lifetime histogram
    ///
    /// # Returns
    /// `None` when disabled, or when nothing was freed since the previous call
    pub fn lifetime_table(&self) -> Option<LifetimeSnapshot> {
        self.inner.lock().lifetime.drain()
    }

    /// Allocations per type since this tracer was created
    pub fn allocated_count_table(&self) -> CountTable {
        self.inner.lock().counters.allocated_table()
    }

    /// Frees per type since this tracer was created
    pub fn freed_count_table(&self) -> CountTable {
        self.inner.lock().counters.freed_table()
    }

    /// Intern a class name for use in allocation events
    pub fn intern_class(&self, name: &str) -> ClassId {
        self.inner.lock().classes.intern(name)
    }

    pub fn class_name(&self, id: ClassId) -> Option<Arc<str>> {
        self.inner.lock().classes.name(id).cloned()
    }

    /// Completed collection cycles seen so far
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Objects currently shadow-tracked
    pub fn live_objects(&self) -> usize {
        self.inner.lock().shadow.len()
    }
}

impl AllocationObserver for AllocationTracer {
    fn notify_allocate(&self, event: &AllocationEvent<'_>) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.counters.record_allocation(event.value_type);

        match inner.state {
            TracerState::Idle => {}
            TracerState::Paused => {
                // Untracked from now on; a stale record must not claim this identity
                inner.shadow.forget(event.object);
            }
            TracerState::Running => {
                let path = event.path.map(|path| inner.paths.intern(path));
                let key = build_key(
                    &inner.fields,
                    path.as_ref(),
                    event.line,
                    event.value_type,
                    event.class,
                );

                inner.table.record_allocation(&key);
                inner.shadow.on_allocate(
                    event.object,
                    ShadowRecord::new(key, event.value_type, inner.generation),
                );
            }
        }
    }

    fn notify_free(&self, event: &FreeEvent) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        inner.counters.record_free(event.value_type);

        match inner.state {
            TracerState::Idle => {}
            TracerState::Paused => {
                inner.shadow.forget(event.object);
            }
            TracerState::Running => {
                let Some(freed) = inner.shadow.on_free(event.object, inner.generation) else {
                    trace!("Ignoring free of untracked object {}", event.object);
                    return;
                };

                inner.table.record_free(
                    &freed.key,
                    freed.age,
                    freed.became_old || event.is_old,
                    event.size_bytes,
                );
                inner.lifetime.record_free(freed.value_type, freed.age);
            }
        }
    }

    fn notify_promote(&self, object: ObjectId) {
        let mut inner = self.inner.lock();
        if inner.state.is_active() {
            inner.shadow.mark_old(object);
        }
    }

    fn generation_tick(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
    }
}
