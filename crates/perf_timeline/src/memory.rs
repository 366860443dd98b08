//! In-process performance host
//!
//! [`InMemoryHost`] keeps an append-only entry buffer and a set of observer
//! registrations. Entries matching an observer are queued for it and pushed
//! out by [`InMemoryHost::flush`], which plays the role of one event-loop
//! turn: every observer with queued entries receives exactly one batch.

use crate::clock::{HostClock, MonotonicClock};
use crate::entry::{EntryList, EntryType, RawEntry, TimingEntry};
use crate::error::{HostError, HostResult};
use crate::host::{HostFeatures, ObserveOptions, ObserverCallback, ObserverHandle, PerformanceHost};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct Registration {
    handle: ObserverHandle,
    options: ObserveOptions,
    callback: Arc<Mutex<ObserverCallback>>,
    pending: Vec<RawEntry>,
}

#[derive(Default)]
struct HostState {
    buffer: Vec<RawEntry>,
    observers: Vec<Registration>,
    next_observer_id: u64,
}

impl HostState {
    fn append(&mut self, raw: RawEntry) {
        let tag = entry_type_of(&raw).map(str::to_string);
        if let Some(tag) = tag {
            for registration in &mut self.observers {
                if registration.options.matches(&tag) {
                    registration.pending.push(raw.clone());
                }
            }
        }
        self.buffer.push(raw);
    }

    fn last_mark_time(&self, name: &str) -> Option<f64> {
        self.buffer
            .iter()
            .rev()
            .find(|e| name_of(e) == Some(name) && entry_type_of(e) == Some("mark"))
            .and_then(|e| e.get("startTime").and_then(Value::as_f64))
    }

    fn clear(&mut self, tag: &str, name: Option<&str>) {
        self.buffer.retain(|e| {
            entry_type_of(e) != Some(tag) || name.is_some_and(|n| name_of(e) != Some(n))
        });
    }
}

fn name_of(raw: &RawEntry) -> Option<&str> {
    raw.get("name").and_then(Value::as_str)
}

fn entry_type_of(raw: &RawEntry) -> Option<&str> {
    raw.get("entryType").and_then(Value::as_str)
}

/// A performance host living entirely in this process.
pub struct InMemoryHost {
    vendor: Option<String>,
    features: HostFeatures,
    clock: Arc<dyn HostClock>,
    strict_marks: bool,
    measure_handback: bool,
    state: Mutex<HostState>,
}

impl InMemoryHost {
    /// Create a host with every primitive, a monotonic clock and no vendor.
    pub fn new() -> Self {
        Self {
            vendor: None,
            features: HostFeatures::all(),
            clock: Arc::new(MonotonicClock::new()),
            strict_marks: false,
            measure_handback: true,
            state: Mutex::new(HostState::default()),
        }
    }

    /// Builder method to set the host identity.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    /// Builder method to restrict the exposed primitives.
    pub fn with_features(mut self, features: HostFeatures) -> Self {
        self.features = features;
        self
    }

    /// Builder method to replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn HostClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method: fail measurements whose marks are missing.
    ///
    /// When off, such a measurement appends nothing and succeeds.
    pub fn strict_marks(mut self, strict: bool) -> Self {
        self.strict_marks = strict;
        self
    }

    /// Builder method: whether `measure` returns the entry it created.
    pub fn with_measure_handback(mut self, handback: bool) -> Self {
        self.measure_handback = handback;
        self
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require(&self, present: bool, primitive: &'static str) -> HostResult<()> {
        if present {
            Ok(())
        } else {
            Err(HostError::Unsupported(primitive))
        }
    }

    /// Append a host-produced entry such as a paint event.
    pub fn record(&self, entry: TimingEntry) {
        self.state().append(entry.to_raw());
    }

    /// Append an entry in raw form, without any validation.
    pub fn record_raw(&self, raw: RawEntry) {
        self.state().append(raw);
    }

    /// Snapshot of the whole buffer, in arrival order.
    pub fn entries(&self) -> Vec<RawEntry> {
        self.state().buffer.clone()
    }

    /// Number of buffered entries.
    pub fn buffer_len(&self) -> usize {
        self.state().buffer.len()
    }

    /// Number of live observer registrations.
    pub fn observer_count(&self) -> usize {
        self.state().observers.len()
    }

    /// Whether `handle` is still registered.
    pub fn is_registered(&self, handle: ObserverHandle) -> bool {
        self.state().observers.iter().any(|r| r.handle == handle)
    }

    fn take_pending(
        &self,
        handle: ObserverHandle,
    ) -> Option<(Arc<Mutex<ObserverCallback>>, Vec<RawEntry>)> {
        let mut state = self.state();
        let registration = state.observers.iter_mut().find(|r| r.handle == handle)?;
        if registration.pending.is_empty() {
            return None;
        }
        Some((
            Arc::clone(&registration.callback),
            std::mem::take(&mut registration.pending),
        ))
    }

    /// Deliver queued entries: one batch per observer with pending entries.
    ///
    /// Returns the number of batches handed to callbacks. Callbacks must not
    /// call `flush` themselves. A panicking callback unwinds out of `flush`;
    /// its registration stays live and observers not yet served this turn keep
    /// their queued entries for the next call.
    pub fn flush(&self) -> usize {
        let handles: Vec<ObserverHandle> = self
            .state()
            .observers
            .iter()
            .filter(|r| !r.pending.is_empty())
            .map(|r| r.handle)
            .collect();

        let mut delivered = 0;
        for handle in handles {
            // Taken per observer so a panicking callback leaves the other queues intact.
            // An earlier callback in this turn may also have disconnected it.
            let Some((callback, batch)) = self.take_pending(handle) else {
                continue;
            };

            let size = batch.len();
            let result = {
                let mut callback = callback.lock().unwrap_or_else(PoisonError::into_inner);
                (*callback)(EntryList::new(batch))
            };
            delivered += 1;

            match result {
                Ok(()) => tracing::trace!(
                    target: "perf::host",
                    observer = handle.id(),
                    entries = size,
                    "batch delivered"
                ),
                Err(err) => tracing::warn!(
                    target: "perf::host",
                    observer = handle.id(),
                    error = %err,
                    "observer callback failed"
                ),
            }
        }
        delivered
    }
}

impl Default for InMemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceHost for InMemoryHost {
    fn vendor(&self) -> Option<String> {
        self.vendor.clone()
    }

    fn features(&self) -> HostFeatures {
        self.features
    }

    fn now(&self) -> HostResult<f64> {
        self.require(self.features.clock, "clock")?;
        Ok(self.clock.now_ms())
    }

    fn mark(&self, name: &str) -> HostResult<()> {
        self.require(self.features.mark, "mark")?;
        let entry = TimingEntry::mark(name, self.clock.now_ms());
        self.state().append(entry.to_raw());
        Ok(())
    }

    fn measure(
        &self,
        name: &str,
        start_mark: &str,
        end_mark: &str,
    ) -> HostResult<Option<RawEntry>> {
        self.require(self.features.measure, "measure")?;
        let mut state = self.state();

        let (start, end) = match (state.last_mark_time(start_mark), state.last_mark_time(end_mark)) {
            (Some(start), Some(end)) => (start, end),
            (start, _) => {
                let missing = if start.is_none() { start_mark } else { end_mark };
                if self.strict_marks {
                    return Err(HostError::MissingMark(missing.to_string()));
                }
                tracing::trace!(target: "perf::host", mark = missing, "measure skipped");
                return Ok(None);
            }
        };

        let raw = TimingEntry::measure(name, start, end).to_raw();
        state.append(raw.clone());
        Ok(self.measure_handback.then_some(raw))
    }

    fn entries_by_name(&self, name: &str) -> Vec<RawEntry> {
        // An absent lookup primitive reads as an empty buffer.
        if !self.features.entries_by_name {
            return Vec::new();
        }
        self.state()
            .buffer
            .iter()
            .filter(|e| name_of(e) == Some(name))
            .cloned()
            .collect()
    }

    fn observe(
        &self,
        options: ObserveOptions,
        callback: ObserverCallback,
    ) -> HostResult<ObserverHandle> {
        self.require(self.features.observer, "observer")?;
        if options.entry_types.is_empty() {
            return Err(HostError::ObserverRejected(
                "no entry types requested".to_string(),
            ));
        }

        let mut state = self.state();
        state.next_observer_id += 1;
        let handle = ObserverHandle::new(state.next_observer_id);

        let pending = if options.buffered {
            state
                .buffer
                .iter()
                .filter(|e| entry_type_of(e).is_some_and(|t| options.matches(t)))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        state.observers.push(Registration {
            handle,
            options,
            callback: Arc::new(Mutex::new(callback)),
            pending,
        });
        Ok(handle)
    }

    fn disconnect(&self, handle: ObserverHandle) {
        self.state().observers.retain(|r| r.handle != handle);
    }

    fn clear_marks(&self, name: Option<&str>) {
        self.state().clear(EntryType::Mark.as_str(), name);
    }

    fn clear_measures(&self, name: Option<&str>) {
        self.state().clear(EntryType::Measure.as_str(), name);
    }
}
