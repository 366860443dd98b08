//! The host port: the timing primitives the timeline consumes.
//!
//! A host owns the clock, the append-only entry buffer and the observer
//! machinery. The timeline only probes, appends and reads; it never mutates
//! entries already buffered.

use crate::entry::{EntryList, RawEntry};
use crate::error::HostResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Callback a host invokes with each delivered batch.
///
/// An `Err` return aborts that delivery only; the registration stays live.
pub type ObserverCallback = Box<dyn FnMut(EntryList) -> HostResult<()> + Send>;

/// Presence flags for the individual host primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostFeatures {
    /// High-resolution clock query
    pub clock: bool,
    /// Named mark creation
    pub mark: bool,
    /// Named range measurement
    pub measure: bool,
    /// Entry buffer lookup by name.
    ///
    /// Unlike the other primitives an absent lookup does not fail: it reports
    /// no entries, so measurements fall back to [`UNMEASURED`](crate::UNMEASURED).
    pub entries_by_name: bool,
    /// Asynchronous entry observation
    pub observer: bool,
}

impl HostFeatures {
    /// Every primitive present.
    pub fn all() -> Self {
        Self {
            clock: true,
            mark: true,
            measure: true,
            entries_by_name: true,
            observer: true,
        }
    }

    /// No primitive present.
    pub fn none() -> Self {
        Self {
            clock: false,
            mark: false,
            measure: false,
            entries_by_name: false,
            observer: false,
        }
    }

    /// Builder method to toggle the clock.
    pub fn with_clock(mut self, present: bool) -> Self {
        self.clock = present;
        self
    }

    /// Builder method to toggle mark creation.
    pub fn with_mark(mut self, present: bool) -> Self {
        self.mark = present;
        self
    }

    /// Builder method to toggle the lookup by name.
    pub fn with_entries_by_name(mut self, present: bool) -> Self {
        self.entries_by_name = present;
        self
    }

    /// Builder method to toggle the observer primitive.
    pub fn with_observer(mut self, present: bool) -> Self {
        self.observer = present;
        self
    }
}

impl Default for HostFeatures {
    fn default() -> Self {
        Self::all()
    }
}

/// Opaque handle for a host-level observer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverHandle(u64);

impl ObserverHandle {
    /// Wrap a host-assigned id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The host-assigned id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Options for an observer registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Entry-type categories to deliver
    pub entry_types: Vec<String>,
    /// Also deliver matching entries buffered before registration
    pub buffered: bool,
}

impl ObserveOptions {
    /// Observe a single category.
    pub fn single(entry_type: impl Into<String>, buffered: bool) -> Self {
        Self {
            entry_types: vec![entry_type.into()],
            buffered,
        }
    }

    /// Whether `entry_type` is one of the observed categories.
    pub fn matches(&self, entry_type: &str) -> bool {
        self.entry_types.iter().any(|t| t == entry_type)
    }
}

/// Timing primitives supplied by the environment.
pub trait PerformanceHost: Send + Sync {
    /// Identity used by the asynchronous-observation allow-list.
    fn vendor(&self) -> Option<String>;

    /// Which primitives this host exposes.
    fn features(&self) -> HostFeatures;

    /// Current high-resolution time in milliseconds.
    fn now(&self) -> HostResult<f64>;

    /// Append a mark named `name` at the current time.
    fn mark(&self, name: &str) -> HostResult<()>;

    /// Append a measure entry named `name` spanning the two marks.
    ///
    /// Hosts that can hand the created entry back return it, letting callers
    /// correlate by identity instead of by name.
    fn measure(&self, name: &str, start_mark: &str, end_mark: &str)
        -> HostResult<Option<RawEntry>>;

    /// Buffered entries named `name`, in arrival order.
    ///
    /// Infallible: a host without the lookup returns an empty list.
    fn entries_by_name(&self, name: &str) -> Vec<RawEntry>;

    /// Register an observer; batches are pushed to `callback` later.
    fn observe(
        &self,
        options: ObserveOptions,
        callback: ObserverCallback,
    ) -> HostResult<ObserverHandle>;

    /// Cancel a registration. Unknown handles are ignored.
    fn disconnect(&self, handle: ObserverHandle);

    /// Drop buffered marks, all of them or only those named `name`.
    fn clear_marks(&self, name: Option<&str>);

    /// Drop buffered measures, all of them or only those named `name`.
    fn clear_measures(&self, name: Option<&str>);
}

impl<H: PerformanceHost + ?Sized> PerformanceHost for Arc<H> {
    fn vendor(&self) -> Option<String> {
        (**self).vendor()
    }

    fn features(&self) -> HostFeatures {
        (**self).features()
    }

    fn now(&self) -> HostResult<f64> {
        (**self).now()
    }

    fn mark(&self, name: &str) -> HostResult<()> {
        (**self).mark(name)
    }

    fn measure(
        &self,
        name: &str,
        start_mark: &str,
        end_mark: &str,
    ) -> HostResult<Option<RawEntry>> {
        (**self).measure(name, start_mark, end_mark)
    }

    fn entries_by_name(&self, name: &str) -> Vec<RawEntry> {
        (**self).entries_by_name(name)
    }

    fn observe(
        &self,
        options: ObserveOptions,
        callback: ObserverCallback,
    ) -> HostResult<ObserverHandle> {
        (**self).observe(options, callback)
    }

    fn disconnect(&self, handle: ObserverHandle) {
        (**self).disconnect(handle)
    }

    fn clear_marks(&self, name: Option<&str>) {
        (**self).clear_marks(name)
    }

    fn clear_measures(&self, name: Option<&str>) {
        (**self).clear_measures(name)
    }
}
