//! Performance Timeline
//!
//! A thin facade over a host's high-resolution timing facilities:
//!
//! - Capability detection for the clock/mark primitives and for asynchronous
//!   entry observation
//! - Named start/end marks and the duration measured between them
//! - A bridge from the host's batched observer callbacks to a single typed
//!   consumer callback
//!
//! The host is anything implementing [`PerformanceHost`]. [`InMemoryHost`]
//! is a complete in-process host with an append-only entry buffer.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use perf_timeline::{
//!     EntryType, InMemoryHost, ManualClock, MarkKind, MetricSpec, PerformanceTimeline,
//!     TimingEntry,
//! };
//!
//! let clock = Arc::new(ManualClock::new(100.0));
//! let host = Arc::new(InMemoryHost::new().with_vendor("chrome").with_clock(clock.clone()));
//! let mut timeline = PerformanceTimeline::new(host.clone());
//!
//! if timeline.supported() {
//!     timeline.mark("load", MarkKind::Start).unwrap();
//!     clock.set(250.5);
//!     timeline.mark("load", MarkKind::End).unwrap();
//!     assert_eq!(timeline.measure("load", &MetricSpec::new()).unwrap(), 150.5);
//! }
//!
//! if timeline.supported_performance_observer() {
//!     timeline
//!         .observe("paint", |entries| {
//!             for entry in entries {
//!                 println!("{} at {}ms", entry.name, entry.start_time);
//!             }
//!         })
//!         .unwrap();
//!     host.record(TimingEntry::new("first-paint", EntryType::Paint, 260.0, 0.0));
//!     host.flush();
//! }
//! ```
//!
//! # Buffer growth
//!
//! Hosts keep marks and measures until told otherwise. Long-running callers
//! should call [`PerformanceTimeline::clear_metric`] for metrics they no
//! longer need.

mod capability;
mod clock;
mod config;
mod engine;
mod entry;
mod error;
mod host;
mod memory;
mod observer;
mod span;
mod timeline;

pub use capability::{supports_async_observation, supports_timing_core};
pub use clock::{HostClock, ManualClock, MonotonicClock};
pub use config::TimelineConfig;
pub use engine::{MarkKind, MetricSpec, UNMEASURED};
pub use entry::{EntryList, EntryType, RawEntry, TimingEntry};
pub use error::{HostError, HostResult, TimelineError, TimelineResult};
pub use host::{HostFeatures, ObserveOptions, ObserverCallback, ObserverHandle, PerformanceHost};
pub use memory::InMemoryHost;
pub use span::MetricSpan;
pub use timeline::PerformanceTimeline;
