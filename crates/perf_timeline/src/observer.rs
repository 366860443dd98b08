//! Observation bridge: host batch callbacks to a single typed consumer.

use crate::entry::{EntryList, TimingEntry};
use crate::error::{HostError, HostResult, TimelineResult};
use crate::host::{ObserveOptions, ObserverCallback, PerformanceHost};
use crate::timeline::PerformanceTimeline;

/// Convert a delivered batch and hand it to the consumer, preserving host order.
///
/// A malformed batch is returned to the host as an error and the consumer
/// is not called for it.
fn forward<F>(list: EntryList, consumer: &mut F) -> HostResult<()>
where
    F: FnMut(Vec<TimingEntry>),
{
    let entries = list
        .to_timing_entries()
        .map_err(|err| HostError::InvalidArgument(format!("malformed entry batch: {}", err)))?;
    consumer(entries);
    Ok(())
}

impl<H: PerformanceHost> PerformanceTimeline<H> {
    /// Subscribe `callback` to entries of `entry_type`.
    ///
    /// Entries buffered before the call are replayed when
    /// `replay_buffered` is set. A previous subscription is cancelled at
    /// the host first, so only the latest callback is ever reachable.
    ///
    /// The cancellation happens before the new registration is attempted: if
    /// the host rejects it, the error is returned and no subscription remains
    /// active, including the previous one.
    pub fn observe<F>(&mut self, entry_type: &str, mut callback: F) -> TimelineResult<()>
    where
        F: FnMut(Vec<TimingEntry>) + Send + 'static,
    {
        self.unobserve();

        let options = ObserveOptions::single(entry_type, self.config.replay_buffered);
        let adapter: ObserverCallback = Box::new(move |list| forward(list, &mut callback));
        let handle = self.host.observe(options, adapter)?;
        self.observer = Some(handle);

        tracing::debug!(
            target: "perf::timeline",
            entry_type = entry_type,
            observer = handle.id(),
            "observer registered"
        );
        Ok(())
    }

    /// Cancel the active subscription. Returns whether one was active.
    pub fn unobserve(&mut self) -> bool {
        match self.observer.take() {
            Some(handle) => {
                self.host.disconnect(handle);
                tracing::debug!(
                    target: "perf::timeline",
                    observer = handle.id(),
                    "observer disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Whether a subscription is active.
    pub fn is_observing(&self) -> bool {
        self.observer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;
    use crate::host::{HostFeatures, ObserverHandle};
    use crate::memory::InMemoryHost;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Batches = Arc<Mutex<Vec<Vec<String>>>>;

    fn recorder() -> (Batches, impl FnMut(Vec<TimingEntry>) + Send + 'static) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let sink = batches.clone();
        let callback = move |entries: Vec<TimingEntry>| {
            let names: Vec<String> = entries.into_iter().map(|e| e.name).collect();
            sink.lock().unwrap().push(names);
        };
        (batches, callback)
    }

    fn paint(name: &str, at: f64) -> TimingEntry {
        TimingEntry::new(name, EntryType::Paint, at, 0.0)
    }

    #[test]
    fn test_batch_forwarded_in_host_order() {
        let host = Arc::new(InMemoryHost::new().with_vendor("chrome"));
        let mut timeline = PerformanceTimeline::new(host.clone());
        let (batches, callback) = recorder();

        timeline.observe("paint", callback).unwrap();
        host.record(paint("first-paint", 10.0));
        host.record(paint("first-contentful-paint", 12.0));

        assert_eq!(host.flush(), 1);
        assert_eq!(
            *batches.lock().unwrap(),
            vec![vec!["first-paint".to_string(), "first-contentful-paint".to_string()]]
        );
    }

    #[test]
    fn test_entries_before_observe_are_replayed() {
        let host = Arc::new(InMemoryHost::new());
        host.record(paint("first-paint", 10.0));

        let mut timeline = PerformanceTimeline::new(host.clone());
        let (batches, callback) = recorder();
        timeline.observe("paint", callback).unwrap();

        host.flush();
        assert_eq!(batches.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_replay_can_be_disabled() {
        let host = Arc::new(InMemoryHost::new());
        host.record(paint("first-paint", 10.0));

        let config = crate::TimelineConfig::new().with_replay_buffered(false);
        let mut timeline = PerformanceTimeline::with_config(host.clone(), config);
        let (batches, callback) = recorder();
        timeline.observe("paint", callback).unwrap();

        host.flush();
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_other_categories_ignored() {
        let host = Arc::new(InMemoryHost::new());
        let mut timeline = PerformanceTimeline::new(host.clone());
        let (batches, callback) = recorder();
        timeline.observe("paint", callback).unwrap();

        host.mark("mark_a_start").unwrap();
        assert_eq!(host.flush(), 0);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_second_observe_replaces_first() {
        let host = Arc::new(InMemoryHost::new());
        let mut timeline = PerformanceTimeline::new(host.clone());
        let (first, first_cb) = recorder();
        let (second, second_cb) = recorder();

        timeline.observe("paint", first_cb).unwrap();
        timeline.observe("paint", second_cb).unwrap();
        assert_eq!(host.observer_count(), 1);

        host.record(paint("first-paint", 10.0));
        host.flush();

        assert!(first.lock().unwrap().is_empty());
        assert_eq!(second.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unobserve_and_drop_disconnect() {
        let host = Arc::new(InMemoryHost::new());
        let mut timeline = PerformanceTimeline::new(host.clone());
        let (batches, callback) = recorder();

        assert!(!timeline.unobserve());
        timeline.observe("paint", callback).unwrap();
        assert!(timeline.is_observing());
        assert!(timeline.unobserve());
        assert!(!timeline.is_observing());
        assert_eq!(host.observer_count(), 0);

        let (_, callback) = recorder();
        timeline.observe("paint", callback).unwrap();
        assert_eq!(host.observer_count(), 1);
        drop(timeline);
        assert_eq!(host.observer_count(), 0);

        host.record(paint("first-paint", 10.0));
        host.flush();
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_batch_skipped_observer_kept() {
        let host = Arc::new(InMemoryHost::new());
        let mut timeline = PerformanceTimeline::new(host.clone());
        let (batches, callback) = recorder();
        timeline.observe("paint", callback).unwrap();

        host.record_raw(json!({ "entryType": "paint", "startTime": 1.0 }));
        assert_eq!(host.flush(), 1);
        assert!(batches.lock().unwrap().is_empty());
        assert!(timeline.is_observing());

        host.record(paint("first-paint", 2.0));
        host.flush();
        assert_eq!(batches.lock().unwrap().len(), 1);
    }

    /// Host that refuses every category except paint.
    struct PaintOnlyHost(InMemoryHost);

    impl PerformanceHost for PaintOnlyHost {
        fn vendor(&self) -> Option<String> {
            self.0.vendor()
        }

        fn features(&self) -> HostFeatures {
            self.0.features()
        }

        fn now(&self) -> HostResult<f64> {
            self.0.now()
        }

        fn mark(&self, name: &str) -> HostResult<()> {
            self.0.mark(name)
        }

        fn measure(
            &self,
            name: &str,
            start_mark: &str,
            end_mark: &str,
        ) -> HostResult<Option<crate::RawEntry>> {
            self.0.measure(name, start_mark, end_mark)
        }

        fn entries_by_name(&self, name: &str) -> Vec<crate::RawEntry> {
            self.0.entries_by_name(name)
        }

        fn observe(
            &self,
            options: ObserveOptions,
            callback: ObserverCallback,
        ) -> HostResult<ObserverHandle> {
            if !options.matches("paint") {
                return Err(HostError::ObserverRejected("paint only".to_string()));
            }
            self.0.observe(options, callback)
        }

        fn disconnect(&self, handle: ObserverHandle) {
            self.0.disconnect(handle)
        }

        fn clear_marks(&self, name: Option<&str>) {
            self.0.clear_marks(name)
        }

        fn clear_measures(&self, name: Option<&str>) {
            self.0.clear_measures(name)
        }
    }

    #[test]
    fn test_rejected_observe_drops_previous_subscription() {
        let mut timeline = PerformanceTimeline::new(PaintOnlyHost(InMemoryHost::new()));
        let (_, first) = recorder();
        let (_, second) = recorder();

        timeline.observe("paint", first).unwrap();
        assert_eq!(timeline.host().0.observer_count(), 1);

        let err = timeline.observe("longtask", second).unwrap_err();
        assert!(matches!(
            err,
            crate::TimelineError::Host(HostError::ObserverRejected(_))
        ));
        assert!(!timeline.is_observing());
        assert_eq!(timeline.host().0.observer_count(), 0);
    }

    #[test]
    fn test_observe_without_primitive_fails() {
        let host = InMemoryHost::new().with_features(HostFeatures::all().with_observer(false));
        let mut timeline = PerformanceTimeline::new(host);
        let (_, callback) = recorder();

        assert!(timeline.observe("paint", callback).is_err());
        assert!(!timeline.is_observing());
    }
}
