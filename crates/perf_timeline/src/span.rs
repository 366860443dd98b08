//! Scope-based metric spans
//!
//! A [`MetricSpan`] writes the start mark when created and the end mark
//! when finished, so a measured region reads like a scope.
//!
//! ```rust
//! use perf_timeline::{InMemoryHost, MetricSpec, PerformanceTimeline};
//!
//! let timeline = PerformanceTimeline::new(InMemoryHost::new());
//! let span = timeline.span("parse", MetricSpec::new()).unwrap();
//! // ... parsing ...
//! let duration_ms = span.finish().unwrap();
//! assert!(duration_ms >= 0.0);
//! ```

use crate::engine::{MarkKind, MetricSpec};
use crate::entry::{EntryType, TimingEntry};
use crate::error::TimelineResult;
use crate::host::PerformanceHost;
use crate::timeline::PerformanceTimeline;

/// An open measurement of one metric.
///
/// Dropping an unfinished span still writes the end mark, so the metric can
/// be measured later; only [`finish`](Self::finish) measures it.
pub struct MetricSpan<'a, H: PerformanceHost> {
    timeline: &'a PerformanceTimeline<H>,
    metric_name: String,
    spec: MetricSpec,
    finished: bool,
}

impl<'a, H: PerformanceHost> MetricSpan<'a, H> {
    /// The metric being measured.
    #[inline]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Milliseconds since the start mark, on the host clock.
    pub fn elapsed_ms(&self) -> TimelineResult<f64> {
        let start = self.timeline.mark_name(&self.metric_name, MarkKind::Start);
        let mut started_at = None;
        for raw in self.timeline.host().entries_by_name(&start).iter().rev() {
            let entry = TimingEntry::from_raw(raw)?;
            if entry.entry_type == EntryType::Mark {
                started_at = Some(entry.start_time);
                break;
            }
        }
        let now = self.timeline.now()?;
        Ok(started_at.map_or(0.0, |start| now - start))
    }

    /// Write the end mark and measure.
    ///
    /// Returns [`UNMEASURED`](crate::UNMEASURED) when the host produced no measurement.
    pub fn finish(mut self) -> TimelineResult<f64> {
        self.finished = true;
        self.timeline.mark(&self.metric_name, MarkKind::End)?;
        self.timeline.measure(&self.metric_name, &self.spec)
    }
}

impl<'a, H: PerformanceHost> Drop for MetricSpan<'a, H> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.timeline.mark(&self.metric_name, MarkKind::End) {
            tracing::warn!(
                target: "perf::timeline",
                metric = %self.metric_name,
                error = %err,
                "span end mark failed"
            );
        }
    }
}

impl<H: PerformanceHost> PerformanceTimeline<H> {
    /// Write the start mark of `metric_name` and return a span that ends it.
    pub fn span(
        &self,
        metric_name: impl Into<String>,
        spec: MetricSpec,
    ) -> TimelineResult<MetricSpan<'_, H>> {
        let metric_name = metric_name.into();
        self.mark(&metric_name, MarkKind::Start)?;
        Ok(MetricSpan {
            timeline: self,
            metric_name,
            spec,
            finished: false,
        })
    }
}
