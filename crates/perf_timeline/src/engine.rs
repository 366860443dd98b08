//! Mark/measure engine

use crate::entry::TimingEntry;
use crate::error::TimelineResult;
use crate::host::PerformanceHost;
use crate::timeline::PerformanceTimeline;
use serde::{Deserialize, Serialize};

/// Duration returned by [`PerformanceTimeline::measure`] when nothing was measured.
pub const UNMEASURED: f64 = -1.0;

/// The two ends of a measured interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkKind {
    /// Beginning of the interval
    Start,
    /// End of the interval
    End,
}

impl MarkKind {
    /// Designator used in mark names.
    pub fn as_str(self) -> &'static str {
        match self {
            MarkKind::Start => "start",
            MarkKind::End => "end",
        }
    }
}

impl AsRef<str> for MarkKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Caller-supplied description of a metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSpec {
    /// Display label
    pub label: Option<String>,
    /// Durations above this are reported at `warn` (and still returned)
    pub max_duration_ms: Option<f64>,
}

impl MetricSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builder method to set the duration ceiling.
    pub fn with_max_duration(mut self, ms: f64) -> Self {
        self.max_duration_ms = Some(ms);
        self
    }
}

impl<H: PerformanceHost> PerformanceTimeline<H> {
    /// Current host time in milliseconds.
    pub fn now(&self) -> TimelineResult<f64> {
        Ok(self.host.now()?)
    }

    /// Name of the mark written for `(metric_name, kind)`.
    pub fn mark_name(&self, metric_name: &str, kind: impl AsRef<str>) -> String {
        format!("{}_{}_{}", self.config.mark_prefix, metric_name, kind.as_ref())
    }

    /// Write a mark for `(metric_name, kind)`.
    ///
    /// Repeated calls append further marks; measurement uses the latest.
    pub fn mark(&self, metric_name: &str, kind: impl AsRef<str>) -> TimelineResult<()> {
        let name = self.mark_name(metric_name, kind);
        self.host.mark(&name)?;
        tracing::trace!(target: "perf::timeline", mark = %name, "mark written");
        Ok(())
    }

    /// Measure between the start and end marks of `metric_name`.
    ///
    /// Returns [`UNMEASURED`] when no completed measurement can be found.
    /// Host failures (e.g. a strict host missing a mark) propagate.
    pub fn measure(&self, metric_name: &str, spec: &MetricSpec) -> TimelineResult<f64> {
        Ok(self.try_measure(metric_name, spec)?.unwrap_or(UNMEASURED))
    }

    /// Like [`measure`](Self::measure), with `None` in place of the sentinel.
    pub fn try_measure(&self, metric_name: &str, spec: &MetricSpec) -> TimelineResult<Option<f64>> {
        let start = self.mark_name(metric_name, MarkKind::Start);
        let end = self.mark_name(metric_name, MarkKind::End);

        let entry = match self.host.measure(metric_name, &start, &end)? {
            Some(created) => Some(TimingEntry::from_raw(&created)?),
            None => self.last_entry_named(metric_name)?,
        };

        let duration = entry
            .filter(|entry| entry.entry_type.is_measure())
            .map(|entry| entry.duration);

        match duration {
            Some(duration_ms) => {
                tracing::trace!(
                    target: "perf::timeline",
                    metric = metric_name,
                    duration_ms = duration_ms,
                    "metric measured"
                );
                if let Some(max) = spec.max_duration_ms.filter(|max| duration_ms > *max) {
                    tracing::warn!(
                        target: "perf::timeline",
                        metric = spec.label.as_deref().unwrap_or(metric_name),
                        duration_ms = duration_ms,
                        max_ms = max,
                        "metric exceeded its ceiling"
                    );
                }
            }
            None => tracing::debug!(
                target: "perf::timeline",
                metric = metric_name,
                "no completed measurement"
            ),
        }

        Ok(duration)
    }

    /// Last buffered entry named `name`; the host appends, so last is newest.
    fn last_entry_named(&self, name: &str) -> TimelineResult<Option<TimingEntry>> {
        self.host
            .entries_by_name(name)
            .last()
            .map(TimingEntry::from_raw)
            .transpose()
    }

    /// Drop the start/end marks and the measures of `metric_name` from the host buffer.
    pub fn clear_metric(&self, metric_name: &str) {
        for kind in [MarkKind::Start, MarkKind::End] {
            self.host.clear_marks(Some(&self.mark_name(metric_name, kind)));
        }
        self.host.clear_measures(Some(metric_name));
        tracing::trace!(target: "perf::timeline", metric = metric_name, "metric cleared");
    }
}
