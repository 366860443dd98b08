//! The timeline facade.

use crate::capability;
use crate::config::TimelineConfig;
use crate::host::{ObserverHandle, PerformanceHost};

/// Timing capture facade over a [`PerformanceHost`].
///
/// Check [`supported`](Self::supported) before marking or measuring and
/// [`supported_performance_observer`](Self::supported_performance_observer)
/// before observing; the facade itself does not guard against unsupported
/// hosts, the host primitives fail instead.
pub struct PerformanceTimeline<H: PerformanceHost> {
    pub(crate) host: H,
    pub(crate) config: TimelineConfig,
    /// At most one live registration.
    pub(crate) observer: Option<ObserverHandle>,
}

impl<H: PerformanceHost> PerformanceTimeline<H> {
    /// Create a timeline with default configuration.
    pub fn new(host: H) -> Self {
        Self::with_config(host, TimelineConfig::default())
    }

    /// Create a timeline with a custom configuration.
    pub fn with_config(host: H, config: TimelineConfig) -> Self {
        Self {
            host,
            config,
            observer: None,
        }
    }

    /// Whether the host offers a clock and named marks.
    pub fn supported(&self) -> bool {
        capability::supports_timing_core(&self.host)
    }

    /// Whether the host is known to implement asynchronous paint observation.
    pub fn supported_performance_observer(&self) -> bool {
        capability::supports_async_observation(&self.host, &self.config)
    }

    /// The underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The active configuration.
    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }
}

impl<H: PerformanceHost> Drop for PerformanceTimeline<H> {
    fn drop(&mut self) {
        self.unobserve();
    }
}
