//! Host capability detection.
//!
//! Both probes are side-effect free and never fail; an absent feature is a
//! normal answer, not an error.

use crate::config::TimelineConfig;
use crate::host::PerformanceHost;

/// True iff the host exposes both a clock and mark creation.
pub fn supports_timing_core<H: PerformanceHost + ?Sized>(host: &H) -> bool {
    let features = host.features();
    features.clock && features.mark
}

/// True iff the host is on the allow-list and exposes the observer primitive.
///
/// This is an allow-list rather than a feature probe: some hosts expose the
/// primitive with an incomplete paint implementation.
pub fn supports_async_observation<H: PerformanceHost + ?Sized>(
    host: &H,
    config: &TimelineConfig,
) -> bool {
    let listed = host
        .vendor()
        .is_some_and(|vendor| config.allows_observer_vendor(&vendor));
    listed && host.features().observer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostFeatures;
    use crate::memory::InMemoryHost;

    #[test]
    fn test_timing_core_requires_clock_and_mark() {
        assert!(supports_timing_core(&InMemoryHost::new()));

        let no_clock = InMemoryHost::new().with_features(HostFeatures::all().with_clock(false));
        assert!(!supports_timing_core(&no_clock));

        let no_mark = InMemoryHost::new().with_features(HostFeatures::all().with_mark(false));
        assert!(!supports_timing_core(&no_mark));

        let bare = InMemoryHost::new().with_features(HostFeatures::none());
        assert!(!supports_timing_core(&bare));
    }

    #[test]
    fn test_async_observation_allow_list() {
        let config = TimelineConfig::default();

        let chrome = InMemoryHost::new().with_vendor("chrome");
        assert!(supports_async_observation(&chrome, &config));

        let unlisted = InMemoryHost::new().with_vendor("firefox");
        assert!(!supports_async_observation(&unlisted, &config));

        let anonymous = InMemoryHost::new();
        assert!(!supports_async_observation(&anonymous, &config));
    }

    #[test]
    fn test_async_observation_requires_primitive() {
        let config = TimelineConfig::default();
        let host = InMemoryHost::new()
            .with_vendor("chrome")
            .with_features(HostFeatures::all().with_observer(false));
        assert!(!supports_async_observation(&host, &config));
    }
}
