//! Timeline configuration

use serde::{Deserialize, Serialize};

/// Configuration for a [`PerformanceTimeline`](crate::PerformanceTimeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimelineConfig {
    /// Host vendors known to implement asynchronous paint observation fully.
    ///
    /// Matched case-insensitively against the host's vendor.
    pub observer_allow_list: Vec<String>,
    /// Ask the host to replay entries buffered before an observer registers
    pub replay_buffered: bool,
    /// Prefix of generated mark names (`{prefix}_{metric}_{kind}`)
    pub mark_prefix: String,
}

impl TimelineConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            observer_allow_list: vec!["chrome".to_string()],
            replay_buffered: true,
            mark_prefix: "mark".to_string(),
        }
    }

    /// Parse a JSON configuration; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builder method to replace the observer allow-list.
    pub fn with_observer_allow_list<I, S>(mut self, vendors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observer_allow_list = vendors.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to toggle buffered replay on observe.
    pub fn with_replay_buffered(mut self, replay: bool) -> Self {
        self.replay_buffered = replay;
        self
    }

    /// Builder method to set the mark name prefix.
    pub fn with_mark_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.mark_prefix = prefix.into();
        self
    }

    /// Whether `vendor` is on the observer allow-list.
    pub fn allows_observer_vendor(&self, vendor: &str) -> bool {
        self.observer_allow_list
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(vendor))
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
