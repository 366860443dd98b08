//! Timeline probe
//!
//! Drives the performance timeline against the in-process host and prints
//! what it captured. Usage: `timeline_probe [config.json]`.

use anyhow::{Context, Result};
use perf_timeline::{
    EntryType, InMemoryHost, MarkKind, MetricSpec, PerformanceTimeline, TimelineConfig,
    TimingEntry, UNMEASURED,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport {
    vendor: Option<String>,
    supported: bool,
    supported_performance_observer: bool,
    measures: Vec<(String, f64)>,
    observed: Vec<TimingEntry>,
}

fn load_config() -> Result<TimelineConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            TimelineConfig::from_json(&json).with_context(|| format!("parsing config {}", path))
        }
        None => Ok(TimelineConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config()?;
    let vendor = std::env::var("TIMELINE_VENDOR").unwrap_or_else(|_| "chrome".to_string());
    let host = Arc::new(InMemoryHost::new().with_vendor(vendor.clone()));
    let mut timeline = PerformanceTimeline::with_config(host.clone(), config);

    tracing::info!(vendor = %vendor, "starting timeline probe");

    let mut report = ProbeReport {
        vendor: Some(vendor),
        supported: timeline.supported(),
        supported_performance_observer: timeline.supported_performance_observer(),
        measures: Vec::new(),
        observed: Vec::new(),
    };

    // Host paints before the subscription exists; replay picks it up.
    let origin = timeline.now()?;
    host.record(TimingEntry::new("first-paint", EntryType::Paint, origin, 0.0));

    let observed = Arc::new(Mutex::new(Vec::new()));
    if report.supported_performance_observer {
        let sink = observed.clone();
        timeline.observe("paint", move |entries| {
            if let Ok(mut seen) = sink.lock() {
                seen.extend(entries);
            }
        })?;
    }

    if report.supported {
        timeline.mark("startup", MarkKind::Start)?;
        std::thread::sleep(Duration::from_millis(15));
        host.record(TimingEntry::new(
            "first-contentful-paint",
            EntryType::Paint,
            timeline.now()?,
            0.0,
        ));
        timeline.mark("startup", MarkKind::End)?;

        let span = timeline.span("settle", MetricSpec::new().with_max_duration(5.0))?;
        std::thread::sleep(Duration::from_millis(8));
        let settle = span.finish()?;

        let startup = timeline.measure("startup", &MetricSpec::new().with_label("Startup"))?;
        for (name, duration) in [("startup", startup), ("settle", settle)] {
            if duration == UNMEASURED {
                tracing::warn!(metric = name, "metric was not measured");
            }
            report.measures.push((name.to_string(), duration));
        }
    }

    let batches = host.flush();
    tracing::info!(batches, "observer batches delivered");

    if let Ok(mut seen) = observed.lock() {
        report.observed = std::mem::take(&mut *seen);
    }

    timeline.unobserve();
    for (name, _) in &report.measures {
        timeline.clear_metric(name);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
