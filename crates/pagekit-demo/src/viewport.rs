#![forbid(unsafe_code)]

//! Viewport collaborator: resize and scroll shaping.
//!
//! Resize bursts are debounced so only the settled width is applied.
//! Scroll positions are throttled so at most one update passes per window.
//! The monitor carries no validation logic; it shares the page clock and
//! configuration with the form pipeline.

use std::time::Duration;

use pagekit::RateLimitConfig;
use pagekit::core::rate_limit::{Debouncer, Throttler};

/// One input sample replayed by [`ViewportMonitor::replay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportInput {
    Resize { width: u32 },
    Scroll { offset: u32 },
}

/// What a replay observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewportReport {
    pub resize_events: usize,
    /// Widths applied after each quiet period.
    pub applied_widths: Vec<u32>,
    pub scroll_events: usize,
    /// Offsets that passed the throttle.
    pub scroll_updates: Vec<u32>,
}

/// Debounced resize plus throttled scroll.
#[derive(Debug, Clone)]
pub struct ViewportMonitor {
    resize: Debouncer<u32>,
    scroll: Throttler,
    report: ViewportReport,
}

impl ViewportMonitor {
    #[must_use]
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            resize: Debouncer::new(config.debounce),
            scroll: Throttler::new(config.throttle),
            report: ViewportReport::default(),
        }
    }

    pub fn on_resize(&mut self, width: u32, now: Duration) {
        self.report.resize_events += 1;
        self.resize.call(width, now);
    }

    /// Returns `true` if the offset was applied.
    pub fn on_scroll(&mut self, offset: u32, now: Duration) -> bool {
        self.report.scroll_events += 1;
        let passed = self.scroll.try_acquire(now);
        if passed {
            self.report.scroll_updates.push(offset);
        }
        passed
    }

    /// Apply the settled width once the resize burst has been quiet long
    /// enough.
    pub fn poll(&mut self, now: Duration) -> Option<u32> {
        let width = self.resize.poll(now)?;
        tracing::debug!(width, "viewport width settled");
        self.report.applied_widths.push(width);
        Some(width)
    }

    /// When the pending resize settles, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.resize.deadline()
    }

    #[must_use]
    pub fn report(&self) -> &ViewportReport {
        &self.report
    }

    /// Feed timestamped samples in order, then let any pending resize
    /// settle.
    pub fn replay(
        config: &RateLimitConfig,
        samples: impl IntoIterator<Item = (Duration, ViewportInput)>,
    ) -> ViewportReport {
        let mut monitor = Self::new(config);
        let mut now = Duration::ZERO;
        for (at, input) in samples {
            // Settle anything that came due between samples first.
            while let Some(deadline) = monitor.next_deadline()
                && deadline <= at
            {
                monitor.poll(deadline);
            }
            now = now.max(at);
            match input {
                ViewportInput::Resize { width } => monitor.on_resize(width, now),
                ViewportInput::Scroll { offset } => {
                    monitor.on_scroll(offset, now);
                }
            }
        }
        if let Some(deadline) = monitor.next_deadline() {
            monitor.poll(deadline.max(now));
        }
        tracing::info!(
            resizes = monitor.report.resize_events,
            applied = monitor.report.applied_widths.len(),
            scrolls = monitor.report.scroll_events,
            passed = monitor.report.scroll_updates.len(),
            "viewport replay finished"
        );
        monitor.report
    }
}

/// A drag-resize from 1280 to 800 pixels while the visitor scrolls down to
/// the contact section.
#[must_use]
pub fn contact_page_visit() -> Vec<(Duration, ViewportInput)> {
    let mut samples = Vec::new();
    for step in 0..12u32 {
        samples.push((
            Duration::from_millis(u64::from(step) * 40),
            ViewportInput::Resize {
                width: 1280 - step * 40,
            },
        ));
    }
    for step in 0..40u32 {
        samples.push((
            Duration::from_millis(600 + u64::from(step) * 16),
            ViewportInput::Scroll { offset: step * 55 },
        ));
    }
    samples
}
