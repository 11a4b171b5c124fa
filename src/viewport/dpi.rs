// SPDX-License-Identifier: MPL-2.0
//! Device pixel ratio change detection.
//!
//! Some hosts have no notification for device pixel ratio changes (moving a
//! window between monitors, browser zoom), so the ratio is sampled on a
//! fixed interval. Hosts that do get a push notification skip the poller and
//! report the new ratio directly.

use crate::config::DEFAULT_DEVICE_PIXEL_RATIO;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Ratios closer than this are considered unchanged.
const RATIO_EPSILON: f64 = 1e-6;

/// Shortest accepted polling period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

fn is_valid_ratio(ratio: f64) -> bool {
    ratio.is_finite() && ratio > 0.0
}

/// Remembers the last device pixel ratio and reports real changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpiMonitor {
    last: f64,
}

impl DpiMonitor {
    /// Starts from `initial`, or from the default ratio when `initial` is
    /// not a usable ratio.
    #[must_use]
    pub fn new(initial: f64) -> Self {
        if is_valid_ratio(initial) {
            Self { last: initial }
        } else {
            tracing::warn!(ratio = initial, "invalid initial device pixel ratio");
            Self {
                last: DEFAULT_DEVICE_PIXEL_RATIO,
            }
        }
    }

    #[must_use]
    pub fn last(&self) -> f64 {
        self.last
    }

    /// Compares a fresh sample against the last ratio. Returns the new
    /// ratio when it changed; invalid samples are ignored.
    pub fn sample(&mut self, ratio: f64) -> Option<f64> {
        if !is_valid_ratio(ratio) {
            return None;
        }
        if (ratio - self.last).abs() <= RATIO_EPSILON {
            return None;
        }
        tracing::debug!(from = self.last, to = ratio, "device pixel ratio changed");
        self.last = ratio;
        Some(ratio)
    }
}

/// Spawns a task sampling `source` every `interval` and publishing changes.
///
/// The receiver starts at the first valid sample. Periods shorter than one
/// millisecond are raised to one millisecond. The task stops once every
/// receiver has been dropped.
pub fn watch_device_pixel_ratio<F>(
    interval: Duration,
    mut source: F,
) -> (watch::Receiver<f64>, JoinHandle<()>)
where
    F: FnMut() -> f64 + Send + 'static,
{
    let mut monitor = DpiMonitor::new(source());
    let (tx, rx) = watch::channel(monitor.last());
    let interval = interval.max(MIN_POLL_INTERVAL);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if tx.is_closed() {
                break;
            }
            if let Some(ratio) = monitor.sample(source()) {
                if tx.send(ratio).is_err() {
                    break;
                }
            }
        }
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[test]
    fn sample_reports_only_changes() {
        let mut monitor = DpiMonitor::new(1.0);
        assert_eq!(monitor.sample(1.0), None);
        assert_eq!(monitor.sample(2.0), Some(2.0));
        assert_eq!(monitor.sample(2.0), None);
        assert_eq!(monitor.last(), 2.0);
    }

    #[test]
    fn sample_ignores_invalid_ratios() {
        let mut monitor = DpiMonitor::new(1.5);
        assert_eq!(monitor.sample(0.0), None);
        assert_eq!(monitor.sample(f64::NAN), None);
        assert_eq!(monitor.last(), 1.5);
    }

    #[test]
    fn invalid_initial_ratio_uses_default() {
        assert_eq!(DpiMonitor::new(0.0).last(), DEFAULT_DEVICE_PIXEL_RATIO);
        assert_eq!(DpiMonitor::new(f64::NAN).last(), DEFAULT_DEVICE_PIXEL_RATIO);
        assert_eq!(DpiMonitor::new(2.0).last(), 2.0);
    }

    #[tokio::test]
    async fn zero_interval_does_not_stop_the_poller() {
        let ratio = Arc::new(AtomicU64::new(0.0f64.to_bits()));
        let source = Arc::clone(&ratio);
        let (mut rx, handle) = watch_device_pixel_ratio(Duration::ZERO, move || {
            f64::from_bits(source.load(Ordering::SeqCst))
        });
        assert_eq!(*rx.borrow(), DEFAULT_DEVICE_PIXEL_RATIO);

        ratio.store(3.0f64.to_bits(), Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("ratio change not published")
            .expect("poller stopped");
        assert_eq!(*rx.borrow(), 3.0);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop")
            .expect("poller panicked");
    }

    #[tokio::test]
    async fn poller_publishes_changed_ratio() {
        let ratio = Arc::new(AtomicU64::new(1.0f64.to_bits()));
        let source = Arc::clone(&ratio);
        let (mut rx, handle) = watch_device_pixel_ratio(Duration::from_millis(5), move || {
            f64::from_bits(source.load(Ordering::SeqCst))
        });
        assert_eq!(*rx.borrow(), 1.0);

        ratio.store(2.0f64.to_bits(), Ordering::SeqCst);
        tokio::time::timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("ratio change not published")
            .expect("poller stopped");
        assert_eq!(*rx.borrow(), 2.0);

        drop(rx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop")
            .expect("poller panicked");
    }
}
