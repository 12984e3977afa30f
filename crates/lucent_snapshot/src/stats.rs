//! Snapshot cache counters

use tracing::debug;

/// Why a crop could not be served from the cached snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissReason {
    NoSnapshot,
    ScaleMismatch,
    OutsideRect,
    CropFailed,
}

/// Raw event counts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotCounters {
    pub crop_calls: u64,
    pub recapture_requests: u64,
    pub capture_attempts: u64,
    pub capture_successes: u64,
    pub capture_failures: u64,
    pub miss_no_snapshot: u64,
    pub miss_scale_mismatch: u64,
    pub miss_outside_rect: u64,
    pub miss_crop_failed: u64,
}

impl SnapshotCounters {
    fn record_miss(&mut self, reason: MissReason) {
        match reason {
            MissReason::NoSnapshot => self.miss_no_snapshot += 1,
            MissReason::ScaleMismatch => self.miss_scale_mismatch += 1,
            MissReason::OutsideRect => self.miss_outside_rect += 1,
            MissReason::CropFailed => self.miss_crop_failed += 1,
        }
    }
}

/// Cumulative counters plus an optional once-per-second debug report
#[derive(Clone, Debug, Default)]
pub struct SnapshotStats {
    enabled: bool,
    totals: SnapshotCounters,
    window: SnapshotCounters,
    window_start: Option<f64>,
}

impl SnapshotStats {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.window = SnapshotCounters::default();
        self.window_start = None;
    }

    /// Counts since creation
    pub fn totals(&self) -> &SnapshotCounters {
        &self.totals
    }

    pub(crate) fn crop_call(&mut self) {
        self.totals.crop_calls += 1;
        self.window.crop_calls += 1;
    }

    pub(crate) fn recapture_request(&mut self) {
        self.totals.recapture_requests += 1;
        self.window.recapture_requests += 1;
    }

    pub(crate) fn capture_attempt(&mut self, success: bool) {
        for c in [&mut self.totals, &mut self.window] {
            c.capture_attempts += 1;
            if success {
                c.capture_successes += 1;
            } else {
                c.capture_failures += 1;
            }
        }
    }

    pub(crate) fn miss(&mut self, reason: MissReason) {
        self.totals.record_miss(reason);
        self.window.record_miss(reason);
    }

    /// Emit one debug line per elapsed second of counts, then reset the window.
    ///
    /// Returns the reported window when a report was emitted.
    pub fn report_if_due(&mut self, now: f64) -> Option<SnapshotCounters> {
        if !self.enabled {
            return None;
        }
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now - start;
        if elapsed < 1.0 {
            return None;
        }

        let w = self.window;
        let per_sec = |n: u64| n as f64 / elapsed;
        debug!(
            crop_per_sec = per_sec(w.crop_calls),
            recapture_per_sec = per_sec(w.recapture_requests),
            attempts_per_sec = per_sec(w.capture_attempts),
            ok = w.capture_successes,
            failed = w.capture_failures,
            miss_no_snapshot = w.miss_no_snapshot,
            miss_scale = w.miss_scale_mismatch,
            miss_outside = w.miss_outside_rect,
            miss_crop = w.miss_crop_failed,
            "snapshot stats"
        );

        self.window = SnapshotCounters::default();
        self.window_start = Some(now);
        Some(w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_resets_window_but_not_totals() {
        let mut stats = SnapshotStats::new(true);
        assert!(stats.report_if_due(0.0).is_none());
        stats.crop_call();
        stats.miss(MissReason::OutsideRect);
        stats.capture_attempt(false);
        assert!(stats.report_if_due(0.5).is_none());

        let window = stats.report_if_due(1.0).expect("due");
        assert_eq!(window.crop_calls, 1);
        assert_eq!(window.miss_outside_rect, 1);
        assert_eq!(window.capture_failures, 1);

        stats.crop_call();
        assert_eq!(stats.totals().crop_calls, 2);
        assert!(stats.report_if_due(1.5).is_none());
    }

    #[test]
    fn disabled_stats_still_count_totals() {
        let mut stats = SnapshotStats::new(false);
        stats.crop_call();
        stats.capture_attempt(true);
        assert!(stats.report_if_due(5.0).is_none());
        assert_eq!(stats.totals().capture_successes, 1);
    }
}
