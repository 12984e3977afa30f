//! Display-synchronised frame ticking
//!
//! The host owns the real frame clock (a display link, a winit redraw loop, a
//! test harness). A [`FrameTicker`] asks it to start or stop delivering ticks
//! and guarantees at most one subscription is live at a time: starting a new
//! one always stops the previous one first.

use tracing::debug;

/// Identifies one periodic subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// Host-side periodic frame callback.
///
/// Between `start(id, ..)` and `stop(id)` the host is expected to call the
/// owning controller's `tick(now)` once per frame.
pub trait DisplayLink {
    fn start(&mut self, id: SubscriptionId, frame_rate_hz: f32);
    fn stop(&mut self, id: SubscriptionId);
}

/// A display link that never ticks on its own.
///
/// Useful for hosts that tick unconditionally every frame and only need
/// [`FrameTicker::is_running`] to know whether work is pending.
#[derive(Clone, Copy, Debug, Default)]
pub struct ManualLink;

impl DisplayLink for ManualLink {
    fn start(&mut self, _id: SubscriptionId, _frame_rate_hz: f32) {}
    fn stop(&mut self, _id: SubscriptionId) {}
}

/// Owns the single active subscription to a [`DisplayLink`]
pub struct FrameTicker {
    link: Box<dyn DisplayLink>,
    active: Option<SubscriptionId>,
    next_id: u64,
    frame_rate_hz: f32,
    last_tick: Option<f64>,
}

impl FrameTicker {
    pub fn new(link: Box<dyn DisplayLink>, frame_rate_hz: f32) -> Self {
        Self {
            link,
            active: None,
            next_id: 1,
            frame_rate_hz,
            last_tick: None,
        }
    }

    pub fn frame_rate_hz(&self) -> f32 {
        self.frame_rate_hz
    }

    pub fn set_frame_rate_hz(&mut self, frame_rate_hz: f32) {
        self.frame_rate_hz = frame_rate_hz;
    }

    /// Stop any running subscription and start a fresh one
    pub fn start(&mut self) -> SubscriptionId {
        self.stop();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        debug!(id = id.0, hz = self.frame_rate_hz, "frame ticker start");
        self.link.start(id, self.frame_rate_hz);
        self.active = Some(id);
        id
    }

    /// Stop the running subscription, if any
    pub fn stop(&mut self) {
        if let Some(id) = self.active.take() {
            debug!(id = id.0, "frame ticker stop");
            self.link.stop(id);
        }
        self.last_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<SubscriptionId> {
        self.active
    }

    /// Record a tick and return the time since the previous one.
    ///
    /// The first tick of a subscription reports one nominal frame.
    pub fn advance(&mut self, now: f64) -> f64 {
        let nominal = 1.0 / self.frame_rate_hz.max(1.0) as f64;
        let dt = match self.last_tick {
            Some(last) => (now - last).max(0.0),
            None => nominal,
        };
        self.last_tick = Some(now);
        dt
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        live: Vec<SubscriptionId>,
        starts: usize,
    }

    struct RecordingLink(Rc<RefCell<Recorder>>);

    impl DisplayLink for RecordingLink {
        fn start(&mut self, id: SubscriptionId, _frame_rate_hz: f32) {
            let mut r = self.0.borrow_mut();
            r.live.push(id);
            r.starts += 1;
        }

        fn stop(&mut self, id: SubscriptionId) {
            self.0.borrow_mut().live.retain(|live| *live != id);
        }
    }

    #[test]
    fn restart_stops_previous_subscription() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let mut ticker = FrameTicker::new(Box::new(RecordingLink(recorder.clone())), 60.0);

        let first = ticker.start();
        let second = ticker.start();
        assert_ne!(first, second);
        assert_eq!(recorder.borrow().live, vec![second]);
        assert_eq!(recorder.borrow().starts, 2);

        ticker.stop();
        assert!(recorder.borrow().live.is_empty());
        assert!(!ticker.is_running());
    }

    #[test]
    fn drop_releases_subscription() {
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        {
            let mut ticker = FrameTicker::new(Box::new(RecordingLink(recorder.clone())), 60.0);
            ticker.start();
        }
        assert!(recorder.borrow().live.is_empty());
    }

    #[test]
    fn advance_reports_elapsed_time() {
        let mut ticker = FrameTicker::new(Box::new(ManualLink), 60.0);
        ticker.start();
        assert!((ticker.advance(10.0) - 1.0 / 60.0).abs() < 1e-9);
        assert!((ticker.advance(10.05) - 0.05).abs() < 1e-9);
    }
}
