//! Lens motion controller
//!
//! Owns the single [`MotionState`], the frame ticker and the deferred task
//! queue. Hosts forward gesture callbacks and frame ticks; the controller
//! moves the lens, renders it through the [`LensOverlay`] and reports
//! selection commits.
//!
//! Every transition stops the running phase first, so at most one phase runs
//! and at most one ticker subscription is live. Deferred work (forced
//! re-prime, debounced tab switch) is checked against the current generation
//! or pending handle before it acts.

use std::mem;

use lucent_animation::curves;
use lucent_animation::{
    Deformation, DisplayLink, Easing, FrameTicker, SettleCurve, SubscriptionId, TaskId, TaskQueue,
    Wobble,
};
use lucent_core::{GesturePhase, PanEvent, Point, PressEvent, Rect, Size};
use tracing::{debug, trace, warn};

use crate::config::LensConfig;
use crate::gesture::{GestureArbiter, PanDecision};
use crate::layout::TabLayout;
use crate::overlay::{LensOverlay, MIN_VISIBLE_ALPHA};
use crate::state::{DragMotion, LensVisual, MotionPhase, MotionState, Settle, TapMove};

/// A timed phase completes once progress reaches `1 - FINISH_EPSILON`
const FINISH_EPSILON: f32 = 1e-4;

/// Upper bound of the settle's starting uniform scale
const MAX_START_UNIFORM: f32 = 1.5;

/// Called with the newly selected slot index
pub type CommitHandler = Box<dyn FnMut(usize)>;

/// Called with `false` when a drag takes over the capsule and `true` when it
/// ends. Hosts disable and re-enable their per-slot context menu gestures.
pub type ContextGestureHandler = Box<dyn FnMut(bool)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeferredAction {
    /// Re-prime the running tap-move's endpoints
    ForcePrime,
    /// Debounced selection commit after a press
    CommitSwitch { index: usize },
}

/// Output of one phase step, before pixel snapping
struct PhaseFrame {
    base: Rect,
    scale_x: f32,
    scale_y: f32,
    alpha: f32,
    brightness: f32,
    delta: f32,
    finished: bool,
}

pub struct MotionController {
    config: LensConfig,
    layout: TabLayout,
    selected: Option<usize>,
    state: MotionState,
    ticker: FrameTicker,
    tasks: TaskQueue<DeferredAction>,
    generation: u64,
    pending_switch: Option<(TaskId, usize)>,
    arbiter: GestureArbiter,
    press_holding: bool,
    /// Last index committed by the controller, awaiting the host's echo
    echo: Option<usize>,
    visual: LensVisual,
    overlay: LensOverlay,
    on_commit: Option<CommitHandler>,
    on_context_gestures: Option<ContextGestureHandler>,
    context_gestures_suppressed: bool,
    deformation: Deformation,
    wobble: Wobble,
    settle_curve: SettleCurve,
}

impl MotionController {
    pub fn new(
        config: LensConfig,
        layout: TabLayout,
        selected: Option<usize>,
        link: Box<dyn DisplayLink>,
        overlay: LensOverlay,
    ) -> Self {
        let motion = &config.motion;
        let deformation = Deformation::new(motion.base_scale, motion.delta_range);
        let wobble = Wobble {
            amplitude: motion.wobble_amplitude,
            frequency_hz: motion.wobble_frequency_hz,
        };
        let settle_curve = SettleCurve {
            phase1_end: motion.settle_phase1_end,
            overshoot_delta: motion.settle_overshoot_delta,
            back_phase1: motion.settle_back_phase1,
            back_phase2: motion.settle_back_phase2,
        };
        let ticker = FrameTicker::new(link, motion.frame_rate_hz);
        let arbiter = GestureArbiter::new(config.gesture.clone());
        let selected = selected.filter(|&i| layout.slot_frame(i).is_some());

        let mut controller = Self {
            config,
            layout,
            selected,
            state: MotionState::Idle,
            ticker,
            tasks: TaskQueue::new(),
            generation: 0,
            pending_switch: None,
            arbiter,
            press_holding: false,
            echo: None,
            visual: LensVisual::default(),
            overlay,
            on_commit: None,
            on_context_gestures: None,
            context_gestures_suppressed: false,
            deformation,
            wobble,
            settle_curve,
        };
        controller.rest_at_selected();
        controller
    }

    pub fn with_commit_handler(mut self, handler: impl FnMut(usize) + 'static) -> Self {
        self.on_commit = Some(Box::new(handler));
        self
    }

    pub fn set_commit_handler(&mut self, handler: impl FnMut(usize) + 'static) {
        self.on_commit = Some(Box::new(handler));
    }

    pub fn with_context_gesture_handler(mut self, handler: impl FnMut(bool) + 'static) -> Self {
        self.on_context_gestures = Some(Box::new(handler));
        self
    }

    /// Whether slot context menu gestures are currently switched off by a drag
    pub fn context_gestures_suppressed(&self) -> bool {
        self.context_gestures_suppressed
    }

    pub fn config(&self) -> &LensConfig {
        &self.config
    }

    pub fn layout(&self) -> &TabLayout {
        &self.layout
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn phase(&self) -> MotionPhase {
        self.state.phase()
    }

    /// The lens as drawn on the most recent frame
    pub fn visual(&self) -> LensVisual {
        self.visual
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn is_press_holding(&self) -> bool {
        self.press_holding
    }

    /// The live ticker subscription, if any
    pub fn subscription(&self) -> Option<SubscriptionId> {
        self.ticker.active()
    }

    /// Slot index of the debounced switch waiting to commit
    pub fn pending_switch(&self) -> Option<usize> {
        self.pending_switch.map(|(_, index)| index)
    }

    /// Time at which the next deferred task becomes due
    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks.next_due()
    }

    pub fn arbiter(&self) -> &GestureArbiter {
        &self.arbiter
    }

    pub fn overlay(&self) -> &LensOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut LensOverlay {
        &mut self.overlay
    }

    /// Animate the lens to slot `index`. Does not commit a selection.
    ///
    /// A debounced switch toward a different slot is dropped.
    pub fn move_to(&mut self, index: usize, now: f64) -> bool {
        if self.layout.slot_frame(index).is_none() {
            return false;
        }
        if self.pending_switch().is_some_and(|pending| pending != index) {
            self.cancel_pending_switch();
        }
        self.move_from(index, None, now)
    }

    /// Squash-and-recover in place on the selected slot. Ignored while moving.
    pub fn bounce(&mut self, now: f64) -> bool {
        if !self.state.is_idle() {
            return false;
        }
        let Some((index, base)) = self.selected.and_then(|i| self.layout.slot_frame(i).map(|f| (i, f))) else {
            return false;
        };
        let motion = &self.config.motion;
        let speed = if motion.delta_range > 0.0 {
            (motion.bounce_delta / motion.delta_range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let bounce = TapMove {
            from_x: base.min_x(),
            to_x: base.min_x(),
            base_frame: base,
            start: now,
            duration: motion.bounce_duration,
            speed,
            target_index: Some(index),
        };
        self.begin_tap_move(bounce, now);
        true
    }

    /// Start dragging the lens toward `point`.
    ///
    /// The lens jumps under the finger when `point` is on it; otherwise it
    /// catches up from where it is.
    pub fn begin_drag(&mut self, point: Point, now: f64) -> bool {
        let slop = self.config.gesture.lens_hit_slop;
        let on_lens = !self.visual.frame.is_empty() && self.visual.frame.inset(-slop.x, -slop.y).contains(point);
        self.begin_drag_at(point, on_lens, now)
    }

    pub fn update_drag(&mut self, point: Point, now: f64) {
        let smoothing = self.config.motion.velocity_smoothing;
        let MotionState::Drag(drag) = &mut self.state else {
            return;
        };
        let dt = (now - drag.last_time).max(1e-4);
        let velocity = (point.x - drag.last_x) / dt as f32;
        drag.velocity = drag.velocity * (1.0 - smoothing) + velocity * smoothing;
        drag.target_center_x = point.x;
        drag.last_x = point.x;
        drag.last_time = now;
    }

    /// Release the drag and settle onto the nearest slot.
    ///
    /// A normal release commits that slot immediately. A cancelled drag
    /// settles back to the selected slot without committing.
    pub fn end_drag(&mut self, point: Point, cancelled: bool, now: f64) -> bool {
        if !matches!(self.state, MotionState::Drag(_)) {
            return false;
        }
        let MotionState::Drag(drag) = mem::take(&mut self.state) else {
            return false;
        };
        self.ticker.stop();
        self.press_holding = false;
        self.set_context_gestures_suppressed(false);

        let index = if cancelled {
            self.selected.or_else(|| self.layout.nearest_index(drag.current_center_x))
        } else {
            self.layout.nearest_index(point.x).or(self.selected)
        };
        let Some((index, target)) = index.and_then(|i| self.layout.slot_frame(i).map(|f| (i, f))) else {
            debug!("drag released without a slot");
            self.visual.alpha = 0.0;
            return false;
        };

        if !cancelled {
            self.commit(index);
        }
        self.start_settle(drag, target, index, now);
        true
    }

    /// Adopt a new capsule/slot geometry, retargeting any running motion
    pub fn notify_layout_changed(&mut self, layout: TabLayout, now: f64) {
        self.layout = layout;
        self.selected = self.selected.and_then(|i| layout.clamp_index(i));
        let capsule = layout.capsule;
        let slot_width = layout.slot_width();
        debug!(?capsule, count = layout.count, "layout changed");

        match &mut self.state {
            MotionState::Idle => {}
            MotionState::TapMove(mv) => {
                if let Some(frame) = mv.target_index.and_then(|i| layout.slot_frame(i)) {
                    if mv.from_x == mv.to_x {
                        mv.from_x = frame.min_x();
                    }
                    mv.to_x = frame.min_x();
                    mv.base_frame = frame;
                }
            }
            MotionState::DragReleaseSettle(settle) => {
                if let Some(frame) = layout.slot_frame(settle.target_index) {
                    settle.to_x = frame.min_x();
                    settle.base_frame = frame;
                }
            }
            MotionState::Drag(drag) => {
                drag.base_frame = Rect::from_center(
                    Point::new(drag.current_center_x, capsule.mid_y()),
                    Size::new(slot_width, capsule.height()),
                );
            }
        }

        if self.state.is_idle() {
            self.rest_at_selected();
        } else {
            self.apply_frame(now, 0.0);
        }
    }

    /// The host changed the selection.
    ///
    /// Echoes of the controller's own commits only move the resting frame;
    /// anything else animates from the previous slot.
    pub fn notify_selection_changed(&mut self, index: usize, now: f64) {
        let Some(target) = self.layout.slot_frame(index) else {
            return;
        };
        if self.echo.take() == Some(index) {
            self.selected = Some(index);
            if self.state.is_idle() {
                self.visual.frame = self.rest_frame(target);
            }
            return;
        }
        if self.selected == Some(index) {
            return;
        }

        let previous = self.selected.replace(index);
        self.cancel_pending_switch();
        let from_x = match &self.state {
            MotionState::Drag(_) => return,
            MotionState::TapMove(mv) if mv.target_index == Some(index) => return,
            MotionState::Idle => previous.and_then(|p| self.layout.slot_frame(p)).map(|f| f.min_x()),
            _ => None,
        };
        self.move_from(index, from_x, now);
    }

    /// Tap / long-press recognizer callback
    pub fn handle_press(&mut self, event: PressEvent) {
        if matches!(self.state, MotionState::Drag(_)) {
            return;
        }
        let now = event.sample.time;
        let point = event.sample.position;

        match event.phase {
            GesturePhase::Began => {
                if !self.arbiter.tap_allowed(now) {
                    trace!("press suppressed");
                    return;
                }
                let Some(index) = self.layout.index_at(point.x, point.y) else {
                    return;
                };
                self.press_holding = true;
                self.press_target(index, now);
            }
            GesturePhase::Changed => {
                if !self.press_holding || !self.arbiter.tap_allowed(now) {
                    return;
                }
                if let Some(index) = self.layout.index_at(point.x, point.y) {
                    self.press_target(index, now);
                }
            }
            GesturePhase::Ended => {
                if !mem::replace(&mut self.press_holding, false) {
                    return;
                }
                if let Some((id, index)) = self.pending_switch.take() {
                    self.tasks.cancel(id);
                    self.commit(index);
                }
                self.release_hold(now);
            }
            GesturePhase::Cancelled => {
                if !mem::replace(&mut self.press_holding, false) {
                    return;
                }
                self.cancel_pending_switch();
                match (self.heading(), self.selected) {
                    (Some(target), Some(selected)) if target != selected => {
                        self.move_to(selected, now);
                    }
                    _ => self.release_hold(now),
                }
            }
        }
    }

    /// Pan recognizer callback. Hosts cancel their tap recognizer on
    /// [`PanDecision::BeginDrag`].
    pub fn handle_pan(&mut self, event: PanEvent) -> PanDecision {
        let sample = event.sample;
        match event.phase {
            GesturePhase::Began => {
                let lens = (!self.visual.frame.is_empty()).then_some(self.visual.frame);
                self.arbiter.pan_began(sample, self.layout.capsule, lens)
            }
            GesturePhase::Changed => {
                let decision = self.arbiter.pan_changed(sample);
                match decision {
                    PanDecision::BeginDrag { started_on_lens } => {
                        self.begin_drag_at(sample.position, started_on_lens, sample.time);
                    }
                    PanDecision::UpdateDrag => self.update_drag(sample.position, sample.time),
                    _ => {}
                }
                decision
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                let decision = self.arbiter.pan_ended(sample, event.phase == GesturePhase::Cancelled);
                if let PanDecision::EndDrag { cancelled } = decision {
                    self.end_drag(sample.position, cancelled, sample.time);
                }
                decision
            }
        }
    }

    /// Advance one display frame. Returns whether a motion is still running.
    pub fn tick(&mut self, now: f64) -> bool {
        self.run_due_tasks(now);
        if self.state.is_idle() {
            self.ticker.stop();
            return false;
        }
        let dt = self.ticker.advance(now);
        self.apply_frame(now, dt);
        self.is_active()
    }

    fn move_from(&mut self, index: usize, from_x: Option<f32>, now: f64) -> bool {
        let Some(target) = self.layout.slot_frame(index) else {
            return false;
        };
        let from_x = from_x
            .or_else(|| self.current_center_x().map(|c| c - target.width() * 0.5))
            .unwrap_or(target.min_x());
        let motion = &self.config.motion;
        let duration = motion.tap_move_duration;
        let travel_velocity = (target.min_x() - from_x).abs() / duration.max(1e-3);
        let speed = curves::speed_factor(travel_velocity, self.reference_velocity() * motion.tap_velocity_boost);

        let mv = TapMove {
            from_x,
            to_x: target.min_x(),
            base_frame: target,
            start: now,
            duration,
            speed,
            target_index: Some(index),
        };
        self.begin_tap_move(mv, now);
        true
    }

    fn begin_tap_move(&mut self, mv: TapMove, now: f64) {
        self.stop_motion();
        self.generation += 1;

        let max_scale = self.config.motion.prime_max_scale;
        self.prime_endpoints(&mv.base_frame, mv.from_x, mv.to_x, max_scale, now);
        debug!(
            from_x = mv.from_x,
            to_x = mv.to_x,
            target = ?mv.target_index,
            speed = mv.speed,
            "tap move"
        );

        self.state = MotionState::TapMove(mv);
        let delay = self.config.motion.force_prime_delay as f64;
        self.tasks.schedule(now, delay, self.generation, DeferredAction::ForcePrime);
        self.ticker.start();
        self.apply_frame(now, 0.0);
    }

    fn begin_drag_at(&mut self, point: Point, started_on_lens: bool, now: f64) -> bool {
        if self.layout.is_empty() {
            return false;
        }
        self.cancel_pending_switch();
        let current = self.current_center_x().unwrap_or(point.x);
        self.stop_motion();
        self.generation += 1;

        let capsule = self.layout.capsule;
        let base_frame = Rect::from_center(
            Point::new(current, capsule.mid_y()),
            Size::new(self.layout.slot_width(), capsule.height()),
        );
        let motion = &self.config.motion;
        let (current_center_x, catch_up_until) = if started_on_lens {
            (point.x, now)
        } else {
            (current, now + motion.catch_up_duration as f64)
        };

        self.overlay.prime(&[capsule.center_scale_uniform(motion.prime_max_scale)], now);
        debug!(x = point.x, started_on_lens, "drag begin");

        self.press_holding = true;
        self.set_context_gestures_suppressed(true);
        self.state = MotionState::Drag(DragMotion {
            target_center_x: point.x,
            current_center_x,
            velocity: 0.0,
            base_frame,
            started: now,
            catch_up_until,
            last_x: point.x,
            last_time: now,
            last_delta: 0.0,
            last_brightness: 0.0,
        });
        self.ticker.start();
        true
    }

    /// Start the release settle from the drag's last frame
    fn start_settle(&mut self, drag: DragMotion, target: Rect, index: usize, now: f64) {
        let motion = &self.config.motion;
        let min_uniform = 1.0 / self.deformation.base_scale.max(1e-3);
        let start_uniform = (drag.base_frame.width() / target.width().max(1.0))
            .min(MAX_START_UNIFORM)
            .max(min_uniform);
        let from_x = drag.current_center_x - target.width() * 0.5;

        let settle = Settle {
            from_x,
            to_x: target.min_x(),
            base_frame: target,
            start_delta: drag.last_delta,
            start_uniform,
            start_brightness: drag.last_brightness,
            start: now,
            duration: motion.settle_duration,
            target_index: index,
        };

        let (sx, sy) = self.deformation.scales(settle.start_delta);
        let max_scale = motion.prime_max_scale;
        let from_frame = target
            .with_x(from_x)
            .center_scale(sx * start_uniform, sy * start_uniform)
            .center_scale_uniform(max_scale);
        let to_frame = target.center_scale_uniform(max_scale);
        self.overlay.prime(&[from_frame, to_frame], now);

        debug!(from_x, to_x = settle.to_x, start_delta = settle.start_delta, index, "release settle");
        self.generation += 1;
        self.state = MotionState::DragReleaseSettle(settle);
        self.ticker.start();
        self.apply_frame(now, 0.0);
    }

    fn press_target(&mut self, index: usize, now: f64) {
        let heading = self.heading();
        if Some(index) == self.selected {
            self.cancel_pending_switch();
            match heading {
                None => {
                    self.bounce(now);
                }
                Some(target) if target != index => {
                    self.move_to(index, now);
                }
                Some(_) => {}
            }
            return;
        }

        if heading != Some(index) {
            self.move_to(index, now);
        }
        if self.pending_switch() != Some(index) {
            self.schedule_switch(index, now);
        }
    }

    /// Fade a lens left visible by a press hold
    fn release_hold(&mut self, now: f64) {
        if !self.state.is_idle() || self.visual.alpha <= MIN_VISIBLE_ALPHA || self.visual.frame.is_empty() {
            return;
        }
        let motion = &self.config.motion;
        let duration = motion.tap_move_duration;
        let x = self.visual.frame.min_x();
        let fade = TapMove {
            from_x: x,
            to_x: x,
            base_frame: self.visual.frame,
            start: now - (motion.tap_fade_out_start * duration) as f64,
            duration,
            speed: 0.0,
            target_index: self.selected,
        };
        self.begin_tap_move(fade, now);
    }

    fn schedule_switch(&mut self, index: usize, now: f64) {
        self.cancel_pending_switch();
        let delay = self.config.motion.tap_move_duration as f64;
        let id = self
            .tasks
            .schedule(now, delay, self.generation, DeferredAction::CommitSwitch { index });
        trace!(index, "switch scheduled");
        self.pending_switch = Some((id, index));
    }

    fn cancel_pending_switch(&mut self) {
        if let Some((id, index)) = self.pending_switch.take() {
            self.tasks.cancel(id);
            debug!(index, "pending switch cancelled");
        }
    }

    fn commit(&mut self, index: usize) -> bool {
        if self.selected == Some(index) {
            return false;
        }
        debug!(index, "commit selection");
        self.selected = Some(index);
        self.echo = Some(index);
        if let Some(handler) = self.on_commit.as_mut() {
            handler(index);
        }
        true
    }

    fn set_context_gestures_suppressed(&mut self, suppressed: bool) {
        if self.context_gestures_suppressed == suppressed {
            return;
        }
        self.context_gestures_suppressed = suppressed;
        debug!(suppressed, "slot context gestures");
        if let Some(handler) = self.on_context_gestures.as_mut() {
            handler(!suppressed);
        }
    }

    fn run_due_tasks(&mut self, now: f64) {
        for (id, task) in self.tasks.drain_due(now) {
            match task.payload {
                DeferredAction::ForcePrime => {
                    if task.generation != self.generation {
                        warn!(
                            generation = task.generation,
                            current = self.generation,
                            "stale force prime dropped"
                        );
                        continue;
                    }
                    self.force_prime(now);
                }
                DeferredAction::CommitSwitch { index } => match self.pending_switch {
                    Some((pending, _)) if pending == id => {
                        self.pending_switch = None;
                        self.commit(index);
                    }
                    _ => warn!(index, "stale switch dropped"),
                },
            }
        }
    }

    fn force_prime(&mut self, now: f64) {
        let MotionState::TapMove(mv) = &self.state else {
            return;
        };
        let (base, from_x, to_x) = (mv.base_frame, mv.from_x, mv.to_x);
        let max_scale = self.config.motion.prime_max_scale;
        trace!(from_x, to_x, "force prime");
        self.prime_endpoints(&base, from_x, to_x, max_scale, now);
        self.apply_frame(now, 0.0);
    }

    fn prime_endpoints(&mut self, base: &Rect, from_x: f32, to_x: f32, max_scale: f32, now: f64) {
        let from = base.with_x(from_x).center_scale_uniform(max_scale);
        let to = base.with_x(to_x).center_scale_uniform(max_scale);
        self.overlay.prime(&[from, to], now);
    }

    /// Stop whatever is running. Leaves the visual where it is.
    fn stop_motion(&mut self) {
        if !self.state.is_idle() {
            debug!(phase = ?self.state.phase(), "motion interrupted");
        }
        if matches!(self.state, MotionState::Drag(_)) {
            self.set_context_gestures_suppressed(false);
        }
        self.state = MotionState::Idle;
        self.ticker.stop();
        self.tasks.cancel_where(|action| *action == DeferredAction::ForcePrime);
    }

    fn finish(&mut self, now: f64) {
        let state = mem::take(&mut self.state);
        let motion = &self.config.motion;
        let rest = match &state {
            MotionState::TapMove(mv) => Some((
                mv.base_frame.with_x(mv.to_x),
                curves::tap_alpha(1.0, motion.tap_fade_in_end, motion.tap_fade_out_start, self.press_holding),
            )),
            MotionState::DragReleaseSettle(settle) => Some((
                settle.base_frame.with_x(settle.to_x),
                curves::settle_alpha(1.0, motion.settle_fade_start),
            )),
            _ => None,
        };

        self.ticker.stop();
        self.tasks.cancel_where(|action| *action == DeferredAction::ForcePrime);

        if let Some((base, alpha)) = rest {
            let frame = self.rest_frame(base);
            self.visual = LensVisual {
                frame,
                alpha,
                brightness: 0.0,
                delta: 0.0,
            };
            self.overlay.render(frame, alpha, 0.0, now);
        }
        debug!(phase = ?state.phase(), "motion finished");

        if let Some((id, index)) = self.pending_switch.take() {
            self.tasks.cancel(id);
            self.commit(index);
        }
    }

    fn apply_frame(&mut self, now: f64, dt: f64) {
        let Some(step) = self.step(now, dt) else {
            return;
        };
        let frame = step
            .base
            .center_scale(step.scale_x, step.scale_y)
            .snap_to_pixels(self.layout.pixel_scale);
        self.visual = LensVisual {
            frame,
            alpha: step.alpha,
            brightness: step.brightness,
            delta: step.delta,
        };
        trace!(
            phase = ?self.state.phase(),
            x = frame.min_x(),
            delta = step.delta,
            alpha = step.alpha,
            "lens frame"
        );
        self.overlay.render(frame, step.alpha, step.brightness, now);

        if step.finished {
            self.finish(now);
        }
    }

    fn step(&mut self, now: f64, dt: f64) -> Option<PhaseFrame> {
        let reference_velocity = self.reference_velocity();
        let motion = &self.config.motion;
        let deformation = self.deformation;
        let wobble = self.wobble;
        let settle_curve = self.settle_curve;
        let capsule = self.layout.capsule;

        match &mut self.state {
            MotionState::Idle => None,
            MotionState::TapMove(mv) => {
                let t = mv.progress(now);
                let x = lerp(mv.from_x, mv.to_x, Easing::EaseOutCubic.apply(t));
                let delta = curves::tap_delta(&deformation, &wobble, t, mv.speed, now);
                let (scale_x, scale_y) = deformation.scales(delta);
                Some(PhaseFrame {
                    base: mv.base_frame.with_x(x),
                    scale_x,
                    scale_y,
                    alpha: curves::tap_alpha(t, motion.tap_fade_in_end, motion.tap_fade_out_start, self.press_holding),
                    brightness: motion.tap_brightness,
                    delta,
                    finished: t >= 1.0 - FINISH_EPSILON,
                })
            }
            MotionState::DragReleaseSettle(settle) => {
                let t = settle.progress(now);
                let x = lerp(settle.from_x, settle.to_x, Easing::EaseOutCubic.apply(t));
                let delta = settle_curve.delta(&deformation, t, settle.start_delta);
                let min_uniform = 1.0 / deformation.base_scale.max(1e-3);
                let uniform = settle_curve.uniform(t, settle.start_uniform, min_uniform);
                let (scale_x, scale_y) = deformation.scales(delta);

                let resting = motion.tap_brightness
                    + (motion.drag_max_brightness - motion.tap_brightness) * deformation.intensity(delta);
                let blend = Easing::EaseOutCubic.apply_clamped(t / settle_curve.phase1_end.max(f32::EPSILON));
                Some(PhaseFrame {
                    base: settle.base_frame.with_x(x),
                    scale_x: scale_x * uniform,
                    scale_y: scale_y * uniform,
                    alpha: curves::settle_alpha(t, motion.settle_fade_start),
                    brightness: lerp(settle.start_brightness, resting, blend),
                    delta,
                    finished: t >= 1.0 - FINISH_EPSILON,
                })
            }
            MotionState::Drag(drag) => {
                let k = if now < drag.catch_up_until {
                    motion.follow_catch_up
                } else {
                    motion.follow_steady
                };
                drag.current_center_x += (drag.target_center_x - drag.current_center_x) * curves::follow_factor(k, dt);

                let ramp = curves::ramp_in(now - drag.started, motion.drag_ramp_duration);
                let deform = ramp * curves::speed_factor(drag.velocity, reference_velocity);
                let delta = curves::drag_delta(&deformation, &wobble, deform, now);
                let (scale_x, scale_y) = deformation.scales(delta);

                // Clamp on the deformed width so the lens never leaves the capsule
                let half = drag.base_frame.width() * scale_x * 0.5;
                let (lo, hi) = (capsule.min_x() + half, capsule.max_x() - half);
                drag.current_center_x = if lo <= hi {
                    drag.current_center_x.max(lo).min(hi)
                } else {
                    capsule.mid_x()
                };
                drag.base_frame = drag
                    .base_frame
                    .with_x(drag.current_center_x - drag.base_frame.width() * 0.5);

                let brightness = motion.drag_max_brightness * deform.clamp(0.0, 1.0);
                drag.last_delta = delta;
                drag.last_brightness = brightness;
                Some(PhaseFrame {
                    base: drag.base_frame,
                    scale_x,
                    scale_y,
                    alpha: 1.0,
                    brightness,
                    delta,
                    finished: false,
                })
            }
        }
    }

    fn heading(&self) -> Option<usize> {
        match &self.state {
            MotionState::TapMove(mv) => mv.target_index,
            MotionState::DragReleaseSettle(settle) => Some(settle.target_index),
            _ => None,
        }
    }

    fn current_center_x(&self) -> Option<f32> {
        (!self.visual.frame.is_empty()).then(|| self.visual.frame.mid_x())
    }

    fn reference_velocity(&self) -> f32 {
        self.config.motion.reference_velocity_per_width * self.layout.screen_width
    }

    fn rest_frame(&self, base: Rect) -> Rect {
        let (sx, sy) = self.deformation.scales(0.0);
        base.center_scale(sx, sy).snap_to_pixels(self.layout.pixel_scale)
    }

    fn rest_at_selected(&mut self) {
        self.visual = match self.selected.and_then(|i| self.layout.slot_frame(i)) {
            Some(frame) => LensVisual {
                frame: self.rest_frame(frame),
                ..LensVisual::default()
            },
            None => LensVisual::default(),
        };
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
