//! End-to-end lens motion driven by a manual clock

use std::cell::RefCell;
use std::rc::Rc;

use image::RgbaImage;
use lucent_animation::{DisplayLink, SubscriptionId};
use lucent_core::{GesturePhase, PanEvent, Point, PointerSample, PressEvent, Rect};
use lucent_gpu::{LensSurface, RenderParameters};
use lucent_motion::{
    LensConfig, LensOverlay, LensVisual, MotionController, MotionPhase, MotionState, PanDecision,
    TabLayout,
};
use lucent_snapshot::ImageCaptureSource;
use tracing_subscriber::EnvFilter;

const FRAME: f64 = 1.0 / 60.0;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct LinkLog {
    active: Vec<SubscriptionId>,
    started: usize,
    max_active: usize,
}

struct RecordingLink(Rc<RefCell<LinkLog>>);

impl DisplayLink for RecordingLink {
    fn start(&mut self, id: SubscriptionId, _frame_rate_hz: f32) {
        let mut log = self.0.borrow_mut();
        log.active.push(id);
        log.started += 1;
        log.max_active = log.max_active.max(log.active.len());
    }

    fn stop(&mut self, id: SubscriptionId) {
        self.0.borrow_mut().active.retain(|active| *active != id);
    }
}

struct CountingSurface(Rc<RefCell<usize>>);

impl LensSurface for CountingSurface {
    fn update_background(&mut self, _background: &RgbaImage) {}

    fn draw(&mut self, _params: &RenderParameters) -> bool {
        *self.0.borrow_mut() += 1;
        true
    }
}

struct Harness {
    lens: MotionController,
    link: Rc<RefCell<LinkLog>>,
    commits: Rc<RefCell<Vec<usize>>>,
    context_gestures: Rc<RefCell<Vec<bool>>>,
    draws: Rc<RefCell<usize>>,
}

impl Harness {
    fn new(selected: Option<usize>) -> Self {
        Self::with_config(LensConfig::default(), selected)
    }

    fn with_config(config: LensConfig, selected: Option<usize>) -> Self {
        init_tracing();
        let link = Rc::new(RefCell::new(LinkLog::default()));
        let commits = Rc::new(RefCell::new(Vec::new()));
        let context_gestures = Rc::new(RefCell::new(Vec::new()));
        let draws = Rc::new(RefCell::new(0));

        let mut overlay = LensOverlay::from_config(Box::new(CountingSurface(draws.clone())), &config, 2.0);
        overlay
            .cache_mut()
            .set_capture_source(Box::new(ImageCaptureSource::new(RgbaImage::new(900, 240), 2.0)));

        let sink = commits.clone();
        let toggles = context_gestures.clone();
        let lens = MotionController::new(
            config,
            four_tabs(300.0),
            selected,
            Box::new(RecordingLink(link.clone())),
            overlay,
        )
        .with_commit_handler(move |index| sink.borrow_mut().push(index))
        .with_context_gesture_handler(move |enabled| toggles.borrow_mut().push(enabled));

        Self {
            lens,
            link,
            commits,
            context_gestures,
            draws,
        }
    }

    /// Tick at 60 Hz from `now` until the lens is idle; returns the final time
    fn run_until_idle(&mut self, mut now: f64) -> f64 {
        while self.lens.tick(now) {
            now += FRAME;
            assert!(now < 10.0, "motion never finished");
        }
        now
    }

    fn commits(&self) -> Vec<usize> {
        self.commits.borrow().clone()
    }

    fn context_gestures(&self) -> Vec<bool> {
        self.context_gestures.borrow().clone()
    }

    fn assert_no_subscription(&self) {
        assert!(self.lens.subscription().is_none());
        assert!(self.link.borrow().active.is_empty());
    }
}

fn four_tabs(width: f32) -> TabLayout {
    TabLayout::new(Rect::new(0.0, 20.0, width, 60.0), 4, 2.0)
}

fn press(phase: GesturePhase, x: f32, time: f64) -> PressEvent {
    PressEvent {
        phase,
        sample: PointerSample::new(x, 50.0, time),
    }
}

fn pan(phase: GesturePhase, x: f32, time: f64) -> PanEvent {
    PanEvent {
        phase,
        sample: PointerSample::new(x, 50.0, time),
    }
}

#[test]
fn tap_move_follows_alpha_envelope_and_lands_on_slot() {
    let mut h = Harness::new(Some(0));
    assert!(h.lens.move_to(2, 0.0));

    let mut samples: Vec<(f32, LensVisual)> = Vec::new();
    for i in 1..=40 {
        let now = i as f64 * FRAME;
        let active = h.lens.tick(now);
        samples.push(((now / 0.5) as f32, h.lens.visual()));
        if !active {
            break;
        }
    }

    // Fade in over the first 18%, hold, fade out over the last 30%
    let fade_in: Vec<f32> = samples.iter().filter(|(t, _)| *t < 0.17).map(|(_, v)| v.alpha).collect();
    assert!(fade_in.windows(2).all(|w| w[1] > w[0]));
    assert!(samples
        .iter()
        .filter(|(t, _)| *t > 0.19 && *t < 0.69)
        .all(|(_, v)| v.alpha == 1.0));
    let fade_out: Vec<f32> = samples.iter().filter(|(t, _)| *t > 0.71).map(|(_, v)| v.alpha).collect();
    assert!(fade_out.windows(2).all(|w| w[1] < w[0]));

    // Travel is monotone and deformation stays in range
    assert!(samples
        .windows(2)
        .all(|w| w[1].1.frame.mid_x() >= w[0].1.frame.mid_x() - 0.5));
    assert!(samples.iter().all(|(_, v)| v.delta.abs() <= 0.16 + 1e-6));

    let last = h.lens.visual();
    assert_eq!(last.frame, Rect::new(150.0, 20.0, 75.0, 60.0));
    assert_eq!(last.delta, 0.0);
    assert_eq!(last.alpha, 0.0);
    assert!(!h.lens.is_active());
    assert_eq!(samples.len(), 30);
    h.assert_no_subscription();
    assert!(*h.draws.borrow() > 0);
    assert!(h.commits().is_empty());
}

#[test]
fn peak_deformation_scales_with_travel() {
    let peak = |index: usize| {
        let mut h = Harness::new(Some(0));
        h.lens.move_to(index, 0.0);
        for i in 1..=15 {
            h.lens.tick(i as f64 * FRAME);
        }
        // t = 0.5 where the wobble crosses zero
        h.lens.visual().delta
    };
    let near = peak(1);
    let mid = peak(2);
    let far = peak(3);
    // speed = |dx| / 0.5s against 3 * 300 * 1.4 pt/s
    assert!((mid - 0.16 * 300.0 / 1260.0).abs() < 1e-4);
    assert!(near < mid && mid < far);
}

#[test]
fn at_most_one_subscription_across_interruptions() {
    let mut h = Harness::new(Some(0));
    h.lens.move_to(3, 0.0);
    assert_eq!(h.link.borrow().active.len(), 1);
    h.lens.tick(FRAME);
    h.lens.tick(2.0 * FRAME);

    h.lens.move_to(1, 3.0 * FRAME);
    assert_eq!(h.link.borrow().active, h.lens.subscription().into_iter().collect::<Vec<_>>());

    h.lens.begin_drag(Point::new(120.0, 50.0), 4.0 * FRAME);
    assert_eq!(h.lens.phase(), MotionPhase::Drag);
    for i in 5..12 {
        let now = i as f64 * FRAME;
        h.lens.update_drag(Point::new(120.0 + i as f32 * 6.0, 50.0), now);
        h.lens.tick(now);
        assert_eq!(h.link.borrow().active.len(), 1);
    }
    h.lens.end_drag(Point::new(190.0, 50.0), false, 12.0 * FRAME);
    assert_eq!(h.lens.phase(), MotionPhase::DragReleaseSettle);

    h.run_until_idle(13.0 * FRAME);
    let log = h.link.borrow();
    assert_eq!(log.max_active, 1);
    assert!(log.started >= 4);
    drop(log);
    h.assert_no_subscription();
}

#[test]
fn settle_starts_exactly_where_the_drag_left_off() {
    let mut h = Harness::new(Some(0));
    assert!(h.lens.begin_drag(Point::new(40.0, 50.0), 0.0));

    let mut x = 40.0;
    for i in 1..=12 {
        let now = i as f64 * FRAME;
        x += 8.0;
        h.lens.update_drag(Point::new(x, 50.0), now);
        h.lens.tick(now);
    }
    let last_drag = h.lens.visual();
    assert!(last_drag.delta > 0.0);

    h.lens.end_drag(Point::new(x, 50.0), false, 12.0 * FRAME + 0.004);
    let first_settle = h.lens.visual();

    assert_eq!(h.lens.phase(), MotionPhase::DragReleaseSettle);
    assert!(first_settle.frame.approx_eq(&last_drag.frame, 1e-3));
    assert_eq!(first_settle.alpha, last_drag.alpha);
    assert!((first_settle.delta - last_drag.delta).abs() < 1e-5);
    assert!((first_settle.brightness - last_drag.brightness).abs() < 1e-5);

    // Released over slot 1
    assert_eq!(h.commits(), vec![1]);
    h.run_until_idle(13.0 * FRAME);
    assert_eq!(h.lens.visual().frame, Rect::new(75.0, 20.0, 75.0, 60.0));
    assert_eq!(h.lens.visual().alpha, 0.0);
}

#[test]
fn press_retargeting_commits_only_the_final_slot() {
    let mut h = Harness::new(Some(0));

    h.lens.handle_press(press(GesturePhase::Began, 100.0, 0.0));
    assert_eq!(h.lens.pending_switch(), Some(1));
    h.lens.tick(FRAME);
    h.lens.handle_press(press(GesturePhase::Changed, 180.0, 0.03));
    assert_eq!(h.lens.pending_switch(), Some(2));
    h.lens.tick(0.04);
    h.lens.handle_press(press(GesturePhase::Changed, 260.0, 0.06));
    h.lens.tick(0.07);
    h.lens.handle_press(press(GesturePhase::Ended, 260.0, 0.09));

    assert_eq!(h.commits(), vec![3]);
    assert_eq!(h.lens.pending_switch(), None);

    // The host echoes the commit back; the motion continues untouched
    h.lens.notify_selection_changed(3, 0.1);
    match h.lens.state() {
        MotionState::TapMove(mv) => assert_eq!(mv.target_index, Some(3)),
        other => panic!("expected a tap move, got {other:?}"),
    }

    h.run_until_idle(0.1);
    assert_eq!(h.commits(), vec![3]);
    assert_eq!(h.lens.visual().frame, Rect::new(225.0, 20.0, 75.0, 60.0));
    h.assert_no_subscription();
}

#[test]
fn held_press_commits_when_the_move_lands_then_fades_on_release() {
    let mut h = Harness::new(Some(0));
    h.lens.handle_press(press(GesturePhase::Began, 180.0, 0.0));
    let now = h.run_until_idle(FRAME);

    assert_eq!(h.commits(), vec![2]);
    assert_eq!(h.lens.visual().alpha, 1.0);
    assert!(h.lens.is_press_holding());

    h.lens.handle_press(press(GesturePhase::Ended, 180.0, now + 0.2));
    assert_eq!(h.lens.phase(), MotionPhase::TapMove);
    h.run_until_idle(now + 0.2 + FRAME);

    assert_eq!(h.commits(), vec![2]);
    assert_eq!(h.lens.visual().alpha, 0.0);
    assert_eq!(h.lens.visual().frame, Rect::new(150.0, 20.0, 75.0, 60.0));
}

#[test]
fn pan_drag_across_slots_commits_once_and_suppresses_trailing_tap() {
    let mut h = Harness::new(Some(0));

    assert_eq!(h.lens.handle_pan(pan(GesturePhase::Began, 37.0, 0.0)), PanDecision::Ignore);
    assert_eq!(h.lens.handle_pan(pan(GesturePhase::Changed, 45.0, 0.016)), PanDecision::Ignore);
    assert_eq!(
        h.lens.handle_pan(pan(GesturePhase::Changed, 60.0, 0.033)),
        PanDecision::BeginDrag { started_on_lens: true }
    );

    for (i, x) in [110.0, 170.0, 230.0, 262.0].into_iter().enumerate() {
        let now = 0.05 + i as f64 * 0.016;
        assert_eq!(h.lens.handle_pan(pan(GesturePhase::Changed, x, now)), PanDecision::UpdateDrag);
        h.lens.tick(now);
    }
    assert!(h.commits().is_empty());

    assert_eq!(
        h.lens.handle_pan(pan(GesturePhase::Ended, 262.0, 0.11)),
        PanDecision::EndDrag { cancelled: false }
    );
    assert_eq!(h.commits(), vec![3]);

    // A tap arriving right after the release is swallowed
    h.lens.handle_press(press(GesturePhase::Began, 30.0, 0.2));
    h.lens.handle_press(press(GesturePhase::Ended, 30.0, 0.22));
    assert_eq!(h.commits(), vec![3]);
    assert_eq!(h.lens.phase(), MotionPhase::DragReleaseSettle);

    h.run_until_idle(0.23);
    assert_eq!(h.lens.visual().frame, Rect::new(225.0, 20.0, 75.0, 60.0));
}

#[test]
fn cancelled_drag_settles_back_without_committing() {
    let mut h = Harness::new(Some(0));
    h.lens.begin_drag(Point::new(37.0, 50.0), 0.0);
    for i in 1..=10 {
        let now = i as f64 * FRAME;
        h.lens.update_drag(Point::new(37.0 + i as f32 * 18.0, 50.0), now);
        h.lens.tick(now);
    }
    assert!(h.lens.visual().frame.mid_x() > 100.0);

    assert!(h.lens.end_drag(Point::new(217.0, 50.0), true, 11.0 * FRAME));
    h.run_until_idle(12.0 * FRAME);

    assert!(h.commits().is_empty());
    assert_eq!(h.lens.selected(), Some(0));
    assert_eq!(h.lens.visual().frame, Rect::new(0.0, 20.0, 75.0, 60.0));
    h.assert_no_subscription();
}

#[test]
fn drag_stays_inside_the_capsule() {
    let mut h = Harness::new(Some(0));
    h.lens.begin_drag(Point::new(37.0, 50.0), 0.0);
    for i in 1..=30 {
        let now = i as f64 * FRAME;
        h.lens.update_drag(Point::new(37.0 + i as f32 * 40.0, 50.0), now);
        h.lens.tick(now);
        let frame = h.lens.visual().frame;
        assert!(frame.min_x() >= -0.5 && frame.max_x() <= 300.5, "{frame:?}");
    }
}

#[test]
fn layout_change_retargets_a_running_move() {
    let mut h = Harness::new(Some(0));
    h.lens.move_to(2, 0.0);
    for i in 1..=6 {
        h.lens.tick(i as f64 * FRAME);
    }

    h.lens.notify_layout_changed(four_tabs(400.0), 7.0 * FRAME);
    h.run_until_idle(8.0 * FRAME);
    assert_eq!(h.lens.visual().frame, Rect::new(200.0, 20.0, 100.0, 60.0));
}

#[test]
fn layout_change_while_idle_snaps_to_selected_slot() {
    let mut h = Harness::new(Some(1));
    h.lens.notify_layout_changed(four_tabs(400.0), 0.0);
    let visual = h.lens.visual();
    assert_eq!(visual.frame, Rect::new(100.0, 20.0, 100.0, 60.0));
    assert_eq!(visual.alpha, 0.0);
    assert!(!h.lens.is_active());

    // Shrinking the slot count clamps the selection
    h.lens.notify_layout_changed(TabLayout::new(Rect::new(0.0, 20.0, 300.0, 60.0), 1, 2.0), 0.0);
    assert_eq!(h.lens.selected(), Some(0));
}

#[test]
fn host_selection_change_animates_from_previous_slot() {
    let mut h = Harness::new(Some(0));
    h.lens.notify_selection_changed(3, 0.0);

    match h.lens.state() {
        MotionState::TapMove(mv) => {
            assert_eq!(mv.from_x, 0.0);
            assert_eq!(mv.to_x, 225.0);
        }
        other => panic!("expected a tap move, got {other:?}"),
    }
    h.run_until_idle(FRAME);
    assert_eq!(h.lens.selected(), Some(3));
    assert!(h.commits().is_empty());
}

#[test]
fn tapping_the_selected_slot_bounces_in_place() {
    let mut h = Harness::new(Some(1));
    h.lens.handle_press(press(GesturePhase::Began, 110.0, 0.0));
    assert_eq!(h.lens.phase(), MotionPhase::TapMove);
    assert_eq!(h.lens.pending_switch(), None);
    h.lens.handle_press(press(GesturePhase::Ended, 110.0, 0.05));

    let mut max_delta = 0.0f32;
    let mut now = FRAME;
    while h.lens.tick(now) {
        max_delta = max_delta.max(h.lens.visual().delta.abs());
        now += FRAME;
    }
    assert!(max_delta > 0.03);
    assert!(h.commits().is_empty());
    assert_eq!(h.lens.visual().frame, Rect::new(75.0, 20.0, 75.0, 60.0));
    assert_eq!(h.lens.visual().alpha, 0.0);
}

#[test]
fn tuned_config_shortens_the_move() -> anyhow::Result<()> {
    let config = LensConfig::from_toml_str("[motion]\ntap_move_duration = 0.25\n")?;
    let mut h = Harness::with_config(config, Some(0));
    h.lens.move_to(1, 0.0);
    let end = h.run_until_idle(FRAME);
    assert!(end > 0.24 && end < 0.25 + FRAME);
    Ok(())
}

#[test]
fn host_retarget_drops_the_pending_press_switch() {
    let mut h = Harness::new(Some(0));
    h.lens.handle_press(press(GesturePhase::Began, 180.0, 0.0));
    assert_eq!(h.lens.pending_switch(), Some(2));
    h.lens.tick(FRAME);

    assert!(h.lens.move_to(3, 0.05));
    assert_eq!(h.lens.pending_switch(), None);

    h.run_until_idle(0.05 + FRAME);
    assert!(h.commits().is_empty());
    assert_eq!(h.lens.selected(), Some(0));
    assert_eq!(h.lens.visual().frame, Rect::new(225.0, 20.0, 75.0, 60.0));
}

#[test]
fn retargeting_to_the_pending_slot_keeps_the_switch() {
    let mut h = Harness::new(Some(0));
    h.lens.handle_press(press(GesturePhase::Began, 180.0, 0.0));
    h.lens.move_to(2, 0.1);
    assert_eq!(h.lens.pending_switch(), Some(2));

    h.run_until_idle(0.1 + FRAME);
    assert_eq!(h.commits(), vec![2]);
}

#[test]
fn drag_switches_slot_context_gestures_off_until_release() {
    let mut h = Harness::new(Some(0));
    h.lens.handle_pan(pan(GesturePhase::Began, 37.0, 0.0));
    assert!(h.context_gestures().is_empty());

    h.lens.handle_pan(pan(GesturePhase::Changed, 60.0, 0.02));
    assert!(h.lens.context_gestures_suppressed());
    assert_eq!(h.context_gestures(), vec![false]);

    h.lens.handle_pan(pan(GesturePhase::Changed, 120.0, 0.04));
    h.lens.tick(0.04);
    assert_eq!(h.context_gestures(), vec![false]);

    h.lens.handle_pan(pan(GesturePhase::Cancelled, 120.0, 0.06));
    assert!(!h.lens.context_gestures_suppressed());
    assert_eq!(h.context_gestures(), vec![false, true]);

    h.run_until_idle(0.07);
    assert_eq!(h.context_gestures(), vec![false, true]);
}

#[test]
fn interrupted_drag_restores_context_gestures() {
    let mut h = Harness::new(Some(0));
    h.lens.begin_drag(Point::new(37.0, 50.0), 0.0);
    assert_eq!(h.context_gestures(), vec![false]);

    h.lens.move_to(2, 0.05);
    assert_eq!(h.lens.phase(), MotionPhase::TapMove);
    assert_eq!(h.context_gestures(), vec![false, true]);
}
