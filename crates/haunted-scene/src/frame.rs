//! The per-tick frame updater and its run-until-cancelled driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tracing::debug;

use crate::camera::Camera;
use crate::flicker::Flicker;
use crate::ghost::GhostOrbit;
use crate::graph::{NodeId, Scene};
use crate::timer::FrameClock;

/// A point light node driven along a ghost orbit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostLight {
    pub node: NodeId,
    pub orbit: GhostOrbit,
}

/// Everything a tick reads or writes.
#[derive(Clone, Debug)]
pub struct SceneState {
    pub scene: Scene,
    pub camera: Camera,
    pub ghosts: Vec<GhostLight>,
    pub door_light: NodeId,
    pub flicker: Flicker,
    /// Time of the last animation step, in seconds.
    pub elapsed: f64,
}

impl SceneState {
    /// Move the ghosts to their positions at `t` and flicker the door light.
    pub fn animate<R: Rng + ?Sized>(&mut self, t: f64, rng: &mut R) {
        self.elapsed = t;
        for ghost in &self.ghosts {
            self.scene.set_position(ghost.node, ghost.orbit.position(t));
        }
        let flicker = self.flicker;
        if let Some(light) = self.scene.point_light_mut(self.door_light) {
            light.intensity = flicker.step(light.intensity, rng);
        }
    }

    pub fn door_intensity(&self) -> f32 {
        self.scene
            .point_light(self.door_light)
            .map_or(0.0, |light| light.intensity)
    }
}

/// Interactive camera movement, stepped once per tick.
pub trait CameraControls {
    fn update(&mut self, camera: &mut Camera);
}

/// The presentation side of the loop.
pub trait FrameHost {
    /// Draw the scene. Failures are handled and logged by the host.
    fn render(&mut self, state: &SceneState);

    /// Ask for another tick on the next display refresh.
    fn request_next_tick(&mut self);
}

/// Shared flag that stops the frame loop.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs one animation step per display tick.
pub struct FrameUpdater<C, R> {
    clock: C,
    rng: R,
    ticks: u64,
    log_interval: u64,
}

impl<C: FrameClock, R: Rng> FrameUpdater<C, R> {
    pub fn new(clock: C, rng: R) -> Self {
        Self {
            clock,
            rng,
            ticks: 0,
            log_interval: 0,
        }
    }

    /// Emit a debug line every `interval` ticks. Zero disables it.
    pub fn with_log_interval(mut self, interval: u64) -> Self {
        self.log_interval = interval;
        self
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Swap in a fresh clock so elapsed time restarts from zero. The tick
    /// count and the random source carry on.
    pub fn restart_clock(&mut self, clock: C) {
        self.clock = clock;
    }

    /// Advance time, animate, step the controls, render, then request the
    /// next tick. Returns the elapsed time used.
    pub fn tick(
        &mut self,
        state: &mut SceneState,
        controls: &mut impl CameraControls,
        host: &mut impl FrameHost,
    ) -> f64 {
        let t = self.clock.advance();
        state.animate(t, &mut self.rng);
        controls.update(&mut state.camera);
        host.render(state);
        host.request_next_tick();
        self.ticks += 1;

        if self.log_interval > 0 && self.ticks % self.log_interval == 0 {
            debug!(
                ticks = self.ticks,
                elapsed = t,
                door_intensity = state.door_intensity(),
                "frame"
            );
        }
        t
    }

    /// Run a tick unless `token` has been cancelled.
    pub fn tick_unless_cancelled(
        &mut self,
        token: &ShutdownToken,
        state: &mut SceneState,
        controls: &mut impl CameraControls,
        host: &mut impl FrameHost,
    ) -> Option<f64> {
        if token.is_cancelled() {
            return None;
        }
        Some(self.tick(state, controls, host))
    }
}

/// Tick back to back until `token` is cancelled. Returns the total tick count.
///
/// The token is checked before every tick, so a token cancelled up front
/// runs nothing.
pub fn run_until_cancelled<C: FrameClock, R: Rng>(
    updater: &mut FrameUpdater<C, R>,
    state: &mut SceneState,
    controls: &mut impl CameraControls,
    host: &mut impl FrameHost,
    token: &ShutdownToken,
) -> u64 {
    while updater
        .tick_unless_cancelled(token, state, controls, host)
        .is_some()
    {}
    debug!(ticks = updater.ticks(), "frame loop stopped");
    updater.ticks()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;
    use haunted_lighting::{AmbientLight, Color, DirectionalLight, PointLight};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::flicker::FLICKER_RESET_INTENSITY;
    use crate::ghost::{GHOST_ORBITS, ghost_positions};
    use crate::timer::ManualClock;

    fn test_state() -> SceneState {
        let mut scene = Scene::new(
            AmbientLight::new(Color::WHITE, 0.5),
            DirectionalLight::new(Color::WHITE, 1.0, Vec3::Y),
        );
        let ghosts = GHOST_ORBITS
            .iter()
            .enumerate()
            .map(|(i, orbit)| GhostLight {
                node: scene.add_point_light(
                    format!("ghost{}", i + 1),
                    Vec3::ZERO,
                    None,
                    PointLight::new(Color::WHITE, 2.0),
                ),
                orbit: *orbit,
            })
            .collect();
        let door_light = scene.add_point_light(
            "door_light",
            Vec3::new(0.0, 2.2, 2.5),
            None,
            PointLight::new(Color::WHITE, FLICKER_RESET_INTENSITY),
        );
        SceneState {
            scene,
            camera: Camera::default(),
            ghosts,
            door_light,
            flicker: Flicker::default(),
            elapsed: 0.0,
        }
    }

    /// Always yields zero.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    /// Shared call log so ordering across controls and host is visible.
    type CallLog = Rc<RefCell<Vec<&'static str>>>;

    struct RecordingControls {
        log: CallLog,
    }

    impl CameraControls for RecordingControls {
        fn update(&mut self, _camera: &mut Camera) {
            self.log.borrow_mut().push("controls");
        }
    }

    struct RecordingHost {
        log: CallLog,
        door_intensities: Vec<f32>,
        ghost_positions: Vec<Vec3>,
        cancel_after: Option<(usize, ShutdownToken)>,
    }

    impl RecordingHost {
        fn new(log: CallLog) -> Self {
            Self {
                log,
                door_intensities: Vec::new(),
                ghost_positions: Vec::new(),
                cancel_after: None,
            }
        }
    }

    impl FrameHost for RecordingHost {
        fn render(&mut self, state: &SceneState) {
            self.log.borrow_mut().push("render");
            self.door_intensities.push(state.door_intensity());
            self.ghost_positions
                .push(state.scene.world_position(state.ghosts[0].node));
            if let Some((limit, token)) = &self.cancel_after
                && self.door_intensities.len() >= *limit
            {
                token.cancel();
            }
        }

        fn request_next_tick(&mut self) {
            self.log.borrow_mut().push("request");
        }
    }

    #[test]
    fn test_tick_order() {
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log.clone());
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.1), ChaCha8Rng::seed_from_u64(0));

        updater.tick(&mut state, &mut controls, &mut host);
        updater.tick(&mut state, &mut controls, &mut host);

        assert_eq!(
            *log.borrow(),
            ["controls", "render", "request", "controls", "render", "request"]
        );
        assert_eq!(updater.ticks(), 2);
    }

    #[test]
    fn test_restart_clock_resets_elapsed_time() {
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log);
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.5), ChaCha8Rng::seed_from_u64(0));

        updater.tick(&mut state, &mut controls, &mut host);
        updater.tick(&mut state, &mut controls, &mut host);
        updater.restart_clock(ManualClock::new(0.5));

        assert_eq!(updater.tick(&mut state, &mut controls, &mut host), 0.5);
        assert_eq!(updater.ticks(), 3);
    }

    #[test]
    fn test_ghosts_follow_elapsed_time() {
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log);
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.25), ChaCha8Rng::seed_from_u64(0));

        for _ in 0..8 {
            updater.tick(&mut state, &mut controls, &mut host);
        }

        assert_eq!(state.elapsed, 2.0);
        let expected = ghost_positions(2.0);
        for (ghost, position) in state.ghosts.iter().zip(expected) {
            assert_eq!(state.scene.world_position(ghost.node), position);
        }
    }

    #[test]
    fn test_flicker_uses_injected_rng() {
        // A zero-valued source never decrements.
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log);
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.016), ZeroRng);

        for _ in 0..5 {
            updater.tick(&mut state, &mut controls, &mut host);
        }
        assert_eq!(host.door_intensities, vec![FLICKER_RESET_INTENSITY; 5]);
    }

    #[test]
    fn test_rendered_intensity_never_negative() {
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log);
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.016), ChaCha8Rng::seed_from_u64(99));

        for _ in 0..500 {
            updater.tick(&mut state, &mut controls, &mut host);
        }
        assert!(
            host.door_intensities
                .iter()
                .all(|&i| (0.0..=FLICKER_RESET_INTENSITY).contains(&i))
        );
    }

    #[test]
    fn test_run_until_cancelled_stops() {
        let log = CallLog::default();
        let token = ShutdownToken::new();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log.clone());
        host.cancel_after = Some((7, token.clone()));
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.1), ChaCha8Rng::seed_from_u64(1));

        let ticks = run_until_cancelled(&mut updater, &mut state, &mut controls, &mut host, &token);

        assert_eq!(ticks, 7);
        let log = log.borrow();
        assert_eq!(log.iter().filter(|&&c| c == "render").count(), 7);
        assert_eq!(log.iter().filter(|&&c| c == "request").count(), 7);
    }

    #[test]
    fn test_cancelled_token_runs_nothing() {
        let log = CallLog::default();
        let token = ShutdownToken::new();
        token.cancel();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log.clone());
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.1), ChaCha8Rng::seed_from_u64(1));

        assert_eq!(
            run_until_cancelled(&mut updater, &mut state, &mut controls, &mut host, &token),
            0
        );
        assert!(log.borrow().is_empty());
        assert_eq!(updater.clock().elapsed(), 0.0);
    }

    #[test]
    fn test_token_clones_share_state() {
        let token = ShutdownToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_door_light_that_is_not_a_light() {
        let mut state = test_state();
        state.door_light = state
            .scene
            .add_group("not_a_light", crate::graph::Transform::IDENTITY, None);
        assert_eq!(state.door_intensity(), 0.0);
        state.animate(1.0, &mut ChaCha8Rng::seed_from_u64(0));
        assert_eq!(state.door_intensity(), 0.0);
    }

    #[test]
    fn test_recorded_ghost_path_is_on_orbit() {
        let log = CallLog::default();
        let mut controls = RecordingControls { log: log.clone() };
        let mut host = RecordingHost::new(log);
        let mut state = test_state();
        let mut updater = FrameUpdater::new(ManualClock::new(0.3), ChaCha8Rng::seed_from_u64(5));
        for _ in 0..20 {
            updater.tick(&mut state, &mut controls, &mut host);
        }
        for p in host.ghost_positions {
            let distance = (p.x * p.x + p.z * p.z).sqrt();
            assert!((distance - 4.0).abs() < 1e-4);
        }
    }
}
