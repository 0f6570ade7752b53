use std::time::Instant;

/// Idle rotation speed, in radians per frame.
pub const BASE_SPEED: f32 = 0.01;
/// Per-frame decay factor applied to drag momentum.
pub const MOMENTUM_DECAY: f32 = 0.92;
/// Fraction by which the eased speed relaxes toward the base each frame.
pub const SPEED_RELAXATION: f32 = 0.02;
/// Converts drag velocity in pixels per millisecond into rotation speed.
const DRAG_GAIN: f32 = 0.5;

/// Pointer-driven spin dynamics with momentum.
///
/// While a drag is active, each pointer move re-derives the momentum from
/// the instantaneous drag velocity. Every frame the momentum decays toward
/// zero and the eased speed relaxes toward [`BASE_SPEED`]; the rotation
/// applied that frame is their sum. Releasing folds the momentum into the
/// eased speed so the emblem keeps coasting before settling back to idle.
#[derive(Debug, Clone, Copy)]
pub struct SpinState {
    speed: f32,
    momentum: f32,
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    last_x: f32,
    last_at: Instant,
}

impl SpinState {
    pub fn new() -> Self {
        Self {
            speed: BASE_SPEED,
            momentum: 0.0,
            drag: None,
        }
    }

    /// Begins a drag at the given pointer position. Any previous momentum
    /// is cancelled so the emblem tracks the finger, not its own coast.
    pub fn press(&mut self, x: f32, at: Instant) {
        self.drag = Some(Drag { last_x: x, last_at: at });
        self.momentum = 0.0;
    }

    /// Re-derives the momentum from the drag velocity. Ignored when no
    /// drag is active.
    pub fn move_to(&mut self, x: f32, at: Instant) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = x - drag.last_x;
        let elapsed = at.saturating_duration_since(drag.last_at);
        let dt_ms = (elapsed.as_secs_f32() * 1_000.0).max(1.0);
        self.momentum = dx / dt_ms * DRAG_GAIN;
        drag.last_x = x;
        drag.last_at = at;
    }

    /// Ends the drag, folding the momentum into the eased speed.
    pub fn release(&mut self) {
        if self.drag.take().is_some() {
            self.speed = BASE_SPEED + self.momentum;
        }
    }

    /// Advances the dynamics one frame and returns the rotation delta to
    /// apply. Runs during drags too, so released momentum is already
    /// mid-decay when the finger lifts.
    pub fn step(&mut self) -> f32 {
        self.momentum *= MOMENTUM_DECAY;
        self.speed += (BASE_SPEED - self.speed) * SPEED_RELAXATION;
        self.speed + self.momentum
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

impl Default for SpinState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const EPS: f32 = 1e-6;

    #[test]
    fn idle_spin_holds_base_speed() {
        let mut spin = SpinState::new();
        for _ in 0..10 {
            assert!((spin.step() - BASE_SPEED).abs() < EPS);
        }
        assert!(!spin.is_dragging());
    }

    #[test]
    fn drag_velocity_sets_momentum() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(100.0, t0);
        assert!(spin.is_dragging());
        assert_eq!(spin.momentum(), 0.0);

        spin.move_to(140.0, t0 + Duration::from_millis(10));
        // 40 px over 10 ms, halved by the gain
        assert!((spin.momentum() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn zero_interval_moves_are_clamped() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(0.0, t0);
        spin.move_to(8.0, t0);
        // dt clamps to one millisecond
        assert!((spin.momentum() - 4.0).abs() < EPS);
    }

    #[test]
    fn moves_without_a_press_are_ignored() {
        let mut spin = SpinState::new();
        spin.move_to(500.0, Instant::now());
        assert_eq!(spin.momentum(), 0.0);
        assert!(!spin.is_dragging());
    }

    #[test]
    fn press_cancels_coasting_momentum() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(0.0, t0);
        spin.move_to(50.0, t0 + Duration::from_millis(5));
        spin.release();
        assert!(spin.momentum().abs() > 0.0);

        spin.press(0.0, t0 + Duration::from_millis(100));
        assert_eq!(spin.momentum(), 0.0);
    }

    #[test]
    fn release_folds_momentum_into_speed() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(0.0, t0);
        spin.move_to(30.0, t0 + Duration::from_millis(10));
        let momentum = spin.momentum();
        spin.release();
        assert!(!spin.is_dragging());
        assert!((spin.speed() - (BASE_SPEED + momentum)).abs() < EPS);
    }

    #[test]
    fn momentum_decays_toward_zero() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(0.0, t0);
        spin.move_to(-60.0, t0 + Duration::from_millis(10));
        spin.release();
        assert!(spin.momentum() < 0.0);

        let mut previous = spin.momentum().abs();
        for _ in 0..100 {
            spin.step();
            let current = spin.momentum().abs();
            assert!(current < previous || current == 0.0);
            assert!(spin.momentum() <= 0.0, "decay must not change sign");
            previous = current;
        }
        assert!(previous < 1e-3);
    }

    #[test]
    fn speed_relaxes_back_to_base_after_release() {
        let t0 = Instant::now();
        let mut spin = SpinState::new();
        spin.press(0.0, t0);
        spin.move_to(200.0, t0 + Duration::from_millis(10));
        spin.release();
        assert!(spin.speed() > BASE_SPEED);

        for _ in 0..600 {
            spin.step();
        }
        assert!((spin.speed() - BASE_SPEED).abs() < 1e-4);
    }
}
