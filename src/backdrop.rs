use glam::{Mat4, Vec3};
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::lifecycle::Phase;
use crate::particles::{spawn_cloud, Cloud, DensityProfile, LayerParams, Twinkle, TWINKLE_STEP};

/// Field of view of the backdrop camera, in degrees.
pub const BACKDROP_FOV_DEG: f32 = 42.0;
/// Distance of the backdrop camera from the spiral plane.
pub const BACKDROP_CAMERA_Z: f32 = 22.0;

/// View and projection for the backdrop. Unlike the emblem camera this one
/// uses the raw aspect; the spiral fills whatever viewport it gets.
pub fn backdrop_view_proj(width: u32, height: u32) -> (Mat4, Mat4) {
    let aspect = width as f32 / height.max(1) as f32;
    let view = Mat4::look_at_rh(
        Vec3::new(0.0, 0.0, BACKDROP_CAMERA_Z),
        Vec3::ZERO,
        Vec3::Y,
    );
    let proj = Mat4::perspective_rh(BACKDROP_FOV_DEG.to_radians(), aspect, 0.1, 1000.0);
    (view, proj)
}

/// One particle layer: an immutable cloud plus its animated orientation.
#[derive(Debug, Clone)]
pub struct Layer {
    pub params: LayerParams,
    pub cloud: Cloud,
    spin_z: f32,
}

impl Layer {
    /// Display state for the current twinkle clock.
    pub fn frame(&self, clock: f32) -> LayerFrame {
        let (opacity, size_scale) = match self.params.twinkle {
            Some(twinkle) => {
                let pulse = twinkle.pulse(clock);
                (Twinkle::opacity(pulse), Twinkle::size_scale(pulse))
            }
            None => (self.params.opacity, 1.0),
        };
        LayerFrame {
            opacity,
            point_size: self.params.point_size * size_scale,
            alpha_test: self.params.alpha_test,
            tilt_x: self.params.tilt_x,
            spin_z: self.spin_z,
        }
    }

    pub fn spin_z(&self) -> f32 {
        self.spin_z
    }
}

/// Per-frame display state of one layer, resolved for the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFrame {
    pub opacity: f32,
    pub point_size: f32,
    pub alpha_test: f32,
    pub tilt_x: f32,
    pub spin_z: f32,
}

impl LayerFrame {
    /// Orientation matrix: the accumulated roll, seen through a fixed tilt.
    pub fn orientation(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt_x) * Mat4::from_rotation_z(self.spin_z)
    }
}

/// Decorative spiral particle field behind the emblem.
///
/// Construction generates every layer synchronously; the field counts as
/// ready once its first frame has actually been presented, which is what
/// the reveal fade keys off.
pub struct ParticleField {
    phase: Phase,
    profile: DensityProfile,
    layers: Vec<Layer>,
    clock: f32,
    frames_rendered: u64,
}

impl ParticleField {
    /// Generates the four layers for a density profile. The seed fixes the
    /// jitter, so equal seeds produce identical fields.
    pub fn new(profile: DensityProfile, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let layers = LayerParams::showcase_layers(profile)
            .into_iter()
            .map(|params| Layer {
                cloud: spawn_cloud(&params, &mut rng),
                params,
                spin_z: 0.0,
            })
            .collect();
        let mut phase = Phase::Uninitialized;
        phase.advance(Phase::Loading);
        Self {
            phase,
            profile,
            layers,
            clock: 0.0,
            frames_rendered: 0,
        }
    }

    /// Advances the roll and twinkle clocks one frame.
    pub fn advance(&mut self) {
        if self.phase.is_disposed() {
            return;
        }
        self.clock += TWINKLE_STEP;
        for layer in &mut self.layers {
            layer.spin_z += layer.params.spin_rate;
        }
    }

    /// Marks a presented frame. The first one moves the field to `Ready`.
    pub fn mark_rendered(&mut self) {
        if self.phase.is_disposed() {
            return;
        }
        self.frames_rendered += 1;
        if self.frames_rendered == 1 {
            self.phase.advance(Phase::Ready);
            debug!("backdrop presented its first frame");
        }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_frames(&self) -> Vec<LayerFrame> {
        self.layers
            .iter()
            .map(|layer| layer.frame(self.clock))
            .collect()
    }

    pub fn total_points(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.cloud.positions.len())
            .sum()
    }

    pub fn profile(&self) -> DensityProfile {
        self.profile
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    /// Drops the generated clouds. Terminal.
    pub fn dispose(&mut self) {
        if !self.phase.advance(Phase::Disposed) {
            return;
        }
        self.layers.clear();
    }
}
