use std::f32::consts::PI;
use std::fmt;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Platinum tint shared by every layer (`0xE5E4E2`).
pub const PLATINUM: Vec3 = Vec3::new(229.0 / 255.0, 228.0 / 255.0, 226.0 / 255.0);
/// Time added to the twinkle clock each frame.
pub const TWINKLE_STEP: f32 = 0.016;
/// Viewports narrower than this use the compact density profile.
pub const COMPACT_WIDTH: u32 = 768;
/// Side length of the generated point sprite, in pixels.
pub const SPRITE_SIZE: u32 = 64;

/// Radius of the sprite's bright core, in pixels.
const SPRITE_CORE_RADIUS: f32 = 18.0;
/// Radial falloff stops of the sprite: (distance fraction, alpha). The
/// steep early drop gives a hard bright core with a faint halo.
const SPRITE_STOPS: [(f32, f32); 4] = [(0.0, 1.0), (0.06, 0.98), (0.12, 0.20), (1.0, 0.0)];

/// Particle density profile, selected from the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityProfile {
    Full,
    Compact,
}

impl DensityProfile {
    pub fn for_width(width: u32) -> Self {
        if width < COMPACT_WIDTH {
            Self::Compact
        } else {
            Self::Full
        }
    }
}

impl fmt::Display for DensityProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DensityProfile::Full => "full",
            DensityProfile::Compact => "compact",
        })
    }
}

/// The four spiral layers, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerKind {
    Fine,
    Mid,
    SparkA,
    SparkB,
}

/// Periodic brightness pulse of a spark layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Twinkle {
    pub rate: f32,
    pub wave: Wave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wave {
    Sine,
    Cosine,
}

impl Twinkle {
    /// Normalized pulse in `[0, 1]` at twinkle clock `t`.
    pub fn pulse(&self, t: f32) -> f32 {
        let phase = t * self.rate;
        let wave = match self.wave {
            Wave::Sine => phase.sin(),
            Wave::Cosine => phase.cos(),
        };
        0.5 + 0.5 * wave
    }

    /// Opacity of a twinkling layer at pulse `tw`.
    pub fn opacity(tw: f32) -> f32 {
        0.45 + 0.35 * tw
    }

    /// Size multiplier of a twinkling layer at pulse `tw`.
    pub fn size_scale(tw: f32) -> f32 {
        1.0 + 0.35 * tw
    }
}

/// Static parameters of one particle layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerParams {
    pub kind: LayerKind,
    pub count: usize,
    pub point_size: f32,
    pub opacity: f32,
    pub spread_z: f32,
    pub arm_count: u32,
    pub alpha_test: f32,
    pub tilt_x: f32,
    pub spin_rate: f32,
    pub twinkle: Option<Twinkle>,
}

impl LayerParams {
    /// The showcase's layer stack for a density profile, in draw order.
    pub fn showcase_layers(profile: DensityProfile) -> [LayerParams; 4] {
        let compact = profile == DensityProfile::Compact;
        [
            LayerParams {
                kind: LayerKind::Fine,
                count: if compact { 2400 } else { 4200 },
                point_size: if compact { 0.6 } else { 0.7 },
                opacity: 0.30,
                spread_z: 12.0,
                arm_count: 10,
                alpha_test: 0.5,
                tilt_x: -0.28,
                spin_rate: 0.0008,
                twinkle: None,
            },
            LayerParams {
                kind: LayerKind::Mid,
                count: if compact { 900 } else { 1500 },
                point_size: if compact { 0.9 } else { 1.1 },
                opacity: 0.48,
                spread_z: 14.0,
                arm_count: 8,
                alpha_test: 0.45,
                tilt_x: -0.26,
                spin_rate: 0.0011,
                twinkle: None,
            },
            LayerParams {
                kind: LayerKind::SparkA,
                count: if compact { 200 } else { 320 },
                point_size: if compact { 1.2 } else { 1.5 },
                opacity: 0.62,
                spread_z: 16.0,
                arm_count: 7,
                alpha_test: 0.4,
                tilt_x: -0.24,
                spin_rate: 0.0016,
                twinkle: Some(Twinkle {
                    rate: 2.2,
                    wave: Wave::Sine,
                }),
            },
            LayerParams {
                kind: LayerKind::SparkB,
                count: if compact { 200 } else { 320 },
                point_size: if compact { 1.2 } else { 1.5 },
                opacity: 0.62,
                spread_z: 16.0,
                arm_count: 9,
                alpha_test: 0.4,
                tilt_x: -0.24,
                spin_rate: -0.0014,
                twinkle: Some(Twinkle {
                    rate: 1.8,
                    wave: Wave::Cosine,
                }),
            },
        ]
    }
}

/// Generated point cloud for one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

/// Deterministic part of a particle's placement: the spiral angle and
/// radius before jitter. Arm banding comes from the quantized offset.
pub fn spiral_point(index: usize, count: usize, arm_count: u32) -> (f32, f32) {
    let t = index as f32 / count.max(1) as f32;
    let angle = t * 8.0 * PI + ((t * arm_count as f32).floor() / arm_count as f32) * 1.1;
    let radius = 4.0 + 30.0 * t.powf(0.92);
    (angle, radius)
}

/// Scatters one layer along the spiral, jittered by `rng`.
pub fn spawn_cloud(params: &LayerParams, rng: &mut StdRng) -> Cloud {
    let mut positions = Vec::with_capacity(params.count);
    let mut colors = Vec::with_capacity(params.count);
    for index in 0..params.count {
        let (angle, base_radius) = spiral_point(index, params.count, params.arm_count);
        let radius = base_radius + (rng.gen::<f32>() - 0.5) * 1.8;
        let x = angle.cos() * radius + (rng.gen::<f32>() - 0.5) * 0.8;
        // the spiral plane is squashed to look like a disc seen at an angle
        let y = angle.sin() * radius * 0.5 + (rng.gen::<f32>() - 0.5) * 0.8;
        let z = (rng.gen::<f32>() - 0.5) * params.spread_z;
        positions.push(Vec3::new(x, y, z));
        colors.push(PLATINUM * (0.85 + rng.gen::<f32>() * 0.25));
    }
    Cloud { positions, colors }
}

/// Renders the shared point sprite as straight-alpha RGBA8 pixels: a white
/// core whose alpha follows [`SPRITE_STOPS`].
pub fn sprite_pixels() -> Vec<u8> {
    let mut pixels = vec![0u8; (SPRITE_SIZE * SPRITE_SIZE * 4) as usize];
    let center = SPRITE_SIZE as f32 / 2.0;
    for y in 0..SPRITE_SIZE {
        for x in 0..SPRITE_SIZE {
            let dx = x as f32 + 0.5 - center;
            let dy = y as f32 + 0.5 - center;
            let fraction = (dx * dx + dy * dy).sqrt() / SPRITE_CORE_RADIUS;
            let alpha = (gradient_alpha(fraction) * 255.0).round() as u8;
            let offset = ((y * SPRITE_SIZE + x) * 4) as usize;
            pixels[offset] = 255;
            pixels[offset + 1] = 255;
            pixels[offset + 2] = 255;
            pixels[offset + 3] = alpha;
        }
    }
    pixels
}

fn gradient_alpha(fraction: f32) -> f32 {
    if fraction >= 1.0 {
        return 0.0;
    }
    let mut previous = SPRITE_STOPS[0];
    for stop in SPRITE_STOPS.iter().skip(1) {
        if fraction <= stop.0 {
            let span = stop.0 - previous.0;
            let blend = if span > 0.0 {
                (fraction - previous.0) / span
            } else {
                0.0
            };
            return previous.1 + (stop.1 - previous.1) * blend;
        }
        previous = *stop;
    }
    0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn profile_follows_viewport_width() {
        assert_eq!(DensityProfile::for_width(767), DensityProfile::Compact);
        assert_eq!(DensityProfile::for_width(768), DensityProfile::Full);
        assert_eq!(DensityProfile::for_width(1920), DensityProfile::Full);
    }

    #[test]
    fn layer_counts_match_profiles() {
        let full: Vec<usize> = LayerParams::showcase_layers(DensityProfile::Full)
            .iter()
            .map(|layer| layer.count)
            .collect();
        assert_eq!(full, vec![4200, 1500, 320, 320]);

        let compact: Vec<usize> = LayerParams::showcase_layers(DensityProfile::Compact)
            .iter()
            .map(|layer| layer.count)
            .collect();
        assert_eq!(compact, vec![2400, 900, 200, 200]);
    }

    #[test]
    fn only_spark_layers_twinkle() {
        let layers = LayerParams::showcase_layers(DensityProfile::Full);
        assert!(layers[0].twinkle.is_none());
        assert!(layers[1].twinkle.is_none());
        assert!(layers[2].twinkle.is_some());
        assert!(layers[3].twinkle.is_some());
        // the two spark layers counter-rotate
        assert!(layers[2].spin_rate > 0.0 && layers[3].spin_rate < 0.0);
    }

    #[test]
    fn spiral_radius_grows_outward() {
        let count = 1000;
        let mut previous = 0.0;
        for index in 0..count {
            let (_, radius) = spiral_point(index, count, 8);
            assert!(radius >= previous);
            previous = radius;
        }
        let (_, innermost) = spiral_point(0, count, 8);
        assert_eq!(innermost, 4.0);
    }

    #[test]
    fn cloud_generation_is_deterministic_per_seed() {
        let params = LayerParams::showcase_layers(DensityProfile::Compact)[2];
        let a = spawn_cloud(&params, &mut StdRng::seed_from_u64(9));
        let b = spawn_cloud(&params, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);

        let c = spawn_cloud(&params, &mut StdRng::seed_from_u64(10));
        assert_ne!(a, c);
    }

    #[test]
    fn cloud_respects_layer_bounds() {
        let params = LayerParams::showcase_layers(DensityProfile::Full)[0];
        let cloud = spawn_cloud(&params, &mut StdRng::seed_from_u64(1));
        assert_eq!(cloud.positions.len(), params.count);
        assert_eq!(cloud.colors.len(), params.count);
        for position in &cloud.positions {
            assert!(position.z.abs() <= params.spread_z / 2.0);
        }
        for color in &cloud.colors {
            // brightness jitter stays within [0.85, 1.10] of the base tint
            assert!(color.x >= PLATINUM.x * 0.85 && color.x <= PLATINUM.x * 1.1 + 1e-5);
        }
    }

    #[test]
    fn twinkle_pulse_and_ramps() {
        let twinkle = Twinkle {
            rate: 2.2,
            wave: Wave::Sine,
        };
        for step in 0..500 {
            let pulse = twinkle.pulse(step as f32 * TWINKLE_STEP);
            assert!((0.0..=1.0).contains(&pulse));
        }
        assert_eq!(Twinkle::opacity(0.0), 0.45);
        assert_eq!(Twinkle::opacity(1.0), 0.8);
        assert_eq!(Twinkle::size_scale(0.0), 1.0);
        assert_eq!(Twinkle::size_scale(1.0), 1.35);
    }

    #[test]
    fn sprite_has_bright_core_and_transparent_rim() {
        let pixels = sprite_pixels();
        assert_eq!(pixels.len(), (SPRITE_SIZE * SPRITE_SIZE * 4) as usize);

        let alpha_at = |x: u32, y: u32| pixels[((y * SPRITE_SIZE + x) * 4 + 3) as usize];
        // pixel centers sit half a texel off the true middle
        assert!(alpha_at(32, 32) >= 250);
        assert_eq!(alpha_at(0, 0), 0);
        assert_eq!(alpha_at(63, 63), 0);

        // alpha falls off monotonically along the central row
        let mut previous = alpha_at(32, 32);
        for x in 33..SPRITE_SIZE {
            let current = alpha_at(x, 32);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        assert_eq!(gradient_alpha(0.0), 1.0);
        assert!((gradient_alpha(0.06) - 0.98).abs() < 1e-6);
        assert!((gradient_alpha(0.12) - 0.20).abs() < 1e-6);
        // halfway through the halo
        let mid = gradient_alpha(0.56);
        assert!(mid > 0.0 && mid < 0.20);
        assert_eq!(gradient_alpha(1.0), 0.0);
        assert_eq!(gradient_alpha(2.0), 0.0);
    }
}
