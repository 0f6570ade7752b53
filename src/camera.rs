use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

/// Vertical field of view of the emblem camera, in degrees.
pub const VIEW_FOV_DEG: f32 = 45.0;
/// Largest dimension the framed mesh is scaled to.
pub const TARGET_EXTENT: f32 = 2.4;
/// Margin applied on top of the exact fit distance so the silhouette never
/// touches the viewport edge.
const FIT_MARGIN: f32 = 1.1;
/// Narrow viewports are clamped so the emblem never collapses into a sliver.
const MIN_ASPECT: f32 = 0.6;
/// Camera distance used until a mesh has been framed.
const DEFAULT_DISTANCE: f32 = 2.4;
/// Quiet period a resize must survive before the camera is refit.
pub const RESIZE_SETTLE: Duration = Duration::from_millis(300);

/// Axis-aligned bounds accumulated from interleaved vertex data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Scans `position.xyz normal.xyz` interleaved vertices. Returns `None`
    /// when there is no complete vertex to measure.
    pub fn from_interleaved(vertices: &[f32]) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for chunk in vertices.chunks_exact(6) {
            let point = Vec3::new(chunk[0], chunk[1], chunk[2]);
            bounds = Some(match bounds {
                Some(b) => Bounds {
                    min: b.min.min(point),
                    max: b.max.max(point),
                },
                None => Bounds {
                    min: point,
                    max: point,
                },
            });
        }
        bounds
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Radius of the sphere through the box corners.
    pub fn sphere_radius(&self) -> f32 {
        self.size().length() * 0.5
    }
}

/// Recenter-and-scale placement that puts a mesh at the origin with its
/// largest dimension equal to [`TARGET_EXTENT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: Vec3,
    pub scale: f32,
    /// Bounding sphere radius after scaling.
    pub radius: f32,
}

impl Placement {
    pub fn fit(bounds: &Bounds) -> Self {
        let max_dim = bounds.max_dimension();
        let scale = if max_dim > f32::EPSILON {
            TARGET_EXTENT / max_dim
        } else {
            1.0
        };
        Self {
            center: bounds.center(),
            scale,
            radius: bounds.sphere_radius() * scale,
        }
    }
}

/// Clamped width-over-height ratio of a viewport.
pub fn viewport_aspect(width: u32, height: u32) -> f32 {
    (width as f32 / height.max(1) as f32).max(MIN_ASPECT)
}

/// Distance at which a sphere of `radius` fills the view in whichever axis
/// is tighter, with the fit margin applied.
pub fn fit_distance(radius: f32, aspect: f32) -> f32 {
    let v_fov = VIEW_FOV_DEG.to_radians();
    let h_fov = 2.0 * ((v_fov / 2.0).tan() * aspect).atan();
    let distance_v = radius / (v_fov / 2.0).tan();
    let distance_h = radius / (h_fov / 2.0).tan();
    distance_v.max(distance_h) * FIT_MARGIN
}

/// Near and far planes derived from the camera distance.
pub fn clip_planes(distance: f32) -> (f32, f32) {
    ((distance / 100.0).max(0.01), distance * 100.0)
}

/// Perspective camera on the +Z axis looking at the framed emblem.
#[derive(Debug, Clone, Copy)]
pub struct EmblemCamera {
    aspect: f32,
    distance: f32,
    near: f32,
    far: f32,
    framed_radius: Option<f32>,
}

impl EmblemCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            aspect: viewport_aspect(width, height),
            distance: DEFAULT_DISTANCE,
            near: 0.1,
            far: 1000.0,
            framed_radius: None,
        }
    }

    /// Backs the camera away until the sphere fits, and remembers the radius
    /// so later viewport changes refit against it.
    pub fn frame_sphere(&mut self, radius: f32) {
        self.framed_radius = Some(radius);
        self.refit();
    }

    /// Applies a settled viewport change.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = viewport_aspect(width, height);
        self.refit();
    }

    fn refit(&mut self) {
        let Some(radius) = self.framed_radius else {
            return;
        };
        self.distance = fit_distance(radius, self.aspect);
        let (near, far) = clip_planes(self.distance);
        self.near = near;
        self.far = far;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn clip(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, self.distance), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(VIEW_FOV_DEG.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Holds resize requests until the viewport has been quiet for
/// [`RESIZE_SETTLE`], so a burst of intermediate sizes refits the camera
/// only once.
#[derive(Debug, Default)]
pub struct ResizeDebouncer {
    pending: Option<(u32, u32)>,
    apply_at: Option<Instant>,
}

impl ResizeDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new viewport size and restarts the settle timer.
    pub fn request(&mut self, width: u32, height: u32, now: Instant) {
        self.pending = Some((width, height));
        self.apply_at = Some(now + RESIZE_SETTLE);
    }

    /// Returns the latest size once the settle timer has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<(u32, u32)> {
        let apply_at = self.apply_at?;
        if now < apply_at {
            return None;
        }
        self.apply_at = None;
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn interleave(points: &[[f32; 3]]) -> Vec<f32> {
        let mut data = Vec::new();
        for p in points {
            data.extend_from_slice(&[p[0], p[1], p[2], 0.0, 0.0, 1.0]);
        }
        data
    }

    #[test]
    fn bounds_accumulate_min_and_max() {
        let data = interleave(&[[1.0, -2.0, 3.0], [-4.0, 5.0, 0.5]]);
        let bounds = Bounds::from_interleaved(&data).unwrap();
        assert_eq!(bounds.min, Vec3::new(-4.0, -2.0, 0.5));
        assert_eq!(bounds.max, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(bounds.center(), Vec3::new(-1.5, 1.5, 1.75));
    }

    #[test]
    fn bounds_of_empty_data_is_none() {
        assert!(Bounds::from_interleaved(&[]).is_none());
        // a partial vertex is not a vertex
        assert!(Bounds::from_interleaved(&[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn placement_scales_largest_dimension_to_target() {
        let data = interleave(&[[-2.0, -1.0, 0.0], [2.0, 1.0, 0.0]]);
        let bounds = Bounds::from_interleaved(&data).unwrap();
        let placement = Placement::fit(&bounds);
        assert!((placement.scale - TARGET_EXTENT / 4.0).abs() < EPS);
        let expected_radius = bounds.sphere_radius() * placement.scale;
        assert!((placement.radius - expected_radius).abs() < EPS);
    }

    #[test]
    fn degenerate_bounds_keep_unit_scale() {
        let data = interleave(&[[1.0, 1.0, 1.0]]);
        let bounds = Bounds::from_interleaved(&data).unwrap();
        let placement = Placement::fit(&bounds);
        assert_eq!(placement.scale, 1.0);
        assert_eq!(placement.radius, 0.0);
    }

    #[test]
    fn aspect_is_clamped_never_divides_by_zero() {
        assert!((viewport_aspect(1280, 720) - 1280.0 / 720.0).abs() < EPS);
        assert_eq!(viewport_aspect(300, 1000), 0.6);
        assert_eq!(viewport_aspect(100, 0), 100.0);
    }

    #[test]
    fn fit_distance_covers_both_axes() {
        let radius = 1.0;
        let half_v = (VIEW_FOV_DEG.to_radians() / 2.0).tan();
        // square viewport: both limits agree
        let square = fit_distance(radius, 1.0);
        assert!((square - radius / half_v * 1.1).abs() < 1e-4);
        // wide viewport: vertical fit dominates
        let wide = fit_distance(radius, 2.0);
        assert!((wide - radius / half_v * 1.1).abs() < 1e-4);
        // narrow viewport: horizontal fit pushes the camera further back
        let narrow = fit_distance(radius, 0.6);
        assert!(narrow > square);
    }

    #[test]
    fn clip_planes_track_distance() {
        assert_eq!(clip_planes(50.0), (0.5, 5000.0));
        // never closer than the floor
        let (near, far) = clip_planes(0.5);
        assert_eq!(near, 0.01);
        assert_eq!(far, 50.0);
    }

    #[test]
    fn camera_refits_on_viewport_change() {
        let mut camera = EmblemCamera::new(1000, 1000);
        assert_eq!(camera.distance(), DEFAULT_DISTANCE);

        camera.frame_sphere(1.0);
        let framed = camera.distance();
        assert!(framed > 1.0);

        camera.set_viewport(600, 1000);
        assert!(camera.distance() > framed, "narrower view backs off further");
        let (near, far) = camera.clip();
        assert!(near < camera.distance() && camera.distance() < far);
    }

    #[test]
    fn unframed_camera_ignores_viewport_refit() {
        let mut camera = EmblemCamera::new(1000, 1000);
        camera.set_viewport(200, 1000);
        assert_eq!(camera.distance(), DEFAULT_DISTANCE);
        assert_eq!(camera.aspect(), 0.6);
    }

    #[test]
    fn debouncer_waits_for_quiet_period() {
        let t0 = Instant::now();
        let mut debouncer = ResizeDebouncer::new();
        debouncer.request(800, 600, t0);
        assert!(debouncer.poll(t0 + Duration::from_millis(100)).is_none());
        assert_eq!(
            debouncer.poll(t0 + RESIZE_SETTLE),
            Some((800, 600))
        );
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn debouncer_restart_keeps_only_latest_size() {
        let t0 = Instant::now();
        let mut debouncer = ResizeDebouncer::new();
        debouncer.request(800, 600, t0);
        debouncer.request(1024, 768, t0 + Duration::from_millis(200));
        // first timer would have fired here, but the second request reset it
        assert!(debouncer.poll(t0 + Duration::from_millis(350)).is_none());
        assert_eq!(
            debouncer.poll(t0 + Duration::from_millis(500)),
            Some((1024, 768))
        );
    }
}
