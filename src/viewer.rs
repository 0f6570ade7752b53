use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::{Mat4, Vec3};
use log::{error, info};

use crate::assets::ShowcaseAssets;
use crate::camera::{Bounds, EmblemCamera, Placement, ResizeDebouncer};
use crate::lifecycle::{Loader, Phase};
use crate::obj::{decode_obj, MeshData};
use crate::spin::SpinState;

/// Mesh prepared for display: decoded, measured, and framed.
#[derive(Debug, Clone, PartialEq)]
pub struct FramedMesh {
    pub mesh: MeshData,
    pub placement: Placement,
    /// Asset name the mesh was decoded from.
    pub source: String,
}

/// Interactive emblem viewer. Owns the mesh lifecycle, the auto-framing
/// camera, and the pointer-driven spin.
///
/// Loading happens on a worker thread; the viewer stays in `Loading` until
/// the mesh lands. A failed load is terminal for the mesh but not for the
/// viewer: the camera and spin keep running so the rest of the page is
/// unaffected.
pub struct ModelViewer {
    phase: Phase,
    loader: Option<Loader<FramedMesh>>,
    framed: Option<FramedMesh>,
    camera: EmblemCamera,
    spin: SpinState,
    angle: f32,
    resize: ResizeDebouncer,
    load_failed: bool,
}

impl ModelViewer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            phase: Phase::Uninitialized,
            loader: None,
            framed: None,
            camera: EmblemCamera::new(width, height),
            spin: SpinState::new(),
            angle: 0.0,
            resize: ResizeDebouncer::new(),
            load_failed: false,
        }
    }

    /// Starts decoding the emblem mesh on a worker thread. Does nothing if
    /// loading already started or the viewer is disposed.
    pub fn begin_loading(&mut self, assets: &ShowcaseAssets) {
        if !self.phase.advance(Phase::Loading) {
            return;
        }
        let assets = assets.clone();
        self.loader = Some(Loader::spawn("emblem", move || load_emblem(&assets)));
    }

    /// Advances one frame: folds in a finished load, applies settled
    /// resizes, and steps the spin dynamics.
    pub fn advance(&mut self, now: Instant) {
        if self.phase.is_disposed() {
            return;
        }
        self.poll_load();
        if let Some((width, height)) = self.resize.poll(now) {
            self.camera.set_viewport(width, height);
        }
        let delta = self.spin.step();
        if self.framed.is_some() {
            self.angle += delta;
        }
    }

    /// Blocks until the load finishes. Headless runs use this instead of
    /// polling from a frame loop.
    pub fn await_load(&mut self) {
        let Some(mut loader) = self.loader.take() else {
            return;
        };
        let result = loader.wait();
        self.finish_load(result);
    }

    fn poll_load(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        let Some(result) = loader.poll() else {
            return;
        };
        self.loader = None;
        self.finish_load(result);
    }

    fn finish_load(&mut self, result: Result<FramedMesh>) {
        match result {
            Ok(framed) => {
                info!(
                    "emblem {}: {} triangles, sphere radius {:.3}",
                    framed.source,
                    framed.mesh.triangle_count(),
                    framed.placement.radius
                );
                self.camera.frame_sphere(framed.placement.radius);
                self.framed = Some(framed);
                self.phase.advance(Phase::Ready);
            }
            Err(err) => {
                // the page keeps running without its emblem
                error!("emblem load failed: {err:?}");
                self.load_failed = true;
            }
        }
    }

    /// Records a viewport change, applied to the camera once the size has
    /// settled. The render surface should resize immediately regardless.
    pub fn viewport_changed(&mut self, width: u32, height: u32, now: Instant) {
        self.resize.request(width, height, now);
    }

    pub fn pointer_down(&mut self, x: f32, at: Instant) {
        if self.phase.is_disposed() {
            return;
        }
        self.spin.press(x, at);
    }

    pub fn pointer_move(&mut self, x: f32, at: Instant) {
        self.spin.move_to(x, at);
    }

    pub fn pointer_up(&mut self) {
        self.spin.release();
    }

    /// Model matrix that spins the emblem in place: recenter, scale to the
    /// target extent, then rotate about the vertical axis.
    pub fn model_matrix(&self) -> Option<Mat4> {
        let placement = self.framed.as_ref()?.placement;
        Some(
            Mat4::from_rotation_y(self.angle)
                * Mat4::from_scale(Vec3::splat(placement.scale))
                * Mat4::from_translation(-placement.center),
        )
    }

    pub fn camera(&self) -> &EmblemCamera {
        &self.camera
    }

    pub fn framed(&self) -> Option<&FramedMesh> {
        self.framed.as_ref()
    }

    pub fn spin(&self) -> &SpinState {
        &self.spin
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    /// Releases the mesh and detaches any in-flight load so a late result
    /// is dropped. Terminal.
    pub fn dispose(&mut self) {
        if !self.phase.advance(Phase::Disposed) {
            return;
        }
        if let Some(mut loader) = self.loader.take() {
            loader.abandon();
        }
        self.framed = None;
    }
}

fn load_emblem(assets: &ShowcaseAssets) -> Result<FramedMesh> {
    let name = assets
        .emblem_mesh()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("showcase has no .obj mesh"))?;
    let text = assets
        .read_text(&name)
        .with_context(|| format!("unable to read emblem {name}"))?;
    let mesh = decode_obj(&text).with_context(|| format!("failed to decode {name}"))?;
    let bounds = Bounds::from_interleaved(&mesh.vertices)
        .ok_or_else(|| anyhow!("{name} has no vertices to frame"))?;
    let placement = Placement::fit(&bounds);
    Ok(FramedMesh {
        mesh,
        placement,
        source: name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spin::BASE_SPEED;
    use std::time::Duration;

    const SQUARE_OBJ: &str = "\
v 1 -1 0
v 3 -1 0
v 3 1 0
v 1 1 0
f 1 2 3 4
";

    fn square_assets() -> ShowcaseAssets {
        ShowcaseAssets::from_entries(
            "viewer-test",
            vec![("emblem.obj".to_string(), SQUARE_OBJ.as_bytes().to_vec())],
        )
    }

    fn loaded_viewer() -> ModelViewer {
        let mut viewer = ModelViewer::new(1000, 1000);
        viewer.begin_loading(&square_assets());
        viewer.await_load();
        viewer
    }

    #[test]
    fn load_frames_mesh_and_camera() {
        let viewer = loaded_viewer();
        assert!(viewer.is_ready());
        assert!(!viewer.load_failed());

        let framed = viewer.framed().unwrap();
        assert_eq!(framed.source, "emblem.obj");
        assert_eq!(framed.mesh.triangle_count(), 2);
        // 2x2 square scaled so its largest dimension hits the target extent
        assert!((framed.placement.scale - 1.2).abs() < 1e-5);
        assert!(viewer.camera().distance() > framed.placement.radius);
    }

    #[test]
    fn missing_mesh_fails_softly() {
        let empty = ShowcaseAssets::from_entries("bare", Vec::new());
        let mut viewer = ModelViewer::new(800, 600);
        viewer.begin_loading(&empty);
        viewer.await_load();

        assert!(viewer.load_failed());
        assert!(viewer.framed().is_none());
        assert_eq!(viewer.phase(), Phase::Loading);

        // the viewer still animates and resizes
        viewer.advance(Instant::now());
        assert!(viewer.model_matrix().is_none());
    }

    #[test]
    fn angle_accumulates_only_with_a_mesh() {
        let mut empty_viewer = ModelViewer::new(800, 600);
        empty_viewer.begin_loading(&ShowcaseAssets::from_entries("bare", Vec::new()));
        empty_viewer.await_load();
        let now = Instant::now();
        for _ in 0..5 {
            empty_viewer.advance(now);
        }
        assert_eq!(empty_viewer.angle(), 0.0);

        let mut viewer = loaded_viewer();
        for _ in 0..5 {
            viewer.advance(now);
        }
        assert!((viewer.angle() - 5.0 * BASE_SPEED).abs() < 1e-5);
    }

    #[test]
    fn model_matrix_spins_about_the_mesh_center() {
        let mut viewer = loaded_viewer();
        for _ in 0..17 {
            viewer.advance(Instant::now());
        }
        let matrix = viewer.model_matrix().unwrap();
        let center = viewer.framed().unwrap().placement.center;
        assert_eq!(center, Vec3::new(2.0, 0.0, 0.0));
        assert!(matrix.transform_point3(center).length() < 1e-5);
    }

    #[test]
    fn resize_settles_before_the_camera_refits() {
        let mut viewer = loaded_viewer();
        let t0 = Instant::now();
        let framed_distance = viewer.camera().distance();

        viewer.viewport_changed(600, 1000, t0);
        viewer.advance(t0 + Duration::from_millis(100));
        assert_eq!(viewer.camera().distance(), framed_distance);

        viewer.advance(t0 + Duration::from_millis(300));
        assert!(viewer.camera().distance() > framed_distance);
    }

    #[test]
    fn drag_release_boosts_spin_speed() {
        let mut viewer = loaded_viewer();
        let t0 = Instant::now();
        viewer.pointer_down(10.0, t0);
        assert!(viewer.spin().is_dragging());
        viewer.pointer_move(90.0, t0 + Duration::from_millis(16));
        viewer.pointer_up();
        assert!(viewer.spin().speed() > BASE_SPEED);
    }

    #[test]
    fn dispose_is_terminal_and_drops_the_mesh() {
        let mut viewer = loaded_viewer();
        viewer.dispose();
        assert_eq!(viewer.phase(), Phase::Disposed);
        assert!(viewer.framed().is_none());
        assert!(viewer.model_matrix().is_none());

        let angle = viewer.angle();
        viewer.advance(Instant::now());
        assert_eq!(viewer.angle(), angle);
    }

    #[test]
    fn dispose_during_load_never_installs_the_mesh() {
        let mut viewer = ModelViewer::new(800, 600);
        viewer.begin_loading(&square_assets());
        viewer.dispose();

        std::thread::sleep(Duration::from_millis(20));
        viewer.advance(Instant::now());
        assert!(viewer.framed().is_none());
        assert_eq!(viewer.phase(), Phase::Disposed);
    }
}
