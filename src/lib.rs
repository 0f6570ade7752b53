//! Core modules for the Vitrina showcase.
//!
//! The crate exposes the showcase as composable pieces: the emblem viewer
//! with its auto-framing camera and drag spin, the procedural particle
//! backdrop, the credential gate, and the lifecycle plumbing that ties
//! them together.  Everything except the `render` module runs headless,
//! so the behavior stays testable without a GPU.

pub mod app;
pub mod assets;
pub mod backdrop;
pub mod camera;
pub mod credentials;
pub mod lifecycle;
pub mod obj;
pub mod particles;
pub mod render;
pub mod spin;
pub mod viewer;

pub use app::{Reveal, Showcase};
pub use assets::ShowcaseAssets;
pub use backdrop::ParticleField;
pub use camera::{Bounds, EmblemCamera, Placement};
pub use credentials::{CredentialStore, LoginFlow, LoginStep};
pub use lifecycle::Phase;
pub use obj::{decode_obj, MeshData};
pub use render::Renderer;
pub use viewer::ModelViewer;
