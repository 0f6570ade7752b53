use std::time::{Duration, Instant};

use log::warn;

use crate::assets::ShowcaseAssets;
use crate::backdrop::ParticleField;
use crate::credentials::{CredentialStore, LoginFlow};
use crate::lifecycle::Phase;
use crate::particles::DensityProfile;
use crate::viewer::ModelViewer;

/// Duration of the ease-out reveal once a component may appear.
pub const FADE_DURATION: Duration = Duration::from_millis(700);

/// Ease-out cubic ramp from 0 to 1 over [`FADE_DURATION`].
pub fn fade_opacity(elapsed: Duration) -> f32 {
    let t = (elapsed.as_secs_f32() / FADE_DURATION.as_secs_f32()).clamp(0.0, 1.0);
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// Opacities applied to the two passes this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reveal {
    pub backdrop: f32,
    pub emblem: f32,
}

/// Latches when each component may start fading in.
///
/// The backdrop appears as soon as it has presented a frame. The emblem
/// waits for both components, so the composition pops in as a whole rather
/// than mesh-first over a black screen.
#[derive(Debug)]
pub struct RevealGate {
    backdrop_since: Option<Instant>,
    emblem_since: Option<Instant>,
}

impl RevealGate {
    pub fn new() -> Self {
        Self {
            backdrop_since: None,
            emblem_since: None,
        }
    }

    /// Feeds the readiness flags; the first frame each gate opens is
    /// remembered as the fade start.
    pub fn update(&mut self, backdrop_ready: bool, emblem_ready: bool, now: Instant) {
        if backdrop_ready && self.backdrop_since.is_none() {
            self.backdrop_since = Some(now);
        }
        if backdrop_ready && emblem_ready && self.emblem_since.is_none() {
            self.emblem_since = Some(now);
        }
    }

    pub fn reveal(&self, now: Instant) -> Reveal {
        Reveal {
            backdrop: self.opacity_since(self.backdrop_since, now),
            emblem: self.opacity_since(self.emblem_since, now),
        }
    }

    fn opacity_since(&self, since: Option<Instant>, now: Instant) -> f32 {
        since.map_or(0.0, |start| {
            fade_opacity(now.saturating_duration_since(start))
        })
    }
}

impl Default for RevealGate {
    fn default() -> Self {
        Self::new()
    }
}

/// The composed page: emblem viewer over the particle backdrop, plus the
/// credential gate. Pure state; rendering and input live with the caller.
pub struct Showcase {
    pub viewer: ModelViewer,
    pub backdrop: ParticleField,
    gate: RevealGate,
    login: LoginFlow,
}

impl Showcase {
    /// Builds both components for a viewport. The credential file is read
    /// up front; a missing or unreadable one leaves the login locked but
    /// everything else intact.
    pub fn new(width: u32, height: u32, seed: u64, assets: &ShowcaseAssets) -> Self {
        let store = match assets.credentials_text() {
            Some(text) => CredentialStore::parse(&text),
            None => {
                warn!("credential file unavailable; login stays locked");
                CredentialStore::unavailable()
            }
        };
        Self {
            viewer: ModelViewer::new(width, height),
            backdrop: ParticleField::new(DensityProfile::for_width(width), seed),
            gate: RevealGate::new(),
            login: LoginFlow::new(store),
        }
    }

    /// Starts the emblem load on its worker thread.
    pub fn begin_loading(&mut self, assets: &ShowcaseAssets) {
        self.viewer.begin_loading(assets);
    }

    /// Advances both components one frame and refreshes the reveal gate.
    pub fn advance(&mut self, now: Instant) {
        self.viewer.advance(now);
        self.backdrop.advance();
        self.gate
            .update(self.backdrop.is_ready(), self.viewer.is_ready(), now);
    }

    pub fn reveal(&self, now: Instant) -> Reveal {
        self.gate.reveal(now)
    }

    pub fn login(&mut self) -> &mut LoginFlow {
        &mut self.login
    }

    /// Disposes both components. Terminal for each.
    pub fn dispose(&mut self) {
        self.viewer.dispose();
        self.backdrop.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.viewer.phase() == Phase::Disposed && self.backdrop.phase() == Phase::Disposed
    }
}
