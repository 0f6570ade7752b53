use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::info;
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use vitrina::{Bounds, CredentialStore, LoginFlow, Renderer, Showcase, ShowcaseAssets};

const WINDOW_TITLE: &str = "Vitrina";
const WINDOW_WIDTH: f64 = 1280.0;
const WINDOW_HEIGHT: f64 = 720.0;

/// Fixed seed so the spiral layout is reproducible across runs.
const BACKDROP_SEED: u64 = 42;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let assets = ShowcaseAssets::open(&options.path)
        .with_context(|| format!("failed to open assets directory {}", options.path))?;

    println!(
        "Loaded {} asset file(s) from {}",
        assets.names().len(),
        options.path
    );
    for name in assets.names() {
        println!(" - {name}");
    }

    if let Some((user, pass)) = &options.login {
        return run_login(&assets, user, pass);
    }

    if options.summary_only {
        run_summary(&assets)
    } else {
        match run_interactive(assets.clone()) {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.downcast_ref::<WindowInitError>().is_some() {
                    eprintln!(
                        "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                    );
                    run_summary(&assets)
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// Headless mode: loads the emblem, frames it, and prints the showcase
/// state without opening a window.
fn run_summary(assets: &ShowcaseAssets) -> Result<()> {
    let mut showcase = Showcase::new(
        WINDOW_WIDTH as u32,
        WINDOW_HEIGHT as u32,
        BACKDROP_SEED,
        assets,
    );
    showcase.begin_loading(assets);
    showcase.viewer.await_load();
    showcase.advance(Instant::now());

    match showcase.viewer.framed() {
        Some(framed) => {
            println!(
                "Emblem {}: {} vertices, {} triangles",
                framed.source,
                framed.mesh.vertex_count(),
                framed.mesh.triangle_count()
            );
            if let Some(bounds) = Bounds::from_interleaved(&framed.mesh.vertices) {
                let size = bounds.size();
                println!("Bounds: {:.2} x {:.2} x {:.2}", size.x, size.y, size.z);
            }
            println!(
                "Framed at scale {:.2}, sphere radius {:.2}, camera distance {:.2}",
                framed.placement.scale,
                framed.placement.radius,
                showcase.viewer.camera().distance()
            );
        }
        None => println!("No emblem mesh loaded"),
    }
    println!(
        "Backdrop: {} profile, {} layers, {} points",
        showcase.backdrop.profile(),
        showcase.backdrop.layers().len(),
        showcase.backdrop.total_points()
    );
    println!(
        "Credentials: {}",
        if showcase.login().is_available() {
            "available"
        } else {
            "unavailable"
        }
    );
    println!(
        "Lifecycle: viewer {}, backdrop {}",
        showcase.viewer.phase(),
        showcase.backdrop.phase()
    );
    showcase.dispose();
    println!("Showcase disposed.");
    Ok(())
}

/// Headless credential gate: runs the two-step flow against the stored
/// credentials and exits nonzero on any mismatch.
fn run_login(assets: &ShowcaseAssets, user: &str, pass: &str) -> Result<()> {
    let store = assets
        .credentials_text()
        .map(|text| CredentialStore::parse(&text))
        .unwrap_or_else(CredentialStore::unavailable);
    let mut flow = LoginFlow::new(store);

    if let Err(err) = flow.submit_username(user) {
        println!("{err}");
        return Err(anyhow!("login rejected"));
    }
    if let Err(err) = flow.submit_password(pass) {
        println!("{err}");
        return Err(anyhow!("login rejected"));
    }
    println!("Sesión iniciada.");
    Ok(())
}

fn run_interactive(assets: ShowcaseAssets) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = ShowcaseApp::new(assets);
    let loop_result = event_loop.run_app(&mut app);
    app.shutdown();
    loop_result.context("event loop failed")?;

    if let Some(err) = app.init_error.take() {
        return Err(err.into());
    }
    if let Some(err) = app.last_error.take() {
        return Err(err);
    }
    Ok(())
}

struct ShowcaseApp {
    assets: ShowcaseAssets,
    showcase: Option<Showcase>,
    renderer: Option<Renderer>,
    cursor_x: f32,
    init_error: Option<WindowInitError>,
    last_error: Option<anyhow::Error>,
}

impl ShowcaseApp {
    fn new(assets: ShowcaseAssets) -> Self {
        Self {
            assets,
            showcase: None,
            renderer: None,
            cursor_x: 0.0,
            init_error: None,
            last_error: None,
        }
    }

    fn shutdown(&mut self) {
        let had_showcase = self.showcase.is_some();
        if let Some(mut showcase) = self.showcase.take() {
            showcase.dispose();
        }
        if let Some(renderer) = self.renderer.take() {
            renderer.dispose();
        }
        if had_showcase {
            println!("Showcase disposed.");
        }
    }
}

impl ApplicationHandler for ShowcaseApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                self.init_error = Some(WindowInitError::from_error("window", err));
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let mut showcase = Showcase::new(
            size.width.max(1),
            size.height.max(1),
            BACKDROP_SEED,
            &self.assets,
        );
        showcase.begin_loading(&self.assets);

        match block_on(Renderer::new(Arc::clone(&window), &showcase.backdrop)) {
            Ok(renderer) => {
                self.showcase = Some(showcase);
                self.renderer = Some(renderer);
            }
            Err(err) => {
                self.init_error = Some(WindowInitError::from_error("renderer", err));
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(showcase), Some(renderer)) = (&mut self.showcase, &mut self.renderer) else {
            return;
        };
        if renderer.window().id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                renderer.resize(size);
                showcase
                    .viewer
                    .viewport_changed(size.width, size.height, Instant::now());
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_x = position.x as f32;
                showcase.viewer.pointer_move(self.cursor_x, Instant::now());
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => showcase.viewer.pointer_down(self.cursor_x, Instant::now()),
                ElementState::Released => showcase.viewer.pointer_up(),
            },
            WindowEvent::CursorLeft { .. } => showcase.viewer.pointer_up(),
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => {
                let x = location.x as f32;
                match phase {
                    TouchPhase::Started => showcase.viewer.pointer_down(x, Instant::now()),
                    TouchPhase::Moved => showcase.viewer.pointer_move(x, Instant::now()),
                    TouchPhase::Ended | TouchPhase::Cancelled => showcase.viewer.pointer_up(),
                }
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                showcase.advance(now);
                let reveal = showcase.reveal(now);
                match renderer.render(&showcase.viewer, &showcase.backdrop, reveal) {
                    Ok(()) => showcase.backdrop.mark_rendered(),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = renderer.window().inner_size();
                        renderer.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        self.last_error = Some(anyhow!("GPU is out of memory"));
                        event_loop.exit();
                    }
                    Err(err) => {
                        info!("surface error: {err}; retrying next frame");
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = &self.renderer {
            renderer.window().request_redraw();
        }
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    path: String,
    summary_only: bool,
    login: Option<(String, String)>,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let Some(path) = args.next() else {
            return Err(anyhow!(
                "Usage: vitrina <assets-dir> [--summary-only] [--login USER PASS]"
            ));
        };
        let mut summary_only = false;
        let mut login = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--summary-only" => summary_only = true,
                "--login" => {
                    let (Some(user), Some(pass)) = (args.next(), args.next()) else {
                        return Err(anyhow!("--login expects USER and PASS arguments"));
                    };
                    login = Some((user, pass));
                }
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --summary-only or --login USER PASS"
                    ));
                }
            }
        }
        Ok(Self {
            path,
            summary_only,
            login,
        })
    }
}
