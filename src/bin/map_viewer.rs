//! Interactive map viewer.
//!
//! Controls:
//!   Drag: Pan (flat) / rotate (globe)
//!   Mouse wheel, +/-: Zoom
//!   Arrow keys: Pan
//!   Click: Select, click empty space to clear
//!   G: Toggle flat / globe
//!   T: Cycle themes
//!   Escape: Quit

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::Vec2;
use winit::{
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

use warmap::core::types::{PresentationMode, Viewport};
use warmap::core::EngineConfig;
use warmap::engine::{MapEngine, SelectionEvent};
use warmap::interaction::{InputEvent, PointerButton};
use warmap::lod::JsonTierSource;
use warmap::renderer::MapRenderer;
use warmap::theme::ThemeKind;
use warmap::world::load_world;

/// Pixels per wheel line for trackpads reporting pixel deltas.
const PIXELS_PER_LINE: f32 = 40.0;

#[derive(Parser, Debug)]
#[command(name = "map_viewer", about = "Interactive strategy map viewer")]
struct Args {
    /// World snapshot (JSON)
    world: PathBuf,

    /// Engine configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in globe mode
    #[arg(long)]
    globe: bool,

    /// Sub-region tier (JSON), fetched when zooming in
    #[arg(long)]
    subregions: Option<PathBuf>,

    /// Theme: classic, parchment, midnight or contrast
    #[arg(long)]
    theme: Option<ThemeKind>,
}

fn button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warmap=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if args.globe {
        config.mode = PresentationMode::Globe;
    }

    let snapshot = load_world(&args.world)?;
    tracing::info!("Loaded {} with {} entities", args.world.display(), snapshot.entities().len());

    // Create event loop and window
    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Warmap")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut renderer = pollster::block_on(MapRenderer::new(window.clone(), &config.globe))?;
    let (width, height) = renderer.size();
    let mode = config.mode;
    let mut engine = MapEngine::new(config, snapshot, mode, Viewport::new(width as f32, height as f32))?;
    if let Some(path) = args.subregions {
        engine.attach_tier_source(Box::new(JsonTierSource::new(path)));
    }

    let start = Instant::now();
    let mut cursor = Vec2::ZERO;
    let mut last_title = Instant::now();

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => {
            let now = start.elapsed();
            let input = match event {
                WindowEvent::CloseRequested => {
                    elwt.exit();
                    None
                }

                WindowEvent::Resized(size) => {
                    renderer.resize(size.width, size.height);
                    engine.resize(Viewport::new(size.width as f32, size.height as f32));
                    None
                }

                WindowEvent::CursorMoved { position, .. } => {
                    cursor = Vec2::new(position.x as f32, position.y as f32);
                    Some(InputEvent::PointerMove { pos: cursor })
                }

                WindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeave),

                WindowEvent::MouseInput { state, button: b, .. } => button(b).map(|button| match state {
                    ElementState::Pressed => InputEvent::PointerDown { pos: cursor, button },
                    ElementState::Released => InputEvent::PointerUp { pos: cursor, button },
                }),

                WindowEvent::MouseWheel { delta, .. } => {
                    let delta_lines = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                    };
                    Some(InputEvent::Wheel { pos: cursor, delta_lines })
                }

                WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::ArrowUp) => Some(InputEvent::KeyPan { direction: Vec2::NEG_Y }),
                        PhysicalKey::Code(KeyCode::ArrowDown) => Some(InputEvent::KeyPan { direction: Vec2::Y }),
                        PhysicalKey::Code(KeyCode::ArrowLeft) => Some(InputEvent::KeyPan { direction: Vec2::NEG_X }),
                        PhysicalKey::Code(KeyCode::ArrowRight) => Some(InputEvent::KeyPan { direction: Vec2::X }),
                        PhysicalKey::Code(KeyCode::Equal) | PhysicalKey::Code(KeyCode::NumpadAdd) => {
                            Some(InputEvent::KeyZoom { steps: 1.0 })
                        }
                        PhysicalKey::Code(KeyCode::Minus) | PhysicalKey::Code(KeyCode::NumpadSubtract) => {
                            Some(InputEvent::KeyZoom { steps: -1.0 })
                        }
                        PhysicalKey::Code(KeyCode::KeyG) => {
                            engine.set_mode(engine.mode().toggled());
                            None
                        }
                        PhysicalKey::Code(KeyCode::KeyT) => {
                            engine.set_theme(engine.config().theme.next());
                            None
                        }
                        PhysicalKey::Code(KeyCode::Escape) => {
                            elwt.exit();
                            None
                        }
                        _ => None,
                    }
                }

                WindowEvent::RedrawRequested => {
                    engine.frame(now);
                    if let Err(e) = renderer.render(engine.output(), engine.path_cache()) {
                        tracing::error!("Render failed: {}", e);
                        elwt.exit();
                    }

                    if last_title.elapsed().as_secs_f32() >= 0.25 {
                        last_title = Instant::now();
                        let model = engine.view_model();
                        let hovered = model
                            .hovered
                            .map(|t| match t.owner {
                                Some(owner) => format!("{} ({})", t.name, owner),
                                None => t.name,
                            })
                            .unwrap_or_default();
                        let selected = model.selected.map(|id| id.to_string()).unwrap_or_default();
                        let metrics = engine.metrics();
                        window.set_title(&format!(
                            "Warmap - {:?} | {} | selected: {} | {:.1} FPS | {} commands | {} draws",
                            engine.mode(),
                            hovered,
                            selected,
                            metrics.fps(),
                            metrics.commands,
                            renderer.metrics().draw_calls
                        ));
                    }
                    None
                }

                _ => None,
            };

            if let Some(input) = input {
                match engine.handle_input(input, now) {
                    Some(SelectionEvent::Selected(id)) => tracing::info!("Selected {}", id),
                    Some(SelectionEvent::Cleared) => tracing::info!("Selection cleared"),
                    None => {}
                }
            }
        }

        Event::AboutToWait => {
            window.request_redraw();
        }

        _ => {}
    })?;
    Ok(())
}
