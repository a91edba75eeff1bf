use winit::{
    event::{DeviceEvent, ElementState, Event, KeyEvent, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowBuilder},
};

use crate::config::SandboxConfig;
use crate::core::Ray;
use crate::ecs::rendering::{HeadlessRenderer, SceneRenderer};
use crate::input::InputState;
use crate::material::Material;
use crate::placement::BlockShape;
use crate::sandbox::{ClickOutcome, Sandbox};

const WINDOW_TITLE: &str = "Demolition Sandbox";

pub struct Engine {
    event_loop: EventLoop<()>,
    window: Window,
    renderer: Box<dyn SceneRenderer>,
    config: SandboxConfig,
}

struct FrameState {
    sandbox: Sandbox,
    input: InputState,
    last_update_time: std::time::Instant,
    frame_count: u32,
    fps_timer: std::time::Instant,
    current_fps: f32,
}

impl Engine {
    pub fn new(config: SandboxConfig) -> anyhow::Result<Self> {
        Self::with_renderer(config, Box::new(HeadlessRenderer::default()))
    }

    pub fn with_renderer(config: SandboxConfig, renderer: Box<dyn SceneRenderer>) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?;

        Ok(Self {
            event_loop,
            window,
            renderer,
            config,
        })
    }

    pub fn run(self) -> anyhow::Result<()> {
        let Engine {
            event_loop,
            window,
            mut renderer,
            config,
        } = self;

        let now = std::time::Instant::now();
        let mut state = FrameState {
            sandbox: Sandbox::new(config),
            input: InputState::new(),
            last_update_time: now,
            frame_count: 0,
            fps_timer: now,
            current_fps: 0.0,
        };

        capture_pointer(&window, true);

        event_loop.run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => {
                    target.exit();
                }
                Event::WindowEvent {
                    event: WindowEvent::CursorMoved { position, .. },
                    ..
                } => {
                    state.input.mouse_position = glam::Vec2::new(position.x as f32, position.y as f32);
                }
                Event::WindowEvent {
                    event:
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        },
                    ..
                } => {
                    let ray = pointer_ray(&window, &state);
                    match state.sandbox.handle_click(&ray) {
                        Ok(ClickOutcome::Placed(placed)) => {
                            tracing::debug!(position = ?placed.spec.position, "click placed block");
                        }
                        Ok(ClickOutcome::Exploded { impulses, .. }) => {
                            tracing::debug!(affected = impulses.len(), "click detonated");
                        }
                        Ok(ClickOutcome::Missed) | Ok(ClickOutcome::Ignored) => {}
                        Err(err) => tracing::warn!("Click failed: {}", err),
                    }
                }
                Event::DeviceEvent {
                    event: DeviceEvent::MouseMotion { delta },
                    ..
                } => {
                    if !state.input.ui_focus() {
                        state.input.add_mouse_delta(delta.0, delta.1);
                    }
                }
                Event::WindowEvent {
                    event:
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    physical_key: PhysicalKey::Code(key_code),
                                    state: key_state,
                                    repeat,
                                    ..
                                },
                            ..
                        },
                    ..
                } => match key_state {
                    ElementState::Pressed => {
                        state.input.press(key_code);
                        if !repeat {
                            handle_key(&window, &mut state, key_code);
                        }
                    }
                    ElementState::Released => {
                        state.input.release(key_code);
                    }
                },
                Event::AboutToWait => {
                    window.request_redraw();
                }
                Event::WindowEvent {
                    event: WindowEvent::RedrawRequested,
                    ..
                } => {
                    let now = std::time::Instant::now();
                    let delta_time = now.duration_since(state.last_update_time).as_secs_f32();
                    state.last_update_time = now;

                    state.sandbox.tick(delta_time, &mut state.input);

                    state.frame_count += 1;
                    let elapsed = state.fps_timer.elapsed().as_secs_f32();
                    if elapsed >= 1.0 {
                        state.current_fps = state.frame_count as f32 / elapsed;
                        state.frame_count = 0;
                        state.fps_timer = std::time::Instant::now();
                    }

                    let title = format!(
                        "{} - {} - {:.0} FPS",
                        WINDOW_TITLE,
                        state.sandbox.status(),
                        state.current_fps
                    );
                    window.set_title(&title);

                    let batch = state.sandbox.render_batch();
                    if let Err(e) = renderer.draw(&batch, &state.sandbox.camera) {
                        tracing::error!("Render error: {}", e);
                        target.exit();
                    }
                }
                _ => {}
            }
        })?;

        tracing::info!("Engine shutdown complete");
        Ok(())
    }
}

fn pointer_ray(window: &Window, state: &FrameState) -> Ray {
    let size = window.inner_size();
    let (width, height) = (size.width.max(1) as f32, size.height.max(1) as f32);
    // Captured pointer aims through the screen centre
    let pointer = if state.input.ui_focus() {
        state.input.mouse_position
    } else {
        glam::Vec2::new(width / 2.0, height / 2.0)
    };
    state
        .sandbox
        .camera
        .pointer_ray(pointer.x, pointer.y, width, height)
}

fn capture_pointer(window: &Window, captured: bool) {
    window.set_cursor_visible(!captured);
    let mode = if captured {
        CursorGrabMode::Confined
    } else {
        CursorGrabMode::None
    };
    if let Err(err) = window.set_cursor_grab(mode) {
        tracing::debug!("Cursor grab unavailable: {}", err);
    }
}

fn handle_key(window: &Window, state: &mut FrameState, key_code: KeyCode) {
    let sandbox = &mut state.sandbox;
    match key_code {
        KeyCode::Tab => {
            let ui_focus = state.input.toggle_ui_focus();
            capture_pointer(window, !ui_focus);
            tracing::info!(ui_focus, "pointer capture toggled");
        }
        KeyCode::KeyP => {
            sandbox.toggle_physics();
        }
        KeyCode::KeyX => {
            sandbox.toggle_explosion_mode();
        }
        KeyCode::KeyQ => {
            sandbox.trigger_earthquake();
        }
        KeyCode::KeyB => {
            if let Err(err) = sandbox.spawn_wrecking_ball() {
                tracing::warn!("Wrecking ball failed: {}", err);
            }
        }
        KeyCode::KeyH => {
            let ray = pointer_ray(window, state);
            if let Err(err) = state.sandbox.drop_heavy_ball(&ray) {
                tracing::debug!("Heavy ball not dropped: {}", err);
            }
        }
        KeyCode::Delete => {
            sandbox.clear_blocks();
        }
        KeyCode::Digit1 => sandbox.session.select_material(Material::Wood),
        KeyCode::Digit2 => sandbox.session.select_material(Material::Metal),
        KeyCode::Digit3 => sandbox.session.select_material(Material::Stone),
        KeyCode::KeyZ => sandbox.session.select_shape(BlockShape::Cube),
        KeyCode::KeyC => sandbox.session.select_shape(BlockShape::Cone),
        KeyCode::KeyV => sandbox.session.select_shape(BlockShape::Sphere),
        KeyCode::BracketLeft => {
            let step = sandbox.config.placement.size_step;
            sandbox.session.adjust_block_size(-step);
        }
        KeyCode::BracketRight => {
            let step = sandbox.config.placement.size_step;
            sandbox.session.adjust_block_size(step);
        }
        KeyCode::F5 => {
            sandbox.select_preset(0);
        }
        KeyCode::F6 => {
            sandbox.select_preset(1);
        }
        _ => {}
    }
}
