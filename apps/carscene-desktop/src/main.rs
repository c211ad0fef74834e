use anyhow::{Context as _, Result};
use carscene_common::DriveCommand;
use carscene_input::{InputController, TrackedKey};
use carscene_kernel::{SceneState, TickReport, Tuning};
use carscene_render::SceneRenderer;
use carscene_render_wgpu::WgpuRenderer;
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "carscene-desktop", about = "Drive a boxy car around a lit ground plane")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file overriding movement tuning
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Initial window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial window height
    #[arg(long, default_value = "720")]
    height: u32,
}

/// Map a physical key to the scene's tracked keys.
fn tracked_key(code: KeyCode) -> Option<TrackedKey> {
    let key = match code {
        KeyCode::KeyW => TrackedKey::W,
        KeyCode::KeyA => TrackedKey::A,
        KeyCode::KeyS => TrackedKey::S,
        KeyCode::KeyD => TrackedKey::D,
        KeyCode::ArrowUp => TrackedKey::ArrowUp,
        KeyCode::ArrowLeft => TrackedKey::ArrowLeft,
        KeyCode::ArrowDown => TrackedKey::ArrowDown,
        KeyCode::ArrowRight => TrackedKey::ArrowRight,
        KeyCode::KeyH => TrackedKey::H,
        KeyCode::KeyJ => TrackedKey::J,
        KeyCode::KeyK => TrackedKey::K,
        KeyCode::KeyL => TrackedKey::L,
        KeyCode::KeyP => TrackedKey::P,
        _ => return None,
    };
    Some(key)
}

/// What a key event asks of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Ignored,
    Redraw,
    Exit,
}

/// Everything that is not GPU plumbing.
struct AppState {
    tuning: Tuning,
    scene: SceneState,
    input: InputController,
    renderer: SceneRenderer,
    show_hud: bool,
    last_command: DriveCommand,
    last_report: TickReport,
}

impl AppState {
    fn new(tuning: Tuning) -> Self {
        Self {
            scene: SceneState::new(&tuning),
            input: InputController::new(tuning.tick_period()),
            renderer: SceneRenderer::new(),
            show_hud: true,
            last_command: DriveCommand::NEUTRAL,
            last_report: TickReport::default(),
            tuning,
        }
    }

    fn handle_key(&mut self, code: KeyCode, pressed: bool, now: Instant) -> KeyOutcome {
        if let Some(key) = tracked_key(code) {
            if pressed {
                self.input.key_down(key, now);
            } else if let Some(cmd) = self.input.key_up(key) {
                self.apply(cmd);
                return KeyOutcome::Redraw;
            }
            return KeyOutcome::Ignored;
        }

        if !pressed {
            return KeyOutcome::Ignored;
        }
        match code {
            KeyCode::F1 => {
                self.show_hud = !self.show_hud;
                KeyOutcome::Redraw
            }
            KeyCode::Escape => KeyOutcome::Exit,
            _ => KeyOutcome::Ignored,
        }
    }

    /// Run the repeat timer. Returns `true` when a command was applied.
    fn pump(&mut self, now: Instant) -> bool {
        match self.input.poll(now) {
            Some(cmd) => {
                self.apply(cmd);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, cmd: DriveCommand) {
        self.last_report = self.scene.apply(&cmd, &self.tuning);
        self.last_command = cmd;
    }

    fn control_flow(&self) -> ControlFlow {
        match self.input.deadline() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let s = &self.scene;
        egui::SidePanel::left("hud").default_width(240.0).show(ctx, |ui| {
            ui.heading("Car Scene");
            ui.separator();
            ui.label(format!("Tick: {}", s.tick));
            ui.label(format!("Position: ({:.2}, {:.2})", s.pose.x, s.pose.z));
            ui.label(format!("Heading: {:.0}°", s.pose.heading_deg));
            ui.label(format!("Wheel: {:.0}°", s.wheel_deg));
            ui.label(format!(
                "Doors: L {:.0}°  R {:.0}°",
                s.left_door_deg, s.right_door_deg
            ));
            ui.label(format!("Light: {:?}", s.light_mode));
            ui.separator();
            ui.label(format!("Command: {}", self.last_command));
            if self.last_report.corrected {
                ui.colored_label(egui::Color32::YELLOW, "Returning to arena");
            }
            let held: Vec<_> = self.input.held().iter().map(|k| k.name()).collect();
            ui.label(format!("Held: {}", held.join(" ")));

            ui.separator();
            ui.small("W/S or Up/Down: drive | A/D or Left/Right: steer");
            ui.small("J/H: left door | K/L: right door | P: light");
            ui.small("F1: toggle HUD | Esc: quit");
        });
    }
}

/// Window and GPU resources, created together on `resumed`.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(
        event_loop: &ActiveEventLoop,
        egui_ctx: &EguiContext,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Car Scene")
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible graphics adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("carscene_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height)
            .context("build scene pipeline")?;

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn frame(&mut self, state: &mut AppState, egui_ctx: &EguiContext) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                self.window.request_redraw();
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        state
            .renderer
            .camera
            .set_aspect(self.config.width, self.config.height);
        if let Err(e) = state.renderer.render(&state.scene, &mut self.renderer) {
            tracing::error!("scene render failed: {e}");
            return;
        }
        self.renderer.present(&self.device, &self.queue, &view);

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct App {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    initial_size: (u32, u32),
}

impl App {
    fn new(tuning: Tuning, width: u32, height: u32) -> Self {
        Self {
            state: AppState::new(tuning),
            gpu: None,
            egui_ctx: EguiContext::default(),
            initial_size: (width, height),
        }
    }

    fn request_redraw(&self) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let (width, height) = self.initial_size;
        match Gpu::new(event_loop, &self.egui_ctx, width, height) {
            Ok(gpu) => {
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("initialization failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
        if response.repaint {
            gpu.window.request_redraw();
        }
        if response.consumed {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                gpu.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let pressed = key_state == ElementState::Pressed;
                match self.state.handle_key(code, pressed, Instant::now()) {
                    KeyOutcome::Ignored => {}
                    KeyOutcome::Redraw => gpu.window.request_redraw(),
                    KeyOutcome::Exit => event_loop.exit(),
                }
            }
            WindowEvent::RedrawRequested => {
                gpu.frame(&mut self.state, &self.egui_ctx);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.pump(Instant::now()) {
            self.request_redraw();
        }
        event_loop.set_control_flow(self.state.control_flow());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };
    tracing::info!(tick_hz = tuning.tick_hz, "carscene-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(tuning, cli.width, cli.height);
    event_loop.run_app(&mut app)?;

    Ok(())
}
