use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use haunted_assets::{TextureLoader, TextureStore};
use haunted_house::{GraveOptions, HauntedHouse, HouseOptions, build_haunted_house};
use haunted_render::{
    DragMode, FrameLoop, FrameScheduler, FrameSnapshot, OrbitControls, SurfaceSize, Viewport,
};
use haunted_render_wgpu::{GpuContext, WgpuRenderer};
use haunted_scene::{Scene, SceneError};
use haunted_tools::{DebugPanel, SceneInspector};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "haunted-desktop", about = "Haunted house scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding textures/
    #[arg(long, default_value = "./static")]
    asset_root: PathBuf,

    /// Initial logical window width
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial logical window height
    #[arg(long, default_value = "720")]
    height: u32,

    /// Give the door its texture maps and make it transparent
    #[arg(long)]
    textured_door: bool,

    /// Give the floor grass texture maps
    #[arg(long)]
    textured_grass: bool,

    /// Scatter this many graves around the house
    #[arg(long)]
    graves: Option<usize>,

    /// Seed for grave placement
    #[arg(long, default_value = "42")]
    seed: u64,
}

/// Asks winit for one more `RedrawRequested`.
struct WindowScheduler<'a>(&'a Window);

impl FrameScheduler for WindowScheduler<'_> {
    fn request_frame(&self) {
        self.0.request_redraw();
    }
}

/// Application state.
struct AppState {
    scene: Scene,
    house: HauntedHouse,
    textures: TextureStore,
    controls: OrbitControls,
    viewport: Viewport,
    panel: DebugPanel,
    frame_loop: FrameLoop,
    show_panel: bool,
    cursor: Vec2,
    last_frame_ms: f32,
}

impl AppState {
    fn new(cli: &Cli) -> Result<Self> {
        let options = HouseOptions {
            textured_door: cli.textured_door,
            textured_grass: cli.textured_grass,
            graves: cli.graves.map(|count| GraveOptions {
                count,
                seed: cli.seed,
            }),
        };
        let viewport = Viewport::new(cli.width, cli.height, 1.0);

        let mut scene = Scene::new();
        let mut loader = TextureLoader::new(&cli.asset_root);
        let house = build_haunted_house(&mut scene, Some(&mut loader), viewport.aspect(), &options)?;
        let textures = loader.into_store();
        tracing::info!("{}", SceneInspector::summary(&scene));

        Ok(Self {
            panel: DebugPanel::for_lights(house.ambient_light, house.moon_light),
            scene,
            house,
            textures,
            controls: OrbitControls::default().with_damping(),
            viewport,
            frame_loop: FrameLoop::new(),
            show_panel: true,
            cursor: Vec2::ZERO,
            last_frame_ms: 0.0,
        })
    }

    /// New physical window size: resize the viewport and camera together,
    /// and return the drawing-buffer size for the renderer.
    fn resize(&mut self, width: u32, height: u32, scale_factor: f64) -> Result<SurfaceSize, SceneError> {
        let logical = Viewport::from_physical(width, height, scale_factor);
        let (w, h) = logical.size();
        let (camera, _) = self.scene.camera_mut(self.house.camera)?;
        Ok(self.viewport.resize(w, h, scale_factor, camera))
    }

    fn pointer_moved(&mut self, position: Vec2) -> Result<(), SceneError> {
        self.cursor = position;
        if !self.controls.is_dragging() {
            return Ok(());
        }
        let height = self.viewport.size().1 as f32;
        let (camera, transform) = self.scene.camera_mut(self.house.camera)?;
        self.controls.pointer_move(position, height, camera, transform);
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        if key == KeyCode::KeyH {
            self.show_panel = !self.show_panel;
        }
    }

    /// Advance the controls once and flatten the scene for drawing.
    fn update(&mut self) -> Result<FrameSnapshot, SceneError> {
        let (_, transform) = self.scene.camera_mut(self.house.camera)?;
        self.controls.update(transform);
        FrameSnapshot::extract(&self.scene, self.house.camera)
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::Window::new("Debug")
            .default_width(260.0)
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .show(ctx, |ui| {
                let controls = self.panel.controls().to_vec();
                for (index, control) in controls.iter().enumerate() {
                    let Ok(mut value) = self.panel.get(&self.scene, index) else {
                        continue;
                    };
                    let response = ui.add(
                        egui::Slider::new(&mut value, control.min..=control.max)
                            .step_by(control.step as f64)
                            .text(control.label.as_str()),
                    );
                    if response.changed() {
                        if let Err(e) = self.panel.set(&mut self.scene, index, value) {
                            tracing::warn!("slider '{}' failed: {e}", control.label);
                        }
                    }
                }

                ui.separator();
                let (w, h) = self.viewport.size();
                ui.label(format!(
                    "Viewport: {w}x{h} @{:.2}  Frame: {:.1} ms",
                    self.viewport.pixel_ratio(),
                    self.last_frame_ms
                ));
                ui.small("LMB: orbit | RMB: pan | MMB/Wheel: zoom | H: hide");
            });
    }
}

/// Everything that exists only while a window is open.
struct Graphics {
    window: Arc<Window>,
    gpu: GpuContext,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    egui_ctx: EguiContext,
    graphics: Option<Graphics>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            egui_ctx: EguiContext::default(),
            graphics: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<Graphics> {
        let (width, height) = self.state.viewport.size();
        let attrs = Window::default_attributes()
            .with_title("Haunted House")
            .with_inner_size(LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let size = window.inner_size();
        let gpu = GpuContext::new(window.clone(), size.width, size.height)?;
        let surface_size = self
            .state
            .resize(size.width, size.height, window.scale_factor())?;

        let mut renderer = WgpuRenderer::new(&gpu.device, &gpu.queue, gpu.format(), surface_size);
        renderer.upload_scene(&gpu.device, &gpu.queue, &self.state.scene, &self.state.textures);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&gpu.device, gpu.format(), None, 1, false);

        Ok(Graphics {
            window,
            gpu,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        let Some(graphics) = &mut self.graphics else {
            return;
        };
        let scale = graphics.window.scale_factor();
        match self.state.resize(width, height, scale) {
            Ok(surface_size) => {
                graphics.gpu.resize_surface(width, height);
                graphics.renderer.resize(&graphics.gpu.device, surface_size);
            }
            Err(e) => tracing::error!("resize failed: {e}"),
        }
    }

    fn redraw(&mut self) {
        let Some(time) = self.state.frame_loop.begin_frame() else {
            return;
        };
        self.state.last_frame_ms = time.delta * 1000.0;

        if let Err(e) = self.draw_frame() {
            tracing::error!("frame {} failed: {e}", time.frame);
        }

        if let Some(graphics) = &self.graphics {
            self.state
                .frame_loop
                .end_frame(&WindowScheduler(&graphics.window));
        }
    }

    fn draw_frame(&mut self) -> Result<()> {
        let snapshot = self.state.update()?;
        let Some(graphics) = &mut self.graphics else {
            return Ok(());
        };
        let Graphics {
            window,
            gpu,
            renderer,
            egui_winit,
            egui_renderer,
        } = graphics;

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        renderer.render(&gpu.device, &gpu.queue, &view, &snapshot)?;

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
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
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        Ok(())
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.graphics.is_some() {
            return;
        }
        match self.init_graphics(event_loop) {
            Ok(graphics) => {
                self.state
                    .frame_loop
                    .start(&WindowScheduler(&graphics.window));
                self.graphics = Some(graphics);
            }
            Err(e) => {
                tracing::error!("failed to initialize graphics: {e:#}");
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
        let consumed = match &mut self.graphics {
            Some(graphics) => {
                graphics
                    .egui_winit
                    .on_window_event(&graphics.window, &event)
                    .consumed
            }
            None => false,
        };

        match event {
            WindowEvent::CloseRequested => {
                self.state.frame_loop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size.width, new_size.height);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.graphics.as_ref().map(|g| g.window.inner_size()) {
                    self.handle_resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } if !consumed => {
                self.state.handle_key(key);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self
                    .graphics
                    .as_ref()
                    .map(|g| g.window.scale_factor())
                    .unwrap_or(1.0);
                let logical = position.to_logical::<f32>(scale);
                if let Err(e) = self.state.pointer_moved(Vec2::new(logical.x, logical.y)) {
                    tracing::error!("pointer move failed: {e}");
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let mode = match button {
                    MouseButton::Left => DragMode::Rotate,
                    MouseButton::Right => DragMode::Pan,
                    MouseButton::Middle => DragMode::Dolly,
                    _ => return,
                };
                match state {
                    ElementState::Pressed if !consumed => {
                        self.state.controls.pointer_down(mode, self.state.cursor);
                    }
                    ElementState::Released => self.state.controls.pointer_up(),
                    _ => {}
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let dy = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                self.state.controls.wheel(-dy);
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("haunted-desktop starting");

    let state = AppState::new(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
