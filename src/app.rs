use std::path::Path;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::assets::AssetRegistry;
use crate::game::World;
use crate::input::InputState;
use crate::renderer::postprocess::EffectChain;
use crate::renderer::{Gpu, SpriteRenderer, Texture, RENDER_FORMAT};
use crate::settings::RenderSettings;

/// Elapsed time is clamped so a suspended window does not come back with a
/// multi-second step that destabilizes movement and animation.
const MAX_FRAME_DELTA: f32 = 1.0;

const ASSETS_DIR: &str = "assets";
/// Overlay texture handed to combine effects when the chain requests one.
const OVERLAY_TEXTURE: &str = "ice";

pub struct App {
    settings: RenderSettings,
    state: Option<AppState>,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            state: None,
        }
    }
}

struct AppState {
    window: Window,
    window_id: WindowId,
    gpu: Gpu,
    renderer: SpriteRenderer,
    chain: EffectChain,
    /// Second color attachment of the sprite pass when no bloom effect
    /// supplies its brightness surface.
    fallback_brightness: Texture,
    assets: AssetRegistry,
    world: World,
    input: InputState,
    settings: RenderSettings,
    started: Instant,
    last_frame: Instant,
}

impl AppState {
    /// Full initialization: device, assets, renderer, effect chain, world.
    /// Runs to completion before the first frame; any failure here aborts
    /// startup with no partial renderer left behind.
    fn new(window: Window, settings: RenderSettings) -> Result<Self, String> {
        let gpu = pollster::block_on(Gpu::new(&window, &settings))?;

        let mut assets = AssetRegistry::new();
        assets.load(&gpu.device, &gpu.queue, Path::new(ASSETS_DIR))?;

        let (width, height) = (settings.resolution.width, settings.resolution.height);
        let renderer = SpriteRenderer::new(gpu.device.clone(), gpu.queue.clone(), width, height);

        let mut chain = EffectChain::new(gpu.device.clone(), gpu.queue.clone(), width, height);
        let overlay = assets.texture(OVERLAY_TEXTURE).ok().cloned();
        chain.build_from_keys(&settings.effects, overlay.as_ref());

        let fallback_brightness = Texture::empty(
            &gpu.device,
            width,
            height,
            RENDER_FORMAT,
            Some("BrightnessTarget"),
        );

        let world = World::new(&gpu.device, &gpu.queue, &assets, &settings)?;

        let window_id = window.id();
        let now = Instant::now();
        Ok(Self {
            window,
            window_id,
            gpu,
            renderer,
            chain,
            fallback_brightness,
            assets,
            world,
            input: InputState::new(),
            settings,
            started: now,
            last_frame: now,
        })
    }

    /// One frame, in fixed order: update game state, sprite pass (batched),
    /// screen-wide effect chain, per-object effect chains, present.
    fn render_frame(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(MAX_FRAME_DELTA);
        self.last_frame = now;

        self.world.update(dt, &self.input, &self.assets);

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return;
            }
            Err(err) => {
                log::error!("Dropped frame: {}", err);
                return;
            }
        };
        let surface_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.renderer.begin_frame();

        // With a non-empty chain the sprite pass feeds the first effect's
        // input surface; otherwise it targets the presentation surface
        // directly, with no intermediate hop.
        let color_view = match self.chain.first_target() {
            Some(texture) => texture.view.clone(),
            None => surface_view.clone(),
        };
        let brightness_view = match self.chain.brightness_target() {
            Some(texture) => texture.view.clone(),
            None => self.fallback_brightness.view.clone(),
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FrameEncoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("SpritePass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &color_view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.settings.wgpu_clear_color()),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &brightness_view,
                        resolve_target: None,
                        depth_slice: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.world.draw(&mut self.renderer);
            self.renderer.end_frame(&mut rpass);
        }
        self.gpu.queue.submit(Some(encoder.finish()));

        self.chain.execute(&surface_view);
        self.world.post_render(self.started.elapsed().as_secs_f32());

        frame.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("wgpu sprites")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.resolution.width,
                self.settings.resolution.height,
            ));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => window,
            Err(err) => {
                log::error!("Failed to create window: {}", err);
                event_loop.exit();
                return;
            }
        };

        match AppState::new(window, self.settings.clone()) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("Initialization failed: {}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if id != state.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.gpu.resize(size);
                // With no chain the sprite pass targets the surface, and
                // its sibling brightness attachment must match the new
                // surface size.
                if state.chain.is_empty() {
                    state.fallback_brightness = Texture::empty(
                        &state.gpu.device,
                        size.width.max(1),
                        size.height.max(1),
                        RENDER_FORMAT,
                        Some("BrightnessTarget"),
                    );
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if matches!(event.logical_key, Key::Named(NamedKey::Escape)) {
                    event_loop.exit();
                    return;
                }
                state.input.handle_key_event(&event);
            }
            WindowEvent::RedrawRequested => {
                state.render_frame();
                state.window.request_redraw();
            }
            _ => {}
        }
    }
}
