use crate::renderer::postprocess::{
    create_fullscreen_quad_buffer, quad_vertex_layout, run_fullscreen_pass,
    sampled_texture_layout, texture_bind_group, BlurEffect, PostProcessEffect,
};
use crate::renderer::texture::{Texture, RENDER_FORMAT};
use crate::renderer::PipelineBuilder;

/// How many in-place blur rounds widen the brightness image before the
/// combine pass.
const BLUR_ROUNDS: usize = 3;

/// Bloom: the sprite pass writes the sharp scene into `screen_texture` and
/// bright pixels into `brightness_texture` (its second color output). At
/// draw time the private blur widens the brightness image, then one combine
/// pass blends sharp scene + blurred brightness into the destination.
///
/// This is a composition of existing passes, not a new algorithm: the blur
/// is a [`BlurEffect`] owned by the bloom effect.
pub struct BloomEffect {
    device: wgpu::Device,
    queue: wgpu::Queue,
    screen_texture: Texture,
    brightness_texture: Texture,
    quad: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    screen_bind_group: wgpu::BindGroup,
    brightness_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    blur: BlurEffect,
}

impl BloomEffect {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let screen_texture = Texture::empty(device, width, height, RENDER_FORMAT, Some("BloomInput"));
        let brightness_texture =
            Texture::empty(device, width, height, RENDER_FORMAT, Some("BloomBrightness"));
        let quad = create_fullscreen_quad_buffer(device);

        let layout = sampled_texture_layout(device);
        let screen_bind_group = texture_bind_group(device, &layout, &screen_texture);
        let brightness_bind_group = texture_bind_group(device, &layout, &brightness_texture);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("BloomShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/bloom.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BloomPipelineLayout"),
            bind_group_layouts: &[&layout, &layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("BloomCombinePipeline")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();

        let blur = BlurEffect::new(device, queue, width, height);

        Self {
            device: device.clone(),
            queue: queue.clone(),
            screen_texture,
            brightness_texture,
            quad,
            layout,
            screen_bind_group,
            brightness_bind_group,
            pipeline,
            blur,
        }
    }

    /// The surface the sprite pass's second color attachment must target.
    pub fn brightness_texture(&self) -> &Texture {
        &self.brightness_texture
    }
}

impl PostProcessEffect for BloomEffect {
    fn draw(&self, destination: &wgpu::TextureView, _object_pass: bool) {
        // Progressive widening: each round re-blurs the already blurred
        // brightness image.
        for _ in 0..BLUR_ROUNDS {
            self.blur.apply(&self.brightness_texture);
        }

        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "BloomCombinePass",
            &self.pipeline,
            &self.quad,
            &[&self.screen_bind_group, &self.brightness_bind_group],
            destination,
        );
    }

    fn update_screen_texture(&mut self, input: &Texture) {
        self.screen_texture = input.clone();
        self.screen_bind_group =
            texture_bind_group(&self.device, &self.layout, &self.screen_texture);
    }

    fn screen_texture(&self) -> &Texture {
        &self.screen_texture
    }
}
