use crate::renderer::postprocess::{
    create_fullscreen_quad_buffer, quad_vertex_layout, run_fullscreen_pass,
    sampled_texture_uniform_layout, texture_uniform_bind_group, PostProcessEffect,
};
use crate::renderer::texture::{Texture, RENDER_FORMAT};
use crate::renderer::PipelineBuilder;

/// Desaturates its input per pixel. The object-pass flag only flips an
/// internal uniform (the shader preserves source alpha on object-local
/// passes so the sprite's transparent texels stay transparent).
pub struct GrayscaleEffect {
    device: wgpu::Device,
    queue: wgpu::Queue,
    screen_texture: Texture,
    quad: wgpu::Buffer,
    flag_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl GrayscaleEffect {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let screen_texture = Texture::empty(device, width, height, RENDER_FORMAT, Some("GrayscaleInput"));
        let quad = create_fullscreen_quad_buffer(device);

        let flag_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GrayscaleFlag"),
            size: std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = sampled_texture_uniform_layout(device, std::mem::size_of::<u32>() as u64);
        let bind_group = texture_uniform_bind_group(device, &layout, &screen_texture, &flag_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("GrayscaleShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/grayscale.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("GrayscalePipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("GrayscalePipeline")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();

        Self {
            device: device.clone(),
            queue: queue.clone(),
            screen_texture,
            quad,
            flag_buffer,
            layout,
            bind_group,
            pipeline,
        }
    }
}

impl PostProcessEffect for GrayscaleEffect {
    fn draw(&self, destination: &wgpu::TextureView, object_pass: bool) {
        let flag: u32 = if object_pass { 1 } else { 0 };
        self.queue
            .write_buffer(&self.flag_buffer, 0, bytemuck::bytes_of(&flag));

        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "GrayscalePass",
            &self.pipeline,
            &self.quad,
            &[&self.bind_group],
            destination,
        );
    }

    fn update_screen_texture(&mut self, input: &Texture) {
        self.screen_texture = input.clone();
        // The bind group references the old view; rebuild it for the new
        // input without touching the pipeline.
        self.bind_group = texture_uniform_bind_group(
            &self.device,
            &self.layout,
            &self.screen_texture,
            &self.flag_buffer,
        );
    }

    fn screen_texture(&self) -> &Texture {
        &self.screen_texture
    }
}
