use crate::renderer::postprocess::{
    create_fullscreen_quad_buffer, quad_vertex_layout, run_fullscreen_pass,
    sampled_texture_layout, texture_bind_group, PostProcessEffect,
};
use crate::renderer::texture::{Texture, RENDER_FORMAT};
use crate::renderer::PipelineBuilder;

const DEFAULT_MIX: f32 = 0.55;

/// Cross-fades the screen image against a second, separately supplied
/// texture. A stylistic overlay; not part of the default chain.
pub struct CombineEffect {
    device: wgpu::Device,
    queue: wgpu::Queue,
    screen_texture: Texture,
    quad: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    screen_bind_group: wgpu::BindGroup,
    overlay_bind_group: wgpu::BindGroup,
    mix_buffer: wgpu::Buffer,
    mix_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    mix_value: f32,
}

impl CombineEffect {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        overlay: &Texture,
    ) -> Self {
        let screen_texture =
            Texture::empty(device, width, height, RENDER_FORMAT, Some("CombineInput"));
        let quad = create_fullscreen_quad_buffer(device);

        let layout = sampled_texture_layout(device);
        let screen_bind_group = texture_bind_group(device, &layout, &screen_texture);
        let overlay_bind_group = texture_bind_group(device, &layout, overlay);

        let mix_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("CombineMixValue"),
            size: std::mem::size_of::<f32>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mix_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CombineMixLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<f32>() as u64),
                },
                count: None,
            }],
        });
        let mix_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("CombineMixBindGroup"),
            layout: &mix_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: mix_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("CombineShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/combine.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("CombinePipelineLayout"),
            bind_group_layouts: &[&layout, &layout, &mix_layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("CombinePipeline")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();

        Self {
            device: device.clone(),
            queue: queue.clone(),
            screen_texture,
            quad,
            layout,
            screen_bind_group,
            overlay_bind_group,
            mix_buffer,
            mix_bind_group,
            pipeline,
            mix_value: DEFAULT_MIX,
        }
    }

    /// Replaces the overlay texture the screen is faded against.
    pub fn set_combine_texture(&mut self, overlay: &Texture) {
        self.overlay_bind_group = texture_bind_group(&self.device, &self.layout, overlay);
    }

    pub fn set_mix_value(&mut self, mix: f32) {
        self.mix_value = mix.clamp(0.0, 1.0);
    }
}

impl PostProcessEffect for CombineEffect {
    fn draw(&self, destination: &wgpu::TextureView, _object_pass: bool) {
        self.queue
            .write_buffer(&self.mix_buffer, 0, bytemuck::bytes_of(&self.mix_value));

        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "CombinePass",
            &self.pipeline,
            &self.quad,
            &[
                &self.screen_bind_group,
                &self.overlay_bind_group,
                &self.mix_bind_group,
            ],
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
