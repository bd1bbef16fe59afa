use std::time::Instant;

use bytemuck::{Pod, Zeroable};

use crate::renderer::postprocess::{
    create_fullscreen_quad_buffer, quad_vertex_layout, run_fullscreen_pass,
    sampled_texture_uniform_layout, texture_uniform_bind_group, PostProcessEffect,
};
use crate::renderer::texture::{Texture, RENDER_FORMAT};
use crate::renderer::PipelineBuilder;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WobbleUniform {
    time: f32,
    _padding: [f32; 3],
}

/// Samples its input with a sine-based per-pixel offset that advances with
/// wall-clock time, so the output differs between runs unless a fixed time
/// is injected with [`set_time_override`](Self::set_time_override).
pub struct WobbleEffect {
    device: wgpu::Device,
    queue: wgpu::Queue,
    screen_texture: Texture,
    quad: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    started: Instant,
    time_override: Option<f32>,
}

impl WobbleEffect {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let screen_texture = Texture::empty(device, width, height, RENDER_FORMAT, Some("WobbleInput"));
        let quad = create_fullscreen_quad_buffer(device);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("WobbleUniform"),
            size: std::mem::size_of::<WobbleUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout =
            sampled_texture_uniform_layout(device, std::mem::size_of::<WobbleUniform>() as u64);
        let bind_group =
            texture_uniform_bind_group(device, &layout, &screen_texture, &uniform_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("WobbleShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/wobble.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("WobblePipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("WobblePipeline")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();

        Self {
            device: device.clone(),
            queue: queue.clone(),
            screen_texture,
            quad,
            uniform_buffer,
            layout,
            bind_group,
            pipeline,
            started: Instant::now(),
            time_override: None,
        }
    }

    /// Pins the time uniform to a fixed value, making the output
    /// deterministic for tests and captures.
    pub fn set_time_override(&mut self, seconds: Option<f32>) {
        self.time_override = seconds;
    }

    fn seconds(&self) -> f32 {
        self.time_override
            .unwrap_or_else(|| self.started.elapsed().as_secs_f32())
    }
}

impl PostProcessEffect for WobbleEffect {
    fn draw(&self, destination: &wgpu::TextureView, _object_pass: bool) {
        let uniform = WobbleUniform {
            time: self.seconds(),
            _padding: [0.0; 3],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "WobblePass",
            &self.pipeline,
            &self.quad,
            &[&self.bind_group],
            destination,
        );
    }

    fn update_screen_texture(&mut self, input: &Texture) {
        self.screen_texture = input.clone();
        self.bind_group = texture_uniform_bind_group(
            &self.device,
            &self.layout,
            &self.screen_texture,
            &self.uniform_buffer,
        );
    }

    fn screen_texture(&self) -> &Texture {
        &self.screen_texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wobble_uniform_is_16_bytes() {
        assert_eq!(std::mem::size_of::<WobbleUniform>(), 16);
    }
}
