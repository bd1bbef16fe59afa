use bitflags::bitflags;

use crate::renderer::postprocess::{
    create_fullscreen_quad_buffer, quad_vertex_layout, run_fullscreen_pass,
    sampled_texture_uniform_layout, texture_uniform_bind_group, PostProcessEffect,
};
use crate::renderer::texture::{Texture, RENDER_FORMAT};
use crate::renderer::PipelineBuilder;

bitflags! {
    /// Which of the two separable passes run. Both is the default and the
    /// common case; a single direction is mostly a debugging aid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlurPasses: u8 {
        const HORIZONTAL = 1 << 0;
        const VERTICAL = 1 << 1;
    }
}

impl Default for BlurPasses {
    fn default() -> Self {
        BlurPasses::HORIZONTAL | BlurPasses::VERTICAL
    }
}

/// Two-pass separable blur. The horizontal pass writes into an internal
/// ping-pong surface, the vertical pass reads the ping-pong surface and
/// writes the destination.
///
/// Besides the chain-style [`draw`](PostProcessEffect::draw), the effect
/// exposes [`apply`](Self::apply) which blurs a texture in place (through
/// the ping-pong surface); bloom uses that to widen its brightness image
/// without owning a second blur implementation.
pub struct BlurEffect {
    device: wgpu::Device,
    queue: wgpu::Queue,
    screen_texture: Texture,
    ping_pong: Texture,
    quad: wgpu::Buffer,
    flag_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    horizontal_bind_group: wgpu::BindGroup,
    vertical_bind_group: wgpu::BindGroup,
    horizontal_pipeline: wgpu::RenderPipeline,
    vertical_pipeline: wgpu::RenderPipeline,
    pub passes: BlurPasses,
}

impl BlurEffect {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let screen_texture = Texture::empty(device, width, height, RENDER_FORMAT, Some("BlurInput"));
        let ping_pong = Texture::empty(device, width, height, RENDER_FORMAT, Some("BlurPingPong"));
        let quad = create_fullscreen_quad_buffer(device);

        let flag_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("BlurFlag"),
            size: std::mem::size_of::<u32>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = sampled_texture_uniform_layout(device, std::mem::size_of::<u32>() as u64);
        let horizontal_bind_group =
            texture_uniform_bind_group(device, &layout, &screen_texture, &flag_buffer);
        let vertical_bind_group =
            texture_uniform_bind_group(device, &layout, &ping_pong, &flag_buffer);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("BlurShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/blur.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("BlurPipelineLayout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let horizontal_pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("BlurHorizontalPipeline")
            .with_fragment_entry("fs_horizontal")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();
        let vertical_pipeline = PipelineBuilder::new(device, &pipeline_layout, &shader)
            .with_label("BlurVerticalPipeline")
            .with_fragment_entry("fs_vertical")
            .with_vertex_buffer(quad_vertex_layout())
            .with_color_target(RENDER_FORMAT, None)
            .build();

        Self {
            device: device.clone(),
            queue: queue.clone(),
            screen_texture,
            ping_pong,
            quad,
            flag_buffer,
            layout,
            horizontal_bind_group,
            vertical_bind_group,
            horizontal_pipeline,
            vertical_pipeline,
            passes: BlurPasses::default(),
        }
    }

    /// Blurs `target` in place: horizontal pass target -> ping-pong,
    /// vertical pass ping-pong -> target. Both passes always run here;
    /// the pass toggles only affect the chain-style draw.
    pub fn apply(&self, target: &Texture) {
        let flag: u32 = 0;
        self.queue
            .write_buffer(&self.flag_buffer, 0, bytemuck::bytes_of(&flag));

        let horizontal =
            texture_uniform_bind_group(&self.device, &self.layout, target, &self.flag_buffer);
        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "BlurApplyHorizontal",
            &self.horizontal_pipeline,
            &self.quad,
            &[&horizontal],
            &self.ping_pong.view,
        );

        let vertical = texture_uniform_bind_group(
            &self.device,
            &self.layout,
            &self.ping_pong,
            &self.flag_buffer,
        );
        run_fullscreen_pass(
            &self.device,
            &self.queue,
            "BlurApplyVertical",
            &self.vertical_pipeline,
            &self.quad,
            &[&vertical],
            &target.view,
        );
    }
}

impl PostProcessEffect for BlurEffect {
    fn draw(&self, destination: &wgpu::TextureView, object_pass: bool) {
        let flag: u32 = if object_pass { 1 } else { 0 };
        self.queue
            .write_buffer(&self.flag_buffer, 0, bytemuck::bytes_of(&flag));

        if self.passes.contains(BlurPasses::HORIZONTAL) {
            // When the vertical pass follows, park the result in the
            // ping-pong surface; otherwise go straight to the destination.
            let target = if self.passes.contains(BlurPasses::VERTICAL) {
                &self.ping_pong.view
            } else {
                destination
            };
            run_fullscreen_pass(
                &self.device,
                &self.queue,
                "BlurHorizontalPass",
                &self.horizontal_pipeline,
                &self.quad,
                &[&self.horizontal_bind_group],
                target,
            );
        }

        if self.passes.contains(BlurPasses::VERTICAL) {
            run_fullscreen_pass(
                &self.device,
                &self.queue,
                "BlurVerticalPass",
                &self.vertical_pipeline,
                &self.quad,
                &[&self.vertical_bind_group],
                destination,
            );
        }
    }

    fn update_screen_texture(&mut self, input: &Texture) {
        self.screen_texture = input.clone();
        self.horizontal_bind_group = texture_uniform_bind_group(
            &self.device,
            &self.layout,
            &self.screen_texture,
            &self.flag_buffer,
        );
        self.vertical_bind_group = texture_uniform_bind_group(
            &self.device,
            &self.layout,
            &self.ping_pong,
            &self.flag_buffer,
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
    fn both_passes_enabled_by_default() {
        let passes = BlurPasses::default();
        assert!(passes.contains(BlurPasses::HORIZONTAL));
        assert!(passes.contains(BlurPasses::VERTICAL));
    }
}
