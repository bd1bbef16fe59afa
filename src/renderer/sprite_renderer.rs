use glam::Vec2;

use crate::renderer::batch::SpriteBatcher;
use crate::renderer::buffers::{
    create_projection_buffer, create_quad_index_buffer, VertexBufferPool,
};
use crate::renderer::camera::{Camera2d, CameraUniform};
use crate::renderer::pipeline::PipelineCache;
use crate::renderer::texture::{Texture, TextureId};
use crate::renderer::vertex::INDICES_PER_SPRITE;
use crate::renderer::Rect;

const WHITE: [f32; 3] = [1.0, 1.0, 1.0];

/// The batching sprite renderer.
///
/// Per-frame lifecycle, in strict order:
/// 1. [`begin_frame`](Self::begin_frame) uploads the projection and clears
///    last frame's batches.
/// 2. [`draw_sprite`](Self::draw_sprite) /
///    [`draw_sprite_ex`](Self::draw_sprite_ex), any number of times.
/// 3. [`end_frame`](Self::end_frame) records one indexed draw per batch
///    into the render pass the host opened, then recycles the vertex
///    buffers used.
///
/// Sprites are drawn grouped by texture in the order each texture was first
/// seen that frame; only same-texture sprites preserve submission order.
pub struct SpriteRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    camera: Camera2d,
    projection_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    pipelines: PipelineCache,
    batcher: SpriteBatcher,
    pool: VertexBufferPool,
    current_texture: Option<TextureId>,
}

impl SpriteRenderer {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        let projection_buffer = create_projection_buffer(&device);
        let index_buffer = create_quad_index_buffer(&device);
        let pipelines = PipelineCache::new(&device, projection_buffer.clone());

        Self {
            device,
            queue,
            camera: Camera2d::new(width as f32, height as f32),
            projection_buffer,
            index_buffer,
            pipelines,
            batcher: SpriteBatcher::new(),
            pool: VertexBufferPool::new(),
            current_texture: None,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width as f32, height as f32);
    }

    /// Starts a frame: recomputes and uploads the orthographic projection,
    /// clears the texture-to-batches map, resets current-texture tracking.
    pub fn begin_frame(&mut self) {
        self.batcher.begin();
        self.current_texture = None;

        let uniform = CameraUniform::from_camera(&self.camera);
        self.queue
            .write_buffer(&self.projection_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draws the whole texture into `dest`, untinted and unrotated.
    pub fn draw_sprite(&mut self, texture: &Texture, dest: Rect) {
        let source = Rect::new(0.0, 0.0, texture.width as f32, texture.height as f32);
        self.draw_sprite_ex(texture, dest, source, WHITE, 0.0, None);
    }

    /// Draws the `source` region of `texture` (texel coordinates) into
    /// `dest` (screen coordinates), optionally tinted and rotated about
    /// `anchor` (normalized 0..1 within `dest`; top-left when `None`).
    pub fn draw_sprite_ex(
        &mut self,
        texture: &Texture,
        dest: Rect,
        source: Rect,
        tint: [f32; 3],
        rotation: f32,
        anchor: Option<Vec2>,
    ) {
        // Pipelines are keyed by texture identity, not by call order; the
        // current-texture check only skips redundant cache probes.
        if self.current_texture != Some(texture.id) {
            self.current_texture = Some(texture.id);
            self.pipelines.get_or_create(&self.device, texture);
        }

        self.batcher.submit(
            texture.id,
            (texture.width, texture.height),
            dest,
            source,
            tint,
            rotation,
            anchor,
        );
    }

    /// Ends the frame: for every non-empty batch, in first-seen texture
    /// order, uploads its staging vertices into a pooled buffer and records
    /// one indexed draw into `rpass`. All buffers used are returned to the
    /// pool afterwards; the draws are already recorded, so reuse next frame
    /// is safe.
    pub fn end_frame(&mut self, rpass: &mut wgpu::RenderPass<'_>) {
        self.batcher.finish();

        let mut used = Vec::new();
        for group in self.batcher.groups() {
            let pipeline = self
                .pipelines
                .get(group.texture)
                .expect("pipeline was created when the sprite was submitted");

            for batch in &group.batches {
                if batch.instance_count() == 0 {
                    continue;
                }

                let buffer = self.pool.acquire(&self.device);
                self.queue
                    .write_buffer(&buffer, 0, bytemuck::cast_slice(batch.vertices()));

                rpass.set_pipeline(&pipeline.pipeline);
                rpass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                rpass.set_vertex_buffer(0, buffer.slice(..));
                rpass.set_bind_group(0, &pipeline.projection_bind_group, &[]);
                rpass.set_bind_group(1, &pipeline.texture_bind_group, &[]);
                rpass.draw_indexed(
                    0..(INDICES_PER_SPRITE * batch.instance_count()) as u32,
                    0,
                    0..1,
                );

                used.push(buffer);
            }
        }

        self.pool.recycle(used);
    }

    pub fn batch_count(&self) -> usize {
        self.batcher.batch_count()
    }

    pub fn sprite_count(&self) -> usize {
        self.batcher.sprite_count()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn pooled_buffers(&self) -> usize {
        self.pool.available()
    }
}
