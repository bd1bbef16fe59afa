use std::mem;

use wgpu::util::DeviceExt;

use crate::renderer::vertex::{
    SpriteVertex, INDICES_PER_SPRITE, MAX_SPRITES_PER_BATCH, VERTICES_PER_SPRITE,
};

/// Index pattern covering `sprite_count` quads: two triangles per sprite
/// reusing its four corners. Built once at renderer initialization; the
/// buffer it fills is shared by every batch and never resized.
pub fn quad_index_pattern(sprite_count: usize) -> Vec<u16> {
    let mut indices = Vec::with_capacity(sprite_count * INDICES_PER_SPRITE);
    for sprite in 0..sprite_count {
        let base = (sprite * VERTICES_PER_SPRITE) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    indices
}

pub fn create_quad_index_buffer(device: &wgpu::Device) -> wgpu::Buffer {
    let indices = quad_index_pattern(MAX_SPRITES_PER_BATCH);
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("SpriteIndexBuffer"),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    })
}

pub fn create_projection_buffer(device: &wgpu::Device) -> wgpu::Buffer {
    let initial = crate::renderer::CameraUniform::new();
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ProjectionViewBuffer"),
        contents: bytemuck::bytes_of(&initial),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Size in bytes of one pooled vertex buffer: a full batch's worth of
/// vertices, regardless of how many sprites the batch actually holds.
pub const fn batch_buffer_size() -> wgpu::BufferAddress {
    (MAX_SPRITES_PER_BATCH * VERTICES_PER_SPRITE * mem::size_of::<SpriteVertex>())
        as wgpu::BufferAddress
}

/// Free-list of full-capacity vertex buffers.
///
/// A buffer is either in flight (handed out for a batch being drawn this
/// frame) or sitting here. The renderer recycles every buffer it used only
/// after the frame's draw submissions are recorded, so a buffer is never
/// rewritten mid-frame.
pub struct VertexBufferPool {
    free: Vec<wgpu::Buffer>,
    allocated: usize,
}

impl VertexBufferPool {
    pub fn new() -> Self {
        Self {
            free: Vec::new(),
            allocated: 0,
        }
    }

    /// Pops a free buffer, or allocates a new full-capacity one when the
    /// pool is dry.
    pub fn acquire(&mut self, device: &wgpu::Device) -> wgpu::Buffer {
        if let Some(buffer) = self.free.pop() {
            return buffer;
        }

        self.allocated += 1;
        log::debug!("Allocating sprite vertex buffer #{}", self.allocated);
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("SpriteVertexBuffer"),
            size: batch_buffer_size(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Returns this frame's buffers to the free list.
    pub fn recycle(&mut self, buffers: impl IntoIterator<Item = wgpu::Buffer>) {
        self.free.extend(buffers);
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total buffers ever allocated, in flight or free.
    pub fn allocated(&self) -> usize {
        self.allocated
    }
}

impl Default for VertexBufferPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_pattern_interleaves_two_triangles_per_sprite() {
        let indices = quad_index_pattern(2);
        assert_eq!(indices.len(), 12);
        assert_eq!(&indices[..6], &[0, 1, 2, 2, 3, 0]);
        assert_eq!(&indices[6..], &[4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn index_pattern_covers_max_batch_within_u16() {
        let indices = quad_index_pattern(MAX_SPRITES_PER_BATCH);
        assert_eq!(indices.len(), MAX_SPRITES_PER_BATCH * INDICES_PER_SPRITE);
        // The largest index referenced must fit in the u16 index format.
        let max = *indices.iter().max().unwrap();
        assert_eq!(max as usize, MAX_SPRITES_PER_BATCH * VERTICES_PER_SPRITE - 1);
    }

    #[test]
    fn batch_buffer_holds_one_full_batch() {
        assert_eq!(
            batch_buffer_size(),
            (1000 * 4 * 28) as wgpu::BufferAddress
        );
    }

    // Requires a GPU adapter; run with `cargo test -- --ignored`.
    #[test]
    #[ignore]
    fn pool_recycles_exactly_what_a_frame_used() {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .expect("adapter");
            let (device, _queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .expect("device");

            let mut pool = VertexBufferPool::new();

            // First frame draws three batches from an empty pool.
            let used: Vec<_> = (0..3).map(|_| pool.acquire(&device)).collect();
            assert_eq!(pool.available(), 0);
            assert_eq!(pool.allocated(), 3);
            pool.recycle(used);
            assert_eq!(pool.available(), 3);

            // Next frame's first three requests are served without new
            // allocations.
            let used: Vec<_> = (0..3).map(|_| pool.acquire(&device)).collect();
            assert_eq!(pool.allocated(), 3);
            pool.recycle(used);
            assert_eq!(pool.available(), 3);
        });
    }
}
