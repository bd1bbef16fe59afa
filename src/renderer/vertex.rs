use bytemuck::{Pod, Zeroable};
use std::mem;

/// Sprites a single batch can hold before the renderer spills into a new one.
pub const MAX_SPRITES_PER_BATCH: usize = 1000;
/// Four corners per sprite quad.
pub const VERTICES_PER_SPRITE: usize = 4;
/// Two triangles per sprite quad.
pub const INDICES_PER_SPRITE: usize = 6;

/// Interleaved sprite vertex: position, texture coordinate, tint.
/// Stride is 7 floats; the layout below must stay in sync with sprite.wgsl.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub tint: [f32; 3],
}

impl SpriteVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2,
        2 => Float32x3
    ];

    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<SpriteVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[inline]
pub fn v(position: [f32; 2], uv: [f32; 2], tint: [f32; 3]) -> SpriteVertex {
    SpriteVertex { position, uv, tint }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(
            SpriteVertex::layout().array_stride,
            mem::size_of::<SpriteVertex>() as wgpu::BufferAddress
        );
    }

    #[test]
    fn vertex_is_seven_floats() {
        // position(2) + uv(2) + tint(3), tightly packed
        assert_eq!(mem::size_of::<SpriteVertex>(), 7 * mem::size_of::<f32>());
    }
}
