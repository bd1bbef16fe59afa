use std::collections::HashMap;
use std::mem;
use std::num::NonZeroU64;

use crate::renderer::camera::CameraUniform;
use crate::renderer::texture::{Texture, TextureId, RENDER_FORMAT};
use crate::renderer::vertex::SpriteVertex;
use crate::renderer::PipelineBuilder;

/// Blend state for sprite color output: classic source-over so transparent
/// sprite edges let the background through.
const SPRITE_BLEND: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::Zero,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Everything needed to draw batches of one texture: the compiled sprite
/// pipeline plus the two bind groups its layout expects (group 0 = shared
/// projection-view uniform, group 1 = this texture's sampler and view).
pub struct SpritePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub projection_bind_group: wgpu::BindGroup,
    pub texture_bind_group: wgpu::BindGroup,
}

impl SpritePipeline {
    fn new(cache: &PipelineCache, device: &wgpu::Device, texture: &Texture) -> Self {
        let texture_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SpriteTextureBindGroup"),
            layout: &cache.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
            ],
        });

        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ProjectionViewBindGroup"),
            layout: &cache.projection_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: cache.projection_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("SpritePipelineLayout"),
            bind_group_layouts: &[&cache.projection_layout, &cache.texture_layout],
            push_constant_ranges: &[],
        });

        // Two color targets: the scene image and the brightness image the
        // bloom effect reads back.
        let pipeline = PipelineBuilder::new(device, &pipeline_layout, &cache.shader)
            .with_label("SpritePipeline")
            .with_vertex_buffer(SpriteVertex::layout())
            .with_color_target(RENDER_FORMAT, Some(SPRITE_BLEND))
            .with_color_target(RENDER_FORMAT, Some(SPRITE_BLEND))
            .build();

        Self {
            pipeline,
            projection_bind_group,
            texture_bind_group,
        }
    }
}

/// Lazily builds one [`SpritePipeline`] per distinct texture identity and
/// keeps it for the texture's lifetime. Entries are never invalidated; a
/// texture that stops being drawn simply stops being looked up.
pub struct PipelineCache {
    shader: wgpu::ShaderModule,
    projection_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    projection_buffer: wgpu::Buffer,
    pipelines: HashMap<TextureId, SpritePipeline>,
}

impl PipelineCache {
    /// `projection_buffer` is the shared per-frame uniform every sprite
    /// pipeline binds at group 0.
    pub fn new(device: &wgpu::Device, projection_buffer: wgpu::Buffer) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("SpriteShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shader/sprite.wgsl").into()),
        });

        let projection_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ProjectionViewBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        NonZeroU64::new(mem::size_of::<CameraUniform>() as u64).unwrap(),
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("SpriteTextureBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });

        Self {
            shader,
            projection_layout,
            texture_layout,
            projection_buffer,
            pipelines: HashMap::new(),
        }
    }

    /// Idempotent per texture identity: the first call for a texture builds
    /// its pipeline, every later call returns the cached one.
    pub fn get_or_create(&mut self, device: &wgpu::Device, texture: &Texture) -> &SpritePipeline {
        if !self.pipelines.contains_key(&texture.id) {
            log::debug!(
                "Building sprite pipeline for texture {:?} ({}x{})",
                texture.id,
                texture.width,
                texture.height
            );
            let pipeline = SpritePipeline::new(self, device, texture);
            self.pipelines.insert(texture.id, pipeline);
        }
        &self.pipelines[&texture.id]
    }

    pub fn get(&self, texture: TextureId) -> Option<&SpritePipeline> {
        self.pipelines.get(&texture)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}
