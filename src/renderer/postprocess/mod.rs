//! Full-screen post-processing: an ordered chain of effects, each consuming
//! the previous effect's output texture and drawing a screen-covering quad
//! into the next surface. The last effect in the chain writes to the
//! presentation surface.

mod bloom;
mod blur;
mod combine;
mod grayscale;
mod sprite_fx;
mod wobble;

pub use bloom::BloomEffect;
pub use blur::{BlurEffect, BlurPasses};
pub use combine::CombineEffect;
pub use grayscale::GrayscaleEffect;
pub use sprite_fx::SpriteEffects;
pub use wobble::WobbleEffect;

use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::renderer::texture::Texture;

/// Default edge length of the intermediate surfaces used by per-object
/// effect chains.
pub const OBJECT_FX_SIZE: u32 = 1024;

/// Contract shared by every effect variant. All methods are required; a
/// variant that has no use for `object_pass` simply ignores it.
pub trait PostProcessEffect {
    /// Applies the effect to its current input, writing into `destination`.
    /// `object_pass` is true when the effect runs inside a per-object chain
    /// rather than over the whole screen; it only toggles an internal
    /// uniform, never the algorithm.
    fn draw(&self, destination: &wgpu::TextureView, object_pass: bool);

    /// Re-points the effect's input texture without rebuilding its
    /// pipeline. Used when chaining: the previous stage's output becomes
    /// this stage's input.
    fn update_screen_texture(&mut self, input: &Texture);

    /// The surface the *previous* stage (or the sprite pass) renders into
    /// to feed this effect.
    fn screen_texture(&self) -> &Texture;
}

/// The closed set of effect keys. Unrecognized keys are a construction-time
/// error, never a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Grayscale,
    Blur,
    Bloom,
    Wobble,
    Combine,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::Grayscale,
        EffectKind::Blur,
        EffectKind::Bloom,
        EffectKind::Wobble,
        EffectKind::Combine,
    ];

    pub fn key(self) -> &'static str {
        match self {
            EffectKind::Grayscale => "grayscale",
            EffectKind::Blur => "blur",
            EffectKind::Bloom => "bloom",
            EffectKind::Wobble => "wobble",
            EffectKind::Combine => "combine",
        }
    }
}

impl FromStr for EffectKind {
    type Err = String;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        EffectKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| format!("unknown post-processing effect key: {:?}", key))
    }
}

/// Ordered list of effects. Order is fixed at construction and is the
/// execution order: effect i draws into effect i+1's input surface, the
/// last effect draws to the presentation surface.
pub struct EffectChain {
    device: wgpu::Device,
    queue: wgpu::Queue,
    width: u32,
    height: u32,
    effects: Vec<Box<dyn PostProcessEffect>>,
    brightness: Option<Texture>,
}

impl EffectChain {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, width: u32, height: u32) -> Self {
        Self {
            device,
            queue,
            width,
            height,
            effects: Vec::new(),
            brightness: None,
        }
    }

    /// Builds one effect and appends it. `overlay` supplies the second
    /// texture for [`EffectKind::Combine`]; requesting a combine effect
    /// without one is a construction error.
    pub fn push(&mut self, kind: EffectKind, overlay: Option<&Texture>) -> Result<(), String> {
        let effect: Box<dyn PostProcessEffect> = match kind {
            EffectKind::Grayscale => Box::new(GrayscaleEffect::new(
                &self.device,
                &self.queue,
                self.width,
                self.height,
            )),
            EffectKind::Blur => Box::new(BlurEffect::new(
                &self.device,
                &self.queue,
                self.width,
                self.height,
            )),
            EffectKind::Bloom => {
                let bloom = BloomEffect::new(&self.device, &self.queue, self.width, self.height);
                self.brightness = Some(bloom.brightness_texture().clone());
                Box::new(bloom)
            }
            EffectKind::Wobble => Box::new(WobbleEffect::new(
                &self.device,
                &self.queue,
                self.width,
                self.height,
            )),
            EffectKind::Combine => {
                let overlay = overlay.ok_or_else(|| {
                    "combine effect requested without an overlay texture".to_string()
                })?;
                Box::new(CombineEffect::new(
                    &self.device,
                    &self.queue,
                    self.width,
                    self.height,
                    overlay,
                ))
            }
        };

        log::info!("Post-processing effect added: {}", kind.key());
        self.effects.push(effect);
        Ok(())
    }

    /// Builds the chain from configuration keys. A key that fails to parse
    /// or an effect that fails to build is logged and skipped; the rest of
    /// the chain still comes up. One bad effect must not blank the screen.
    pub fn build_from_keys(&mut self, keys: &[String], overlay: Option<&Texture>) {
        for key in keys {
            let result = EffectKind::from_str(key).and_then(|kind| self.push(kind, overlay));
            if let Err(err) = result {
                log::error!("Skipping post-processing effect {:?}: {}", key, err);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Effect lookup by position; out-of-range is a configuration error.
    pub fn get(&self, index: usize) -> Result<&dyn PostProcessEffect, String> {
        self.effects
            .get(index)
            .map(|e| e.as_ref())
            .ok_or_else(|| format!("invalid effect index: {}", index))
    }

    pub fn effects_mut(&mut self) -> &mut [Box<dyn PostProcessEffect>] {
        &mut self.effects
    }

    /// The surface the sprite pass must render into so the chain picks the
    /// frame up, or `None` when the chain is empty and the sprite pass
    /// should target the presentation surface directly.
    pub fn first_target(&self) -> Option<&Texture> {
        self.effects.first().map(|e| e.screen_texture())
    }

    /// The brightness image the sprite pass's second color output feeds,
    /// present when the chain contains a bloom effect.
    pub fn brightness_target(&self) -> Option<&Texture> {
        self.brightness.as_ref()
    }

    /// Runs every effect in order. Each effect submits its own commands;
    /// queue submission order guarantees effect N reads effect N-1's
    /// completed output.
    pub fn execute(&self, surface_view: &wgpu::TextureView) {
        let count = self.effects.len();
        for i in 0..count {
            let destination = if i + 1 < count {
                self.effects[i + 1].screen_texture().view.clone()
            } else {
                surface_view.clone()
            };
            self.effects[i].draw(&destination, false);
        }
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing for the fullscreen passes.

/// Vertex of the screen-covering quad: clip-space position plus UV.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    position: [f32; 2],
    uv: [f32; 2],
}

const fn qv(x: f32, y: f32, u: f32, v: f32) -> QuadVertex {
    QuadVertex {
        position: [x, y],
        uv: [u, v],
    }
}

/// Two triangles covering clip space, UV origin at the top-left.
pub(crate) const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    qv(-1.0, 1.0, 0.0, 0.0),
    qv(1.0, 1.0, 1.0, 0.0),
    qv(-1.0, -1.0, 0.0, 1.0),
    qv(-1.0, -1.0, 0.0, 1.0),
    qv(1.0, 1.0, 1.0, 0.0),
    qv(1.0, -1.0, 1.0, 1.0),
];

pub(crate) fn create_fullscreen_quad_buffer(device: &wgpu::Device) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("FullscreenQuad"),
        contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

pub(crate) fn quad_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2,
        1 => Float32x2
    ];
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &ATTRS,
    }
}

/// Sampler + texture, the minimal input layout for single-texture passes.
pub(crate) fn sampled_texture_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("EffectTextureLayout"),
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
    })
}

/// Sampler + texture + one small uniform, for passes carrying a per-draw
/// flag or parameter.
pub(crate) fn sampled_texture_uniform_layout(
    device: &wgpu::Device,
    uniform_size: u64,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("EffectTextureUniformLayout"),
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
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            },
        ],
    })
}

pub(crate) fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("EffectTextureBindGroup"),
        layout,
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
    })
}

pub(crate) fn texture_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
    uniform: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("EffectTextureUniformBindGroup"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
    })
}

/// Records and submits one fullscreen pass: clear the target, draw the quad
/// with the given pipeline and bind groups.
pub(crate) fn run_fullscreen_pass(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    pipeline: &wgpu::RenderPipeline,
    quad: &wgpu::Buffer,
    bind_groups: &[&wgpu::BindGroup],
    target: &wgpu::TextureView,
) {
    let mut encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_vertex_buffer(0, quad.slice(..));
        for (index, group) in bind_groups.iter().enumerate() {
            pass.set_bind_group(index as u32, *group, &[]);
        }
        pass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
    }
    queue.submit(Some(encoder.finish()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_key() {
        for kind in EffectKind::ALL {
            assert_eq!(EffectKind::from_str(kind.key()).unwrap(), kind);
        }
    }

    #[test]
    fn unknown_key_is_a_configuration_error() {
        let err = EffectKind::from_str("neonFX").unwrap_err();
        assert!(err.contains("neonFX"));
    }

    #[test]
    fn quad_covers_clip_space_with_top_left_uv_origin() {
        // The top-left corner of the screen is clip (-1, 1) and UV (0, 0).
        assert_eq!(FULLSCREEN_QUAD[0].position, [-1.0, 1.0]);
        assert_eq!(FULLSCREEN_QUAD[0].uv, [0.0, 0.0]);
        // The bottom-right corner is clip (1, -1) and UV (1, 1).
        assert_eq!(FULLSCREEN_QUAD[5].position, [1.0, -1.0]);
        assert_eq!(FULLSCREEN_QUAD[5].uv, [1.0, 1.0]);
    }
}
