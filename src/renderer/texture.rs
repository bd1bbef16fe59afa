use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::renderer::Rect;

/// Color format used for every sprite texture and render target in the
/// crate. Keeping one format end to end lets any texture serve as either a
/// sampling source or an effect destination.
pub const RENDER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

static NEXT_TEXTURE_ID: AtomicU32 = AtomicU32::new(0);

/// Stable identity for one GPU image. Issued at construction and never
/// reused; the pipeline cache and the batcher key on this, not on texture
/// contents. Clones of a [`Texture`] wrapper share the id because they share
/// the underlying image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u32);

impl TextureId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A GPU image plus its sampling state and dimensions.
///
/// Cloning is cheap and shares the underlying resources; dropping the last
/// clone releases the GPU memory. Two separately created textures are never
/// considered equal, even when their pixels match.
#[derive(Debug, Clone)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    /// Load and decode an image file, then upload it.
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
    ) -> Result<Self, String> {
        let path = path.as_ref();
        log::info!("Loading texture: {:?}", path);

        let img = image::open(path)
            .map_err(|e| format!("asset load failed: could not decode {:?}: {}", path, e))?;

        Ok(Self::from_image(device, queue, &img, path.to_str()))
    }

    /// Upload a decoded image.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
    ) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        // The render format is BGRA; swizzle before upload.
        let mut data = rgba.into_raw();
        for px in data.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        Self::from_bytes(device, queue, &data, width, height, label)
    }

    /// Upload raw pixels already in the render format.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let texture = create_gpu_texture(device, width, height, RENDER_FORMAT, label);

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Self::wrap(device, texture, width, height, label)
    }

    /// An uninitialized texture usable as a render target, e.g. an effect's
    /// input surface or a ping-pong buffer.
    pub fn empty(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: Option<&str>,
    ) -> Self {
        let texture = create_gpu_texture(device, width, height, format, label);
        Self::wrap(device, texture, width, height, label)
    }

    /// A new texture holding only the given rectangle of `source`.
    ///
    /// The copy is enqueued on `queue`; any later read issued on the same
    /// queue observes the copied contents.
    pub fn region_copy(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        source: &Texture,
        rect: Rect,
    ) -> Result<Self, String> {
        let bounds = Rect::new(0.0, 0.0, source.width as f32, source.height as f32);
        if !rect.fits_within(bounds) {
            return Err(format!(
                "region copy {:?} exceeds source texture {}x{}",
                rect, source.width, source.height
            ));
        }

        let width = rect.width as u32;
        let height = rect.height as u32;
        let texture = create_gpu_texture(device, width, height, RENDER_FORMAT, Some("RegionCopy"));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("TextureRegionCopy"),
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: rect.x as u32,
                    y: rect.y as u32,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        Ok(Self::wrap(device, texture, width, height, Some("RegionCopy")))
    }

    /// A new texture with the same contents as `source` and independent
    /// backing memory. Used by per-object effects so they never write into
    /// the shared sprite sheet.
    pub fn full_copy(device: &wgpu::Device, queue: &wgpu::Queue, source: &Texture) -> Self {
        let texture = create_gpu_texture(
            device,
            source.width,
            source.height,
            source.texture.format(),
            Some("TextureCopy"),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("TextureFullCopy"),
        });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width: source.width,
                height: source.height,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(Some(encoder.finish()));

        Self::wrap(device, texture, source.width, source.height, Some("TextureCopy"))
    }

    fn wrap(
        device: &wgpu::Device,
        texture: wgpu::Texture,
        width: u32,
        height: u32,
        label: Option<&str>,
    ) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Nearest filtering: sprites are pixel art, no mipmaps.
        let sampler_label = label.map(|name| format!("{name} Sampler"));
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: sampler_label.as_deref(),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            id: TextureId::next(),
            width,
            height,
        }
    }
}

fn create_gpu_texture(
    device: &wgpu::Device,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    label: Option<&str>,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label,
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_ids_are_unique_and_ordered_per_issue() {
        let a = TextureId::next();
        let b = TextureId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn region_bounds_check_matches_rect_containment() {
        let bounds = Rect::new(0.0, 0.0, 128.0, 64.0);
        assert!(Rect::new(0.0, 0.0, 128.0, 64.0).fits_within(bounds));
        assert!(Rect::new(100.0, 32.0, 28.0, 32.0).fits_within(bounds));
        assert!(!Rect::new(100.0, 32.0, 29.0, 32.0).fits_within(bounds));
    }

    // Requires a GPU adapter; run with `cargo test -- --ignored`.
    #[test]
    #[ignore]
    fn copies_preserve_dimensions_and_get_fresh_identity() {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
                .expect("adapter");
            let (device, queue) = adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .expect("device");

            let data = vec![255u8; 8 * 8 * 4];
            let source = Texture::from_bytes(&device, &queue, &data, 8, 8, Some("Source"));

            let copy = Texture::full_copy(&device, &queue, &source);
            assert_eq!((copy.width, copy.height), (8, 8));
            assert_ne!(copy.id, source.id);

            let region =
                Texture::region_copy(&device, &queue, &source, Rect::new(2.0, 2.0, 4.0, 4.0))
                    .expect("region");
            assert_eq!((region.width, region.height), (4, 4));
            assert_ne!(region.id, source.id);

            let oob = Texture::region_copy(&device, &queue, &source, Rect::new(6.0, 6.0, 4.0, 4.0));
            assert!(oob.is_err());
        });
    }
}
