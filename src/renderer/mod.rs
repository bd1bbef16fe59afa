pub mod batch;
pub mod buffers;
pub mod camera;
pub mod gpu;
pub mod pipeline;
pub mod pipeline_builder;
pub mod postprocess;
pub mod rect;
pub mod sprite_renderer;
pub mod texture;
pub mod vertex;

pub use batch::{DrawBatch, SpriteBatcher};
pub use camera::{Camera2d, CameraUniform};
pub use gpu::Gpu;
pub use pipeline::{PipelineCache, SpritePipeline};
pub use pipeline_builder::PipelineBuilder;
pub use rect::Rect;
pub use sprite_renderer::SpriteRenderer;
pub use texture::{Texture, TextureId, RENDER_FORMAT};
pub use vertex::SpriteVertex;
