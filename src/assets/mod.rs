pub mod registry;
pub mod sprite;

pub use registry::AssetRegistry;
pub use sprite::Sprite;
