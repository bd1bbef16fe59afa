use crate::renderer::{Rect, Texture};

/// One texture-backed rectangular image instance.
///
/// The texture is shared (cloning the wrapper shares the GPU image); the
/// two rects are owned values. Registry lookups hand out fresh rect copies
/// so sprites built from the same atlas entry animate independently.
#[derive(Clone)]
pub struct Sprite {
    pub texture: Texture,
    /// Region of the texture to sample, in texel coordinates.
    pub source_rect: Rect,
    /// Where on screen to draw, in pixels.
    pub draw_rect: Rect,
}

impl Sprite {
    pub fn new(texture: Texture, source_rect: Rect, draw_rect: Rect) -> Self {
        Self {
            texture,
            source_rect,
            draw_rect,
        }
    }
}
