use crate::assets::Sprite;
use crate::renderer::postprocess::{EffectChain, OBJECT_FX_SIZE};
use crate::renderer::texture::{Texture, RENDER_FORMAT};

/// A post-render effect chain scoped to one drawable.
///
/// Construction replaces the sprite's texture with a private copy so the
/// effects never write into the shared sprite sheet, and keeps a pristine
/// copy to feed the chain each frame. After the screen-wide chain has run,
/// [`apply`](Self::apply) pipes pristine copy -> effects -> the sprite's
/// texture, so the next frame's sprite pass draws the processed image.
pub struct SpriteEffects {
    chain: EffectChain,
    shader_source: Texture,
    scratch: Texture,
}

impl SpriteEffects {
    /// Builds the chain from `keys` (failures are logged and skipped, like
    /// the screen-wide chain) and re-points `sprite` at its private texture
    /// copy.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        keys: &[String],
        sprite: &mut Sprite,
    ) -> Self {
        let mut chain = EffectChain::new(
            device.clone(),
            queue.clone(),
            OBJECT_FX_SIZE,
            OBJECT_FX_SIZE,
        );
        chain.build_from_keys(keys, None);

        sprite.texture = Texture::full_copy(device, queue, &sprite.texture);
        let shader_source = Texture::full_copy(device, queue, &sprite.texture);
        let scratch = Texture::empty(
            device,
            OBJECT_FX_SIZE,
            OBJECT_FX_SIZE,
            RENDER_FORMAT,
            Some("SpriteFxScratch"),
        );

        Self {
            chain,
            shader_source,
            scratch,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Runs the chain once over the sprite's image. The final stage writes
    /// into the sprite's texture copy; everything upstream goes through the
    /// scratch surface.
    pub fn apply(&mut self, sprite: &Sprite) {
        if self.chain.is_empty() {
            return;
        }

        let scratch = self.scratch.clone();
        let mut current = self.shader_source.clone();
        for effect in self.chain.effects_mut().iter_mut() {
            effect.update_screen_texture(&current);
            effect.draw(&scratch.view, true);
            current = scratch.clone();
        }

        let last = self
            .chain
            .effects_mut()
            .last_mut()
            .expect("chain is non-empty");
        last.update_screen_texture(&current);
        last.draw(&sprite.texture.view, true);
    }
}
