use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::assets::{AssetRegistry, Sprite};
use crate::game::{CircleCollider, Drawable};
use crate::input::InputState;
use crate::renderer::postprocess::SpriteEffects;
use crate::renderer::SpriteRenderer;

const PLAYER_SPRITE: &str = "playerShip1_blue";
const PLAYER_SPEED: f32 = 250.0;

/// Keyboard-driven player ship. Carries the demo's per-object effect chain
/// when `sprite_effects` is configured.
pub struct Player {
    sprite: Sprite,
    collider: CircleCollider,
    effects: Option<SpriteEffects>,
    game_width: f32,
    game_height: f32,
}

impl Player {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetRegistry,
        sprite_effect_keys: &[String],
        game_width: f32,
        game_height: f32,
    ) -> Result<Self, String> {
        let mut sprite = assets.sprite(PLAYER_SPRITE)?;
        sprite.draw_rect.x = 130.0;
        sprite.draw_rect.y = 100.0;

        let collider = CircleCollider::from_rect(sprite.draw_rect);
        let effects = if sprite_effect_keys.is_empty() {
            None
        } else {
            Some(SpriteEffects::new(device, queue, sprite_effect_keys, &mut sprite))
        };

        Ok(Self {
            sprite,
            collider,
            effects,
            game_width,
            game_height,
        })
    }

    pub fn collider(&self) -> &CircleCollider {
        &self.collider
    }

    fn clamp_to_screen(&mut self) {
        let rect = &mut self.sprite.draw_rect;
        rect.x = rect.x.clamp(0.0, self.game_width - rect.width);
        rect.y = rect.y.clamp(0.0, self.game_height - rect.height);
    }
}

impl Drawable for Player {
    fn update(&mut self, dt: f32, input: &InputState) {
        let mut direction = Vec2::ZERO;
        if input.is_down(KeyCode::KeyW) {
            direction.y = -1.0;
        }
        if input.is_down(KeyCode::KeyS) {
            direction.y = 1.0;
        }
        if input.is_down(KeyCode::KeyA) {
            direction.x = -1.0;
        }
        if input.is_down(KeyCode::KeyD) {
            direction.x = 1.0;
        }

        let direction = direction.normalize_or_zero();
        self.sprite.draw_rect.x += direction.x * PLAYER_SPEED * dt;
        self.sprite.draw_rect.y += direction.y * PLAYER_SPEED * dt;
        self.clamp_to_screen();

        self.collider.update(self.sprite.draw_rect);
    }

    fn draw(&self, renderer: &mut SpriteRenderer) {
        renderer.draw_sprite_ex(
            &self.sprite.texture,
            self.sprite.draw_rect,
            self.sprite.source_rect,
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
    }

    fn post_render(&mut self, _time: f32) {
        if let Some(effects) = self.effects.as_mut() {
            effects.apply(&self.sprite);
        }
    }
}
