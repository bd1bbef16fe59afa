use crate::assets::{AssetRegistry, Sprite};
use crate::game::Drawable;
use crate::input::InputState;
use crate::renderer::{Rect, SpriteRenderer};

const SCROLL_SPEED: f32 = 25.0;

/// Vertically scrolling backdrop built from two screen-sized tiles of the
/// same texture; when the lead tile scrolls off, the two swap.
pub struct Background {
    tile: Sprite,
    follower: Sprite,
    game_height: f32,
}

impl Background {
    pub fn new(
        assets: &AssetRegistry,
        game_width: f32,
        game_height: f32,
    ) -> Result<Self, String> {
        let texture = assets.texture("background")?.clone();
        let source = Rect::new(0.0, 0.0, texture.width as f32, texture.height as f32);

        let tile = Sprite::new(
            texture.clone(),
            source,
            Rect::new(0.0, 0.0, game_width, game_height),
        );
        let follower = Sprite::new(
            texture,
            source,
            Rect::new(0.0, -game_height, game_width, game_height),
        );

        Ok(Self {
            tile,
            follower,
            game_height,
        })
    }
}

impl Drawable for Background {
    fn update(&mut self, dt: f32, _input: &InputState) {
        self.tile.draw_rect.y += SCROLL_SPEED * dt;
        self.follower.draw_rect.y = self.tile.draw_rect.y - self.tile.draw_rect.height;
        if self.tile.draw_rect.y >= self.game_height {
            std::mem::swap(&mut self.tile.draw_rect, &mut self.follower.draw_rect);
        }
    }

    fn draw(&self, renderer: &mut SpriteRenderer) {
        renderer.draw_sprite_ex(
            &self.tile.texture,
            self.tile.draw_rect,
            self.tile.source_rect,
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
        renderer.draw_sprite_ex(
            &self.follower.texture,
            self.follower.draw_rect,
            self.follower.source_rect,
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
    }
}
