use crate::assets::AssetRegistry;
use crate::renderer::{Rect, SpriteRenderer, Texture};

const FRAME_COLS: u32 = 4;
const FRAME_ROWS: u32 = 4;
const FRAME_TIME: f32 = 1.0 / 30.0;

/// One playthrough of the explosion sheet animation. `playing` doubles as
/// the pool slot's free flag.
pub struct Explosion {
    pub playing: bool,
    time_to_next_frame: f32,
    current_col: u32,
    current_row: u32,
    draw_rect: Rect,
}

impl Explosion {
    fn new() -> Self {
        Self {
            playing: false,
            time_to_next_frame: 0.0,
            current_col: 0,
            current_row: 0,
            draw_rect: Rect::default(),
        }
    }

    fn play(&mut self, draw_rect: Rect) {
        self.playing = true;
        self.time_to_next_frame = 0.0;
        self.current_col = 0;
        self.current_row = 0;
        self.draw_rect = draw_rect;
    }

    fn update(&mut self, dt: f32) {
        if !self.playing {
            return;
        }

        self.time_to_next_frame += dt;
        if self.time_to_next_frame >= FRAME_TIME {
            self.time_to_next_frame -= FRAME_TIME;
            self.current_col += 1;
            if self.current_col >= FRAME_COLS {
                self.current_col = 0;
                self.current_row += 1;
                if self.current_row >= FRAME_ROWS {
                    self.current_row = 0;
                    self.playing = false;
                }
            }
        }
    }

    fn draw(&self, renderer: &mut SpriteRenderer, texture: &Texture) {
        let frame_width = (texture.width / FRAME_COLS) as f32;
        let frame_height = (texture.height / FRAME_ROWS) as f32;
        let source = Rect::new(
            self.current_col as f32 * frame_width,
            self.current_row as f32 * frame_height,
            frame_width,
            frame_height,
        );
        renderer.draw_sprite_ex(
            texture,
            self.draw_rect,
            source,
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
    }
}

/// Fixed-capacity arena of explosion animations sharing one sheet texture.
pub struct ExplosionPool {
    slots: Vec<Explosion>,
    texture: Texture,
}

const MAX_EXPLOSIONS: usize = 16;

impl ExplosionPool {
    pub fn new(assets: &AssetRegistry) -> Result<Self, String> {
        Ok(Self {
            slots: Vec::new(),
            texture: assets.texture("explosion")?.clone(),
        })
    }

    /// Starts an explosion over `draw_rect`, reusing a finished slot when
    /// one exists. When the arena is full and every slot is playing, the
    /// oldest-allocated slot is restarted rather than allocating past
    /// capacity.
    pub fn play(&mut self, draw_rect: Rect) {
        if let Some(slot) = self.slots.iter_mut().find(|e| !e.playing) {
            slot.play(draw_rect);
            return;
        }
        if self.slots.len() < MAX_EXPLOSIONS {
            let mut explosion = Explosion::new();
            explosion.play(draw_rect);
            self.slots.push(explosion);
            return;
        }
        self.slots[0].play(draw_rect);
    }

    pub fn update(&mut self, dt: f32) {
        for explosion in self.slots.iter_mut().filter(|e| e.playing) {
            explosion.update(dt);
        }
    }

    pub fn draw(&self, renderer: &mut SpriteRenderer) {
        for explosion in self.slots.iter().filter(|e| e.playing) {
            explosion.draw(renderer, &self.texture);
        }
    }

    pub fn playing_count(&self) -> usize {
        self.slots.iter().filter(|e| e.playing).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animation_walks_columns_then_rows_then_stops() {
        let mut explosion = Explosion::new();
        explosion.play(Rect::new(0.0, 0.0, 300.0, 300.0));

        // Step through all 16 frames.
        for _ in 0..(FRAME_COLS * FRAME_ROWS) {
            assert!(explosion.playing);
            explosion.update(FRAME_TIME);
        }
        assert!(!explosion.playing);
        assert_eq!((explosion.current_col, explosion.current_row), (0, 0));
    }

    #[test]
    fn update_accumulates_partial_frames() {
        let mut explosion = Explosion::new();
        explosion.play(Rect::default());
        explosion.update(FRAME_TIME * 0.5);
        assert_eq!(explosion.current_col, 0);
        explosion.update(FRAME_TIME * 0.6);
        assert_eq!(explosion.current_col, 1);
    }
}
