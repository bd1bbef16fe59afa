pub mod background;
pub mod collider;
pub mod explosion;
pub mod obstacle;
pub mod player;

pub use background::Background;
pub use collider::CircleCollider;
pub use obstacle::ObstacleManager;
pub use player::Player;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::assets::AssetRegistry;
use crate::input::InputState;
use crate::renderer::SpriteRenderer;
use crate::settings::RenderSettings;

/// Contract between game objects and the frame driver. The driver calls
/// `update` on every drawable, then `draw` once per frame, and finally
/// `post_render` after the screen-wide effect chain has run; that is where
/// an object applies its private effect chain to its own texture copy.
pub trait Drawable {
    fn update(&mut self, dt: f32, input: &InputState);
    fn draw(&self, renderer: &mut SpriteRenderer);
    fn post_render(&mut self, _time: f32) {}
}

/// The demo world: scrolling background, player ship, falling meteors.
pub struct World {
    background: Background,
    player: Player,
    obstacles: ObstacleManager,
}

impl World {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        assets: &AssetRegistry,
        settings: &RenderSettings,
    ) -> Result<Self, String> {
        let width = settings.resolution.width as f32;
        let height = settings.resolution.height as f32;

        let background = Background::new(assets, width, height)?;
        let player = Player::new(
            device,
            queue,
            assets,
            &settings.sprite_effects,
            width,
            height,
        )?;
        let obstacles =
            ObstacleManager::new(assets, SmallRng::from_entropy(), width, height)?;

        Ok(Self {
            background,
            player,
            obstacles,
        })
    }

    pub fn update(&mut self, dt: f32, input: &InputState, assets: &AssetRegistry) {
        self.background.update(dt, input);
        self.player.update(dt, input);
        if let Err(err) = self
            .obstacles
            .update(dt, assets, self.player.collider())
        {
            log::error!("Obstacle update failed: {}", err);
        }
    }

    /// Painter's order: backdrop first, then meteors, player on top.
    pub fn draw(&self, renderer: &mut SpriteRenderer) {
        self.background.draw(renderer);
        self.obstacles.draw(renderer);
        self.player.draw(renderer);
    }

    /// Per-object effect chains run after the screen-wide chain.
    pub fn post_render(&mut self, time: f32) {
        self.player.post_render(time);
    }
}
