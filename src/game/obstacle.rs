use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::assets::{AssetRegistry, Sprite};
use crate::game::explosion::ExplosionPool;
use crate::game::CircleCollider;
use crate::renderer::SpriteRenderer;

const METEOR_KEYS: [&str; 12] = [
    "meteorBrown_big1",
    "meteorBrown_big2",
    "meteorBrown_big3",
    "meteorBrown_big4",
    "meteorBrown_med1",
    "meteorBrown_med3",
    "meteorGrey_big1",
    "meteorGrey_big2",
    "meteorGrey_big3",
    "meteorGrey_big4",
    "meteorGrey_med1",
    "meteorGrey_med2",
];

const METEOR_MIN_SPEED: f32 = 40.0;
const METEOR_MAX_SPEED: f32 = 130.0;
const SPAWN_INTERVAL: f32 = 0.6;
const MAX_POOL_SIZE: usize = 30;

/// One falling meteor. Slots stay allocated in the pool; `active` marks
/// whether this one is currently on screen.
pub struct Obstacle {
    sprite: Sprite,
    pub active: bool,
    speed: f32,
    rotation: f32,
    rotation_speed: f32,
    pub collider: CircleCollider,
}

impl Obstacle {
    fn new(assets: &AssetRegistry, rng: &mut SmallRng) -> Result<Self, String> {
        let key = METEOR_KEYS[rng.gen_range(0..METEOR_KEYS.len())];
        let sprite = assets.sprite(key)?;
        let collider = CircleCollider::from_rect(sprite.draw_rect);

        Ok(Self {
            sprite,
            active: true,
            speed: rng.gen_range(METEOR_MIN_SPEED..METEOR_MAX_SPEED),
            rotation: rng.gen_range(0.0..std::f32::consts::PI),
            rotation_speed: rng.gen_range(-1.0..1.0),
            collider,
        })
    }

    fn update(&mut self, dt: f32) {
        self.sprite.draw_rect.y += self.speed * dt;
        self.rotation += self.rotation_speed * dt;
        self.collider.update(self.sprite.draw_rect);
    }

    fn draw(&self, renderer: &mut SpriteRenderer) {
        renderer.draw_sprite_ex(
            &self.sprite.texture,
            self.sprite.draw_rect,
            self.sprite.source_rect,
            [1.0, 1.0, 1.0],
            self.rotation,
            // Spin about the sprite's center.
            Some(Vec2::new(0.5, 0.5)),
        );
    }
}

/// Spawns meteors on a timer and drives their collisions with the player.
///
/// Obstacles and explosions live in fixed-capacity arenas: a spawn
/// reactivates an inactive slot found by linear scan, allocates a new slot
/// only while the arena is below capacity, and is skipped otherwise.
pub struct ObstacleManager {
    pool: Vec<Obstacle>,
    explosions: ExplosionPool,
    time_to_spawn: f32,
    rng: SmallRng,
    game_width: f32,
    game_height: f32,
}

impl ObstacleManager {
    pub fn new(
        assets: &AssetRegistry,
        rng: SmallRng,
        game_width: f32,
        game_height: f32,
    ) -> Result<Self, String> {
        Ok(Self {
            pool: Vec::new(),
            explosions: ExplosionPool::new(assets)?,
            time_to_spawn: 0.0,
            rng,
            game_width,
            game_height,
        })
    }

    fn spawn_obstacle(&mut self, assets: &AssetRegistry) -> Result<(), String> {
        if self.time_to_spawn <= SPAWN_INTERVAL {
            return Ok(());
        }
        self.time_to_spawn = 0.0;

        let slot = match self.pool.iter().position(|o| !o.active) {
            Some(index) => &mut self.pool[index],
            None if self.pool.len() < MAX_POOL_SIZE => {
                let obstacle = Obstacle::new(assets, &mut self.rng)?;
                self.pool.push(obstacle);
                self.pool.last_mut().expect("just pushed")
            }
            // Arena full and every slot on screen; skip this spawn.
            None => return Ok(()),
        };

        slot.active = true;
        let width = slot.sprite.draw_rect.width;
        slot.sprite.draw_rect.x = self.rng.gen_range(0.0..(self.game_width - width).max(1.0));
        slot.sprite.draw_rect.y = -slot.sprite.draw_rect.height;
        Ok(())
    }

    pub fn update(
        &mut self,
        dt: f32,
        assets: &AssetRegistry,
        player: &CircleCollider,
    ) -> Result<(), String> {
        self.time_to_spawn += dt;
        self.spawn_obstacle(assets)?;

        let mut hits = Vec::new();
        for obstacle in self.pool.iter_mut().filter(|o| o.active) {
            obstacle.update(dt);

            if CircleCollider::intersects(&obstacle.collider, player) {
                hits.push(obstacle.sprite.draw_rect);
                obstacle.active = false;
            } else if obstacle.sprite.draw_rect.y > self.game_height {
                obstacle.active = false;
            }
        }
        for rect in hits {
            self.explosions.play(rect);
        }

        self.explosions.update(dt);
        Ok(())
    }

    pub fn draw(&self, renderer: &mut SpriteRenderer) {
        for obstacle in self.pool.iter().filter(|o| o.active) {
            obstacle.draw(renderer);
        }
        self.explosions.draw(renderer);
    }

    pub fn active_count(&self) -> usize {
        self.pool.iter().filter(|o| o.active).count()
    }
}
