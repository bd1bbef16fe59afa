use std::collections::HashMap;

use glam::{Affine2, Vec2};

use crate::renderer::texture::TextureId;
use crate::renderer::vertex::{v, SpriteVertex, MAX_SPRITES_PER_BATCH, VERTICES_PER_SPRITE};
use crate::renderer::Rect;

/// Staging vertices for up to [`MAX_SPRITES_PER_BATCH`] sprites sharing one
/// texture. When a batch fills up the batcher starts a new one; a batch
/// never grows past its capacity.
pub struct DrawBatch {
    vertices: Vec<SpriteVertex>,
}

impl DrawBatch {
    fn new() -> Self {
        Self {
            vertices: Vec::with_capacity(MAX_SPRITES_PER_BATCH * VERTICES_PER_SPRITE),
        }
    }

    pub fn instance_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_SPRITE
    }

    pub fn is_full(&self) -> bool {
        self.instance_count() >= MAX_SPRITES_PER_BATCH
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    fn push_sprite(&mut self, quad: [SpriteVertex; 4]) {
        debug_assert!(!self.is_full());
        self.vertices.extend_from_slice(&quad);
    }
}

/// All batches for one texture, in submission order.
pub struct TextureBatches {
    pub texture: TextureId,
    pub batches: Vec<DrawBatch>,
}

/// CPU side of the batching algorithm: groups per-frame sprite submissions
/// by texture identity, preserving the order each texture was first seen and
/// the submission order within a texture. Carries no GPU state so the
/// grouping, winding, UV and rotation math are testable directly.
pub struct SpriteBatcher {
    groups: Vec<TextureBatches>,
    index: HashMap<TextureId, usize>,
    frame_active: bool,
}

impl SpriteBatcher {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            index: HashMap::new(),
            frame_active: false,
        }
    }

    /// Starts a new frame, discarding all batches from the previous one.
    pub fn begin(&mut self) {
        self.groups.clear();
        self.index.clear();
        self.frame_active = true;
    }

    /// Records the frame as finished. Batches stay readable until the next
    /// [`begin`](Self::begin).
    pub fn finish(&mut self) {
        assert!(
            self.frame_active,
            "SpriteBatcher::finish called without a matching begin"
        );
        self.frame_active = false;
    }

    pub fn is_frame_active(&self) -> bool {
        self.frame_active
    }

    /// Appends one sprite quad to the texture's current batch.
    ///
    /// `texture_size` is the full texture's dimensions, used to normalize
    /// the texel-space `source` rect to 0..1 UVs. `anchor`, when given, is a
    /// normalized 0..1 offset within `dest` that the rotation pivots around;
    /// otherwise the top-left corner is the pivot.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        texture: TextureId,
        texture_size: (u32, u32),
        dest: Rect,
        source: Rect,
        tint: [f32; 3],
        rotation: f32,
        anchor: Option<Vec2>,
    ) {
        assert!(
            self.frame_active,
            "sprite submitted outside the begin/end frame lifecycle"
        );

        let group_index = *self.index.entry(texture).or_insert_with(|| {
            self.groups.push(TextureBatches {
                texture,
                batches: Vec::new(),
            });
            self.groups.len() - 1
        });
        let batches = &mut self.groups[group_index].batches;

        if batches.last().is_none_or(|batch| batch.is_full()) {
            batches.push(DrawBatch::new());
        }
        let batch = batches.last_mut().expect("batch list is non-empty");

        // Corner winding: top-left, top-right, bottom-right, bottom-left.
        let mut corners = [
            Vec2::new(dest.x, dest.y),
            Vec2::new(dest.right(), dest.y),
            Vec2::new(dest.right(), dest.bottom()),
            Vec2::new(dest.x, dest.bottom()),
        ];

        if rotation != 0.0 {
            let pivot = match anchor {
                Some(a) => Vec2::new(dest.x + a.x * dest.width, dest.y + a.y * dest.height),
                None => corners[0],
            };
            corners = rotate_about(corners, pivot, rotation);
        }

        let (tex_w, tex_h) = (texture_size.0 as f32, texture_size.1 as f32);
        let u0 = source.x / tex_w;
        let v0 = source.y / tex_h;
        let u1 = source.right() / tex_w;
        let v1 = source.bottom() / tex_h;

        batch.push_sprite([
            v(corners[0].into(), [u0, v0], tint),
            v(corners[1].into(), [u1, v0], tint),
            v(corners[2].into(), [u1, v1], tint),
            v(corners[3].into(), [u0, v1], tint),
        ]);
    }

    /// Texture groups in the order each texture was first submitted this
    /// frame. Within a group, batches and their vertices follow submission
    /// order. Overlapping sprites of *different* textures therefore do not
    /// necessarily composite in submission order; only same-texture sprites
    /// do.
    pub fn groups(&self) -> &[TextureBatches] {
        &self.groups
    }

    pub fn batch_count(&self) -> usize {
        self.groups.iter().map(|g| g.batches.len()).sum()
    }

    pub fn sprite_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.batches.iter())
            .map(|b| b.instance_count())
            .sum()
    }
}

impl Default for SpriteBatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Rotates all four corners with a single composed transform (translate the
/// pivot to the origin, rotate, translate back). One transform applied to
/// each corner keeps the quad rigid; rotating corners independently would
/// accumulate floating-point drift.
fn rotate_about(corners: [Vec2; 4], pivot: Vec2, angle: f32) -> [Vec2; 4] {
    let transform = Affine2::from_translation(pivot)
        * Affine2::from_angle(angle)
        * Affine2::from_translation(-pivot);
    corners.map(|corner| transform.transform_point2(corner))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEX: (u32, u32) = (100, 100);

    fn submit_plain(batcher: &mut SpriteBatcher, texture: TextureId, dest: Rect) {
        batcher.submit(
            texture,
            TEX,
            dest,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let (a, b) = (TextureId::next(), TextureId::next());
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        submit_plain(&mut batcher, b, Rect::new(0.0, 0.0, 1.0, 1.0));
        submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
        submit_plain(&mut batcher, b, Rect::new(0.0, 0.0, 1.0, 1.0));
        batcher.finish();

        let groups = batcher.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].texture, b);
        assert_eq!(groups[1].texture, a);
        assert_eq!(groups[0].batches[0].instance_count(), 2);
        assert_eq!(groups[1].batches[0].instance_count(), 1);
    }

    #[test]
    fn a_full_batch_does_not_spill() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        for _ in 0..MAX_SPRITES_PER_BATCH {
            submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
        }
        batcher.finish();

        let batches = &batcher.groups()[0].batches;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].instance_count(), MAX_SPRITES_PER_BATCH);
    }

    #[test]
    fn batch_spills_at_capacity() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        for _ in 0..MAX_SPRITES_PER_BATCH + 1 {
            submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
        }
        batcher.finish();

        let batches = &batcher.groups()[0].batches;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].instance_count(), MAX_SPRITES_PER_BATCH);
        assert_eq!(batches[1].instance_count(), 1);
    }

    #[test]
    #[should_panic(expected = "outside the begin/end frame lifecycle")]
    fn submit_without_begin_panics() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn begin_clears_previous_frame() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
        batcher.finish();
        batcher.begin();
        assert_eq!(batcher.batch_count(), 0);
        assert_eq!(batcher.sprite_count(), 0);
    }

    #[test]
    fn batch_count_is_sum_of_per_texture_spills() {
        let (a, b, c) = (TextureId::next(), TextureId::next(), TextureId::next());
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        for _ in 0..2500 {
            submit_plain(&mut batcher, a, Rect::new(0.0, 0.0, 1.0, 1.0));
        }
        submit_plain(&mut batcher, b, Rect::new(0.0, 0.0, 1.0, 1.0));
        for _ in 0..1500 {
            submit_plain(&mut batcher, c, Rect::new(0.0, 0.0, 1.0, 1.0));
        }
        batcher.finish();

        // ceil(2500/1000) + ceil(1/1000) + ceil(1500/1000)
        assert_eq!(batcher.batch_count(), 3 + 1 + 2);
        assert_eq!(batcher.sprite_count(), 2500 + 1 + 1500);
    }

    #[test]
    fn unrotated_corners_follow_the_fixed_winding() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        submit_plain(&mut batcher, a, Rect::new(10.0, 10.0, 20.0, 20.0));
        batcher.finish();

        let vertices = batcher.groups()[0].batches[0].vertices();
        let positions: Vec<[f32; 2]> = vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            vec![[10.0, 10.0], [30.0, 10.0], [30.0, 30.0], [10.0, 30.0]]
        );
    }

    #[test]
    fn source_rect_normalizes_to_uv() {
        let a = TextureId::next();
        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        batcher.submit(
            a,
            (100, 100),
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(0.0, 0.0, 50.0, 50.0),
            [1.0, 1.0, 1.0],
            0.0,
            None,
        );
        batcher.finish();

        let vertices = batcher.groups()[0].batches[0].vertices();
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
        assert_eq!(vertices[1].uv, [0.5, 0.0]);
        assert_eq!(vertices[2].uv, [0.5, 0.5]);
        assert_eq!(vertices[3].uv, [0.0, 0.5]);
    }

    #[test]
    fn rotating_by_pi_and_back_restores_the_corners() {
        let a = TextureId::next();
        let dest = Rect::new(10.0, 10.0, 20.0, 20.0);

        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        batcher.submit(
            a,
            TEX,
            dest,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            [1.0, 1.0, 1.0],
            std::f32::consts::PI,
            None,
        );
        batcher.finish();
        let rotated: Vec<Vec2> = batcher.groups()[0].batches[0]
            .vertices()
            .iter()
            .map(|v| Vec2::from(v.position))
            .collect();

        // Undoing the rotation about the same top-left anchor must land
        // back on the unrotated corners within float tolerance.
        let pivot = Vec2::new(dest.x, dest.y);
        let restored = rotate_about(
            [rotated[0], rotated[1], rotated[2], rotated[3]],
            pivot,
            -std::f32::consts::PI,
        );
        let expected = [
            Vec2::new(10.0, 10.0),
            Vec2::new(30.0, 10.0),
            Vec2::new(30.0, 30.0),
            Vec2::new(10.0, 30.0),
        ];
        for (restored, expected) in restored.iter().zip(expected) {
            assert!(
                (*restored - expected).length() < 1e-4,
                "corner {:?} did not return to {:?}",
                restored,
                expected
            );
        }
    }

    #[test]
    fn anchor_is_normalized_within_the_dest_rect() {
        let a = TextureId::next();
        let dest = Rect::new(0.0, 0.0, 10.0, 10.0);

        let mut batcher = SpriteBatcher::new();
        batcher.begin();
        batcher.submit(
            a,
            TEX,
            dest,
            Rect::new(0.0, 0.0, 100.0, 100.0),
            [1.0, 1.0, 1.0],
            std::f32::consts::PI,
            Some(Vec2::new(0.5, 0.5)),
        );
        batcher.finish();

        // A half-turn about the center swaps opposite corners.
        let vertices = batcher.groups()[0].batches[0].vertices();
        let tl = Vec2::from(vertices[0].position);
        let br = Vec2::from(vertices[2].position);
        assert!((tl - Vec2::new(10.0, 10.0)).length() < 1e-4);
        assert!((br - Vec2::new(0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn rotation_about_center_keeps_center_fixed() {
        let corners = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let rotated = rotate_about(corners, Vec2::new(1.0, 1.0), std::f32::consts::FRAC_PI_2);
        // 90 degrees about the center maps TL -> BL position.
        assert!((rotated[0] - Vec2::new(2.0, 0.0)).length() < 1e-5);
        let center = (rotated[0] + rotated[2]) * 0.5;
        assert!((center - Vec2::new(1.0, 1.0)).length() < 1e-5);
    }
}
