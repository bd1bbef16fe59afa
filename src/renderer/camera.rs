use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Orthographic 2D camera with the origin at the top-left corner of the
/// screen and y growing downward, matching sprite pixel coordinates.
pub struct Camera2d {
    pub width: f32,
    pub height: f32,
}

impl Camera2d {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Projection-view matrix uploaded once per frame. The view is the
    /// identity; only the orthographic projection does work here.
    pub fn projection_view(&self) -> Mat4 {
        // left=0, right=width, bottom=height, top=0 flips y so screen
        // coordinates map directly to clip space. Near/far are -1/1.
        Mat4::orthographic_rh(0.0, self.width, self.height, 0.0, -1.0, 1.0)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection_view: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            projection_view: Mat4::IDENTITY.to_cols_array_2d(),
        }
    }

    pub fn from_camera(camera: &Camera2d) -> Self {
        Self {
            projection_view: camera.projection_view().to_cols_array_2d(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn camera_uniform_is_64_bytes() {
        // mat4x4<f32> = 16 * 4 bytes
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn origin_maps_to_top_left_of_clip_space() {
        let camera = Camera2d::new(800.0, 600.0);
        let m = camera.projection_view();

        let top_left = m * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((top_left.x - -1.0).abs() < 1e-6);
        assert!((top_left.y - 1.0).abs() < 1e-6);

        let bottom_right = m * Vec4::new(800.0, 600.0, 0.0, 1.0);
        assert!((bottom_right.x - 1.0).abs() < 1e-6);
        assert!((bottom_right.y - -1.0).abs() < 1e-6);
    }

    #[test]
    fn center_maps_to_clip_origin() {
        let camera = Camera2d::new(640.0, 480.0);
        let m = camera.projection_view();
        let center = m * Vec4::new(320.0, 240.0, 0.0, 1.0);
        assert!(center.x.abs() < 1e-6);
        assert!(center.y.abs() < 1e-6);
    }
}
