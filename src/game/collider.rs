use crate::renderer::Rect;

/// Circle collision proxy inscribed in a sprite's draw rect.
#[derive(Debug, Clone, Copy)]
pub struct CircleCollider {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl CircleCollider {
    pub fn from_rect(draw_rect: Rect) -> Self {
        let radius = draw_rect.width.min(draw_rect.height) / 2.0;
        Self {
            x: draw_rect.x + radius,
            y: draw_rect.y + radius,
            radius,
        }
    }

    /// Re-centers the circle on the rect's current position.
    pub fn update(&mut self, draw_rect: Rect) {
        self.radius = draw_rect.width.min(draw_rect.height) / 2.0;
        self.x = draw_rect.x + self.radius;
        self.y = draw_rect.y + self.radius;
    }

    pub fn intersects(a: &CircleCollider, b: &CircleCollider) -> bool {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        let distance_squared = dx * dx + dy * dy;
        let radii = a.radius + b.radius;
        distance_squared <= radii * radii
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collider_is_inscribed_in_the_rect() {
        let collider = CircleCollider::from_rect(Rect::new(10.0, 20.0, 40.0, 60.0));
        assert_eq!(collider.radius, 20.0);
        assert_eq!((collider.x, collider.y), (30.0, 40.0));
    }

    #[test]
    fn overlapping_circles_intersect() {
        let a = CircleCollider {
            x: 0.0,
            y: 0.0,
            radius: 10.0,
        };
        let b = CircleCollider {
            x: 15.0,
            y: 0.0,
            radius: 10.0,
        };
        assert!(CircleCollider::intersects(&a, &b));
    }

    #[test]
    fn touching_circles_count_as_intersecting() {
        let a = CircleCollider {
            x: 0.0,
            y: 0.0,
            radius: 10.0,
        };
        let b = CircleCollider {
            x: 20.0,
            y: 0.0,
            radius: 10.0,
        };
        assert!(CircleCollider::intersects(&a, &b));
    }

    #[test]
    fn distant_circles_do_not_intersect() {
        let a = CircleCollider {
            x: 0.0,
            y: 0.0,
            radius: 10.0,
        };
        let b = CircleCollider {
            x: 25.0,
            y: 0.0,
            radius: 10.0,
        };
        assert!(!CircleCollider::intersects(&a, &b));
    }

    #[test]
    fn update_follows_a_moving_rect() {
        let mut collider = CircleCollider::from_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        collider.update(Rect::new(100.0, 50.0, 20.0, 20.0));
        assert_eq!((collider.x, collider.y), (110.0, 60.0));
    }
}
