//! Keeping the marker inside the circular stage.

use glam::Vec2;

/// Result of bouncing a move off the stage edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reflection {
    pub position: Vec2,
    /// Inward unit normal at the contact point, `None` when the move was
    /// degenerate and the target was only clamped.
    pub normal: Option<Vec2>,
}

/// Scale `p` onto the circle of radius `r`; the origin stays put.
#[inline]
pub fn clamp_to_radius(p: Vec2, r: f32) -> Vec2 {
    p.normalize_or_zero() * r
}

/// Specular reflection of the move `current -> target` off a circle of
/// radius `max_radius` centred on the origin.
///
/// The overshoot past the contact point is mirrored about the inward normal.
/// A result still outside the circle is pulled in to `inner_fraction *
/// max_radius`. `current` is expected to be inside the circle.
pub fn reflect_off_boundary(
    current: Vec2,
    target: Vec2,
    max_radius: f32,
    inner_fraction: f32,
) -> Reflection {
    let inner = max_radius * inner_fraction;
    let clamped = Reflection {
        position: clamp_to_radius(target, inner),
        normal: None,
    };
    let Some(dir) = (target - current).try_normalize() else {
        return clamped;
    };

    // |current + dir * s| = max_radius, dir is unit length so a = 1
    let b = 2.0 * current.dot(dir);
    let c = current.length_squared() - max_radius * max_radius;
    let disc = b * b - 4.0 * c;
    if disc < 0.0 {
        return clamped;
    }
    let s = (-b + disc.sqrt()) * 0.5;
    let hit = current + dir * s;
    let Some(outward) = hit.try_normalize() else {
        return clamped;
    };
    let normal = -outward;

    let overshoot = target - hit;
    let reflected = overshoot - normal * (2.0 * overshoot.dot(normal));
    let mut position = hit + reflected;
    if position.length() > max_radius {
        position = clamp_to_radius(position, inner);
    }
    Reflection {
        position,
        normal: Some(normal),
    }
}

/// Position-only form of [`reflect_off_boundary`].
#[inline]
pub fn mirror_at_boundary(
    current: Vec2,
    target: Vec2,
    max_radius: f32,
    inner_fraction: f32,
) -> Vec2 {
    reflect_off_boundary(current, target, max_radius, inner_fraction).position
}

/// Mirror a velocity about a unit normal.
#[inline]
pub fn reflect_velocity(v: Vec2, normal: Vec2) -> Vec2 {
    v - normal * (2.0 * v.dot(normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radial_overshoot_bounces_back_inside() {
        let p = mirror_at_boundary(Vec2::new(4.0, 0.0), Vec2::new(6.0, 0.0), 5.0, 0.95);
        assert!((p - Vec2::new(4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn oblique_overshoot_stays_within_radius() {
        let p = mirror_at_boundary(Vec2::new(3.0, 3.0), Vec2::new(7.0, 1.0), 5.0, 0.95);
        assert!(p.length() <= 5.0 + 1e-4);
    }

    #[test]
    fn degenerate_move_clamps_target() {
        let t = Vec2::new(8.0, 0.0);
        let p = mirror_at_boundary(t, t, 5.0, 0.95);
        assert!((p - Vec2::new(4.75, 0.0)).length() < 1e-5);
        let p = mirror_at_boundary(t, t, 5.0, 0.8);
        assert!((p - Vec2::new(4.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn velocity_reflects_about_normal() {
        let v = reflect_velocity(Vec2::new(1.0, 1.0), Vec2::new(-1.0, 0.0));
        assert!((v - Vec2::new(-1.0, 1.0)).length() < 1e-6);
    }
}
