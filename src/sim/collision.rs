//! Narrow-phase collision resolution for bubble pairs
//!
//! The broad phase hands us *candidate* pairs; this module does the exact
//! circle-vs-circle test and computes the positional and velocity response.
//! Responses are returned as deltas rather than applied in place so the
//! caller controls when (and to which slice elements) they land.

use glam::Vec2;

/// Restitution for bubble-on-bubble bounces
const RESTITUTION: f32 = 0.9;

/// Exact circle overlap test
#[inline]
pub fn detect_collision(pos_a: Vec2, pos_b: Vec2, radius_a: f32, radius_b: f32) -> bool {
    let sum = radius_a + radius_b;
    pos_a.distance_squared(pos_b) < sum * sum
}

/// Deltas to apply to both bodies of a colliding pair.
///
/// Displacements separate the circles, split by inverse mass so heavier
/// bodies move less. Velocity changes are a restitution impulse along the
/// contact normal. Both are additive, so resolving the same pair twice (the
/// broad phase can emit a pair once per shared cell) only pushes a little
/// harder instead of corrupting anything.
#[derive(Debug, Clone, Copy)]
pub struct CollisionResponse {
    pub displacement_a: Vec2,
    pub displacement_b: Vec2,
    pub velocity_change_a: Vec2,
    pub velocity_change_b: Vec2,
}

/// Resolve an overlapping circle pair, or `None` when they don't touch.
#[allow(clippy::too_many_arguments)]
pub fn resolve_collision(
    pos_a: Vec2,
    pos_b: Vec2,
    vel_a: Vec2,
    vel_b: Vec2,
    radius_a: f32,
    radius_b: f32,
    mass_a: f32,
    mass_b: f32,
) -> Option<CollisionResponse> {
    let sum_radii = radius_a + radius_b;
    let delta = pos_b - pos_a;
    let dist_sq = delta.length_squared();

    if dist_sq >= sum_radii * sum_radii {
        return None;
    }

    let dist = dist_sq.sqrt();
    // Coincident centers: pick an arbitrary separation axis
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    let overlap = sum_radii - dist;

    let total_mass = mass_a + mass_b;
    let displacement_a = -normal * overlap * (mass_b / total_mass);
    let displacement_b = normal * overlap * (mass_a / total_mass);

    // Impulse only when the pair is closing; separating pairs still get the
    // positional correction above
    let closing_speed = (vel_b - vel_a).dot(normal);
    let (velocity_change_a, velocity_change_b) = if closing_speed < 0.0 {
        let impulse =
            normal * (-(1.0 + RESTITUTION) * closing_speed / (1.0 / mass_a + 1.0 / mass_b));
        (-impulse / mass_a, impulse / mass_b)
    } else {
        (Vec2::ZERO, Vec2::ZERO)
    };

    Some(CollisionResponse {
        displacement_a,
        displacement_b,
        velocity_change_a,
        velocity_change_b,
    })
}
