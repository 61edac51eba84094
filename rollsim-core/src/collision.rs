//! Circle vs static segment collision response.

use crate::engine::{Body, Segment};
use glam::Vec2;

/// Separations shorter than this have no usable push-out direction
pub const SEPARATION_EPSILON: f32 = 1e-6;

/// Bodies slower than this are treated as resting and get no impulse
pub const JITTER_SPEED: f32 = 0.1;

/// Outcome of one body/segment overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Closest point on the segment to the body center
    pub point: Vec2,
    pub normal: Vec2,
    pub overlap: f32,
    /// Whether the velocity impulse was applied
    pub impulse: bool,
}

/// Parametric position of the point on `segment` closest to `center`, and the
/// point itself. A zero-length segment always answers its first endpoint.
pub fn closest_point(segment: &Segment, center: Vec2) -> (f32, Vec2) {
    let ab = segment.p2 - segment.p1;
    let len_sq = ab.length_squared();
    let s = if len_sq > 0.0 {
        ((center - segment.p1).dot(ab) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (s, segment.p1 + s * ab)
}

/// Push `body` out of `segment` and bounce it.
///
/// Returns `None` when the body does not overlap the segment. The impulse
/// leaves the angular velocity untouched.
pub fn resolve(body: &mut Body, segment: &Segment, dt: f32) -> Option<Contact> {
    let (s, point) = closest_point(segment, body.pos);
    let pc = body.pos - point;
    let dist = pc.length();
    let overlap = body.radius - dist;

    if overlap <= 0.0 {
        return None;
    }

    let correction = if dist > SEPARATION_EPSILON {
        overlap * (pc / dist)
    } else {
        Vec2::ZERO
    };

    let normal = if s == 0.0 {
        -(body.pos - segment.p1).normalize_or_zero()
    } else if s == 1.0 {
        -(body.pos - segment.p2).normalize_or_zero()
    } else {
        let canonical = segment.normal();
        if pc.dot(canonical) < 0.0 {
            -canonical
        } else {
            canonical
        }
    };

    body.pos += correction;

    let impulse = body.speed() > JITTER_SPEED;
    if impulse {
        // contact velocity approximated along world x only
        let v_r = body.vel + Vec2::new(-body.angular_vel * body.radius, 0.0);
        let j = -(1.0 + body.restitution) * v_r.dot(normal) / (1.0 / body.mass);

        body.vel += (j / body.mass) * normal;
        body.pos += normal.perp() * (body.angular_vel * body.radius / 2.0 * dt);
    }

    Some(Contact {
        point,
        normal,
        overlap,
        impulse,
    })
}
