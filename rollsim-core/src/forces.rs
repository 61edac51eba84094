//! Force model: gravity, quadratic air drag and linear springs.

use crate::engine::{Body, BodyHandle, Spring};
use glam::Vec2;

/// Drag coefficient of a sphere
pub const DRAG_COEFFICIENT: f32 = 0.47;

/// Uniform forces acting on every body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub gravity: Vec2,
    pub air_density: f32,
}

impl Environment {
    pub fn new(gravity: Vec2, air_density: f32) -> Self {
        Self {
            gravity,
            air_density,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -100.0),
            air_density: 0.005,
        }
    }
}

/// Sum of spring forces on `body`, evaluated as if it were displaced by `dx`.
///
/// Springs that do not touch `handle` are skipped, as are springs whose other
/// end is missing from `bodies`. A spring from a body to itself uses `body`
/// as its own partner.
pub fn spring_force(
    handle: BodyHandle,
    body: &Body,
    bodies: &[Body],
    springs: &[Spring],
    dx: Vec2,
) -> Vec2 {
    let mut total = Vec2::ZERO;

    for spring in springs {
        let Some(other) = spring.other(handle) else {
            continue;
        };
        let other_pos = if other == handle {
            body.pos
        } else {
            match bodies.get(other.0) {
                Some(b) => b.pos,
                None => continue,
            }
        };

        let d = other_pos - body.pos - dx;
        let dist = d.length();
        let dir = if dist != 0.0 { d / dist } else { Vec2::ZERO };
        let stretch = dist - spring.rest;

        total += (spring.k * stretch) * dir;
    }

    total
}

/// Quadratic drag opposing the body's velocity
pub fn drag_force(body: &Body, air_density: f32) -> Vec2 {
    let speed = body.vel.length();
    if speed == 0.0 {
        return Vec2::ZERO;
    }
    let magnitude = DRAG_COEFFICIENT * body.radius * air_density * speed * speed;
    -magnitude * (body.vel / speed)
}

/// Net acceleration on `body` with its position probed at `dx`.
///
/// `dx` only shifts the point where spring forces are sampled; drag always
/// uses the body's current velocity.
pub fn acceleration(
    handle: BodyHandle,
    body: &Body,
    bodies: &[Body],
    springs: &[Spring],
    env: &Environment,
    dx: Vec2,
) -> Vec2 {
    let springs = spring_force(handle, body, bodies, springs, dx);
    let drag = drag_force(body, env.air_density);
    env.gravity + (springs + drag) / body.mass
}
