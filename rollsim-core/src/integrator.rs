use crate::engine::{Body, BodyHandle, Spring};
use crate::forces::{acceleration, Environment};
use glam::Vec2;

/// Step one body forward by dt.
///
/// Position and velocity use classical RK4 over the force model, probing
/// spring forces at the intermediate positions. Rotation uses explicit Euler
/// since it is driven only by the constant angular acceleration.
pub fn step(
    handle: BodyHandle,
    body: &mut Body,
    bodies: &[Body],
    springs: &[Spring],
    env: &Environment,
    dt: f32,
) {
    let current = *body;
    let accel = |dx: Vec2| acceleration(handle, &current, bodies, springs, env, dx);

    let kx1 = current.vel;
    let kv1 = accel(Vec2::ZERO);

    let kx2 = current.vel + 0.5 * dt * kv1;
    let kv2 = accel(0.5 * dt * kx1);

    let kx3 = current.vel + 0.5 * dt * kv2;
    let kv3 = accel(0.5 * dt * kx2);

    let kx4 = current.vel + dt * kv3;
    let kv4 = accel(dt * kx3);

    body.acc = kv1;
    body.pos += (dt / 6.0) * (kx1 + 2.0 * kx2 + 2.0 * kx3 + kx4);
    body.vel += (dt / 6.0) * (kv1 + 2.0 * kv2 + 2.0 * kv3 + kv4);

    body.angular_vel += body.angular_acc * dt;
    body.angle += body.angular_vel * dt;
}
