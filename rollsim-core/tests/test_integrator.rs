//! Tests for the RK4 / Euler body integrator

use glam::Vec2;
use rollsim_core::engine::{BodyHandle, Spring};
use rollsim_core::forces::Environment;
use rollsim_core::integrator::step;
use rollsim_core::tests::test_helpers::{approx_eq_f32, approx_eq_vec2, unit_body};

const GRAVITY: Vec2 = Vec2::new(0.0, -100.0);

#[test]
fn test_free_fall_matches_closed_form() {
    let dt = 1.0 / 120.0;
    let env = Environment::new(GRAVITY, 0.0);
    let v0 = Vec2::new(3.0, 1.0);
    let x0 = Vec2::new(0.0, 10.0);
    let mut body = unit_body(x0).with_velocity(v0);
    let bodies = vec![body];

    step(BodyHandle(0), &mut body, &bodies, &[], &env, dt);

    assert!(approx_eq_vec2(body.vel, v0 + GRAVITY * dt, 1e-4));
    assert!(approx_eq_vec2(
        body.pos,
        x0 + v0 * dt + 0.5 * GRAVITY * dt * dt,
        1e-4
    ));
}

#[test]
fn test_acceleration_is_stored_on_body() {
    let env = Environment::new(GRAVITY, 0.0);
    let mut body = unit_body(Vec2::ZERO);
    let bodies = vec![body];

    step(BodyHandle(0), &mut body, &bodies, &[], &env, 0.01);
    assert_eq!(body.acc, GRAVITY);
}

#[test]
fn test_rotation_uses_explicit_euler() {
    let env = Environment::new(Vec2::ZERO, 0.0);
    let mut body = unit_body(Vec2::ZERO)
        .with_angular_velocity(1.0)
        .with_angular_acceleration(2.0);
    let bodies = vec![body];

    step(BodyHandle(0), &mut body, &bodies, &[], &env, 0.5);

    // omega first, then angle with the updated omega
    assert!(approx_eq_f32(body.angular_vel, 2.0, 1e-6));
    assert!(approx_eq_f32(body.angle, 1.0, 1e-6));
}

#[test]
fn test_spin_does_not_move_a_free_body() {
    let env = Environment::new(Vec2::ZERO, 0.0);
    let mut body = unit_body(Vec2::new(4.0, 4.0)).with_angular_velocity(30.0);
    let bodies = vec![body];

    step(BodyHandle(0), &mut body, &bodies, &[], &env, 0.1);
    assert_eq!(body.pos, Vec2::new(4.0, 4.0));
    assert_eq!(body.vel, Vec2::ZERO);
}

#[test]
fn test_spring_oscillator_tracks_cosine() {
    // Unit mass on a zero-length unit spring anchored at the origin:
    // x'' = -x, so x(t) = cos(t) and v(t) = -sin(t)
    let env = Environment::new(Vec2::ZERO, 0.0);
    let mut bodies = vec![unit_body(Vec2::new(1.0, 0.0)), unit_body(Vec2::ZERO)];
    let springs = [Spring {
        a: BodyHandle(0),
        b: BodyHandle(1),
        rest: 0.0,
        k: 1.0,
    }];

    let dt = 0.01;
    for _ in 0..100 {
        let mut body = bodies[0];
        step(BodyHandle(0), &mut body, &bodies, &springs, &env, dt);
        bodies[0] = body;
    }

    let t: f32 = 1.0;
    assert!(approx_eq_f32(bodies[0].pos.x, t.cos(), 1e-4));
    assert!(approx_eq_f32(bodies[0].vel.x, -t.sin(), 1e-4));
    assert!(approx_eq_f32(bodies[0].pos.y, 0.0, 1e-6));
}

#[test]
fn test_drag_slows_a_moving_body() {
    let env = Environment::new(Vec2::ZERO, 1.0);
    let mut body = unit_body(Vec2::ZERO).with_velocity(Vec2::new(10.0, 0.0));
    let bodies = vec![body];

    step(BodyHandle(0), &mut body, &bodies, &[], &env, 0.01);

    assert!(body.vel.x < 10.0);
    assert!(body.vel.x > 0.0);
    assert!(approx_eq_f32(body.vel.y, 0.0, 1e-6));
}
