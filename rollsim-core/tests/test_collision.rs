//! Tests for circle vs segment collision response

use glam::Vec2;
use rollsim_core::collision::{closest_point, resolve, JITTER_SPEED};
use rollsim_core::engine::{Body, Segment};
use rollsim_core::tests::test_helpers::{approx_eq_f32, approx_eq_vec2};

const DT: f32 = 1.0 / 120.0;

fn floor() -> Segment {
    Segment::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0))
}

fn ball(pos: Vec2) -> Body {
    Body::new(1.0, 1.0, 0.5, pos)
}

fn is_finite(body: &Body) -> bool {
    body.pos.is_finite() && body.vel.is_finite()
}

#[test]
fn test_no_contact_leaves_body_untouched() {
    let mut body = ball(Vec2::new(0.0, 3.0)).with_velocity(Vec2::new(1.0, -2.0));
    let before = body;

    assert!(resolve(&mut body, &floor(), DT).is_none());
    assert_eq!(body, before);
}

#[test]
fn test_touching_exactly_is_not_a_contact() {
    let mut body = ball(Vec2::new(0.0, 1.0));
    assert!(resolve(&mut body, &floor(), DT).is_none());
}

#[test]
fn test_stationary_overlap_is_pushed_out() {
    for y in [0.1, 0.5, 0.9, 0.999] {
        let mut body = ball(Vec2::new(3.0, y));
        let contact = resolve(&mut body, &floor(), DT).expect("should overlap");

        let (_, point) = closest_point(&floor(), body.pos);
        let overlap = body.radius - (body.pos - point).length();
        assert!(overlap <= 1e-5, "still penetrating by {} from y = {}", overlap, y);
        assert!(!contact.impulse);
        assert_eq!(body.vel, Vec2::ZERO);
    }
}

#[test]
fn test_overlap_from_below_pushes_down() {
    let mut body = ball(Vec2::new(0.0, -0.5));
    let contact = resolve(&mut body, &floor(), DT).expect("should overlap");

    assert!(approx_eq_vec2(contact.normal, Vec2::new(0.0, -1.0), 1e-6));
    assert!(approx_eq_f32(body.pos.y, -1.0, 1e-6));
}

#[test]
fn test_slow_resting_body_keeps_velocity() {
    let mut body = ball(Vec2::new(0.0, 0.9)).with_velocity(Vec2::new(0.05, 0.0));

    for _ in 0..10 {
        resolve(&mut body, &floor(), DT);
        assert_eq!(body.vel, Vec2::new(0.05, 0.0));
    }
    assert!(approx_eq_f32(body.pos.y, 1.0, 1e-6));
}

#[test]
fn test_jitter_threshold_is_strict() {
    let mut body = ball(Vec2::new(0.0, 0.9)).with_velocity(Vec2::new(0.0, -JITTER_SPEED));
    let contact = resolve(&mut body, &floor(), DT).expect("should overlap");

    assert!(!contact.impulse);
    assert_eq!(body.vel, Vec2::new(0.0, -JITTER_SPEED));
}

#[test]
fn test_impulse_reflects_normal_velocity_with_restitution() {
    let mut body = ball(Vec2::new(0.0, 0.9)).with_velocity(Vec2::new(2.0, -10.0));
    let contact = resolve(&mut body, &floor(), DT).expect("should overlap");

    assert!(contact.impulse);
    assert!(approx_eq_vec2(body.vel, Vec2::new(2.0, 5.0), 1e-5));
    assert!(approx_eq_vec2(body.pos, Vec2::new(0.0, 1.0), 1e-6));
}

#[test]
fn test_impulse_response_does_not_depend_on_mass() {
    let mut light = ball(Vec2::new(0.0, 0.9)).with_velocity(Vec2::new(0.0, -10.0));
    let mut heavy = light;
    heavy.mass = 30.0;

    resolve(&mut light, &floor(), DT);
    resolve(&mut heavy, &floor(), DT);
    assert!(approx_eq_vec2(light.vel, heavy.vel, 1e-4));
}

#[test]
fn test_spin_nudges_position_but_keeps_angular_velocity() {
    let dt = 0.1;
    let mut body = ball(Vec2::new(0.0, 0.9))
        .with_velocity(Vec2::new(0.0, -10.0))
        .with_angular_velocity(2.0);
    resolve(&mut body, &floor(), dt);

    // omega * r * rotate90(n) / 2 * dt with n = (0, 1)
    assert!(approx_eq_vec2(body.pos, Vec2::new(-0.1, 1.0), 1e-5));
    assert_eq!(body.angular_vel, 2.0);
    assert!(approx_eq_vec2(body.vel, Vec2::new(0.0, 5.0), 1e-5));
}

#[test]
fn test_spin_enters_contact_velocity_along_x() {
    // A wall facing +x: spin adds -omega * r to the normal component
    let wall = Segment::new(Vec2::new(0.0, 10.0), Vec2::new(0.0, -10.0));
    let mut body = ball(Vec2::new(0.9, 0.0))
        .with_velocity(Vec2::new(-1.0, 0.0))
        .with_angular_velocity(1.0);
    let contact = resolve(&mut body, &wall, DT).expect("should overlap");

    assert!(approx_eq_vec2(contact.normal, Vec2::new(1.0, 0.0), 1e-6));
    // v_r . n = -1 - 1 = -2, j = 1.5 * 2 = 3
    assert!(approx_eq_f32(body.vel.x, 2.0, 1e-5));
}

#[test]
fn test_endpoint_contact_uses_direction_to_endpoint() {
    let segment = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let mut body = ball(Vec2::new(-0.5, 0.5));
    let contact = resolve(&mut body, &segment, DT).expect("should overlap");

    let expected = -Vec2::new(-0.5, 0.5).normalize();
    assert!(approx_eq_vec2(contact.normal, expected, 1e-6));
    assert!(approx_eq_f32(body.pos.length(), 1.0, 1e-5));
}

#[test]
fn test_far_endpoint_contact() {
    let segment = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0));
    let mut body = ball(Vec2::new(10.6, 0.0));
    let contact = resolve(&mut body, &segment, DT).expect("should overlap");

    assert!(approx_eq_vec2(contact.normal, Vec2::new(-1.0, 0.0), 1e-6));
    assert!(approx_eq_vec2(body.pos, Vec2::new(11.0, 0.0), 1e-5));
}

#[test]
fn test_degenerate_segment_stays_finite() {
    let dot = Segment::new(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
    assert_eq!(dot.normal(), Vec2::ZERO);

    let mut near = ball(Vec2::new(1.5, 1.0)).with_velocity(Vec2::new(-3.0, 0.0));
    resolve(&mut near, &dot, DT);
    assert!(is_finite(&near));
    assert!(approx_eq_vec2(near.pos, Vec2::new(2.0, 1.0), 1e-5));

    let mut centered = ball(Vec2::new(1.0, 1.0)).with_velocity(Vec2::new(0.0, -3.0));
    resolve(&mut centered, &dot, DT);
    assert!(is_finite(&centered));
}

#[test]
fn test_center_on_segment_has_no_push_direction() {
    let mut body = ball(Vec2::new(2.0, 0.0)).with_velocity(Vec2::new(0.0, -4.0));
    let contact = resolve(&mut body, &floor(), DT).expect("should overlap");

    assert!(is_finite(&body));
    assert!(approx_eq_f32(contact.overlap, 1.0, 1e-6));
    assert!(approx_eq_vec2(body.vel, Vec2::new(0.0, 2.0), 1e-5));
}

#[test]
fn test_closest_point_clamps_to_segment() {
    let (s, p) = closest_point(&floor(), Vec2::new(25.0, 3.0));
    assert_eq!(s, 1.0);
    assert_eq!(p, Vec2::new(10.0, 0.0));

    let (s, p) = closest_point(&floor(), Vec2::new(5.0, -3.0));
    assert!(approx_eq_f32(s, 0.75, 1e-6));
    assert!(approx_eq_vec2(p, Vec2::new(5.0, 0.0), 1e-6));
}
