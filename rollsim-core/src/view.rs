//! Geometry shared by renderers: camera transform, orientation marker and
//! spring coils. Screen space has y pointing down and the world origin at
//! `origin`; the camera shifts the view in world units.

use crate::engine::Body;
use glam::Vec2;

/// Camera movement per frame while a pan key is held
pub const CAMERA_PAN_STEP: f32 = 10.0;

pub const SPRING_COIL_SAMPLES: usize = 50;
pub const SPRING_COIL_AMPLITUDE: f32 = 5.0;
/// Angular frequency of the coil over the normalized spring length
pub const SPRING_COIL_FREQUENCY: f32 = 50.0;

/// Pan keys held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanKeys {
    pub up: bool,
    pub left: bool,
    pub down: bool,
    pub right: bool,
}

impl PanKeys {
    /// Camera offset for one frame
    pub fn offset(self) -> Vec2 {
        let mut offset = Vec2::ZERO;
        if self.up {
            offset.y += CAMERA_PAN_STEP;
        }
        if self.left {
            offset.x -= CAMERA_PAN_STEP;
        }
        if self.down {
            offset.y -= CAMERA_PAN_STEP;
        }
        if self.right {
            offset.x += CAMERA_PAN_STEP;
        }
        offset
    }
}

/// Map a world position to screen coordinates
pub fn to_screen(origin: Vec2, camera: Vec2, world: Vec2) -> Vec2 {
    Vec2::new(
        origin.x - camera.x + world.x,
        origin.y + camera.y - world.y,
    )
}

/// End of the radius line that shows a body's orientation
pub fn angle_marker(body: &Body) -> Vec2 {
    body.pos + Vec2::from_angle(body.angle) * body.radius
}

/// Zig-zag polyline drawn for a spring from `p1` to `p2`, in world space.
///
/// Samples a sine wave along the spring axis. Coincident endpoints give the
/// straight pair `[p1, p2]`.
pub fn spring_coil(p1: Vec2, p2: Vec2) -> Vec<Vec2> {
    let d = p2 - p1;
    let len = d.length();
    if len == 0.0 {
        return vec![p1, p2];
    }

    let axis = d / len;
    let side = axis.perp();
    let last = (SPRING_COIL_SAMPLES - 1) as f32;

    (0..SPRING_COIL_SAMPLES)
        .map(|i| {
            let along = len * i as f32 / last;
            let offset = SPRING_COIL_AMPLITUDE * (SPRING_COIL_FREQUENCY * along / len).sin();
            p1 + axis * along + side * offset
        })
        .collect()
}
