use crate::collision;
use crate::forces::Environment;
use crate::integrator;
use glam::Vec2;
use log::trace;

/// Index of a body inside a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

/// Index of a static segment inside a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentHandle(pub usize);

/// Index of a spring inside a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpringHandle(pub usize);

/// A circular rigid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub mass: f32,
    pub radius: f32,
    pub restitution: f32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Acceleration sampled at the start of the last step
    pub acc: Vec2,
    pub angle: f32,
    pub angular_vel: f32,
    /// Constant angular acceleration, set from outside the engine
    pub angular_acc: f32,
}

impl Body {
    /// A body at rest at `pos`
    pub fn new(mass: f32, radius: f32, restitution: f32, pos: Vec2) -> Self {
        Self {
            mass,
            radius,
            restitution,
            pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            angle: 0.0,
            angular_vel: 0.0,
            angular_acc: 0.0,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_angular_velocity(mut self, angular_vel: f32) -> Self {
        self.angular_vel = angular_vel;
        self
    }

    pub fn with_angular_acceleration(mut self, angular_acc: f32) -> Self {
        self.angular_acc = angular_acc;
        self
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A static line segment bodies collide against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Segment {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Unit normal: the direction `p1 -> p2` rotated 90° counter-clockwise.
    /// Zero for a degenerate segment.
    pub fn normal(&self) -> Vec2 {
        (self.p2 - self.p1).perp().normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        self.p1.distance(self.p2)
    }
}

/// An undamped linear spring between two bodies
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub rest: f32,
    pub k: f32,
}

impl Spring {
    /// The opposite endpoint when `body` is attached to this spring
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.a == body {
            Some(self.b)
        } else if self.b == body {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Bodies, static segments and springs of one simulation
#[derive(Debug, Clone, Default)]
pub struct Scene {
    bodies: Vec<Body>,
    segments: Vec<Segment>,
    springs: Vec<Spring>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_body(
        &mut self,
        mass: f32,
        radius: f32,
        restitution: f32,
        position: Vec2,
        velocity: Vec2,
        acceleration: Vec2,
        angle: f32,
        angular_velocity: f32,
        angular_acceleration: f32,
    ) -> BodyHandle {
        self.add_body(Body {
            mass,
            radius,
            restitution,
            pos: position,
            vel: velocity,
            acc: acceleration,
            angle,
            angular_vel: angular_velocity,
            angular_acc: angular_acceleration,
        })
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle(self.bodies.len() - 1)
    }

    pub fn create_segment(&mut self, p1: Vec2, p2: Vec2) -> SegmentHandle {
        self.segments.push(Segment::new(p1, p2));
        SegmentHandle(self.segments.len() - 1)
    }

    pub fn create_spring(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        rest_length: f32,
        stiffness: f32,
    ) -> SpringHandle {
        self.springs.push(Spring {
            a,
            b,
            rest: rest_length,
            k: stiffness,
        });
        SpringHandle(self.springs.len() - 1)
    }

    pub fn body(&self, handle: BodyHandle) -> &Body {
        &self.bodies[handle.0]
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> &mut Body {
        &mut self.bodies[handle.0]
    }

    pub fn segment(&self, handle: SegmentHandle) -> &Segment {
        &self.segments[handle.0]
    }

    pub fn spring(&self, handle: SpringHandle) -> &Spring {
        &self.springs[handle.0]
    }

    /// Current world positions of both ends of a spring
    pub fn spring_endpoints(&self, handle: SpringHandle) -> (Vec2, Vec2) {
        let spring = self.spring(handle);
        (self.body(spring.a).pos, self.body(spring.b).pos)
    }

    pub fn set_angular_velocity(&mut self, handle: BodyHandle, angular_vel: f32) {
        self.body_mut(handle).angular_vel = angular_vel;
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    pub fn body_handles(&self) -> impl Iterator<Item = BodyHandle> {
        (0..self.bodies.len()).map(BodyHandle)
    }

    pub fn spring_handles(&self) -> impl Iterator<Item = SpringHandle> {
        (0..self.springs.len()).map(SpringHandle)
    }

    /// Advance every body by `dt`.
    ///
    /// Bodies are processed in insertion order and written back before the
    /// next one is visited, so spring partners later in the list already see
    /// the new positions of earlier bodies. Each body is first resolved
    /// against every segment in order, then integrated once.
    pub fn step(&mut self, dt: f32, gravity: Vec2, air_density: f32) {
        let env = Environment::new(gravity, air_density);
        for index in 0..self.bodies.len() {
            let handle = BodyHandle(index);
            let mut body = self.bodies[index];

            for (segment_index, segment) in self.segments.iter().enumerate() {
                if let Some(contact) = collision::resolve(&mut body, segment, dt) {
                    trace!(
                        "body {} hit segment {}: overlap {:.4}, normal {:?}, impulse {}",
                        index,
                        segment_index,
                        contact.overlap,
                        contact.normal,
                        contact.impulse
                    );
                }
            }

            integrator::step(handle, &mut body, &self.bodies, &self.springs, &env, dt);
            self.bodies[index] = body;
        }
    }

    /// Same as [`Scene::step`] with gravity and air density taken from `env`
    pub fn step_in(&mut self, env: &Environment, dt: f32) {
        self.step(dt, env.gravity, env.air_density);
    }
}
