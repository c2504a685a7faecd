//! Rigid-body state shared by every simulated object.

use std::f64::consts::PI;

use super::robot::Puck;
use super::world::{ObjectId, WorldId};
use super::{Color, Vector2};

/// Shape descriptor of a rigid body. Fixed together with the mass at
/// construction; the two variants are mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum Shape {
    Cylindric { radius: f64, height: f64 },
    Rectangular { l1: f64, l2: f64, height: f64 },
}

impl Shape {
    /// Radius of the smallest circle enclosing the footprint.
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Shape::Cylindric { radius, .. } => radius,
            Shape::Rectangular { l1, l2, .. } => l1.hypot(l2) / 2.0,
        }
    }

    pub fn height(&self) -> f64 {
        match *self {
            Shape::Cylindric { height, .. } | Shape::Rectangular { height, .. } => height,
        }
    }

    pub fn is_cylindric(&self) -> bool {
        matches!(self, Shape::Cylindric { .. })
    }
}

/// Rigid-body state of a physical object.
///
/// Shape, mass and the derived moment of inertia are fixed at construction.
/// Kinematic state and the surface coefficients are mutable every tick.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Body {
    pos: Vector2,
    angle: f64,
    speed: Vector2,
    ang_speed: f64,
    shape: Shape,
    mass: f64,
    moment_of_inertia: f64,
    color: Color,
    infrared_reflectiveness: f64,
    pub collision_elasticity: f64,
    pub dry_friction_coefficient: f64,
    pub viscous_friction_coefficient: f64,
    pub viscous_moment_friction_coefficient: f64,
}

impl Body {
    pub fn cylindric(radius: f64, height: f64, mass: f64) -> Self {
        Self::with_shape(Shape::Cylindric { radius, height }, mass)
    }

    pub fn rectangular(l1: f64, l2: f64, height: f64, mass: f64) -> Self {
        Self::with_shape(Shape::Rectangular { l1, l2, height }, mass)
    }

    fn with_shape(shape: Shape, mass: f64) -> Self {
        let moment_of_inertia = match shape {
            Shape::Cylindric { radius, .. } => mass * radius * radius / 2.0,
            Shape::Rectangular { l1, l2, .. } => mass * (l1 * l1 + l2 * l2) / 12.0,
        };
        Self {
            pos: Vector2::default(),
            angle: 0.0,
            speed: Vector2::default(),
            ang_speed: 0.0,
            shape,
            mass,
            moment_of_inertia,
            color: Color::default(),
            infrared_reflectiveness: 1.0,
            collision_elasticity: 0.9,
            dry_friction_coefficient: 0.25,
            viscous_friction_coefficient: 0.01,
            viscous_moment_friction_coefficient: 0.01,
        }
    }

    pub fn pos(&self) -> Vector2 {
        self.pos
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn speed(&self) -> Vector2 {
        self.speed
    }

    pub fn ang_speed(&self) -> f64 {
        self.ang_speed
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn radius(&self) -> f64 {
        self.shape.bounding_radius()
    }

    pub fn height(&self) -> f64 {
        self.shape.height()
    }

    pub fn is_cylindric(&self) -> bool {
        self.shape.is_cylindric()
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn moment_of_inertia(&self) -> f64 {
        self.moment_of_inertia
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn infrared_reflectiveness(&self) -> f64 {
        self.infrared_reflectiveness
    }

    pub fn set_pos(&mut self, pos: Vector2) {
        self.pos = pos;
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    pub fn set_speed(&mut self, speed: Vector2) {
        self.speed = speed;
    }

    pub fn set_ang_speed(&mut self, ang_speed: f64) {
        self.ang_speed = ang_speed;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_infrared_reflectiveness(&mut self, reflectiveness: f64) {
        self.infrared_reflectiveness = reflectiveness;
    }

    /// One solver sub-step: integrate the kinematic state and apply the
    /// friction decays.
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.pos = self.pos + self.speed * dt;
        self.angle = (self.angle + self.ang_speed * dt) % (2.0 * PI);

        let linear_decay = 1.0 / (1.0 + self.viscous_friction_coefficient * dt);
        self.speed = self.speed * linear_decay;
        let angular_decay = 1.0 / (1.0 + self.viscous_moment_friction_coefficient * dt);
        self.ang_speed *= angular_decay;

        let speed_norm = self.speed.norm();
        let dry_loss = self.dry_friction_coefficient * dt;
        if speed_norm > 0.0 && dry_loss > 0.0 {
            let remaining = (speed_norm - dry_loss).max(0.0);
            self.speed = self.speed * (remaining / speed_norm);
        }
    }
}

/// Identity of the world an object is currently registered in. Non-owning:
/// used purely for membership checks, never for access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Membership {
    pub world: WorldId,
    pub object: ObjectId,
}

/// A simulated object: either a passive rigid body or a robot. The common
/// `body` accessors give every variant the physical-object capability set.
#[derive(Clone, Debug)]
pub enum SimObject {
    Passive(Body),
    Puck(Puck),
}

impl SimObject {
    pub fn body(&self) -> &Body {
        match self {
            SimObject::Passive(body) => body,
            SimObject::Puck(puck) => puck.body(),
        }
    }

    pub fn body_mut(&mut self) -> &mut Body {
        match self {
            SimObject::Passive(body) => body,
            SimObject::Puck(puck) => puck.body_mut(),
        }
    }

    pub fn as_puck(&self) -> Option<&Puck> {
        match self {
            SimObject::Puck(puck) => Some(puck),
            SimObject::Passive(_) => None,
        }
    }

    pub fn as_puck_mut(&mut self) -> Option<&mut Puck> {
        match self {
            SimObject::Puck(puck) => Some(puck),
            SimObject::Passive(_) => None,
        }
    }

    pub fn is_robot(&self) -> bool {
        matches!(self, SimObject::Puck(_))
    }
}

/// Registration and lifetime bookkeeping shared between a `SimObject` and the
/// world holding it.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    membership: Option<Membership>,
    destroyed: bool,
}

impl Registration {
    pub fn membership(&self) -> Option<Membership> {
        self.membership
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn register(&mut self, membership: Membership) {
        self.membership = Some(membership);
    }

    pub(crate) fn unregister(&mut self) {
        self.membership = None;
    }

    pub(crate) fn destroy(&mut self) {
        self.membership = None;
        self.destroyed = true;
    }
}
