//! The world: container of simulated objects, arena walls, stepping loop.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Matrix2, Vector2 as NaVector2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use super::object::{Body, Membership, Registration, SimObject};
use super::robot::RayHit;
use super::{Color, Vector2};

/// Stable identity of an object within a world, for the lifetime of its
/// membership.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct ObjectId(u64);

/// Process-unique identity of a world, used for membership checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WorldId(u64);

static NEXT_WORLD_ID: AtomicU64 = AtomicU64::new(1);

/// A registered simulation object together with its lifetime bookkeeping.
/// Both the world and any script-side handles share one slot.
#[derive(Debug)]
pub struct SimSlot {
    pub object: SimObject,
    pub registration: Registration,
}

impl SimSlot {
    pub fn new(object: SimObject) -> Self {
        Self {
            object,
            registration: Registration::default(),
        }
    }
}

pub type ObjectRef = Rc<RefCell<SimSlot>>;

/// Arena managed by a world: bounded rectangle, bounded disc, or an infinite
/// surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arena {
    Bounded {
        width: f64,
        height: f64,
        walls_color: Color,
    },
    Circular {
        radius: f64,
        walls_color: Color,
    },
    Unbounded,
}

impl Arena {
    pub fn walls_color(&self) -> Option<Color> {
        match *self {
            Arena::Bounded { walls_color, .. } | Arena::Circular { walls_color, .. } => {
                Some(walls_color)
            }
            Arena::Unbounded => None,
        }
    }
}

/// Lifetime policy of a world towards the objects added to it, fixed per
/// world before the first registration.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Ownership {
    /// The caller keeps objects alive; removal detaches them intact.
    #[default]
    CallerOwns,
    /// The world owns registered objects; removal destroys them and any
    /// later use of a stale handle fails fast.
    WorldOwns,
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("object is already registered in a world")]
    AlreadyRegistered,
    #[error("object is not registered in this world")]
    NotRegistered,
    #[error("object was destroyed by its owning world")]
    Destroyed,
    #[error("ownership mode can only change while the world is empty")]
    OwnershipFixed,
    #[error("control routine failed: {0}")]
    Control(String),
}

/// Seam for the per-tick control dispatch. The world hands each robot whose
/// control slot is populated to the controller before running the native
/// base update.
pub trait RobotController {
    fn control(&mut self, function: &str, robot: &ObjectRef, dt: f64) -> Result<(), WorldError>;
}

/// Controller that leaves every robot to its native default behavior.
pub struct NullController;

impl RobotController for NullController {
    fn control(&mut self, _function: &str, _robot: &ObjectRef, _dt: f64) -> Result<(), WorldError> {
        Ok(())
    }
}

/// Per-object snapshot used by ray queries, taken once per sensor phase so
/// sensors observe a consistent world state.
#[derive(Clone, Copy, Debug)]
struct ObjectSnapshot {
    id: ObjectId,
    pos: Vector2,
    radius: f64,
    color: Color,
    infrared_reflectiveness: f64,
}

pub struct World {
    id: WorldId,
    arena: Arena,
    ownership: Ownership,
    objects: BTreeMap<ObjectId, ObjectRef>,
    next_object: u64,
    rng: ChaCha8Rng,
}

const DEFAULT_RNG_SEED: u64 = 0;

impl World {
    /// An infinite surface without walls.
    pub fn unbounded() -> Self {
        Self::with_arena(Arena::Unbounded)
    }

    /// A rectangular arena `[0, width] x [0, height]` with walls at all
    /// sides.
    pub fn bounded(width: f64, height: f64, walls_color: Color) -> Self {
        Self::with_arena(Arena::Bounded {
            width,
            height,
            walls_color,
        })
    }

    /// A circular arena of the given radius, centered at the origin.
    pub fn circular(radius: f64, walls_color: Color) -> Self {
        Self::with_arena(Arena::Circular {
            radius,
            walls_color,
        })
    }

    fn with_arena(arena: Arena) -> Self {
        Self {
            id: WorldId(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed)),
            arena,
            ownership: Ownership::default(),
            objects: BTreeMap::new(),
            next_object: 1,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_RNG_SEED),
        }
    }

    pub fn id(&self) -> WorldId {
        self.id
    }

    pub fn arena(&self) -> Arena {
        self.arena
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Select the lifetime policy. Only possible while no object is
    /// registered, so every object observes a single consistent policy.
    pub fn set_ownership(&mut self, ownership: Ownership) -> Result<(), WorldError> {
        if !self.objects.is_empty() {
            return Err(WorldError::OwnershipFixed);
        }
        self.ownership = ownership;
        Ok(())
    }

    pub fn set_random_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Deterministic uniform sample from the world's generator.
    pub fn random_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &ObjectRef)> {
        self.objects.iter().map(|(id, slot)| (*id, slot))
    }

    pub fn contains(&self, object: &ObjectRef) -> bool {
        object
            .borrow()
            .registration
            .membership()
            .is_some_and(|m| m.world == self.id)
    }

    /// Register an object. The world keeps the object alive while it is
    /// registered; the object records which world holds it.
    pub fn add_object(&mut self, object: &ObjectRef) -> Result<ObjectId, WorldError> {
        {
            let registration = &object.borrow().registration;
            if registration.is_destroyed() {
                return Err(WorldError::Destroyed);
            }
            if registration.membership().is_some() {
                return Err(WorldError::AlreadyRegistered);
            }
        }

        let id = ObjectId(self.next_object);
        self.next_object += 1;
        object.borrow_mut().registration.register(Membership {
            world: self.id,
            object: id,
        });
        self.objects.insert(id, object.clone());
        Ok(id)
    }

    /// Unregister an object from stepping and rendering. Under
    /// [`Ownership::WorldOwns`] the object is destroyed and stale handles
    /// fail fast afterwards; under [`Ownership::CallerOwns`] it reverts to a
    /// detached, usable object.
    pub fn remove_object(&mut self, object: &ObjectRef) -> Result<(), WorldError> {
        let membership = {
            let registration = &object.borrow().registration;
            if registration.is_destroyed() {
                return Err(WorldError::Destroyed);
            }
            registration.membership()
        };
        let Some(membership) = membership.filter(|m| m.world == self.id) else {
            return Err(WorldError::NotRegistered);
        };

        self.objects.remove(&membership.object);
        let mut slot = object.borrow_mut();
        match self.ownership {
            Ownership::CallerOwns => slot.registration.unregister(),
            Ownership::WorldOwns => slot.registration.destroy(),
        }
        Ok(())
    }

    /// Advance the world by `dt` with the native default control for every
    /// robot.
    pub fn step(&mut self, dt: f64, oversampling: u32) -> Result<(), WorldError> {
        self.step_with(dt, oversampling, &mut NullController)
    }

    /// Advance the world by one tick of size `dt`, internally subdividing
    /// physical integration into `oversampling` sub-steps.
    ///
    /// Phase order per tick: script control hooks, native actuator and
    /// encoder update, physics sub-steps, sensor refresh. Sensors therefore
    /// always expose the previous tick's state to control routines.
    pub fn step_with(
        &mut self,
        dt: f64,
        oversampling: u32,
        controller: &mut dyn RobotController,
    ) -> Result<(), WorldError> {
        let robots: Vec<(ObjectId, ObjectRef)> = self
            .objects
            .iter()
            .filter(|(_, slot)| slot.borrow().object.is_robot())
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();

        // Control phase: script hook first, native base update always.
        for (_, slot) in &robots {
            let function = slot
                .borrow()
                .object
                .as_puck()
                .and_then(|p| p.control_function().map(str::to_owned));
            if let Some(function) = function {
                controller.control(&function, slot, dt)?;
            }
            if let Some(puck) = slot.borrow_mut().object.as_puck_mut() {
                puck.drive_mut().apply_wheel_speeds(dt);
            }
        }

        // Physics phase.
        let substeps = oversampling.max(1);
        let sub_dt = dt / f64::from(substeps);
        for _ in 0..substeps {
            for slot in self.objects.values() {
                slot.borrow_mut().object.body_mut().integrate(sub_dt);
            }
            self.resolve_object_collisions();
            for slot in self.objects.values() {
                constrain_to_arena(self.arena, &mut slot.borrow_mut().object);
            }
        }

        // Sensor phase: refresh from a consistent snapshot for the next tick.
        let snapshots = self.snapshots();
        for (id, slot) in &robots {
            if let Some(puck) = slot.borrow_mut().object.as_puck_mut() {
                puck.refresh_sensors(|origin, angle| {
                    raycast(&snapshots, self.arena, origin, angle, Some(*id))
                });
            }
        }

        Ok(())
    }

    /// Closest hit of a ray against the arena walls and every registered
    /// object except `exclude`.
    pub fn raycast(
        &self,
        origin: Vector2,
        angle: f64,
        exclude: Option<ObjectId>,
    ) -> Option<RayHit> {
        raycast(&self.snapshots(), self.arena, origin, angle, exclude)
    }

    fn snapshots(&self) -> Vec<ObjectSnapshot> {
        self.objects
            .iter()
            .map(|(id, slot)| {
                let slot = slot.borrow();
                let body = slot.object.body();
                ObjectSnapshot {
                    id: *id,
                    pos: body.pos(),
                    radius: body.radius(),
                    color: body.color(),
                    infrared_reflectiveness: body.infrared_reflectiveness(),
                }
            })
            .collect()
    }

    /// Push interpenetrating bodies apart and exchange normal velocity, using
    /// the bounding circles of both footprints.
    fn resolve_object_collisions(&mut self) {
        let refs: Vec<&ObjectRef> = self.objects.values().collect();
        for (i, first) in refs.iter().enumerate() {
            for second in refs.iter().skip(i + 1) {
                let mut a = first.borrow_mut();
                let mut b = second.borrow_mut();
                collide_pair(a.object.body_mut(), b.object.body_mut());
            }
        }
    }
}

fn collide_pair(a: &mut Body, b: &mut Body) {
    let delta = b.pos() - a.pos();
    let distance = delta.norm();
    let min_distance = a.radius() + b.radius();
    if distance >= min_distance || distance == 0.0 {
        return;
    }

    let normal = delta / distance;
    let overlap = min_distance - distance;
    let total_mass = a.mass() + b.mass();
    a.set_pos(a.pos() - normal * (overlap * b.mass() / total_mass));
    b.set_pos(b.pos() + normal * (overlap * a.mass() / total_mass));

    let approach = (a.speed() - b.speed()).dot(normal);
    if approach > 0.0 {
        let elasticity = a.collision_elasticity * b.collision_elasticity;
        let impulse = (1.0 + elasticity) * approach / (1.0 / a.mass() + 1.0 / b.mass());
        a.set_speed(a.speed() - normal * (impulse / a.mass()));
        b.set_speed(b.speed() + normal * (impulse / b.mass()));
    }
}

fn constrain_to_arena(arena: Arena, object: &mut SimObject) {
    let body = object.body_mut();
    let r = body.radius();
    match arena {
        Arena::Unbounded => {}
        Arena::Bounded { width, height, .. } => {
            let elasticity = body.collision_elasticity;
            let mut pos = body.pos();
            let mut speed = body.speed();
            if pos.x() < r {
                pos = Vector2::new(r, pos.y());
                speed = Vector2::new(-speed.x() * elasticity, speed.y());
            } else if pos.x() > width - r {
                pos = Vector2::new(width - r, pos.y());
                speed = Vector2::new(-speed.x() * elasticity, speed.y());
            }
            if pos.y() < r {
                pos = Vector2::new(pos.x(), r);
                speed = Vector2::new(speed.x(), -speed.y() * elasticity);
            } else if pos.y() > height - r {
                pos = Vector2::new(pos.x(), height - r);
                speed = Vector2::new(speed.x(), -speed.y() * elasticity);
            }
            body.set_pos(pos);
            body.set_speed(speed);
        }
        Arena::Circular { radius, .. } => {
            let pos = body.pos();
            let center_distance = pos.norm();
            if center_distance + r > radius && center_distance > 0.0 {
                let normal = pos / center_distance;
                body.set_pos(normal * (radius - r));
                let outward = body.speed().dot(normal);
                if outward > 0.0 {
                    let elasticity = body.collision_elasticity;
                    body.set_speed(body.speed() - normal * ((1.0 + elasticity) * outward));
                }
            }
        }
    }
}

fn raycast(
    snapshots: &[ObjectSnapshot],
    arena: Arena,
    origin: Vector2,
    angle: f64,
    exclude: Option<ObjectId>,
) -> Option<RayHit> {
    let direction = Vector2::from_angle(angle);

    let mut best: Option<RayHit> = None;
    let mut consider = |hit: RayHit| {
        if best.map_or(true, |b| hit.distance < b.distance) {
            best = Some(hit);
        }
    };

    for snapshot in snapshots {
        if Some(snapshot.id) == exclude {
            continue;
        }
        if let Some(distance) = ray_circle_distance(origin, direction, snapshot.pos, snapshot.radius)
        {
            consider(RayHit {
                distance,
                color: snapshot.color,
                infrared_reflectiveness: snapshot.infrared_reflectiveness,
            });
        }
    }

    match arena {
        Arena::Unbounded => {}
        Arena::Bounded {
            width,
            height,
            walls_color,
        } => {
            let corners = [
                Vector2::new(0.0, 0.0),
                Vector2::new(width, 0.0),
                Vector2::new(width, height),
                Vector2::new(0.0, height),
            ];
            for i in 0..4 {
                if let Some(distance) =
                    ray_segment_distance(origin, direction, corners[i], corners[(i + 1) % 4])
                {
                    consider(RayHit {
                        distance,
                        color: walls_color,
                        infrared_reflectiveness: 1.0,
                    });
                }
            }
        }
        Arena::Circular {
            radius,
            walls_color,
        } => {
            if let Some(distance) = ray_circle_exit_distance(origin, direction, radius) {
                consider(RayHit {
                    distance,
                    color: walls_color,
                    infrared_reflectiveness: 1.0,
                });
            }
        }
    }

    best
}

/// Distance along the ray to a circle hit from outside, `None` if the ray
/// misses. A ray starting inside the circle reports distance zero.
fn ray_circle_distance(
    origin: Vector2,
    direction: Vector2,
    center: Vector2,
    radius: f64,
) -> Option<f64> {
    let to_center = center - origin;
    let projection = to_center.dot(direction);
    if projection < 0.0 {
        return None;
    }
    let closest_sq = to_center.dot(to_center) - projection * projection;
    let radius_sq = radius * radius;
    if closest_sq > radius_sq {
        return None;
    }
    Some((projection - (radius_sq - closest_sq).sqrt()).max(0.0))
}

/// Distance to the circle of the given radius around the origin, for a ray
/// cast from inside it.
fn ray_circle_exit_distance(origin: Vector2, direction: Vector2, radius: f64) -> Option<f64> {
    let b = origin.dot(direction);
    let c = origin.dot(origin) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let t = -b + discriminant.sqrt();
    (t >= 0.0).then_some(t)
}

/// Distance along the ray to a wall segment, solved as the 2x2 linear system
/// `origin + t * direction = p1 + s * (p2 - p1)`.
fn ray_segment_distance(
    origin: Vector2,
    direction: Vector2,
    p1: Vector2,
    p2: Vector2,
) -> Option<f64> {
    let edge = p2 - p1;
    let system = Matrix2::new(direction.x(), -edge.x(), direction.y(), -edge.y());
    let rhs = NaVector2::new(p1.x() - origin.x(), p1.y() - origin.y());
    let solution = system.lu().solve(&rhs)?;
    let (t, s) = (solution[0], solution[1]);
    (t >= 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::super::object::Body;
    use super::super::robot::{Puck, PuckCapability, PROXIMITY_SENSOR_RANGE};
    use super::*;

    fn slot(object: SimObject) -> ObjectRef {
        Rc::new(RefCell::new(SimSlot::new(object)))
    }

    fn circular_object(radius: f64) -> ObjectRef {
        slot(SimObject::Passive(Body::cylindric(radius, 1.0, 1.0)))
    }

    #[test]
    fn test_no_drift_without_forces() {
        let mut world = World::unbounded();
        let object = circular_object(1.0);
        object
            .borrow_mut()
            .object
            .body_mut()
            .set_pos(Vector2::new(0.0, 0.0));
        world.add_object(&object).unwrap();

        for _ in 0..30 {
            world.step(1.0 / 30.0, 3).unwrap();
        }

        let body = object.borrow();
        assert_abs_diff_eq!(body.object.body().pos().x(), 0.0);
        assert_abs_diff_eq!(body.object.body().pos().y(), 0.0);
    }

    #[rstest]
    #[case::single_substep(1)]
    #[case::oversampled(3)]
    fn test_step_preserves_membership(#[case] oversampling: u32) {
        let mut world = World::bounded(2.0, 2.0, Color::GRAY);
        let a = circular_object(0.1);
        let b = slot(SimObject::Puck(Puck::new(PuckCapability::default())));
        let id_a = world.add_object(&a).unwrap();
        let id_b = world.add_object(&b).unwrap();

        world.step(1.0 / 30.0, oversampling).unwrap();

        assert_eq!(world.object_count(), 2);
        assert_eq!(world.object_ids().collect::<Vec<_>>(), vec![id_a, id_b]);
    }

    #[test]
    fn test_removed_object_not_stepped() {
        let mut world = World::unbounded();
        let object = circular_object(0.1);
        object
            .borrow_mut()
            .object
            .body_mut()
            .set_speed(Vector2::new(1.0, 0.0));
        world.add_object(&object).unwrap();
        world.remove_object(&object).unwrap();

        world.step(1.0, 3).unwrap();

        assert_eq!(world.object_count(), 0);
        // detached object kept its pre-removal state
        assert_abs_diff_eq!(object.borrow().object.body().pos().x(), 0.0);
    }

    #[test]
    fn test_double_add_rejected() {
        let mut world = World::unbounded();
        let mut other = World::unbounded();
        let object = circular_object(0.1);
        world.add_object(&object).unwrap();
        assert!(matches!(
            world.add_object(&object),
            Err(WorldError::AlreadyRegistered)
        ));
        assert!(matches!(
            other.add_object(&object),
            Err(WorldError::AlreadyRegistered)
        ));
    }

    #[test]
    fn test_remove_foreign_object_rejected() {
        let mut world = World::unbounded();
        let object = circular_object(0.1);
        assert!(matches!(
            world.remove_object(&object),
            Err(WorldError::NotRegistered)
        ));
    }

    #[test]
    fn test_world_owns_destroys_on_removal() {
        let mut world = World::unbounded();
        world.set_ownership(Ownership::WorldOwns).unwrap();
        let object = circular_object(0.1);
        world.add_object(&object).unwrap();
        world.remove_object(&object).unwrap();

        assert!(object.borrow().registration.is_destroyed());
        assert!(matches!(
            world.add_object(&object),
            Err(WorldError::Destroyed)
        ));
    }

    #[test]
    fn test_ownership_fixed_once_populated() {
        let mut world = World::unbounded();
        world.add_object(&circular_object(0.1)).unwrap();
        assert!(matches!(
            world.set_ownership(Ownership::WorldOwns),
            Err(WorldError::OwnershipFixed)
        ));
    }

    #[test]
    fn test_encoders_after_one_step() {
        let mut world = World::unbounded();
        let robot = slot(SimObject::Puck(Puck::new(PuckCapability::default())));
        {
            let mut slot = robot.borrow_mut();
            let drive = slot.object.as_puck_mut().unwrap().drive_mut();
            drive.left_speed = 1.0;
            drive.right_speed = 1.0;
            drive.reset_encoders();
        }
        world.add_object(&robot).unwrap();

        let dt = 1.0 / 30.0;
        world.step(dt, 3).unwrap();

        let slot = robot.borrow();
        let drive = slot.object.as_puck().unwrap().drive();
        assert_abs_diff_eq!(drive.left_encoder(), dt);
        assert_abs_diff_eq!(drive.right_encoder(), dt);
        assert!(drive.left_encoder() > 0.0);
    }

    #[test]
    fn test_robot_advances_when_driven() {
        let mut world = World::unbounded();
        let robot = slot(SimObject::Puck(Puck::new(PuckCapability::default())));
        {
            let mut slot = robot.borrow_mut();
            let drive = slot.object.as_puck_mut().unwrap().drive_mut();
            drive.left_speed = 1.0;
            drive.right_speed = 1.0;
        }
        world.add_object(&robot).unwrap();
        world.step(1.0 / 30.0, 3).unwrap();

        assert!(robot.borrow().object.body().pos().x() > 0.0);
    }

    #[test]
    fn test_walls_contain_objects() {
        let mut world = World::bounded(1.0, 1.0, Color::GRAY);
        let object = circular_object(0.1);
        {
            let mut slot = object.borrow_mut();
            let body = slot.object.body_mut();
            body.set_pos(Vector2::new(0.5, 0.5));
            body.set_speed(Vector2::new(10.0, 0.0));
        }
        world.add_object(&object).unwrap();

        for _ in 0..30 {
            world.step(1.0 / 30.0, 3).unwrap();
        }

        let slot = object.borrow();
        let pos = slot.object.body().pos();
        assert!(pos.x() >= 0.1 - f64::EPSILON && pos.x() <= 0.9 + f64::EPSILON);
    }

    #[test]
    fn test_raycast_hits_nearest_object() {
        let mut world = World::unbounded();
        let near = circular_object(0.1);
        near.borrow_mut()
            .object
            .body_mut()
            .set_pos(Vector2::new(1.0, 0.0));
        let mut far_body = Body::cylindric(0.1, 1.0, 1.0);
        far_body.set_pos(Vector2::new(2.0, 0.0));
        far_body.set_color(Color::RED);
        let far = slot(SimObject::Passive(far_body));
        world.add_object(&near).unwrap();
        world.add_object(&far).unwrap();

        let hit = world
            .raycast(Vector2::new(0.0, 0.0), 0.0, None)
            .expect("object ahead");
        assert_abs_diff_eq!(hit.distance, 0.9);
    }

    #[test]
    fn test_raycast_hits_walls() {
        let world = World::bounded(2.0, 1.0, Color::BLUE);
        let hit = world
            .raycast(Vector2::new(1.0, 0.5), 0.0, None)
            .expect("wall ahead");
        assert_abs_diff_eq!(hit.distance, 1.0);
        assert_eq!(hit.color, Color::BLUE);

        let circular = World::circular(2.0, Color::RED);
        let hit = circular
            .raycast(Vector2::new(1.0, 0.0), 0.0, None)
            .expect("wall ahead");
        assert_abs_diff_eq!(hit.distance, 1.0);
    }

    #[test]
    fn test_sensors_see_previous_tick_state() {
        let mut world = World::unbounded();
        let robot = slot(SimObject::Puck(Puck::new(PuckCapability::default())));
        let obstacle = circular_object(0.05);
        obstacle
            .borrow_mut()
            .object
            .body_mut()
            .set_pos(Vector2::new(PUCK_FRONT_GAP, 0.0));
        world.add_object(&robot).unwrap();
        world.add_object(&obstacle).unwrap();

        // Before any step the sensors have never been refreshed.
        assert_abs_diff_eq!(
            robot.borrow().object.as_puck().unwrap().proximity_sensor_values()[0],
            0.0
        );

        world.step(1.0 / 30.0, 3).unwrap();
        let value_after_first = robot
            .borrow()
            .object
            .as_puck()
            .unwrap()
            .proximity_sensor_values()[0];
        assert!(value_after_first > 0.0);
        assert!(
            robot
                .borrow()
                .object
                .as_puck()
                .unwrap()
                .proximity_sensor_distances()[0]
                < PROXIMITY_SENSOR_RANGE
        );
    }

    const PUCK_FRONT_GAP: f64 = 0.1;

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let mut world = World::unbounded();
        world.set_random_seed(42);
        let first: Vec<f64> = (0..4).map(|_| world.random_range(0.0, 1.0)).collect();
        world.set_random_seed(42);
        let second: Vec<f64> = (0..4).map(|_| world.random_range(0.0, 1.0)).collect();
        assert_eq!(first, second);
    }
}
