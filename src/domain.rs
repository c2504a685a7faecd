//! The domain module encapsulates the simulation itself: value types, rigid
//! bodies, robots and the world container, with no scripting or rendering
//! dependencies.

mod color;
mod object;
mod robot;
mod vector;
mod world;

pub use color::{Color, Texture};
pub use object::{Body, Membership, Registration, Shape, SimObject};
pub use robot::{
    DiffDrive, Puck, PuckCapability, RayHit, SensorPose, CAMERA_FIELD_OF_VIEW, CAMERA_PIXEL_COUNT,
    PROXIMITY_SENSOR_COUNT, PROXIMITY_SENSOR_MAX_VALUE, PROXIMITY_SENSOR_RANGE, PUCK_HEIGHT,
    PUCK_MASS, PUCK_RADIUS, PUCK_WHEEL_AXIS,
};
pub use vector::Vector2;
pub use world::{
    Arena, NullController, ObjectId, ObjectRef, Ownership, RobotController, SimSlot, World,
    WorldError, WorldId,
};
