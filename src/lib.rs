//! A scriptable 2D mobile-robot simulator.
//!
//! Worlds hold passive rigid bodies and differential-wheeled robots. Scripts
//! build the scene, optionally override per-robot control with a tick
//! callback, and drive the simulation either headlessly or inside an
//! interactive 3D viewer.

pub mod domain;
pub mod driver;
pub mod resource;
pub mod script;
pub mod viewer;

pub use domain::{Color, Puck, PuckCapability, Vector2, World};
pub use driver::{run, run_in_viewer, CameraRig, STEP_DT, STEP_OVERSAMPLING};
pub use script::{BridgeError, HostError, ScriptHost};
