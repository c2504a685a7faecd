//! Simulation drivers: the headless stepping loop and the interactive viewer
//! entry point. Both advance the world with the same fixed timestep.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::{Window, WindowPlugin};
use tracing::debug;

use crate::domain::{RobotController, Vector2, World};
use crate::resource::{CameraRigRes, ControllerRes, WorldRes};
use crate::script::BridgeError;
use crate::viewer::ViewerPlugin;

/// Duration of one simulation tick, seconds.
pub const STEP_DT: f64 = 1.0 / 30.0;

/// Physics sub-steps per tick.
pub const STEP_OVERSAMPLING: u32 = 3;

// Windowing backends tolerate one event loop per process.
static VIEWER_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Initial camera placement for the interactive viewer, in world coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct CameraRig {
    pub position: Vector2,
    pub altitude: f64,
    pub yaw: f64,
    pub pitch: f64,
}

/// Step the world `steps` times headlessly, dispatching control through
/// `controller` every tick.
pub fn run(
    world: &Rc<RefCell<World>>,
    steps: u64,
    controller: &mut dyn RobotController,
) -> Result<(), BridgeError> {
    for _ in 0..steps {
        world
            .try_borrow_mut()
            .map_err(|_| BridgeError::WorldBusy)?
            .step_with(STEP_DT, STEP_OVERSAMPLING, controller)
            .map_err(BridgeError::from)?;
    }
    Ok(())
}

/// Open the interactive viewer over the world and block until its window
/// closes. The simulation keeps stepping at the fixed tick rate while the
/// viewer runs.
pub fn run_in_viewer(
    world: Rc<RefCell<World>>,
    controller: Box<dyn RobotController>,
    rig: CameraRig,
) -> Result<(), BridgeError> {
    if VIEWER_ACTIVE
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(BridgeError::ViewerActive);
    }

    debug!("starting interactive viewer");
    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "pucksim".into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(CameraRigRes::from(rig))
        .insert_non_send_resource(WorldRes::from(world))
        .insert_non_send_resource(ControllerRes::from(controller))
        .add_plugins(ViewerPlugin)
        .run();

    VIEWER_ACTIVE.store(false, Ordering::Release);
    Ok(())
}
