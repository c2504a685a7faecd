//! Wrappers handing the simulation state to the rendering app. The world and
//! controller are single-threaded by construction, so they travel as non-Send
//! resources and every system touching them runs on the main thread.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use bevy::prelude::Resource;

use crate::domain::{RobotController, World};
use crate::driver::CameraRig;

/// The world stepped and drawn by the viewer.
pub struct WorldRes(Rc<RefCell<World>>);

impl Deref for WorldRes {
    type Target = Rc<RefCell<World>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Rc<RefCell<World>>> for WorldRes {
    fn from(world: Rc<RefCell<World>>) -> Self {
        Self(world)
    }
}

/// The controller dispatching per-tick control while the viewer runs.
pub struct ControllerRes(Box<dyn RobotController>);

impl ControllerRes {
    pub fn get_mut(&mut self) -> &mut dyn RobotController {
        self.0.as_mut()
    }
}

impl Deref for ControllerRes {
    type Target = Box<dyn RobotController>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ControllerRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Box<dyn RobotController>> for ControllerRes {
    fn from(controller: Box<dyn RobotController>) -> Self {
        Self(controller)
    }
}

/// Initial camera placement requested by the caller.
#[derive(Resource, Clone, Copy)]
pub struct CameraRigRes(CameraRig);

impl Deref for CameraRigRes {
    type Target = CameraRig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<CameraRig> for CameraRigRes {
    fn from(rig: CameraRig) -> Self {
        Self(rig)
    }
}
