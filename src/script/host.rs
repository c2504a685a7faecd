//! The script host: compiles a script, runs its top-level statements and
//! dispatches per-tick control callbacks back into it.
//!
//! The host and the per-tick controller use separate engines over the same
//! compiled functions, so a controller can run while the host is suspended
//! inside `run` without sharing mutable state.

use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use rhai::{Dynamic, Engine, EvalAltResult, Scope, Variant, AST};
use thiserror::Error;
use tracing::{debug, info};

use super::api::{self, ObjectHandle, WorldHandle};
use super::{marshal, BridgeError};
use crate::domain::{
    Color, NullController, ObjectRef, Puck, PuckCapability, RobotController, WorldError,
};
use crate::driver::{self, CameraRig, STEP_OVERSAMPLING};

/// Routine name scripts define to override the per-tick control of every
/// robot created afterwards.
pub const DEFAULT_CONTROL_FUNCTION: &str = "control_step";

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("script compilation failed: {0}")]
    Compile(String),
    #[error("script failed: {0}")]
    Runtime(String),
}

#[derive(Default)]
struct HostState {
    ast: Option<AST>,
    controller: Option<RhaiController>,
}

type SharedState = Rc<RefCell<HostState>>;

/// Scope holding the predefined color constants every script starts with.
fn constants_scope() -> Scope<'static> {
    let mut scope = Scope::new();
    scope.push_constant("BLACK", Color::BLACK);
    scope.push_constant("WHITE", Color::WHITE);
    scope.push_constant("GRAY", Color::GRAY);
    scope.push_constant("RED", Color::RED);
    scope.push_constant("GREEN", Color::GREEN);
    scope.push_constant("BLUE", Color::BLUE);
    scope
}

fn has_control_function(ast: &AST) -> bool {
    ast.iter_functions()
        .any(|f| f.name == DEFAULT_CONTROL_FUNCTION && f.params.len() == 2)
}

/// Per-tick controller calling back into the compiled script functions.
///
/// Only the function definitions are kept; the script's top-level statements
/// never re-run during control dispatch.
pub(crate) struct RhaiController {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
}

impl RhaiController {
    fn new(ast: &AST) -> Self {
        let mut engine = Engine::new();
        api::register_api(&mut engine);
        Self {
            engine,
            ast: ast.clone_functions_only(),
            scope: constants_scope(),
        }
    }
}

impl RobotController for RhaiController {
    fn control(&mut self, function: &str, robot: &ObjectRef, dt: f64) -> Result<(), WorldError> {
        let handle = ObjectHandle::from_ref(robot.clone());
        match self
            .engine
            .call_fn::<Dynamic>(&mut self.scope, &self.ast, function, (handle, dt))
        {
            Ok(_) => Ok(()),
            Err(err) => match *err {
                EvalAltResult::ErrorFunctionNotFound(ref missing, _)
                    if missing.starts_with(function) =>
                {
                    debug!(function, "control routine not defined, native behavior");
                    Ok(())
                }
                _ => Err(WorldError::Control(err.to_string())),
            },
        }
    }
}

/// Run `body` with the script controller, building or reusing the cached one.
/// Without a compiled script every robot keeps its native behavior.
fn with_controller<R>(
    shared: &SharedState,
    body: impl FnOnce(&mut dyn RobotController) -> R,
) -> R {
    let cached = {
        let mut state = shared.borrow_mut();
        match state.controller.take() {
            Some(controller) => Some(controller),
            None => state.ast.as_ref().map(RhaiController::new),
        }
    };
    match cached {
        Some(mut controller) => {
            let result = body(&mut controller);
            shared.borrow_mut().controller = Some(controller);
            result
        }
        None => body(&mut NullController),
    }
}

fn new_puck(shared: &SharedState, capability: PuckCapability) -> ObjectHandle {
    let mut puck = Puck::new(capability);
    let overridden = shared
        .borrow()
        .ast
        .as_ref()
        .is_some_and(has_control_function);
    if overridden {
        puck.set_control_function(Some(DEFAULT_CONTROL_FUNCTION.to_owned()));
    }
    ObjectHandle::puck(puck)
}

fn step_world(
    shared: &SharedState,
    world: &WorldHandle,
    dt: f64,
    oversampling: u32,
) -> Result<(), BridgeError> {
    with_controller(shared, |controller| {
        world
            .lock()?
            .step_with(dt, oversampling, controller)
            .map_err(BridgeError::from)
    })
}

fn launch_viewer(
    shared: &SharedState,
    world: &WorldHandle,
    rig: CameraRig,
) -> Result<(), BridgeError> {
    // The controller moves into the viewer loop and is rebuilt lazily after.
    let controller: Box<dyn RobotController> = {
        let mut state = shared.borrow_mut();
        match state.controller.take() {
            Some(controller) => Box::new(controller),
            None => match &state.ast {
                Some(ast) => Box::new(RhaiController::new(ast)),
                None => Box::new(NullController),
            },
        }
    };
    driver::run_in_viewer(world.world().clone(), controller, rig)
}

fn register_host_functions(engine: &mut Engine, shared: &SharedState) {
    type RhaiResult<T> = Result<T, Box<EvalAltResult>>;

    let state = shared.clone();
    engine.register_fn("Puck", move || new_puck(&state, PuckCapability::default()));
    let state = shared.clone();
    engine.register_fn("Puck", move |camera: bool| {
        new_puck(
            &state,
            PuckCapability {
                base_sensors: true,
                camera,
            },
        )
    });

    let state = shared.clone();
    engine.register_fn(
        "step",
        move |world: &mut WorldHandle, dt: Dynamic| -> RhaiResult<()> {
            step_world(&state, world, marshal::scalar_or_err(&dt)?, STEP_OVERSAMPLING)?;
            Ok(())
        },
    );
    let state = shared.clone();
    engine.register_fn(
        "step",
        move |world: &mut WorldHandle, dt: Dynamic, oversampling: i64| -> RhaiResult<()> {
            let oversampling = u32::try_from(oversampling.max(1)).unwrap_or(1);
            step_world(&state, world, marshal::scalar_or_err(&dt)?, oversampling)?;
            Ok(())
        },
    );

    let state = shared.clone();
    engine.register_fn(
        "run",
        move |world: &mut WorldHandle, steps: i64| -> RhaiResult<()> {
            let steps = u64::try_from(steps).map_err(|_| BridgeError::NegativeSteps(steps))?;
            with_controller(&state, |controller| {
                driver::run(world.world(), steps, controller)
            })?;
            Ok(())
        },
    );

    let state = shared.clone();
    engine.register_fn(
        "run_in_viewer",
        move |world: &mut WorldHandle| -> RhaiResult<()> {
            launch_viewer(&state, world, CameraRig::default())?;
            Ok(())
        },
    );
    let state = shared.clone();
    engine.register_fn(
        "run_in_viewer",
        move |world: &mut WorldHandle, position: Dynamic| -> RhaiResult<()> {
            let rig = CameraRig {
                position: marshal::vector_from_dynamic(&position)?,
                ..CameraRig::default()
            };
            launch_viewer(&state, world, rig)?;
            Ok(())
        },
    );
    let state = shared.clone();
    engine.register_fn(
        "run_in_viewer",
        move |world: &mut WorldHandle, position: Dynamic, altitude: Dynamic| -> RhaiResult<()> {
            let rig = CameraRig {
                position: marshal::vector_from_dynamic(&position)?,
                altitude: marshal::scalar_or_err(&altitude)?,
                ..CameraRig::default()
            };
            launch_viewer(&state, world, rig)?;
            Ok(())
        },
    );
    let state = shared.clone();
    engine.register_fn(
        "run_in_viewer",
        move |world: &mut WorldHandle,
              position: Dynamic,
              altitude: Dynamic,
              yaw: Dynamic|
              -> RhaiResult<()> {
            let rig = CameraRig {
                position: marshal::vector_from_dynamic(&position)?,
                altitude: marshal::scalar_or_err(&altitude)?,
                yaw: marshal::scalar_or_err(&yaw)?,
                ..CameraRig::default()
            };
            launch_viewer(&state, world, rig)?;
            Ok(())
        },
    );
    let state = shared.clone();
    engine.register_fn(
        "run_in_viewer",
        move |world: &mut WorldHandle,
              position: Dynamic,
              altitude: Dynamic,
              yaw: Dynamic,
              pitch: Dynamic|
              -> RhaiResult<()> {
            let rig = CameraRig {
                position: marshal::vector_from_dynamic(&position)?,
                altitude: marshal::scalar_or_err(&altitude)?,
                yaw: marshal::scalar_or_err(&yaw)?,
                pitch: marshal::scalar_or_err(&pitch)?,
            };
            launch_viewer(&state, world, rig)?;
            Ok(())
        },
    );
}

/// Owner of the scripting engine and the compiled script.
pub struct ScriptHost {
    engine: Engine,
    shared: SharedState,
}

impl ScriptHost {
    pub fn new() -> Self {
        let shared = SharedState::default();
        let mut engine = Engine::new();
        api::register_api(&mut engine);
        register_host_functions(&mut engine, &shared);
        Self { engine, shared }
    }

    /// Compile and run a script file to completion.
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "running script");
        self.run_source(&source)
    }

    /// Compile and run a script from source.
    pub fn run_source(&mut self, source: &str) -> Result<(), HostError> {
        let ast = self.compile(source)?;
        let mut scope = constants_scope();
        self.engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|err| HostError::Runtime(err.to_string()))
    }

    /// Compile and run a script, returning the value of its final expression.
    pub fn eval<T: Variant + Clone>(&mut self, source: &str) -> Result<T, HostError> {
        let ast = self.compile(source)?;
        let mut scope = constants_scope();
        self.engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|err| HostError::Runtime(err.to_string()))
    }

    fn compile(&mut self, source: &str) -> Result<AST, HostError> {
        let ast = self
            .engine
            .compile(source)
            .map_err(|err| HostError::Compile(err.to_string()))?;
        let mut state = self.shared.borrow_mut();
        state.controller = None;
        state.ast = Some(ast.clone());
        Ok(ast)
    }
}

impl Default for ScriptHost {
    fn default() -> Self {
        Self::new()
    }
}
