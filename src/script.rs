//! The scripting boundary layer: marshaling between rhai values and domain
//! types, the script-facing object model, and the script host driving the
//! per-tick control dispatch.

mod api;
mod host;
mod marshal;

use rhai::{EvalAltResult, Position};
use thiserror::Error;

use crate::domain::WorldError;

pub use api::{ObjectHandle, TextureHandle, WorldHandle};
pub use host::{HostError, ScriptHost, DEFAULT_CONTROL_FUNCTION};
pub use marshal::{
    components_from_dynamic, components_to_array, vector_from_dynamic, vector_to_array,
};

/// Errors raised while a value or call crosses the native/script boundary.
/// Every variant surfaces synchronously at the call that triggered it; failed
/// conversions are detected before any state is mutated.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("expected {expected}, got {found}")]
    Conversion {
        expected: &'static str,
        found: String,
    },
    #[error("expected exactly {expected} numeric components, got {got}")]
    Arity { expected: usize, got: usize },
    #[error(transparent)]
    World(#[from] WorldError),
    #[error("`{property}` is only available on robots")]
    NotARobot { property: &'static str },
    #[error("this robot has no camera")]
    NoCamera,
    #[error("the world is busy stepping")]
    WorldBusy,
    #[error("texture index {index} out of range (len {len})")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("steps count must be non-negative, got {0}")]
    NegativeSteps(i64),
    #[error("another viewer session is already active")]
    ViewerActive,
}

impl From<BridgeError> for Box<EvalAltResult> {
    fn from(err: BridgeError) -> Self {
        EvalAltResult::ErrorRuntime(err.to_string().into(), Position::NONE).into()
    }
}
