mod backend;
#[allow(clippy::module_inception)]
mod error;
mod gate;

pub use backend::{BackendError, TransportKind};
pub use error::CliError;
pub use gate::{GateError, RenderError};
