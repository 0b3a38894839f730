mod gate;
mod processed;
mod types;

pub use gate::DispatchGate;
pub use processed::ProcessedMessages;
pub use types::{DispatchOutcome, SendRequest};
