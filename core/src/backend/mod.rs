mod policy;
mod slot;
mod traits;

#[cfg(test)]
pub(crate) mod fake;

pub use policy::ReconnectPolicy;
pub use slot::BackendSlot;
pub use traits::{
    Attachment, BackendEventTx, BackendFactory, ChatBackend, PairingRenderer,
};
