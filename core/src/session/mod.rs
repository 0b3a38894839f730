mod supervisor;

pub use supervisor::SessionSupervisor;
