pub mod sync_factory;
pub mod sync_supervisor;
pub mod sync_worker;

pub use sync_supervisor::{SyncStats, SyncSupervisor, SyncSupervisorMessage};
