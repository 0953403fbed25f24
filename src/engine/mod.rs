mod lock_coordinator;
mod replay;
mod transfer_engine;

pub use lock_coordinator::{LockCoordinator, LockedPair};
pub use replay::{CommandReplayer, ReplaySummary};
pub use transfer_engine::TransferEngine;
