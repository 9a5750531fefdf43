pub mod file_store;
pub mod memory_store;
pub mod restore;
pub mod sqlite_store;
pub mod store;

pub use file_store::FileStateStore;
pub use memory_store::MemoryStateStore;
pub use restore::{RecoveryReason, RestoreOptions, RestoreStatus, Restored, restore};
pub use sqlite_store::SqliteStateStore;
pub use store::StateStore;
