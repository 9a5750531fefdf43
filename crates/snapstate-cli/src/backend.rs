use std::path::Path;

use snapstate_common::Result;
use snapstate_config::StateBackend;
use snapstate_store::{FileStateStore, SqliteStateStore, StateStore};

/// Open the configured store. A `read_only` store leaves the disk untouched,
/// even when nothing exists at `path` yet.
pub fn open_store(
    backend: StateBackend,
    path: &Path,
    read_only: bool,
) -> Result<Box<dyn StateStore>> {
    let store: Box<dyn StateStore> = match backend {
        // The file store touches nothing until it saves.
        StateBackend::File => Box::new(FileStateStore::new(path)),
        StateBackend::Sqlite if read_only => Box::new(SqliteStateStore::open_read_only(path)?),
        StateBackend::Sqlite => Box::new(SqliteStateStore::open(path)?),
    };
    Ok(store)
}
