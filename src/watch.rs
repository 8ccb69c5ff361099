use crate::models::SharedTable;
use crate::storage::{SnippetStore, TableSource};
use log::info;
use std::fs;
use std::time::SystemTime;

/// Reloads the shared table when the snippet file changes on disk
#[derive(Debug)]
pub struct SnippetWatcher {
    store: SnippetStore,
    last_modified: Option<SystemTime>,
}

impl SnippetWatcher {
    pub fn new(store: SnippetStore) -> Self {
        let last_modified = modified_time(&store);
        Self {
            store,
            last_modified,
        }
    }

    pub fn store(&self) -> &SnippetStore {
        &self.store
    }

    /// Reload and swap the table if the file changed since the last check
    pub fn check(&mut self, table: &SharedTable) -> Option<TableSource> {
        let current = modified_time(&self.store);
        if current == self.last_modified {
            return None;
        }

        info!("Snippets file changed; reloading");
        let source = reload(&self.store, table);
        // Reloading may have re-created the file
        self.last_modified = modified_time(&self.store);
        Some(source)
    }
}

/// Load the store (with fallback) and swap the result into `table`
pub fn reload(store: &SnippetStore, table: &SharedTable) -> TableSource {
    let (snippets, source) = store.load_or_default();
    let count = snippets.len();
    table.replace(snippets);
    info!("Active snippet table has {} entries ({:?})", count, source);
    source
}

fn modified_time(store: &SnippetStore) -> Option<SystemTime> {
    fs::metadata(store.path())
        .and_then(|metadata| metadata.modified())
        .ok()
}
