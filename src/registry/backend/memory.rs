// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Address, RegistryEntry};
use crate::registry::backend::{RegistryBackend, RegistryBackendErr, StoredState};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory persistence twin of the disk backend, used by tests and by
/// nodes running with `memory_only`. Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryStore>>,
}

#[derive(Debug, Default)]
struct MemoryStore {
    entries: HashMap<String, RegistryEntry>,
    authorized: Vec<Address>,
    emergency: bool,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryBackend for MemoryBackend {
    fn load(&self) -> Result<StoredState, RegistryBackendErr> {
        let store = self.inner.read();
        Ok(StoredState {
            entries: store.entries.clone(),
            authorized: store.authorized.clone(),
            emergency: store.emergency,
        })
    }

    fn write_entry(&self, name: &str, entry: &RegistryEntry) -> Result<(), RegistryBackendErr> {
        self.inner
            .write()
            .entries
            .insert(name.to_owned(), entry.clone());
        Ok(())
    }

    fn write_authorized(&self, authorized: &[Address]) -> Result<(), RegistryBackendErr> {
        self.inner.write().authorized = authorized.to_vec();
        Ok(())
    }

    fn write_emergency(&self, active: bool) -> Result<(), RegistryBackendErr> {
        self.inner.write().emergency = active;
        Ok(())
    }
}
