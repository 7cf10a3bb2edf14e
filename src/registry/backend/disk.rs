// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Address, RegistryEntry};
use crate::registry::backend::{RegistryBackend, RegistryBackendErr, StoredState, DB};
use rocksdb::IteratorMode;
use std::collections::HashMap;
use std::sync::Arc;

pub const ENTRIES_CF: &str = "entries";
pub const META_CF: &str = "meta";

/// Meta column family keys
const AUTHORIZED_KEY: &[u8] = b"authorized";
const EMERGENCY_KEY: &[u8] = b"emergency";

/// RocksDB backed persistence. Every write is committed as a single
/// transaction, so a crash can never leave a half written record behind.
#[derive(Clone)]
pub struct DiskBackend {
    db: Arc<DB>,
}

impl DiskBackend {
    #[must_use]
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }
}

impl RegistryBackend for DiskBackend {
    fn load(&self) -> Result<StoredState, RegistryBackendErr> {
        let entries_cf = self
            .db
            .cf_handle(ENTRIES_CF)
            .ok_or(RegistryBackendErr::Error("missing entries column family"))?;
        let meta_cf = self
            .db
            .cf_handle(META_CF)
            .ok_or(RegistryBackendErr::Error("missing meta column family"))?;

        let mut entries = HashMap::new();
        for item in self.db.iterator_cf(&entries_cf, IteratorMode::Start) {
            let (key, value) = item?;
            let name =
                String::from_utf8(key.to_vec()).map_err(|_| RegistryBackendErr::CorruptData)?;
            let entry: RegistryEntry = crate::codec::decode(&value)?;
            entries.insert(name, entry);
        }

        let authorized: Vec<Address> = match self.db.get_cf(&meta_cf, AUTHORIZED_KEY)? {
            Some(bytes) => crate::codec::decode(&bytes)?,
            None => Vec::new(),
        };

        let emergency = match self.db.get_cf(&meta_cf, EMERGENCY_KEY)? {
            Some(bytes) => bytes.first() == Some(&1),
            None => false,
        };

        Ok(StoredState {
            entries,
            authorized,
            emergency,
        })
    }

    fn write_entry(&self, name: &str, entry: &RegistryEntry) -> Result<(), RegistryBackendErr> {
        let entries_cf = self
            .db
            .cf_handle(ENTRIES_CF)
            .ok_or(RegistryBackendErr::Error("missing entries column family"))?;
        let tx = self.db.transaction();
        tx.put_cf(&entries_cf, name.as_bytes(), crate::codec::encode_to_vec(entry)?)?;
        tx.commit()?;
        Ok(())
    }

    fn write_authorized(&self, authorized: &[Address]) -> Result<(), RegistryBackendErr> {
        let meta_cf = self
            .db
            .cf_handle(META_CF)
            .ok_or(RegistryBackendErr::Error("missing meta column family"))?;
        let tx = self.db.transaction();
        tx.put_cf(
            &meta_cf,
            AUTHORIZED_KEY,
            crate::codec::encode_to_vec(&authorized.to_vec())?,
        )?;
        tx.commit()?;
        Ok(())
    }

    fn write_emergency(&self, active: bool) -> Result<(), RegistryBackendErr> {
        let meta_cf = self
            .db
            .cf_handle(META_CF)
            .ok_or(RegistryBackendErr::Error("missing meta column family"))?;
        let tx = self.db.transaction();
        tx.put_cf(&meta_cf, EMERGENCY_KEY, [u8::from(active)])?;
        tx.commit()?;
        Ok(())
    }
}
