// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Address, RegistryEntry};
use bincode::error::DecodeError as BincodeDecodeErr;
use bincode::error::EncodeError as BincodeEncodeErr;
use rocksdb::Error as RocksDBErr;
use rocksdb::{ColumnFamilyDescriptor, LogLevel, MultiThreaded, Options, TransactionDB, TransactionDBOptions};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub type DB = TransactionDB<MultiThreaded>;

/// Write-through persistence interface for the registry. Each write call is
/// atomic on its own; the registry serializes calls under its write lock, so
/// implementations never see interleaved mutations.
pub trait RegistryBackend: Clone + Send + Sync + 'static {
    /// Loads the full persisted registry state.
    fn load(&self) -> Result<StoredState, RegistryBackendErr>;

    /// Persists the full record stored under a name, history included.
    fn write_entry(&self, name: &str, entry: &RegistryEntry) -> Result<(), RegistryBackendErr>;

    /// Persists the authorized updater set.
    fn write_authorized(&self, authorized: &[Address]) -> Result<(), RegistryBackendErr>;

    /// Persists the emergency mode flag.
    fn write_emergency(&self, active: bool) -> Result<(), RegistryBackendErr>;
}

/// Registry state as read back from a backend at startup.
#[derive(Debug, Default)]
pub struct StoredState {
    pub entries: HashMap<String, RegistryEntry>,
    pub authorized: Vec<Address>,
    pub emergency: bool,
}

#[derive(Debug)]
pub enum RegistryBackendErr {
    /// Backend data is corrupted
    CorruptData,

    /// Rocksdb error
    RocksDB(RocksDBErr),

    /// Bincode encode error
    BincodeEncode(BincodeEncodeErr),

    /// Bincode decode error
    BincodeDecode(BincodeDecodeErr),

    /// Generic error
    Error(&'static str),
}

impl From<RocksDBErr> for RegistryBackendErr {
    fn from(other: RocksDBErr) -> Self {
        Self::RocksDB(other)
    }
}

impl From<BincodeEncodeErr> for RegistryBackendErr {
    fn from(other: BincodeEncodeErr) -> Self {
        Self::BincodeEncode(other)
    }
}

impl From<BincodeDecodeErr> for RegistryBackendErr {
    fn from(other: BincodeDecodeErr) -> Self {
        Self::BincodeDecode(other)
    }
}

/// Opens the RocksDB database at the given path, creating it and the
/// registry column families when missing.
#[must_use]
pub fn create_rocksdb_backend_at(path: PathBuf) -> Arc<DB> {
    // RocksDB only creates the final path segment on its own
    std::fs::create_dir_all(&path).unwrap_or(());

    let mut cf_opts = Options::default();
    cf_opts.set_max_write_buffer_number(3);
    let cfs = vec![
        ColumnFamilyDescriptor::new(crate::registry::backend::disk::ENTRIES_CF, cf_opts.clone()),
        ColumnFamilyDescriptor::new(crate::registry::backend::disk::META_CF, cf_opts),
    ];

    let mut db_opts = Options::default();
    db_opts.create_missing_column_families(true);
    db_opts.create_if_missing(true);
    db_opts.set_log_level(LogLevel::Warn);
    db_opts.set_keep_log_file_num(1);
    let db =
        DB::open_cf_descriptors(&db_opts, &TransactionDBOptions::default(), path, cfs).unwrap();
    Arc::new(db)
}

/// Opens the node database under the configured data directory.
#[must_use]
pub fn create_rocksdb_backend() -> Arc<DB> {
    #[cfg(not(test))]
    let mut path = PathBuf::from_str(&crate::settings::SETTINGS.node.data_dir).unwrap();

    #[cfg(test)]
    let mut path = {
        use rand::Rng;
        let mut path = std::env::temp_dir();
        path.push(hex::encode(rand::thread_rng().gen::<[u8; 32]>()));
        path.push("Chainreg");
        path
    };

    path.push(&crate::settings::SETTINGS.node.network_name);
    path.push("data");

    create_rocksdb_backend_at(path)
}

pub mod disk;
pub mod memory;
