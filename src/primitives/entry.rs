// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::Address;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// One address assignment in an entry's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub address: Address,
    pub version: u64,
    pub timestamp: i64,
    pub reason: String,
}

/// Marks the point at which an entry was cleared from the live table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RemovalRecord {
    /// Version the entry carried when it was removed
    pub version: u64,
    pub timestamp: i64,
}

/// A named registry record: the current live address plus the full audit
/// trail of every assignment and removal.
///
/// Invariant: `history.len() == version` from the first assignment onward.
/// `history` holds exactly one record per address assignment; removals are
/// tracked separately so the version to history bijection always holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Current resolved address. `None` once removed from the live table.
    pub address: Option<Address>,

    /// Monotonically increasing assignment counter, starting at 1.
    pub version: u64,

    /// Append-only list of all address assignments.
    pub history: Vec<HistoryRecord>,

    /// Append-only list of all removals.
    pub removals: Vec<RemovalRecord>,
}

impl RegistryEntry {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.address.is_some()
    }

    /// Applies a new address assignment and returns the new version.
    pub fn assign(&mut self, address: Address, timestamp: i64, reason: &str) -> u64 {
        self.version += 1;
        self.history.push(HistoryRecord {
            address,
            version: self.version,
            timestamp,
            reason: reason.to_owned(),
        });
        self.address = Some(address);
        debug_assert_eq!(self.history.len() as u64, self.version);
        self.version
    }

    /// Clears the live address, keeping the version counter and history.
    pub fn remove(&mut self, timestamp: i64) {
        self.removals.push(RemovalRecord {
            version: self.version,
            timestamp,
        });
        self.address = None;
    }

    #[must_use]
    pub fn info(&self, name: &str) -> EntryInfo {
        EntryInfo {
            name: name.to_owned(),
            address: self.address,
            version: self.version,
            history_len: self.history.len() as u64,
            removals: self.removals.clone(),
        }
    }
}

/// Audit snapshot of a single entry as returned over RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub name: String,
    pub address: Option<Address>,
    pub version: u64,
    pub history_len: u64,
    pub removals: Vec<RemovalRecord>,
}
