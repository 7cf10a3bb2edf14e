// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::{Address, EntryInfo, HistoryRecord, RegistryEntry};
use crate::registry::backend::{RegistryBackend, RegistryBackendErr};
use crate::registry::checker::ExistenceChecker;
use crate::registry::config::RegistryConfig;
use chrono::prelude::*;
use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use triomphe::Arc;

/// Audit reason recorded for the first assignment of a name
pub const REASON_INITIAL: &str = "Initial registration";

/// Audit reason recorded when a live name changes address
pub const REASON_UPDATE: &str = "Address update";

/// Audit reason recorded when a removed name comes back to the live table
pub const REASON_REREGISTER: &str = "Re-registration";

/// Audit reason recorded on the emergency path
pub const REASON_EMERGENCY: &str = "Emergency update";

#[derive(Debug)]
pub enum RegistryErr {
    /// Caller is neither the owner nor an authorized updater
    Unauthorized,

    /// No live entry exists under the given name
    NotFound,

    /// Input failed validation
    InvalidInput(InputErr),

    /// The live name count reached the configured maximum
    CapacityExceeded,

    /// Normal mutation attempted while emergency mode is active
    EmergencyActive,

    /// Emergency path used while emergency mode is off
    NotInEmergency,

    /// Storage backend failure
    Backend(RegistryBackendErr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputErr {
    /// Name is empty
    EmptyName,

    /// Name exceeds the configured byte limit
    NameTooLong,

    /// The zero address can never be registered
    ZeroAddress,

    /// Address is not valid hex of the expected length
    MalformedAddress,

    /// No deployed code at the target address
    NoCode,
}

impl From<RegistryBackendErr> for RegistryErr {
    fn from(other: RegistryBackendErr) -> Self {
        Self::Backend(other)
    }
}

impl From<InputErr> for RegistryErr {
    fn from(other: InputErr) -> Self {
        Self::InvalidInput(other)
    }
}

/// Authoritative name to contract address directory with versioning, an
/// append-only audit trail, authorization gating and an owner-only
/// emergency override.
///
/// All state sits behind a single reader-writer lock: mutations hold the
/// write lock across their whole check, persist and commit sequence, so
/// versions for a name can never interleave and readers never observe a
/// torn update. The backend is written before memory is touched; a storage
/// failure therefore leaves the registry unchanged.
#[derive(Clone)]
pub struct Registry<B: RegistryBackend, C: ExistenceChecker> {
    backend: B,
    checker: C,
    config: RegistryConfig,
    state: Arc<RwLock<RegistryState>>,
}

struct RegistryState {
    entries: HashMap<String, RegistryEntry>,
    live_names: Vec<String>,
    live_index: HashMap<String, usize>,
    authorized: HashSet<Address>,
    emergency: bool,
}

impl<B: RegistryBackend, C: ExistenceChecker> Registry<B, C> {
    /// Opens a registry over the given backend, loading any persisted state.
    pub fn open(backend: B, checker: C, config: RegistryConfig) -> Result<Self, RegistryErr> {
        let stored = backend.load()?;

        let mut live_names = Vec::new();
        let mut live_index = HashMap::new();
        for (name, entry) in &stored.entries {
            if entry.is_live() {
                live_index.insert(name.clone(), live_names.len());
                live_names.push(name.clone());
            }
        }

        info!(
            "registry opened with {} entries ({} live)",
            stored.entries.len(),
            live_names.len()
        );

        let state = RegistryState {
            entries: stored.entries,
            live_names,
            live_index,
            authorized: stored.authorized.into_iter().collect(),
            emergency: stored.emergency,
        };

        Ok(Self {
            backend,
            checker,
            config,
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Registers or updates the contract address stored under a name and
    /// returns the new version.
    pub fn set_contract(
        &self,
        caller: Address,
        name: &str,
        address: Address,
    ) -> Result<u64, RegistryErr> {
        let mut state = self.state.write();
        self.check_authorized(&state, &caller)?;

        if state.emergency {
            return Err(RegistryErr::EmergencyActive);
        }

        self.validate_name(name)?;

        if address.is_zero() {
            return Err(InputErr::ZeroAddress.into());
        }

        if !self.checker.has_code(&address) {
            return Err(InputErr::NoCode.into());
        }

        let (was_live, mut entry, reason) = {
            let existing = state.entries.get(name);
            let was_live = existing.map_or(false, RegistryEntry::is_live);
            let reason = match existing {
                None => REASON_INITIAL,
                Some(e) if e.is_live() => REASON_UPDATE,
                Some(_) => REASON_REREGISTER,
            };
            (was_live, existing.cloned().unwrap_or_default(), reason)
        };

        if !was_live && state.live_names.len() >= self.config.max_entries {
            return Err(RegistryErr::CapacityExceeded);
        }

        let version = entry.assign(address, Utc::now().timestamp(), reason);
        self.backend.write_entry(name, &entry)?;

        if !was_live {
            let pos = state.live_names.len();
            state.live_index.insert(name.to_owned(), pos);
            state.live_names.push(name.to_owned());
        }
        state.entries.insert(name.to_owned(), entry);

        info!("registered contract {name} v{version} -> {address}");
        Ok(version)
    }

    /// Resolves the current live address for a name.
    pub fn get_contract(&self, name: &str) -> Result<Address, RegistryErr> {
        self.state
            .read()
            .entries
            .get(name)
            .and_then(|entry| entry.address)
            .ok_or(RegistryErr::NotFound)
    }

    /// Clears the live mapping for a name. The entry's history and version
    /// counter survive, and the name may be registered again later.
    pub fn remove_contract(&self, caller: Address, name: &str) -> Result<(), RegistryErr> {
        let mut state = self.state.write();
        self.check_authorized(&state, &caller)?;

        if state.emergency {
            return Err(RegistryErr::EmergencyActive);
        }

        let mut entry = match state.entries.get(name) {
            Some(entry) if entry.is_live() => entry.clone(),
            _ => return Err(RegistryErr::NotFound),
        };

        entry.remove(Utc::now().timestamp());
        self.backend.write_entry(name, &entry)?;

        state.entries.insert(name.to_owned(), entry);

        // Swap-with-last removal from the live list. O(1), does not preserve
        // iteration order.
        if let Some(idx) = state.live_index.remove(name) {
            state.live_names.swap_remove(idx);
            if idx < state.live_names.len() {
                let moved = state.live_names[idx].clone();
                state.live_index.insert(moved, idx);
            }
        }

        info!("removed contract {name} from the live table");
        Ok(())
    }

    /// Returns true when a live entry exists for the name.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.state
            .read()
            .entries
            .get(name)
            .map_or(false, RegistryEntry::is_live)
    }

    /// Grants or revokes updater rights. Owner only. The owner itself is
    /// always authorized regardless of set membership.
    pub fn set_authorized_updater(
        &self,
        caller: Address,
        address: Address,
        authorized: bool,
    ) -> Result<(), RegistryErr> {
        let mut state = self.state.write();
        self.check_owner(&caller)?;

        if address.is_zero() {
            return Err(InputErr::ZeroAddress.into());
        }

        let mut updated = state.authorized.clone();
        if authorized {
            updated.insert(address);
        } else {
            updated.remove(&address);
        }

        let mut as_vec: Vec<Address> = updated.iter().copied().collect();
        as_vec.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        self.backend.write_authorized(&as_vec)?;

        state.authorized = updated;
        info!("updater {address} authorized={authorized}");
        Ok(())
    }

    /// Toggles emergency mode. Owner only.
    pub fn set_emergency_mode(&self, caller: Address, active: bool) -> Result<(), RegistryErr> {
        let mut state = self.state.write();
        self.check_owner(&caller)?;

        self.backend.write_emergency(active)?;

        if active && !state.emergency {
            warn!("emergency mode enabled, normal mutations are disabled");
        } else if !active && state.emergency {
            info!("emergency mode cleared");
        }

        state.emergency = active;
        Ok(())
    }

    /// Break-glass update path: owner only, requires emergency mode, and
    /// skips the capacity and code checks. The change is still versioned
    /// and recorded in history.
    pub fn emergency_update_contract(
        &self,
        caller: Address,
        name: &str,
        address: Address,
    ) -> Result<u64, RegistryErr> {
        let mut state = self.state.write();
        self.check_owner(&caller)?;

        if !state.emergency {
            return Err(RegistryErr::NotInEmergency);
        }

        self.validate_name(name)?;

        if address.is_zero() {
            return Err(InputErr::ZeroAddress.into());
        }

        let (was_live, mut entry) = {
            let existing = state.entries.get(name);
            let was_live = existing.map_or(false, RegistryEntry::is_live);
            (was_live, existing.cloned().unwrap_or_default())
        };

        let version = entry.assign(address, Utc::now().timestamp(), REASON_EMERGENCY);
        self.backend.write_entry(name, &entry)?;

        if !was_live {
            let pos = state.live_names.len();
            state.live_index.insert(name.to_owned(), pos);
            state.live_names.push(name.to_owned());
        }
        state.entries.insert(name.to_owned(), entry);

        warn!("emergency update of {name} to {address} (v{version})");
        Ok(version)
    }

    /// Paginated read of a name's assignment history. Clamps out of range
    /// input instead of failing; unknown names yield an empty page.
    #[must_use]
    pub fn get_contract_history(&self, name: &str, offset: u64, limit: u64) -> Vec<HistoryRecord> {
        let state = self.state.read();
        let entry = match state.entries.get(name) {
            Some(entry) => entry,
            None => return Vec::new(),
        };

        let len = entry.history.len();
        let start = offset.min(len as u64) as usize;
        let take = limit.min(len as u64) as usize;
        let end = (start + take).min(len);
        entry.history[start..end].to_vec()
    }

    /// Snapshot of the live names. Iteration order is unspecified.
    #[must_use]
    pub fn registered_names(&self) -> Vec<String> {
        self.state.read().live_names.clone()
    }

    /// Full audit snapshot for a name, removals included.
    #[must_use]
    pub fn entry_info(&self, name: &str) -> Option<EntryInfo> {
        self.state
            .read()
            .entries
            .get(name)
            .map(|entry| entry.info(name))
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.state.read().live_names.len()
    }

    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.state.read().emergency
    }

    #[must_use]
    pub fn is_authorized(&self, address: &Address) -> bool {
        *address == self.config.owner || self.state.read().authorized.contains(address)
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.config.owner
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.max_entries
    }

    fn check_authorized(&self, state: &RegistryState, caller: &Address) -> Result<(), RegistryErr> {
        if *caller == self.config.owner || state.authorized.contains(caller) {
            Ok(())
        } else {
            Err(RegistryErr::Unauthorized)
        }
    }

    fn check_owner(&self, caller: &Address) -> Result<(), RegistryErr> {
        if *caller == self.config.owner {
            Ok(())
        } else {
            Err(RegistryErr::Unauthorized)
        }
    }

    fn validate_name(&self, name: &str) -> Result<(), RegistryErr> {
        if name.is_empty() {
            return Err(InputErr::EmptyName.into());
        }

        if name.len() > self.config.max_name_bytes {
            return Err(InputErr::NameTooLong.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::backend::memory::MemoryBackend;
    use crate::registry::checker::DeploymentTable;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address(bytes)
    }

    fn owner() -> Address {
        addr(1)
    }

    fn test_registry() -> Registry<MemoryBackend, DeploymentTable> {
        Registry::open(
            MemoryBackend::new(),
            DeploymentTable::new(true),
            RegistryConfig::new(owner()),
        )
        .unwrap()
    }

    fn snapshot(reg: &Registry<MemoryBackend, DeploymentTable>) -> (Vec<EntryInfo>, Vec<String>, bool) {
        let mut names = reg.registered_names();
        names.sort();
        let mut infos: Vec<_> = names
            .iter()
            .filter_map(|name| reg.entry_info(name))
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        (infos, names, reg.is_emergency())
    }

    #[test]
    fn register_then_lookup() {
        let reg = test_registry();
        let target = addr(0xaa);
        assert_eq!(reg.set_contract(owner(), "UserService", target).unwrap(), 1);
        assert_eq!(reg.get_contract("UserService").unwrap(), target);
    }

    #[test]
    fn version_increments_by_one_per_update() {
        let reg = test_registry();
        for expected in 1..=5u64 {
            let version = reg
                .set_contract(owner(), "Oracle", addr(expected as u8 + 10))
                .unwrap();
            assert_eq!(version, expected);
            let info = reg.entry_info("Oracle").unwrap();
            assert_eq!(info.history_len, info.version);
        }
    }

    #[test]
    fn remove_then_lookup_fails() {
        let reg = test_registry();
        reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
        reg.remove_contract(owner(), "Oracle").unwrap();
        assert!(matches!(
            reg.get_contract("Oracle"),
            Err(RegistryErr::NotFound)
        ));
        assert!(!reg.is_registered("Oracle"));
    }

    #[test]
    fn remove_missing_name_fails() {
        let reg = test_registry();
        assert!(matches!(
            reg.remove_contract(owner(), "Ghost"),
            Err(RegistryErr::NotFound)
        ));
    }

    #[test]
    fn unauthorized_callers_never_mutate() {
        let reg = test_registry();
        reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
        let mallory = addr(0x66);
        let before = snapshot(&reg);

        assert!(matches!(
            reg.set_contract(mallory, "Oracle", addr(0xbb)),
            Err(RegistryErr::Unauthorized)
        ));
        assert!(matches!(
            reg.set_contract(mallory, "Intruder", addr(0xbb)),
            Err(RegistryErr::Unauthorized)
        ));
        assert!(matches!(
            reg.remove_contract(mallory, "Oracle"),
            Err(RegistryErr::Unauthorized)
        ));
        assert!(matches!(
            reg.set_emergency_mode(mallory, true),
            Err(RegistryErr::Unauthorized)
        ));
        assert!(matches!(
            reg.set_authorized_updater(mallory, mallory, true),
            Err(RegistryErr::Unauthorized)
        ));
        assert!(matches!(
            reg.emergency_update_contract(mallory, "Oracle", addr(0xbb)),
            Err(RegistryErr::Unauthorized)
        ));

        assert_eq!(snapshot(&reg), before);
        assert_eq!(
            reg.get_contract_history("Oracle", 0, u64::MAX).len(),
            1
        );
    }

    #[test]
    fn authorized_updater_can_mutate_until_revoked() {
        let reg = test_registry();
        let updater = addr(2);

        assert!(matches!(
            reg.set_contract(updater, "Oracle", addr(0xaa)),
            Err(RegistryErr::Unauthorized)
        ));

        reg.set_authorized_updater(owner(), updater, true).unwrap();
        assert!(reg.is_authorized(&updater));
        reg.set_contract(updater, "Oracle", addr(0xaa)).unwrap();

        reg.set_authorized_updater(owner(), updater, false).unwrap();
        assert!(!reg.is_authorized(&updater));
        assert!(matches!(
            reg.set_contract(updater, "Oracle", addr(0xbb)),
            Err(RegistryErr::Unauthorized)
        ));
    }

    #[test]
    fn owner_is_implicitly_authorized() {
        let reg = test_registry();
        assert!(reg.is_authorized(&owner()));
        // Revoking the owner from the explicit set changes nothing.
        reg.set_authorized_updater(owner(), owner(), false).unwrap();
        reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
    }

    #[test]
    fn emergency_blocks_normal_mutations() {
        let reg = test_registry();
        reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
        reg.set_emergency_mode(owner(), true).unwrap();

        assert!(matches!(
            reg.set_contract(owner(), "Oracle", addr(0xbb)),
            Err(RegistryErr::EmergencyActive)
        ));
        assert!(matches!(
            reg.remove_contract(owner(), "Oracle"),
            Err(RegistryErr::EmergencyActive)
        ));

        // The break-glass path still works and still audits.
        let version = reg
            .emergency_update_contract(owner(), "Oracle", addr(0xbb))
            .unwrap();
        assert_eq!(version, 2);
        let history = reg.get_contract_history("Oracle", 0, u64::MAX);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].reason, REASON_EMERGENCY);

        reg.set_emergency_mode(owner(), false).unwrap();
        reg.set_contract(owner(), "Oracle", addr(0xcc)).unwrap();
    }

    #[test]
    fn emergency_update_requires_active_mode() {
        let reg = test_registry();
        assert!(matches!(
            reg.emergency_update_contract(owner(), "Oracle", addr(0xaa)),
            Err(RegistryErr::NotInEmergency)
        ));
    }

    #[test]
    fn emergency_update_skips_capacity_and_code_checks() {
        let table = DeploymentTable::new(false);
        let mut config = RegistryConfig::new(owner());
        config.max_entries = 1;
        let reg = Registry::open(MemoryBackend::new(), table.clone(), config).unwrap();

        let attested = addr(0xaa);
        table.attest(attested);
        reg.set_contract(owner(), "Oracle", attested).unwrap();
        reg.set_emergency_mode(owner(), true).unwrap();

        // Unattested address, beyond capacity: both accepted on this path.
        reg.emergency_update_contract(owner(), "Backup", addr(0xbb))
            .unwrap();
        assert_eq!(reg.live_count(), 2);
    }

    #[test]
    fn is_registered_is_idempotent() {
        let reg = test_registry();
        reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
        assert_eq!(reg.is_registered("Oracle"), reg.is_registered("Oracle"));
        assert_eq!(reg.is_registered("Ghost"), reg.is_registered("Ghost"));
    }

    #[test]
    fn user_service_lifecycle_scenario() {
        let reg = test_registry();

        assert_eq!(reg.set_contract(owner(), "UserService", addr(0xaa)).unwrap(), 1);
        assert_eq!(reg.set_contract(owner(), "UserService", addr(0xbb)).unwrap(), 2);
        let info = reg.entry_info("UserService").unwrap();
        assert_eq!(info.history_len, 2);

        reg.remove_contract(owner(), "UserService").unwrap();
        assert!(!reg.is_registered("UserService"));
        assert!(matches!(
            reg.get_contract("UserService"),
            Err(RegistryErr::NotFound)
        ));
        let info = reg.entry_info("UserService").unwrap();
        assert_eq!(info.history_len, 2);
        assert_eq!(info.removals.len(), 1);

        // Version continues across the removal gap.
        assert_eq!(reg.set_contract(owner(), "UserService", addr(0xcc)).unwrap(), 3);
        let info = reg.entry_info("UserService").unwrap();
        assert_eq!(info.history_len, 3);
        assert_eq!(reg.get_contract("UserService").unwrap(), addr(0xcc));
    }

    #[test]
    fn capacity_is_enforced_and_freed_by_removal() {
        let mut config = RegistryConfig::new(owner());
        config.max_entries = 2;
        let reg = Registry::open(MemoryBackend::new(), DeploymentTable::new(true), config).unwrap();

        reg.set_contract(owner(), "A", addr(0xa1)).unwrap();
        reg.set_contract(owner(), "B", addr(0xa2)).unwrap();
        assert!(matches!(
            reg.set_contract(owner(), "C", addr(0xa3)),
            Err(RegistryErr::CapacityExceeded)
        ));

        // Updating a live name is not a capacity event.
        reg.set_contract(owner(), "A", addr(0xa4)).unwrap();

        reg.remove_contract(owner(), "B").unwrap();
        reg.set_contract(owner(), "C", addr(0xa3)).unwrap();
        assert_eq!(reg.live_count(), 2);
    }

    #[test]
    fn name_validation() {
        let reg = test_registry();
        assert!(matches!(
            reg.set_contract(owner(), "", addr(0xaa)),
            Err(RegistryErr::InvalidInput(InputErr::EmptyName))
        ));
        let long = "x".repeat(33);
        assert!(matches!(
            reg.set_contract(owner(), &long, addr(0xaa)),
            Err(RegistryErr::InvalidInput(InputErr::NameTooLong))
        ));
        let exact = "y".repeat(32);
        reg.set_contract(owner(), &exact, addr(0xaa)).unwrap();
    }

    #[test]
    fn zero_address_is_rejected() {
        let reg = test_registry();
        assert!(matches!(
            reg.set_contract(owner(), "Oracle", Address::zero()),
            Err(RegistryErr::InvalidInput(InputErr::ZeroAddress))
        ));
    }

    #[test]
    fn checker_gates_registration() {
        let table = DeploymentTable::new(false);
        let reg = Registry::open(
            MemoryBackend::new(),
            table.clone(),
            RegistryConfig::new(owner()),
        )
        .unwrap();

        let target = addr(0xaa);
        assert!(matches!(
            reg.set_contract(owner(), "Oracle", target),
            Err(RegistryErr::InvalidInput(InputErr::NoCode))
        ));

        table.attest(target);
        reg.set_contract(owner(), "Oracle", target).unwrap();
    }

    #[test]
    fn history_pagination_clamps() {
        let reg = test_registry();
        for i in 0..5u8 {
            reg.set_contract(owner(), "Oracle", addr(i + 10)).unwrap();
        }

        assert_eq!(reg.get_contract_history("Oracle", 0, 2).len(), 2);
        let tail = reg.get_contract_history("Oracle", 3, 10);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].version, 4);
        assert!(reg.get_contract_history("Oracle", 99, 10).is_empty());
        assert!(reg.get_contract_history("Oracle", 0, 0).is_empty());
        assert!(reg.get_contract_history("Ghost", 0, 10).is_empty());
    }

    #[test]
    fn removed_names_leave_the_live_list() {
        let reg = test_registry();
        reg.set_contract(owner(), "A", addr(0xa1)).unwrap();
        reg.set_contract(owner(), "B", addr(0xa2)).unwrap();
        reg.set_contract(owner(), "C", addr(0xa3)).unwrap();

        reg.remove_contract(owner(), "A").unwrap();
        let mut names = reg.registered_names();
        names.sort();
        assert_eq!(names, vec!["B".to_owned(), "C".to_owned()]);

        // The swapped-in name must still resolve after further removals.
        reg.remove_contract(owner(), "C").unwrap();
        assert_eq!(reg.registered_names(), vec!["B".to_owned()]);
        assert_eq!(reg.get_contract("B").unwrap(), addr(0xa2));
    }

    #[test]
    fn state_survives_reopen_over_same_backend() {
        let backend = MemoryBackend::new();
        let updater = addr(2);

        {
            let reg = Registry::open(
                backend.clone(),
                DeploymentTable::new(true),
                RegistryConfig::new(owner()),
            )
            .unwrap();
            reg.set_contract(owner(), "Oracle", addr(0xaa)).unwrap();
            reg.set_contract(owner(), "Oracle", addr(0xbb)).unwrap();
            reg.set_authorized_updater(owner(), updater, true).unwrap();
            reg.set_emergency_mode(owner(), true).unwrap();
        }

        let reg = Registry::open(
            backend,
            DeploymentTable::new(true),
            RegistryConfig::new(owner()),
        )
        .unwrap();
        assert_eq!(reg.get_contract("Oracle").unwrap(), addr(0xbb));
        assert_eq!(reg.entry_info("Oracle").unwrap().version, 2);
        assert!(reg.is_authorized(&updater));
        assert!(reg.is_emergency());
        assert_eq!(reg.live_count(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, u8, u8),
        Remove(u8, u8),
        SetEmergency(u8, bool),
        EmergencyUpdate(u8, u8, u8),
        Authorize(u8, u8, bool),
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            match u8::arbitrary(g) % 5 {
                0 => Op::Set(u8::arbitrary(g), u8::arbitrary(g), u8::arbitrary(g)),
                1 => Op::Remove(u8::arbitrary(g), u8::arbitrary(g)),
                2 => Op::SetEmergency(u8::arbitrary(g), bool::arbitrary(g)),
                3 => Op::EmergencyUpdate(u8::arbitrary(g), u8::arbitrary(g), u8::arbitrary(g)),
                _ => Op::Authorize(u8::arbitrary(g), u8::arbitrary(g), bool::arbitrary(g)),
            }
        }
    }

    const QC_NAMES: [&str; 3] = ["alpha", "beta", "gamma"];

    fn qc_name(n: u8) -> &'static str {
        QC_NAMES[n as usize % QC_NAMES.len()]
    }

    #[quickcheck]
    fn history_version_bijection_holds(ops: Vec<Op>) -> bool {
        let reg = test_registry();

        for op in ops {
            match op {
                Op::Set(caller, name, target) => {
                    let _ = reg.set_contract(addr(caller % 4), qc_name(name), addr(target));
                }
                Op::Remove(caller, name) => {
                    let _ = reg.remove_contract(addr(caller % 4), qc_name(name));
                }
                Op::SetEmergency(caller, active) => {
                    let _ = reg.set_emergency_mode(addr(caller % 4), active);
                }
                Op::EmergencyUpdate(caller, name, target) => {
                    let _ =
                        reg.emergency_update_contract(addr(caller % 4), qc_name(name), addr(target));
                }
                Op::Authorize(caller, target, authorized) => {
                    let _ =
                        reg.set_authorized_updater(addr(caller % 4), addr(target), authorized);
                }
            }
        }

        QC_NAMES.iter().all(|name| {
            match reg.entry_info(name) {
                Some(info) => {
                    let live_consistent = info.address.is_some() == reg.is_registered(name);
                    info.history_len == info.version && info.version > 0 && live_consistent
                }
                None => !reg.is_registered(name),
            }
        })
    }

    #[quickcheck]
    fn unauthorized_sequences_change_nothing(ops: Vec<Op>) -> bool {
        let reg = test_registry();
        reg.set_contract(owner(), "alpha", addr(0xaa)).unwrap();
        let before = snapshot(&reg);

        // Callers 200..=255 are never the owner (addr(1)) nor authorized.
        for op in ops {
            match op {
                Op::Set(caller, name, target) => {
                    let _ = reg.set_contract(
                        addr(200 + caller % 50),
                        qc_name(name),
                        addr(target),
                    );
                }
                Op::Remove(caller, name) => {
                    let _ = reg.remove_contract(addr(200 + caller % 50), qc_name(name));
                }
                Op::SetEmergency(caller, active) => {
                    let _ = reg.set_emergency_mode(addr(200 + caller % 50), active);
                }
                Op::EmergencyUpdate(caller, name, target) => {
                    let _ = reg.emergency_update_contract(
                        addr(200 + caller % 50),
                        qc_name(name),
                        addr(target),
                    );
                }
                Op::Authorize(caller, target, authorized) => {
                    let _ = reg.set_authorized_updater(
                        addr(200 + caller % 50),
                        addr(target),
                        authorized,
                    );
                }
            }
        }

        snapshot(&reg) == before
            && reg.entry_info("beta").is_none()
            && reg.entry_info("gamma").is_none()
    }
}
