// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::Address;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// Capability check consulted before a registration is accepted: the target
/// address must host deployed, executable code. A 20 byte value on its own
/// proves nothing.
pub trait ExistenceChecker: Clone + Send + Sync + 'static {
    /// Returns true when the target address hosts deployed code.
    fn has_code(&self, address: &Address) -> bool;
}

/// Checker backed by a table of attested deployments, usually seeded from
/// the `registry.known_contracts` setting. With `allow_unattested` set the
/// table accepts any address, for networks where no attestation source is
/// available.
#[derive(Debug, Clone)]
pub struct DeploymentTable {
    attested: Arc<RwLock<HashSet<Address>>>,
    allow_unattested: bool,
}

impl DeploymentTable {
    #[must_use]
    pub fn new(allow_unattested: bool) -> Self {
        Self {
            attested: Arc::new(RwLock::new(HashSet::new())),
            allow_unattested,
        }
    }

    /// Marks an address as a known deployment.
    pub fn attest(&self, address: Address) {
        self.attested.write().insert(address);
    }
}

impl ExistenceChecker for DeploymentTable {
    fn has_code(&self, address: &Address) -> bool {
        self.allow_unattested || self.attested.read().contains(address)
    }
}
