// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::Address;

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const DEFAULT_MAX_NAME_BYTES: usize = 32;

/// Registry wide configuration, fixed at construction time.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Owner address. Always authorized, cannot be revoked.
    pub owner: Address,

    /// Maximum number of live names the registry accepts.
    pub max_entries: usize,

    /// Maximum name size in bytes.
    pub max_name_bytes: usize,
}

impl RegistryConfig {
    #[must_use]
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_name_bytes: DEFAULT_MAX_NAME_BYTES,
        }
    }
}
