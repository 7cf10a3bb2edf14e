// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use serde::{Deserialize, Serialize};

pub use rpc::*;

pub mod rpc;

/// Service level information returned by the `get_node_info` RPC
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Node software version
    pub version: String,

    /// Network name the node is configured for
    pub network: String,

    /// Number of live registry entries
    pub live_entries: u64,

    /// Configured live entry capacity
    pub capacity: u64,

    /// Whether emergency mode is active
    pub emergency: bool,

    /// Seconds since process start
    pub uptime: u64,
}
