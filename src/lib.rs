// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

//! # Chainreg
//! An auditable contract registry service: a directory mapping logical
//! service names to deployed contract addresses.
//!
//! ## Features
//! * **Versioned**: every address change for a name increments a monotonic
//!   version counter and appends to an append-only history, so the full
//!   upgrade trail of a service is queryable forever.
//! * **Gated**: all mutations require the caller to be the registry owner or
//!   an explicitly authorized updater. Lookups are public.
//! * **Break-glass ready**: an owner-only emergency mode disables the normal
//!   mutation paths while still recording every emergency change in the
//!   audit trail.
//! * **Pluggable storage**: registry state is persisted write-through via a
//!   backend trait, with a RocksDB implementation for durable deployments
//!   and an in-memory implementation for tests and ephemeral nodes.
//! * **JSON-RPC over HTTP**: the full operation surface is exposed through a
//!   tarpc service behind an HTTP gateway with Basic authentication.

pub mod codec;
pub mod global;
pub mod node;
pub mod primitives;
pub mod registry;
pub mod settings;
