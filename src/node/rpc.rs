// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::node::NodeInfo;
use crate::primitives::{Address, EntryInfo, HistoryRecord};
use crate::registry::backend::RegistryBackend;
use crate::registry::{ExistenceChecker, InputErr, Registry, RegistryErr};
use futures::future::{self, Ready};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tarpc::context;

#[tarpc::service]
pub trait RpcServerDefinition {
    /// Registers or updates the contract address for a name, returning the
    /// new version
    async fn set_contract(caller: String, name: String, address: String) -> Result<u64, RpcErr>;

    /// Resolves the current address registered under a name
    async fn get_contract(name: String) -> Result<String, RpcErr>;

    /// Clears the live mapping for a name, preserving its audit trail
    async fn remove_contract(caller: String, name: String) -> Result<(), RpcErr>;

    /// Returns true when a live entry exists for the name
    async fn is_registered(name: String) -> bool;

    /// Grants or revokes updater rights for an address. Owner only
    async fn set_authorized_updater(
        caller: String,
        address: String,
        authorized: bool,
    ) -> Result<(), RpcErr>;

    /// Toggles emergency mode. Owner only
    async fn set_emergency_mode(caller: String, active: bool) -> Result<(), RpcErr>;

    /// Owner-only break-glass update, available only while emergency mode
    /// is active
    async fn emergency_update_contract(
        caller: String,
        name: String,
        address: String,
    ) -> Result<u64, RpcErr>;

    /// Paginated read of a name's assignment history. Out of range input is
    /// clamped
    async fn get_contract_history(name: String, offset: u64, limit: u64) -> Vec<HistoryRecord>;

    /// Lists the live names. Iteration order is unspecified
    async fn registered_names() -> Vec<String>;

    /// Full audit snapshot for a name, removals included
    async fn get_entry_info(name: String) -> Option<EntryInfo>;

    /// Returns information about the node
    async fn get_node_info() -> NodeInfo;

    /// Attempts to gracefully shut down the registry node
    async fn stop() -> String;

    /// Returns the number of seconds the server has been running
    async fn uptime() -> u64;
}

/// Wire level mirror of the registry failure taxonomy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcErr {
    Unauthorized,
    NotFound,
    InvalidInput(InputErr),
    CapacityExceeded,
    EmergencyActive,
    NotInEmergency,
    Storage(String),
}

impl From<RegistryErr> for RpcErr {
    fn from(other: RegistryErr) -> Self {
        match other {
            RegistryErr::Unauthorized => Self::Unauthorized,
            RegistryErr::NotFound => Self::NotFound,
            RegistryErr::InvalidInput(err) => Self::InvalidInput(err),
            RegistryErr::CapacityExceeded => Self::CapacityExceeded,
            RegistryErr::EmergencyActive => Self::EmergencyActive,
            RegistryErr::NotInEmergency => Self::NotInEmergency,
            RegistryErr::Backend(err) => Self::Storage(format!("{err:?}")),
        }
    }
}

fn parse_addr(encoded: &str) -> Result<Address, RpcErr> {
    Address::from_hex(encoded).map_err(|_| RpcErr::InvalidInput(InputErr::MalformedAddress))
}

/// RPC server
#[derive(Clone)]
pub struct RpcServer<B: RegistryBackend, C: ExistenceChecker> {
    pub registry: Registry<B, C>,
}

impl<B: RegistryBackend, C: ExistenceChecker> RpcServerDefinition for RpcServer<B, C> {
    type SetContractFut = Ready<Result<u64, RpcErr>>;
    type GetContractFut = Ready<Result<String, RpcErr>>;
    type RemoveContractFut = Ready<Result<(), RpcErr>>;
    type IsRegisteredFut = Ready<bool>;
    type SetAuthorizedUpdaterFut = Ready<Result<(), RpcErr>>;
    type SetEmergencyModeFut = Ready<Result<(), RpcErr>>;
    type EmergencyUpdateContractFut = Ready<Result<u64, RpcErr>>;
    type GetContractHistoryFut = Ready<Vec<HistoryRecord>>;
    type RegisteredNamesFut = Ready<Vec<String>>;
    type GetEntryInfoFut = Ready<Option<EntryInfo>>;
    type GetNodeInfoFut = Ready<NodeInfo>;
    type StopFut = Ready<String>;
    type UptimeFut = Ready<u64>;

    fn set_contract(
        self,
        _: context::Context,
        caller: String,
        name: String,
        address: String,
    ) -> Self::SetContractFut {
        let result = parse_addr(&caller).and_then(|caller| {
            let target = parse_addr(&address)?;
            self.registry
                .set_contract(caller, &name, target)
                .map_err(RpcErr::from)
        });
        future::ready(result)
    }

    fn get_contract(self, _: context::Context, name: String) -> Self::GetContractFut {
        let result = self
            .registry
            .get_contract(&name)
            .map(|address| address.to_hex())
            .map_err(RpcErr::from);
        future::ready(result)
    }

    fn remove_contract(
        self,
        _: context::Context,
        caller: String,
        name: String,
    ) -> Self::RemoveContractFut {
        let result = parse_addr(&caller).and_then(|caller| {
            self.registry
                .remove_contract(caller, &name)
                .map_err(RpcErr::from)
        });
        future::ready(result)
    }

    fn is_registered(self, _: context::Context, name: String) -> Self::IsRegisteredFut {
        future::ready(self.registry.is_registered(&name))
    }

    fn set_authorized_updater(
        self,
        _: context::Context,
        caller: String,
        address: String,
        authorized: bool,
    ) -> Self::SetAuthorizedUpdaterFut {
        let result = parse_addr(&caller).and_then(|caller| {
            let updater = parse_addr(&address)?;
            self.registry
                .set_authorized_updater(caller, updater, authorized)
                .map_err(RpcErr::from)
        });
        future::ready(result)
    }

    fn set_emergency_mode(
        self,
        _: context::Context,
        caller: String,
        active: bool,
    ) -> Self::SetEmergencyModeFut {
        let result = parse_addr(&caller).and_then(|caller| {
            self.registry
                .set_emergency_mode(caller, active)
                .map_err(RpcErr::from)
        });
        future::ready(result)
    }

    fn emergency_update_contract(
        self,
        _: context::Context,
        caller: String,
        name: String,
        address: String,
    ) -> Self::EmergencyUpdateContractFut {
        let result = parse_addr(&caller).and_then(|caller| {
            let target = parse_addr(&address)?;
            self.registry
                .emergency_update_contract(caller, &name, target)
                .map_err(RpcErr::from)
        });
        future::ready(result)
    }

    fn get_contract_history(
        self,
        _: context::Context,
        name: String,
        offset: u64,
        limit: u64,
    ) -> Self::GetContractHistoryFut {
        future::ready(self.registry.get_contract_history(&name, offset, limit))
    }

    fn registered_names(self, _: context::Context) -> Self::RegisteredNamesFut {
        future::ready(self.registry.registered_names())
    }

    fn get_entry_info(self, _: context::Context, name: String) -> Self::GetEntryInfoFut {
        future::ready(self.registry.entry_info(&name))
    }

    fn get_node_info(self, _: context::Context) -> Self::GetNodeInfoFut {
        future::ready(NodeInfo {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            network: crate::settings::SETTINGS.node.network_name.clone(),
            live_entries: self.registry.live_count() as u64,
            capacity: self.registry.capacity() as u64,
            emergency: self.registry.is_emergency(),
            uptime: crate::global::uptime_secs(),
        })
    }

    fn stop(self, _: context::Context) -> Self::StopFut {
        crate::global::EXIT_SIGNAL.store(true, Ordering::Relaxed);
        future::ready("Chainreg shutting down".to_string())
    }

    fn uptime(self, _: context::Context) -> Self::UptimeFut {
        future::ready(crate::global::uptime_secs())
    }
}

pub async fn dispatch_rpc_request(
    request: tarpc::Request<RpcServerDefinitionRequest>,
    client: RpcServerDefinitionClient,
) -> Result<RpcServerDefinitionResponse, String> {
    tracing::debug!(id = request.id, "dispatching rpc request");
    client
        .0
        .call(
            tarpc::context::current(),
            &request.id.to_string(),
            request.message,
        )
        .await
        .map_err(|err| err.to_string())
}
