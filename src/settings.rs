// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use crate::primitives::Address;
use config::{Config, ConfigError, File};
use lazy_static::*;
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{metadata, File as FsFile};
use std::io::Write;
use struct_field_names_as_array::FieldNamesAsArray;

lazy_static! {
    pub static ref SETTINGS: Settings = Settings::new().unwrap();
}

#[derive(Debug, Serialize, Deserialize, Default, FieldNamesAsArray)]
pub struct Settings {
    /// Network settings.
    pub network: Network,

    /// Node settings.
    pub node: Node,

    /// Registry settings.
    pub registry: Registry,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let mut config_path = dirs::config_dir().unwrap();
        config_path.push("Chainreg");
        config_path.push("config.toml");
        let default_settings = Settings::default();
        if metadata(config_path.clone()).is_err() {
            // Create default configuration
            let settings_str = toml::ser::to_string_pretty(&default_settings).unwrap();

            match FsFile::create(config_path.clone()) {
                Ok(mut file) => {
                    file.write_all(settings_str.as_bytes()).unwrap_or(());
                }
                Err(err) => {
                    // If this fails, do nothing and fall back to environment variables
                    error!("Failed to create configuration! Reason: {:#?}", err);
                }
            }
        }

        let prefix = "chainreg";
        let env_source: Vec<_> = std::env::vars().collect();
        let mut s = Config::builder().add_source(
            File::with_name(&config_path.into_os_string().into_string().unwrap()).required(false),
        );

        // Set defaults
        let defaults: HashMap<String, HashMap<String, DynamicConfVal>> =
            serde_yaml::from_value(serde_yaml::to_value(&default_settings).unwrap()).unwrap();
        for (k1, inner) in &defaults {
            for (k2, v) in inner {
                match v {
                    DynamicConfVal::String(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                    }

                    DynamicConfVal::Bool(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::U16(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.to_string())?;
                    }

                    DynamicConfVal::Sequence(v) => {
                        s = s.set_default(format!("{k1}.{k2}"), v.clone())?;
                    }

                    DynamicConfVal::Option(v) => {
                        if let Some(v) = v {
                            s = s.set_default(format!("{k1}.{k2}"), v.as_str())?;
                        }
                    }

                    DynamicConfVal::OptionSequence(v) => {
                        if let Some(v) = v {
                            s = s.set_default(format!("{k1}.{k2}"), v.clone())?;
                        }
                    }
                }
            }
        }

        // Make sure to list these in order
        let settings_modules: Vec<_> = vec![
            Network::FIELD_NAMES_AS_ARRAY,
            Node::FIELD_NAMES_AS_ARRAY,
            Registry::FIELD_NAMES_AS_ARRAY,
        ];

        // Gather all possible settings keys
        let possible_keys: HashMap<String, &str> = Settings::FIELD_NAMES_AS_ARRAY
            .iter()
            .enumerate()
            .flat_map(|(i, field)| {
                settings_modules[i].iter().map(|nested| {
                    (
                        format!(
                            "{}_{}_{}",
                            prefix,
                            field.to_owned(),
                            nested.split('_').collect::<Vec<_>>().join("")
                        ),
                        *nested,
                    )
                })
            })
            .collect();

        // Parse env vars manually and set overrides if they exist as the
        // config package `Environment` module seems to behave poorly.
        for (k, v) in env_source.iter() {
            let k = k.to_lowercase();

            if let Some(k_postfix) = possible_keys.get(&k) {
                let mut k: Vec<_> = k.split('_').filter(|x| x != &prefix).collect();
                *k.last_mut().unwrap() = k_postfix;
                let k = k.join(".");

                // Filter empty values
                if v.as_str() == "" {
                    continue;
                }

                s = s.set_override(k, v.as_str())?;
            }
        }

        s.build()?.try_deserialize()
    }

    /// Panics when the configuration cannot support a running node. Called
    /// once at startup before any state is opened.
    pub fn validate(&self) {
        match self.node.network_name.as_str() {
            "mainnet" | "testnet" | "devnet" => {}
            other => panic!("Invalid network name: {other}"),
        }

        let owner = match Address::from_hex(&self.registry.owner) {
            Ok(owner) => owner,
            Err(err) => panic!("Invalid registry owner address: {err}"),
        };

        if owner.is_zero() {
            panic!("Registry owner cannot be the zero address");
        }

        if self.registry.max_entries == 0 {
            panic!("registry.max_entries must be at least 1");
        }

        if self.registry.max_name_bytes == 0 {
            panic!("registry.max_name_bytes must be at least 1");
        }

        if let Some(known) = &self.registry.known_contracts {
            for encoded in known {
                if let Err(err) = Address::from_hex(encoded) {
                    panic!("Invalid known contract address {encoded}: {err}");
                }
            }
        }

        if self.registry.require_code_attestation
            && self.registry.known_contracts.as_deref().unwrap_or(&[]).is_empty()
        {
            warn!("code attestation is required but no known contracts are configured, every registration will be rejected");
        }
    }

    /// Parsed owner address. Only valid after `validate` has passed.
    #[must_use]
    pub fn owner_address(&self) -> Address {
        Address::from_hex(&self.registry.owner).expect("validated at startup")
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Network {
    /// Enable RPC.
    #[serde(alias = "rpcenabled")]
    pub rpc_enabled: bool,

    /// RPC listen port on mainnet.
    #[serde(alias = "rpclistenportmainnet")]
    pub rpc_listen_port_mainnet: u16,

    /// RPC listen port on testnet.
    #[serde(alias = "rpclistenporttestnet")]
    pub rpc_listen_port_testnet: u16,

    /// RPC listen port on devnet.
    #[serde(alias = "rpclistenportdevnet")]
    pub rpc_listen_port_devnet: u16,

    /// RPC username.
    #[serde(alias = "rpcusername")]
    pub rpc_username: String,

    /// RPC password.
    #[serde(alias = "rpcpassword")]
    pub rpc_password: String,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            rpc_enabled: true,
            rpc_listen_port_mainnet: 8067,
            rpc_listen_port_testnet: 8037,
            rpc_listen_port_devnet: 8027,
            rpc_username: "chainreg".to_owned(),
            rpc_password: "chainreg".to_owned(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Node {
    /// The network name the node is serving.
    #[serde(alias = "networkname")]
    pub network_name: String,

    /// Number of threads used for network communication and the RPC
    /// interface.
    ///
    /// Default is 0 which means the number of cores of the system
    #[serde(alias = "networkthreads")]
    pub network_threads: u16,

    /// Node data directory
    #[serde(alias = "datadir")]
    pub data_dir: String,

    /// If specified, we won't be storing anything to disk.
    #[serde(alias = "memoryonly")]
    pub memory_only: bool,
}

impl Default for Node {
    fn default() -> Self {
        let mut path = dirs::config_dir().unwrap();
        path.push("Chainreg");

        Self {
            network_name: "devnet".to_owned(), // Use devnet as default for now
            network_threads: 0,
            data_dir: path.into_os_string().into_string().unwrap(),
            memory_only: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FieldNamesAsArray)]
pub struct Registry {
    /// Registry owner address. The owner is always authorized to mutate the
    /// registry and is the only caller allowed on the emergency paths.
    #[serde(alias = "owner")]
    pub owner: String,

    /// Maximum number of live names the registry accepts.
    #[serde(alias = "maxentries")]
    pub max_entries: u16,

    /// Maximum name size in bytes.
    #[serde(alias = "maxnamebytes")]
    pub max_name_bytes: u16,

    /// When enabled, registrations are only accepted for addresses present
    /// in `known_contracts`.
    #[serde(alias = "requirecodeattestation")]
    pub require_code_attestation: bool,

    /// Addresses attested as live deployments.
    #[serde(alias = "knowncontracts")]
    pub known_contracts: Option<Vec<String>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            // Development placeholder, replace before serving real traffic
            owner: "0x0000000000000000000000000000000000000001".to_owned(),
            max_entries: 100,
            max_name_bytes: 32,
            require_code_attestation: false,
            known_contracts: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DynamicConfVal {
    String(String),
    Sequence(Vec<String>),
    Option(Option<String>),
    OptionSequence(Option<Vec<String>>),
    Bool(bool),
    U16(u16),
}
