// Copyright (c) 2023 The Chainreg Core developers
// Licensed under the Apache License, Version 2.0 see LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0 or the MIT license, see
// LICENSE-MIT or http://opensource.org/licenses/MIT

use chainreg::global::EXIT_SIGNAL;
use chainreg::primitives::Address;
use chainreg::registry::backend::disk::DiskBackend;
use chainreg::registry::backend::memory::MemoryBackend;
use chainreg::registry::backend::{create_rocksdb_backend, RegistryBackend};
use chainreg::registry::{DeploymentTable, Registry, RegistryConfig};
use chainreg::settings::SETTINGS;
use log::*;
use mimalloc::MiMalloc;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;
use tokio::runtime::Builder;
use tokio::time::sleep;
use tracing_subscriber::prelude::*;

#[cfg(feature = "rpc")]
use chainreg::node::*;
#[cfg(feature = "rpc")]
use tarpc::server::{self, Channel};
#[cfg(feature = "rpc")]
use warp::Filter;

#[cfg(not(windows))]
use signal_hook::consts::TERM_SIGNALS;
#[cfg(not(windows))]
use signal_hook::flag;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> anyhow::Result<()> {
    chainreg::global::init();

    #[cfg(not(windows))]
    for sig in TERM_SIGNALS {
        // When terminated by a second term signal, exit with exit code 1.
        // This will do nothing the first time (because term_now is false).
        flag::register_conditional_shutdown(*sig, 1, EXIT_SIGNAL.clone())?;
        // But this will "arm" the above for the second time, by setting it to true.
        // The order of registering these is important, if you put this one first, it will
        // first arm and then terminate ‒ all in the first round.
        flag::register(*sig, EXIT_SIGNAL.clone())?;
    }

    run_init()
}

fn run_init() -> anyhow::Result<()> {
    let t = thread::spawn(start_runtime);

    // This loop runs forever, and blocks until the exit signal is received
    loop {
        if EXIT_SIGNAL.load(Ordering::Relaxed) {
            break;
        }
        thread::sleep(Duration::from_millis(200));
    }

    // Wait for thread to exit
    let _ = t.join().unwrap();

    Ok(())
}

fn start_runtime() -> anyhow::Result<()> {
    perform_sanity_checks();

    let worker_threads = if SETTINGS.node.network_threads == 0 {
        num_cpus::get()
    } else {
        SETTINGS.node.network_threads as usize
    };

    let runtime = Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_io()
        .enable_time()
        .build()
        .unwrap();

    let checker = deployment_table_from_settings();
    let config = registry_config_from_settings();

    if SETTINGS.node.memory_only {
        let registry = Registry::open(MemoryBackend::new(), checker, config)
            .unwrap_or_else(|err| panic!("Could not open registry: {err:?}"));
        runtime.block_on(run_node(registry))
    } else {
        let db = create_rocksdb_backend();
        let registry = Registry::open(DiskBackend::new(db), checker, config)
            .unwrap_or_else(|err| panic!("Could not open registry: {err:?}"));
        runtime.block_on(run_node(registry))
    }
}

async fn run_node<B: RegistryBackend>(
    registry: Registry<B, DeploymentTable>,
) -> anyhow::Result<()> {
    init_tracing().unwrap();

    if SETTINGS.node.memory_only {
        info!(
            "Running Chainreg v{} on {} in memory only mode",
            env!("CARGO_PKG_VERSION"),
            SETTINGS.node.network_name
        );
    } else {
        info!(
            "Running Chainreg v{} on {}",
            env!("CARGO_PKG_VERSION"),
            SETTINGS.node.network_name
        );
    }

    #[cfg(feature = "rpc")]
    let run_rpc = {
        let registry = registry.clone();
        async move {
            if SETTINGS.network.rpc_enabled {
                // Create transports
                let (client_transport, server_transport) = tarpc::transport::channel::unbounded();
                let server = server::BaseChannel::with_defaults(server_transport);
                let client = RpcServerDefinitionClient::new(
                    tarpc::client::Config::default(),
                    client_transport,
                )
                .spawn();

                // Schedule rpc server
                tokio::spawn(server.execute(RpcServer { registry }.serve()));

                // Set up http route
                let client_filter = warp::any().map(move || client.clone());
                let rpc_path = warp::post()
                    .and(warp::path::end())
                    .and(json_body())
                    .and(client_filter.clone())
                    .and(warp::header("authorization"))
                    .and_then(handle_rpc_request);

                let port = match SETTINGS.node.network_name.as_str() {
                    "mainnet" => SETTINGS.network.rpc_listen_port_mainnet,
                    "testnet" => SETTINGS.network.rpc_listen_port_testnet,
                    "devnet" => SETTINGS.network.rpc_listen_port_devnet,
                    other => panic!("Invalid network name: {other}"),
                };

                info!(
                    "Chainreg v{} RPC Listening on port {}",
                    env!("CARGO_PKG_VERSION"),
                    port
                );

                warp::serve(rpc_path).run(([127, 0, 0, 1], port)).await;
            } else {
                loop {
                    sleep(Duration::from_secs(1)).await;
                }
            }

            Ok::<(), ()>(())
        }
    };

    #[cfg(not(feature = "rpc"))]
    let run_rpc = async move {
        loop {
            sleep(Duration::from_secs(1)).await;
        }
    };

    tokio::select!(
        _ = tokio::spawn(run_rpc) => (),
        _ = tokio::spawn(run_periodics(registry.clone())) => (),
        _ = tokio::spawn(check_exit_signal()) => (),
    );

    Ok(())
}

async fn check_exit_signal() {
    loop {
        if EXIT_SIGNAL.load(Ordering::Relaxed) {
            break;
        }

        sleep(Duration::from_millis(10)).await;
    }

    info!(
        "Chainreg v{} shutting down...",
        env!("CARGO_PKG_VERSION")
    )
}

/// Schedules periodic jobs such as stats reporting
async fn run_periodics<B: RegistryBackend>(registry: Registry<B, DeploymentTable>) {
    loop {
        sleep(Duration::from_secs(30)).await;
        debug!(
            "registry stats: {} live entries, emergency={}",
            registry.live_count(),
            registry.is_emergency()
        );
    }
}

#[cfg(feature = "rpc")]
async fn handle_rpc_request(
    request: tarpc::Request<RpcServerDefinitionRequest>,
    client: RpcServerDefinitionClient,
    authorization: String,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !check_authorization_header(authorization) {
        return Ok(warp::reply::with_status(
            warp::reply::json(&"Forbidden".to_owned()),
            warp::http::StatusCode::FORBIDDEN,
        ));
    }

    match dispatch_rpc_request(request, client).await {
        Ok(resp) => Ok(warp::reply::with_status(
            warp::reply::json(&resp),
            warp::http::StatusCode::CREATED,
        )),

        Err(err) => Ok(warp::reply::with_status(
            warp::reply::json(&err),
            warp::http::StatusCode::BAD_REQUEST,
        )),
    }
}

#[cfg(feature = "rpc")]
fn check_authorization_header(auth: String) -> bool {
    let split: Vec<_> = auth.split(' ').collect();

    if split.len() != 2 {
        return false;
    }

    if split[0] != "Basic" {
        return false;
    }

    let decoded = match base64::decode(split[1]) {
        Ok(decoded) => decoded,
        Err(_) => return false,
    };

    // Hash both stored credentials and given ones and then constant compare the two hashes
    let hash_context = "chainreg.basic_auth";
    let oracle_key = format!(
        "{}:{}",
        SETTINGS.network.rpc_username, SETTINGS.network.rpc_password
    );
    let oracle_hash = blake3::derive_key(hash_context, oracle_key.as_bytes());
    let hash = blake3::derive_key(hash_context, &decoded);

    constant_time_eq::constant_time_eq_32(&oracle_hash, &hash)
}

#[cfg(feature = "rpc")]
fn json_body(
) -> impl Filter<Extract = (tarpc::Request<RpcServerDefinitionRequest>,), Error = warp::Rejection> + Clone
{
    // When accepting a body, we want a JSON body
    // (and to reject huge payloads)...
    warp::body::content_length_limit(1024 * 64)
        .and(warp::body::json::<tarpc::Request<RpcServerDefinitionRequest>>())
}

/// Initializes a tracing subscriber with an env filter.
fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

fn perform_sanity_checks() {
    // Validate settings
    SETTINGS.validate();

    // Add here more sanity checks
}

fn registry_config_from_settings() -> RegistryConfig {
    let mut config = RegistryConfig::new(SETTINGS.owner_address());
    config.max_entries = SETTINGS.registry.max_entries as usize;
    config.max_name_bytes = SETTINGS.registry.max_name_bytes as usize;
    config
}

fn deployment_table_from_settings() -> DeploymentTable {
    let table = DeploymentTable::new(!SETTINGS.registry.require_code_attestation);
    if let Some(known) = &SETTINGS.registry.known_contracts {
        for encoded in known {
            table.attest(Address::from_hex(encoded).expect("validated at startup"));
        }
    }

    table
}
