use {
    super::{
        board::GameBoard,
        cli::{Cli, Command},
        console::run_board,
    },
    crate::constants::{DEPLOY_GAS, RECEIPT_MAX_POLLS, RECEIPT_POLL_MS},
    crate::libs::{
        config::{load_env, Config},
        contract::{
            abi::{self, display_value, CallKind},
            Artifact, ContractClient, ContractHandle, WriteOptions,
        },
        journal::save_log_to_file,
        networks::{NetworksFile, ResolvedNetwork},
        rpc::{client::RpcTransport, wallet::connect_wallet, Transport},
        writing::cc,
    },
    crate::{log, warn},
    alloy::{
        dyn_abi::DynSolValue,
        json_abi::StateMutability,
        primitives::Address,
    },
    anyhow::{bail, Context, Result},
    basketgame::{GameRecord, CREATE_GAME, GET_RESULT, IS_GAME_FINISHED},
    std::{path::Path, time::Duration},
};

pub async fn run(cli: Cli) -> Result<()> {
    load_env();
    let mut cfg = Config::from_env()?;
    if let Some(path) = &cli.networks_file {
        cfg.networks_file = path.clone();
    }

    if let Command::Networks = cli.command {
        return list_networks(&cfg.networks_file);
    }

    let network = resolve_network(&cfg, &cli)?;
    log!(cc::LIGHT_GRAY, "using {} at {}", network.name, network.endpoint);

    match &network.private_key {
        Some(key) => {
            let transport = connect_wallet(network.endpoint.clone(), key)?;
            log!(cc::LIGHT_GRAY, "signing locally as {}", transport.address);
            execute(ContractClient::new(transport), &network, &cfg, cli.command).await
        }
        None => {
            let transport = RpcTransport::with_url(
                network.endpoint.clone(),
                Duration::from_millis(*RECEIPT_POLL_MS),
                *RECEIPT_MAX_POLLS,
            );
            execute(ContractClient::new(transport), &network, &cfg, cli.command).await
        }
    }
}

fn resolve_network(cfg: &Config, cli: &Cli) -> Result<ResolvedNetwork> {
    match cli.network.as_ref().or(cfg.network.as_ref()) {
        Some(name) => NetworksFile::load(&cfg.networks_file)?.resolve(name),
        None => {
            let url = cli.rpc_url.as_deref().unwrap_or(&cfg.rpc_url);
            ResolvedNetwork::from_url("default", url)
        }
    }
}

fn list_networks(path: &Path) -> Result<()> {
    let file = NetworksFile::load(path)?;
    for (name, spec) in &file.networks {
        let target = match &spec.target {
            crate::libs::networks::NetworkTarget::Host { host, port } => format!("{host}:{port}"),
            crate::libs::networks::NetworkTarget::Provider { provider } => {
                format!("{} (signs with ${})", provider.url, provider.private_key_env)
            }
        };
        let gas = spec.gas.map(|g| format!(" gas {g}")).unwrap_or_default();
        log!(cc::CYAN, "{name:<12} network_id {:<6} {target}{gas}", spec.network_id.to_string());
    }
    Ok(())
}

async fn execute<T: Transport>(
    client: ContractClient<T>,
    network: &ResolvedNetwork,
    cfg: &Config,
    command: Command,
) -> Result<()> {
    let id = client
        .network_id()
        .await
        .with_context(|| format!("Failed to reach {}", network.endpoint))?;
    if !network.network_id.accepts(id) {
        bail!(
            "{} expects network id {}, node reports {id}",
            network.name,
            network.network_id
        );
    }
    log!(cc::LIGHT_GREEN, "connected to network {id}");

    match command {
        Command::Deploy {
            abi,
            bytecode,
            gas,
            args,
        } => {
            let gas = deploy_gas(gas, network);
            let address = deploy(&client, cfg, abi.as_deref(), bytecode.as_deref(), gas, &args).await?;
            println!("{address}");
        }
        Command::Interact {
            address,
            home,
            visitor,
        } => {
            let handle = attached(cfg, None, address)?;
            if let Some(game) = interact(&client, &handle, home, visitor).await? {
                println!("{}", game.scoreline());
            }
        }
        Command::Call {
            address,
            abi,
            simulate,
            gas,
            value,
            method,
            args,
        } => {
            let handle = attached(cfg, abi.as_deref(), address)?;
            let options = WriteOptions {
                gas: gas.or(network.gas),
                value,
            };
            for line in call(&client, &handle, &method, &args, simulate, options).await? {
                println!("{line}");
            }
        }
        Command::Dapp { address } => {
            let handle = attached(cfg, None, address)?;
            run_board(&GameBoard::new(client, handle)).await?;
        }
        Command::Networks => unreachable!("`networks` is answered before connecting"),
    }
    Ok(())
}

/// Creation gas: the flag, else the network profile, else DEPLOY_GAS.
fn deploy_gas(flag: Option<u64>, network: &ResolvedNetwork) -> u64 {
    flag.or(network.gas).unwrap_or(*DEPLOY_GAS)
}

fn load_artifact(cfg: &Config, abi_override: Option<&Path>) -> Result<Artifact> {
    let artifact = match abi_override.or(cfg.abi_path.as_deref()) {
        Some(path) => Artifact::load(path)?,
        None => Artifact::basketgame()?,
    };
    Ok(artifact)
}

/// Handle on an existing contract: the CLI address, else CONTRACT_ADDRESS,
/// else the address Ganache gives the first deployment.
fn attached(cfg: &Config, abi_override: Option<&Path>, address: Option<Address>) -> Result<ContractHandle> {
    let artifact = load_artifact(cfg, abi_override)?;
    let address = address
        .or(cfg.contract_address)
        .unwrap_or(basketgame::DEFAULT_ADDRESS);
    Ok(ContractHandle::at(artifact.interface, address))
}

async fn deploy<T: Transport>(
    client: &ContractClient<T>,
    cfg: &Config,
    abi_override: Option<&Path>,
    bytecode_override: Option<&Path>,
    gas: u64,
    raw_args: &[String],
) -> Result<Address> {
    let mut artifact = load_artifact(cfg, abi_override)?;
    if let Some(path) = bytecode_override.or(cfg.bytecode_path.as_deref()) {
        artifact = artifact.with_bytecode_file(path)?;
    }
    let bytecode = artifact.require_bytecode()?.clone();

    let params = artifact
        .interface
        .constructor()
        .map(|c| c.inputs.clone())
        .unwrap_or_default();
    let args = abi::coerce_args("constructor", &params, raw_args)?;

    let from = client.default_account().await?;
    let handle = ContractHandle::new(artifact.interface);
    log!(cc::LIGHT_GRAY, "deploying from {from} with gas {gas}");
    let address = client.deploy(&handle, &bytecode, &args, from, gas).await?;
    save_log_to_file(&format!("deployed {address} from {from}"));
    Ok(address)
}

/// Create a game, then read it back by the predicted id. `None` when the id
/// reads back empty.
async fn interact<T: Transport>(
    client: &ContractClient<T>,
    handle: &ContractHandle,
    home: String,
    visitor: String,
) -> Result<Option<GameRecord>> {
    let from = client.default_account().await?;
    let outcome = client
        .create_then_confirm(
            handle,
            CREATE_GAME,
            &[DynSolValue::String(home), DynSolValue::String(visitor)],
            from,
            WriteOptions::default(),
        )
        .await?;
    let id = outcome
        .predicted
        .as_deref()
        .and_then(|out| out.first())
        .and_then(DynSolValue::as_uint)
        .map(|(id, _)| id)
        .context("createGame predicted no game id")?;
    log!(
        cc::LIGHT_GREEN,
        "New game created (id {id}) in {} (gas used {})",
        outcome.tx_hash,
        outcome.gas_used
    );

    let arg = [DynSolValue::Uint(id, 256)];
    let result = client.read(handle, GET_RESULT, &arg, from).await?;
    let finished = client
        .read(handle, IS_GAME_FINISHED, &arg, from)
        .await?
        .first()
        .and_then(DynSolValue::as_bool)
        .unwrap_or_default();
    let game = GameRecord::from_result(id, &result, finished)?;
    if game.is_none() {
        warn!("game {id} not found; another transaction may have taken the id");
    }
    Ok(game)
}

/// Run `method` and return the lines to print: decoded return values for
/// queries and simulations, one line per emitted event for transactions.
async fn call<T: Transport>(
    client: &ContractClient<T>,
    handle: &ContractHandle,
    method: &str,
    raw_args: &[String],
    simulate: bool,
    options: WriteOptions,
) -> Result<Vec<String>> {
    let is_query = handle
        .interface()
        .function(method)
        .is_some_and(|overloads| {
            overloads
                .iter()
                .any(|f| matches!(f.state_mutability, StateMutability::View | StateMutability::Pure))
        });
    let kind = if is_query {
        CallKind::Query
    } else {
        CallKind::Transaction
    };
    if kind == CallKind::Query && options.value.is_some() {
        bail!("`{method}` is a query; --value only applies to transactions");
    }
    let args = abi::parse_args(handle.interface(), method, raw_args, kind)?;
    let from = client.default_account().await?;

    let values = match kind {
        CallKind::Query => client.read(handle, method, &args, from).await?,
        CallKind::Transaction if simulate => client.simulate(handle, method, &args, from).await?,
        CallKind::Transaction => {
            let outcome = client.write(handle, method, &args, from, options).await?;
            log!(
                cc::LIGHT_GREEN,
                "{method} mined in block {} tx {} gas used {}",
                outcome
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "?".into()),
                outcome.tx_hash,
                outcome.gas_used
            );
            save_log_to_file(&format!("{method} {raw_args:?} -> {}", outcome.tx_hash));
            return Ok(outcome
                .events
                .iter()
                .map(|event| {
                    let fields: Vec<String> = event
                        .fields
                        .iter()
                        .map(|(name, v)| format!("{name}={}", display_value(v)))
                        .collect();
                    format!("{}({})", event.name, fields.join(", "))
                })
                .collect());
        }
    };
    Ok(values.iter().map(display_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::contract::testing::{MockChain, NETWORK_ID};
    use crate::libs::networks::NetworkId;
    use alloy::primitives::U256;
    use std::path::PathBuf;

    const CONSTRUCTOR_ARTIFACT: &str = r#"{
        "abi": [{
            "type": "constructor",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "owner", "type": "address" },
                { "name": "cap", "type": "uint256" }
            ]
        }],
        "bytecode": "0x6080604052"
    }"#;

    fn cfg() -> Config {
        Config {
            network: None,
            rpc_url: basketgame::DEFAULT_ENDPOINT.to_string(),
            networks_file: PathBuf::from("networks.json"),
            contract_address: None,
            abi_path: None,
            bytecode_path: None,
        }
    }

    fn ganache(network_id: NetworkId, gas: Option<u64>) -> ResolvedNetwork {
        let mut net = ResolvedNetwork::from_url("ganache", "http://127.0.0.1:8545").unwrap();
        net.network_id = network_id;
        net.gas = gas;
        net
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("courtside-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Client on a chain with BasketGame at the default address.
    fn installed() -> (ContractClient<MockChain>, ContractHandle) {
        let chain = MockChain::new();
        chain.install(basketgame::DEFAULT_ADDRESS);
        (ContractClient::new(chain), attached(&cfg(), None, None).unwrap())
    }

    #[tokio::test]
    async fn interact_creates_and_reads_back_the_game() -> anyhow::Result<()> {
        let (client, handle) = installed();
        let game = interact(&client, &handle, "UNICAJA".into(), "BASKONIA".into())
            .await?
            .expect("game 1 exists");
        assert_eq!(game.game_id, U256::from(1u64));
        assert_eq!(game.home_team, "UNICAJA");
        assert_eq!(game.visitor_team, "BASKONIA");
        assert!(!game.finished);
        assert!(game.scoreline().contains("UNICAJA"));
        assert_eq!(client.transport().sends(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn call_prints_values_for_views_and_events_for_writes() -> anyhow::Result<()> {
        let (client, handle) = installed();
        let opts = WriteOptions::default();

        let created = call(&client, &handle, "createGame", &strings(&["UNICAJA", "BASKONIA"]), false, opts).await?;
        assert!(created.is_empty());
        call(&client, &handle, "scoreThreePointer", &strings(&["1", "0"]), false, opts).await?;

        let result = call(&client, &handle, "getResult", &strings(&["1"]), false, opts).await?;
        assert_eq!(result, strings(&["UNICAJA", "3", "BASKONIA", "0"]));

        let finished = call(&client, &handle, "finishGame", &strings(&["1"]), false, opts).await?;
        assert_eq!(
            finished,
            strings(&["FinalResult(game_id=1, message=Game finished, home=3, visitor=0)"])
        );
        let flag = call(&client, &handle, "isGameFinished", &strings(&["1"]), false, opts).await?;
        assert_eq!(flag, strings(&["true"]));
        Ok(())
    }

    #[tokio::test]
    async fn simulated_call_returns_prediction_without_sending() -> anyhow::Result<()> {
        let (client, handle) = installed();
        let opts = WriteOptions::default();
        let predicted = call(&client, &handle, "createGame", &strings(&["UNICAJA", "BASKONIA"]), true, opts).await?;
        assert_eq!(predicted, strings(&["1"]));
        assert_eq!(client.transport().sends(), 0);

        let result = call(&client, &handle, "getResult", &strings(&["1"]), false, opts).await?;
        assert_eq!(result, strings(&["", "0", "", "0"]));
        Ok(())
    }

    #[tokio::test]
    async fn value_on_a_query_is_refused_before_dispatch() {
        let (client, handle) = installed();
        let opts = WriteOptions {
            gas: None,
            value: Some(U256::from(1u64)),
        };
        let err = call(&client, &handle, "getResult", &strings(&["1"]), false, opts)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--value"), "{err}");
        assert_eq!(client.transport().dispatched(), 0);
    }

    #[tokio::test]
    async fn deploy_coerces_constructor_args() -> anyhow::Result<()> {
        let chain = MockChain::new();
        let client = ContractClient::new(&chain);
        let mut cfg = cfg();
        cfg.abi_path = Some(temp_file("capped.json", CONSTRUCTOR_ARTIFACT));

        let args = strings(&["0x1CbcCEB59367a2f68d2AD912F836d569d2d22321", "100"]);
        let address = deploy(&client, &cfg, None, None, 3_000_000, &args).await?;
        assert_ne!(address, Address::ZERO);

        let sent = chain.last_sent().expect("creation sent");
        assert_eq!(sent.to, None);
        assert_eq!(sent.gas, Some(3_000_000));
        assert_eq!(&sent.data[..5], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(sent.data.len(), 5 + 64);
        assert_eq!(&sent.data[5..][12..32], basketgame::DEFAULT_ADDRESS.as_slice());
        assert_eq!(sent.data[5 + 63], 100);

        let bad_args = strings(&["0x1CbcCEB59367a2f68d2AD912F836d569d2d22321", "lots"]);
        let bad = deploy(&client, &cfg, None, None, 3_000_000, &bad_args).await;
        assert!(bad.is_err());
        assert_eq!(chain.sends(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn deploy_without_bytecode_fails_before_sending() {
        let chain = MockChain::new();
        let client = ContractClient::new(&chain);
        let err = deploy(&client, &cfg(), None, None, 3_000_000, &[]).await.unwrap_err();
        assert!(err.to_string().contains("no bytecode"), "{err}");
        assert_eq!(chain.dispatched(), 0);
    }

    #[test]
    fn deploy_gas_prefers_flag_then_network_then_default() {
        assert_eq!(deploy_gas(Some(1_000_000), &ganache(NetworkId::Any, Some(5_500_000))), 1_000_000);
        assert_eq!(deploy_gas(None, &ganache(NetworkId::Any, Some(5_500_000))), 5_500_000);
        assert_eq!(deploy_gas(None, &ganache(NetworkId::Any, None)), *DEPLOY_GAS);
    }

    #[tokio::test]
    async fn execute_deploys_with_network_gas() -> anyhow::Result<()> {
        let chain = MockChain::new();
        let mut cfg = cfg();
        cfg.bytecode_path = Some(temp_file("basketgame.bin", "0x6080604052\n"));
        let command = Command::Deploy {
            abi: None,
            bytecode: None,
            gas: None,
            args: Vec::new(),
        };
        let network = ganache(NetworkId::Exact(NETWORK_ID), Some(5_500_000));
        execute(ContractClient::new(&chain), &network, &cfg, command).await?;
        assert_eq!(chain.last_gas(), Some(5_500_000));
        Ok(())
    }

    #[tokio::test]
    async fn execute_refuses_a_node_on_another_network() {
        let chain = MockChain::new();
        chain.install(basketgame::DEFAULT_ADDRESS);
        let command = Command::Interact {
            address: None,
            home: "UNICAJA".into(),
            visitor: "BASKONIA".into(),
        };
        let err = execute(ContractClient::new(&chain), &ganache(NetworkId::Exact(1), None), &cfg(), command)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("expects network id 1"), "{err}");
        assert!(err.contains(&NETWORK_ID.to_string()), "{err}");
        assert_eq!(chain.dispatched(), 0);
        assert_eq!(chain.account_lookups(), 0);
    }
}
