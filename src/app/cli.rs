use std::path::PathBuf;

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "courtside", about = "Deploy and drive the BasketGame contract", version)]
pub struct Cli {
    /// Entry of the networks file to connect through. Overrides NETWORK.
    #[arg(long, short = 'n', global = true, value_name = "NAME")]
    pub network: Option<String>,

    /// JSON-RPC endpoint used when no network is named. Overrides RPC_URL.
    #[arg(long, global = true, value_name = "URL")]
    pub rpc_url: Option<String>,

    /// Networks file. Overrides NETWORKS_FILE.
    #[arg(long, global = true, value_name = "PATH")]
    pub networks_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Deploy a new contract instance.
    Deploy {
        /// Build artifact with `abi` and `bytecode`, or a bare ABI.
        #[arg(long, value_name = "PATH")]
        abi: Option<PathBuf>,
        /// Creation code as hex, when the artifact has none.
        #[arg(long, value_name = "PATH")]
        bytecode: Option<PathBuf>,
        /// Gas limit of the creation transaction.
        #[arg(long)]
        gas: Option<u64>,
        /// Constructor arguments, parsed by their ABI types.
        args: Vec<String>,
    },
    /// Create a game and read it back.
    Interact {
        #[arg(long, short = 'a')]
        address: Option<Address>,
        #[arg(default_value = "UNICAJA")]
        home: String,
        #[arg(default_value = "BASKONIA")]
        visitor: String,
    },
    /// Call any method of the contract. View methods are queried, the rest
    /// are sent as transactions.
    Call {
        #[arg(long, short = 'a')]
        address: Option<Address>,
        #[arg(long, value_name = "PATH")]
        abi: Option<PathBuf>,
        /// Run a state-changing method through eth_call only.
        #[arg(long)]
        simulate: bool,
        #[arg(long)]
        gas: Option<u64>,
        /// Wei to attach; payable methods only.
        #[arg(long)]
        value: Option<U256>,
        method: String,
        args: Vec<String>,
    },
    /// Interactive scoreboard.
    Dapp {
        #[arg(long, short = 'a')]
        address: Option<Address>,
    },
    /// List the networks file entries.
    Networks,
}
