use {
    alloy::primitives::Address,
    anyhow::{Context, Result},
    dotenv::dotenv,
    std::{fmt::Debug, path::PathBuf, str::FromStr},
};

pub fn load_env() {
    dotenv().ok();
}

/// Process-wide settings read from the environment (and `.env`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Entry of the networks file to use; `None` means talk to `rpc_url`.
    pub network: Option<String>,
    pub rpc_url: String,
    pub networks_file: PathBuf,
    pub contract_address: Option<Address>,
    /// Build artifact with the contract interface; the embedded BasketGame
    /// ABI is used when unset.
    pub abi_path: Option<PathBuf>,
    pub bytecode_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        load_env();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| non_empty(lookup(key));
        let contract_address = match var("CONTRACT_ADDRESS") {
            Some(raw) => Some(
                raw.parse::<Address>()
                    .with_context(|| format!("CONTRACT_ADDRESS is not an address: {raw}"))?,
            ),
            None => None,
        };

        Ok(Self {
            network: var("NETWORK"),
            rpc_url: var("RPC_URL")
                .unwrap_or_else(|| basketgame::DEFAULT_ENDPOINT.to_string()),
            networks_file: var("NETWORKS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("networks.json")),
            contract_address,
            abi_path: var("ABI_PATH").map(PathBuf::from),
            bytecode_path: var("BYTECODE_PATH").map(PathBuf::from),
        })
    }

    /// Parse env var to T; fall back to typed default.
    pub fn get_var_t<T>(key: &str, default: T) -> T
    where
        T: FromStr,
        <T as FromStr>::Err: Debug,
    {
        parse_or(std::env::var(key).ok(), default)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_or_falls_back_on_missing_or_garbage() {
        assert_eq!(parse_or::<u64>(Some("not-a-number".into()), 21_000), 21_000);
        assert_eq!(parse_or::<u64>(Some("90000".into()), 21_000), 90_000);
        assert_eq!(parse_or::<u32>(None, 7), 7);
        assert_eq!(Config::get_var_t::<u32>("COURTSIDE_TEST_UNSET_KEY", 7), 7);
    }

    #[test]
    fn blank_vars_count_as_unset() {
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(Some(" ganache ".into())).as_deref(), Some("ganache"));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn config_defaults_and_overrides() -> anyhow::Result<()> {
        let cfg = Config::from_lookup(lookup(&[("NETWORK", "  "), ("ABI_PATH", "build/BasketGame.json")]))?;
        assert_eq!(cfg.network, None);
        assert_eq!(cfg.rpc_url, basketgame::DEFAULT_ENDPOINT);
        assert_eq!(cfg.networks_file, PathBuf::from("networks.json"));
        assert_eq!(cfg.abi_path, Some(PathBuf::from("build/BasketGame.json")));
        assert_eq!(cfg.contract_address, None);

        let cfg = Config::from_lookup(lookup(&[
            ("NETWORK", "ganache"),
            ("CONTRACT_ADDRESS", "0x1CbcCEB59367a2f68d2AD912F836d569d2d22321"),
        ]))?;
        assert_eq!(cfg.network.as_deref(), Some("ganache"));
        assert_eq!(cfg.contract_address, Some(basketgame::DEFAULT_ADDRESS));

        assert!(Config::from_lookup(lookup(&[("CONTRACT_ADDRESS", "court")])).is_err());
        Ok(())
    }
}
