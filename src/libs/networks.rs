//! Deployment network profiles, in the shape of a truffle `networks` block:
//!
//! ```json
//! {
//!   "networks": {
//!     "ganache": { "host": "127.0.0.1", "port": 8545, "network_id": "*" },
//!     "ropsten": {
//!       "provider": { "url": "https://ropsten.infura.io/v3/${INFURA_PROJECT_ID}" },
//!       "network_id": 3,
//!       "gas": 5500000
//!     }
//!   }
//! }
//! ```
//!
//! A `host`/`port` entry talks to a node that manages its own accounts. A
//! `provider` entry signs locally with the key found in `private_key_env`.
use {
    anyhow::{anyhow, bail, Context, Result},
    serde::Deserialize,
    std::{collections::BTreeMap, fmt, fs, path::Path},
    url::Url,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NetworksFile {
    pub networks: BTreeMap<String, NetworkSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSpec {
    #[serde(flatten)]
    pub target: NetworkTarget,
    pub network_id: NetworkId,
    #[serde(default)]
    pub gas: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NetworkTarget {
    Host { host: String, port: u16 },
    Provider { provider: ProviderFactory },
}

/// Signing credentials plus the RPC endpoint they are used against.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderFactory {
    pub url: String,
    #[serde(default = "default_key_env")]
    pub private_key_env: String,
}

fn default_key_env() -> String {
    "PRIVATE_KEY".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawNetworkId")]
pub enum NetworkId {
    Any,
    Exact(u64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNetworkId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawNetworkId> for NetworkId {
    type Error = String;

    fn try_from(raw: RawNetworkId) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawNetworkId::Number(n) => Ok(NetworkId::Exact(n)),
            RawNetworkId::Text(s) if s.trim() == "*" => Ok(NetworkId::Any),
            RawNetworkId::Text(s) => s
                .trim()
                .parse()
                .map(NetworkId::Exact)
                .map_err(|_| format!("network_id must be a number or \"*\", got {s:?}")),
        }
    }
}

impl NetworkId {
    pub fn accepts(self, id: u64) -> bool {
        match self {
            NetworkId::Any => true,
            NetworkId::Exact(n) => n == id,
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkId::Any => f.write_str("*"),
            NetworkId::Exact(n) => write!(f, "{n}"),
        }
    }
}

/// A network entry turned into something a transport can be built from.
#[derive(Clone)]
pub struct ResolvedNetwork {
    pub name: String,
    pub endpoint: Url,
    pub private_key: Option<String>,
    pub network_id: NetworkId,
    pub gas: Option<u64>,
}

impl fmt::Debug for ResolvedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNetwork")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint.as_str())
            .field("signer", &self.private_key.is_some())
            .field("network_id", &self.network_id)
            .field("gas", &self.gas)
            .finish()
    }
}

impl ResolvedNetwork {
    /// Ad-hoc profile for a bare endpoint, any network id accepted.
    pub fn from_url(name: &str, url: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_string(),
            endpoint: Url::parse(url).with_context(|| format!("Failed to parse RPC URL: {url}"))?,
            private_key: None,
            network_id: NetworkId::Any,
            gas: None,
        })
    }
}

impl NetworksFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedNetwork> {
        self.resolve_with(name, |key| std::env::var(key).ok())
    }

    /// [`Self::resolve`] with `lookup` standing in for the process
    /// environment.
    pub fn resolve_with(&self, name: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<ResolvedNetwork> {
        let spec = self.networks.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.networks.keys().map(String::as_str).collect();
            anyhow!("unknown network `{name}` (known: {})", known.join(", "))
        })?;

        let (endpoint, private_key) = match &spec.target {
            NetworkTarget::Host { host, port } => {
                let raw = format!("http://{host}:{port}");
                let url = Url::parse(&raw).with_context(|| format!("bad host/port: {raw}"))?;
                (url, None)
            }
            NetworkTarget::Provider { provider } => {
                let raw = expand_vars(&provider.url, &lookup)?;
                let url = Url::parse(&raw)
                    .with_context(|| format!("bad provider url for `{name}`: {raw}"))?;
                let key = lookup(&provider.private_key_env)
                    .filter(|k| !k.trim().is_empty())
                    .with_context(|| {
                        format!("network `{name}` signs locally but {} is not set", provider.private_key_env)
                    })?;
                (url, Some(key))
            }
        };

        Ok(ResolvedNetwork {
            name: name.to_string(),
            endpoint,
            private_key,
            network_id: spec.network_id,
            gas: spec.gas,
        })
    }
}

/// Replace every `${VAR}` in `raw` with `lookup(VAR)`. A missing variable
/// is an error.
pub fn expand_vars(raw: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            bail!("unterminated ${{ in {raw:?}");
        };
        let var = &after[..end];
        let value = lookup(var).with_context(|| format!("{var} is not set (used in {raw:?})"))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
