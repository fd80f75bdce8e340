//! Build artifacts as compilers and IDEs export them: a bare ABI array, or an
//! object with `abi` and optionally `bytecode` (a hex string or solc's
//! `{ "object": "..." }`).
use std::fs;
use std::path::Path;

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct Artifact {
    pub interface: JsonAbi,
    pub bytecode: Option<Bytes>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArtifact {
    Bare(JsonAbi),
    Build {
        abi: JsonAbi,
        #[serde(default)]
        bytecode: Option<Value>,
    },
}

impl Artifact {
    /// The BasketGame interface bundled with the binary. It has no bytecode.
    pub fn basketgame() -> Result<Self> {
        Ok(Self {
            interface: basketgame::interface()?,
            bytecode: None,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse artifact {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        match serde_json::from_str(contents)? {
            RawArtifact::Bare(interface) => Ok(Self {
                interface,
                bytecode: None,
            }),
            RawArtifact::Build { abi, bytecode } => {
                let bytecode = match bytecode {
                    None | Some(Value::Null) => None,
                    Some(v) => Some(bytecode_from_json(&v)?),
                };
                Ok(Self {
                    interface: abi,
                    bytecode: bytecode.filter(|b| !b.is_empty()),
                })
            }
        }
    }

    /// Swap in creation code read from a separate file.
    pub fn with_bytecode_file(mut self, path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read bytecode {}", path.display()))?;
        self.bytecode = Some(parse_bytecode(&contents)?);
        Ok(self)
    }

    pub fn require_bytecode(&self) -> Result<&Bytes> {
        self.bytecode
            .as_ref()
            .ok_or_else(|| anyhow!("artifact has no bytecode; set BYTECODE_PATH or use a build artifact"))
    }
}

fn bytecode_from_json(value: &Value) -> Result<Bytes> {
    match value {
        Value::String(s) => parse_bytecode(s),
        Value::Object(map) => map
            .get("object")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("bytecode object has no `object` string"))
            .and_then(parse_bytecode),
        other => Err(anyhow!("unsupported bytecode value: {other}")),
    }
}

/// Hex creation code, with or without `0x`, or solc's `{ "object": ... }`
/// wrapper as Remix copies it.
pub fn parse_bytecode(raw: &str) -> Result<Bytes> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed).context("bytecode JSON")?;
        return bytecode_from_json(&value);
    }
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.contains("__") {
        return Err(anyhow!("bytecode has unlinked library placeholders"));
    }
    let bytes = hex::decode(digits).context("bytecode is not valid hex")?;
    Ok(bytes.into())
}
