//! Typed encode/decode keyed by the contract interface. Arguments are checked
//! against the declared parameter types here, before anything is dispatched.
use alloy::dyn_abi::{DynSolType, DynSolValue, EventExt, FunctionExt, JsonAbiExt, Specifier};
use alloy::json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy::primitives::{Address, Bytes};

use super::{ContractError, EmittedEvent};
use crate::libs::rpc::LogEntry;
use crate::warn;

/// Which mutability a caller requires from the method it names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallKind {
    /// `view` or `pure`: answered by `eth_call`.
    Query,
    /// `nonpayable` or `payable`: submitted as a transaction.
    Transaction,
}

impl CallKind {
    fn admits(self, mutability: StateMutability) -> bool {
        match self {
            CallKind::Query => matches!(mutability, StateMutability::View | StateMutability::Pure),
            CallKind::Transaction => matches!(
                mutability,
                StateMutability::NonPayable | StateMutability::Payable
            ),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            CallKind::Query => "view",
            CallKind::Transaction => "nonpayable or payable",
        }
    }
}

pub fn mutability_name(mutability: StateMutability) -> &'static str {
    match mutability {
        StateMutability::Pure => "pure",
        StateMutability::View => "view",
        StateMutability::NonPayable => "nonpayable",
        StateMutability::Payable => "payable",
    }
}

fn invalid_args(method: &str, reason: impl Into<String>) -> ContractError {
    ContractError::InvalidArguments {
        method: method.to_string(),
        reason: reason.into(),
    }
}

fn abi_err(method: &str, reason: impl ToString) -> ContractError {
    ContractError::Abi {
        method: method.to_string(),
        reason: reason.to_string(),
    }
}

/// Find the overload of `method` with `arity` inputs whose mutability fits
/// `kind`.
///
/// A name missing from the interface, or present only with the wrong
/// mutability, is `InvalidMethod`. A name that fits but has no overload with
/// that many inputs is `InvalidArguments`.
pub fn resolve<'a>(
    interface: &'a JsonAbi,
    method: &str,
    arity: usize,
    kind: CallKind,
) -> Result<&'a Function, ContractError> {
    let overloads = interface
        .function(method)
        .filter(|o| !o.is_empty())
        .ok_or_else(|| ContractError::InvalidMethod {
            method: method.to_string(),
            reason: "not in the contract interface".to_string(),
        })?;

    let admitted: Vec<&Function> = overloads
        .iter()
        .filter(|f| kind.admits(f.state_mutability))
        .collect();
    if admitted.is_empty() {
        return Err(ContractError::InvalidMethod {
            method: method.to_string(),
            reason: format!(
                "declared {}, expected {}",
                mutability_name(overloads[0].state_mutability),
                kind.expected()
            ),
        });
    }

    admitted
        .iter()
        .find(|f| f.inputs.len() == arity)
        .copied()
        .ok_or_else(|| {
            let arities: Vec<String> = admitted.iter().map(|f| f.inputs.len().to_string()).collect();
            invalid_args(
                method,
                format!("got {arity} arguments, expected {}", arities.join(" or ")),
            )
        })
}

fn param_type(method: &str, param: &Param) -> Result<DynSolType, ContractError> {
    param
        .resolve()
        .map_err(|e| abi_err(method, format!("parameter `{}` of type {}: {e}", param.name, param.ty)))
}

fn value_type_name(value: &DynSolValue) -> String {
    value
        .as_type()
        .map(|t| t.sol_type_name().into_owned())
        .unwrap_or_else(|| "an untyped value".to_string())
}

/// Reject argument lists whose count or types do not match `params`.
pub fn check_args(method: &str, params: &[Param], args: &[DynSolValue]) -> Result<(), ContractError> {
    if params.len() != args.len() {
        return Err(invalid_args(
            method,
            format!("got {} arguments, expected {}", args.len(), params.len()),
        ));
    }
    for (i, (param, arg)) in params.iter().zip(args).enumerate() {
        let ty = param_type(method, param)?;
        if !ty.matches(arg) {
            return Err(invalid_args(
                method,
                format!(
                    "argument {i} (`{}`) is {}, expected {}",
                    param.name,
                    value_type_name(arg),
                    param.ty
                ),
            ));
        }
        if let DynSolValue::Uint(v, bits) = arg {
            if *bits < 256 && v.bit_len() > *bits {
                return Err(invalid_args(
                    method,
                    format!("argument {i} (`{}`) = {v} overflows {}", param.name, param.ty),
                ));
            }
        }
    }
    Ok(())
}

/// Parse UI-facing strings (form fields, CLI words) into typed arguments.
pub fn coerce_args(method: &str, params: &[Param], raw: &[String]) -> Result<Vec<DynSolValue>, ContractError> {
    if params.len() != raw.len() {
        return Err(invalid_args(
            method,
            format!("got {} arguments, expected {}", raw.len(), params.len()),
        ));
    }
    params
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(i, (param, word))| {
            let ty = param_type(method, param)?;
            ty.coerce_str(word).map_err(|e| {
                invalid_args(
                    method,
                    format!("argument {i} (`{}`) {word:?} is not a {}: {e}", param.name, param.ty),
                )
            })
        })
        .collect()
}

/// Resolve `method` for `kind` and parse `raw` into its argument types.
pub fn parse_args(
    interface: &JsonAbi,
    method: &str,
    raw: &[String],
    kind: CallKind,
) -> Result<Vec<DynSolValue>, ContractError> {
    let function = resolve(interface, method, raw.len(), kind)?;
    coerce_args(method, &function.inputs, raw)
}

pub fn encode_call(function: &Function, args: &[DynSolValue]) -> Result<Bytes, ContractError> {
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| abi_err(&function.name, e))
}

pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<DynSolValue>, ContractError> {
    if function.outputs.is_empty() {
        return Ok(Vec::new());
    }
    if data.is_empty() {
        return Err(abi_err(
            &function.name,
            "empty return data (is there a contract at this address?)",
        ));
    }
    function
        .abi_decode_output(data)
        .map_err(|e| abi_err(&function.name, e))
}

/// Creation payload: `bytecode` followed by the encoded constructor arguments.
pub fn encode_deploy(interface: &JsonAbi, bytecode: &[u8], args: &[DynSolValue]) -> Result<Bytes, ContractError> {
    if bytecode.is_empty() {
        return Err(invalid_args("constructor", "bytecode is empty"));
    }
    let mut data = bytecode.to_vec();
    match interface.constructor() {
        Some(ctor) => {
            check_args("constructor", &ctor.inputs, args)?;
            if !args.is_empty() {
                let encoded = ctor
                    .abi_encode_input(args)
                    .map_err(|e| abi_err("constructor", e))?;
                data.extend_from_slice(&encoded);
            }
        }
        None if !args.is_empty() => {
            return Err(invalid_args(
                "constructor",
                format!("interface declares no constructor, got {} arguments", args.len()),
            ));
        }
        None => {}
    }
    Ok(data.into())
}

/// Decode the logs `address` emitted that match a non-anonymous event of
/// `interface`. Other logs are skipped.
pub fn decode_events(interface: &JsonAbi, address: Address, logs: &[LogEntry]) -> Vec<EmittedEvent> {
    logs.iter()
        .filter(|log| log.address == address)
        .filter_map(|log| {
            let topic0 = log.topics.first()?;
            let event = interface
                .events()
                .find(|e| !e.anonymous && e.selector() == *topic0)?;
            let decoded = match event.decode_log_parts(log.topics.iter().copied(), &log.data) {
                Ok(d) => d,
                Err(e) => {
                    warn!("could not decode {} log: {e}", event.name);
                    return None;
                }
            };
            let mut indexed = decoded.indexed.into_iter();
            let mut body = decoded.body.into_iter();
            let fields = event
                .inputs
                .iter()
                .filter_map(|p| {
                    let value = if p.indexed { indexed.next() } else { body.next() };
                    value.map(|v| (p.name.clone(), v))
                })
                .collect();
            Some(EmittedEvent {
                name: event.name.clone(),
                fields,
            })
        })
        .collect()
}

/// Display form of a decoded value for result fields and logs.
pub fn display_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Address(a) => a.to_checksum(None),
        DynSolValue::FixedBytes(word, size) => format!("0x{}", hex::encode(&word[..*size])),
        DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let parts: Vec<String> = items.iter().map(display_value).collect();
            format!("[{}]", parts.join(", "))
        }
        DynSolValue::Tuple(items) => {
            let parts: Vec<String> = items.iter().map(display_value).collect();
            format!("({})", parts.join(", "))
        }
        other => format!("{other:?}"),
    }
}
