//! Core data model: the parsed call plan and the shaped fetch result.
//!
//! The call plan ([`Web3Url`]) is the output of URL parsing and name
//! resolution; everything a fetch needs is resolved into it up front. The
//! mode and shaping choices are closed enumerations carrying their
//! associated data, so an unset or half-set combination cannot be
//! represented.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, Bytes};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::config::NameServiceKind;

/// The ERC-4804 resolve mode declared by the target contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Path and query are parsed into a method call.
    Auto,
    /// Path and query are forwarded verbatim as calldata.
    Manual,
    /// ERC-5219 resource requests. Reserved.
    ResourceRequest,
}

impl Display for ResolveMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveMode::Auto => write!(f, "auto"),
            ResolveMode::Manual => write!(f, "manual"),
            ResolveMode::ResourceRequest => write!(f, "resource-request"),
        }
    }
}

/// How the contract is called.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractCall {
    /// Raw calldata, passed through verbatim.
    Calldata(Bytes),
    /// A method with typed arguments; calldata is derived from it.
    /// `arg_types` and `arg_values` have equal length by construction.
    Method {
        name: String,
        arg_types: Vec<DynSolType>,
        arg_values: Vec<DynSolValue>,
    },
}

/// How the raw contract return is shaped into a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnProcessing {
    /// The return is ABI-encoded `bytes`; decode and serve them, optionally
    /// with a MIME type sniffed from the request path.
    AbiEncodedBytes { mime_type: Option<String> },
    /// JSON-encode the raw return bytes as `["0x..."]`.
    RawBytesJson,
    /// ABI-decode the return as the given tuple and JSON-encode the values.
    JsonValues(Vec<DynSolType>),
    /// ERC-5219 return convention. Reserved; fetching yields a 501.
    Erc5219,
}

/// A parsed `web3://` URL: the fully-resolved call plan.
#[derive(Debug, Clone)]
pub struct Web3Url {
    /// The original URL string.
    pub url: String,

    /// Name service used to resolve the host, if it was a domain name.
    pub host_resolver: Option<NameServiceKind>,
    /// Chain the name resolution ran on. `0` when the host was a literal
    /// address.
    pub host_resolver_chain_id: u64,

    /// The contract that will be called, after optional name resolution.
    pub contract_address: Address,
    /// Chain the call targets. Differs from the resolver chain when the name
    /// service returned an EIP-3770 chain-prefixed address.
    pub chain_id: u64,

    /// The contract-declared resolve mode.
    pub resolve_mode: ResolveMode,

    /// The call itself: raw calldata or a typed method invocation.
    pub call: ContractCall,

    /// How to shape the return.
    pub return_processing: ReturnProcessing,
}

/// The result of fetching a `web3://` URL, ready to serve.
#[derive(Debug, Clone)]
pub struct FetchedWeb3Url {
    /// The parsed URL the fetch executed.
    pub parsed: Web3Url,
    /// The raw bytes returned by the contract.
    pub contract_return: Vec<u8>,
    /// The shaped response body.
    pub output: Vec<u8>,
    /// HTTP status to serve.
    pub http_code: u16,
    /// HTTP headers to serve.
    pub http_headers: HashMap<String, String>,
}
