//! Client for the ERC-4804 `web3://` URL scheme.
//!
//! A `web3://` URL names a contract (directly or through a decentralized
//! name service) on an EVM-compatible chain. Fetching one is a read-only
//! pipeline:
//!
//! 1. Parse the URL into a call plan ([`Web3Url`]): grammar, chain, host
//!    resolution (with a TTL cache over name lookups), the `resolveMode()`
//!    probe, and mode-specific argument parsing.
//! 2. Derive the calldata and issue a single `eth_call` from the zero
//!    address against the target chain's RPC endpoint.
//! 3. Shape the returned bytes into an HTTP-style response
//!    ([`FetchedWeb3Url`]): status, headers, body.
//!
//! Examples:
//! - `web3://0x4e1f41613c9084fdb9e34e11fae9412427480e56/tokenHTML/9352`
//! - `web3://vitalik.eth/balanceOf/0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045?returns=(uint256)`
//! - `web3://example.eth:5/`
//!
//! The RPC transport is a capability ([`EthCaller`]) injected at
//! construction, so the whole state machine can be driven against canned
//! responses. All failures surface as [`Web3Error`], an HTTP status code
//! plus message, ready for a gateway front-end to forward.
//!
//! This crate performs no wallet operations, no transaction signing, and no
//! state-changing calls.

use std::sync::Arc;
use std::time::Duration;

pub mod abi;
pub mod cache;
pub mod caller;
pub mod config;
pub mod error;
mod mode;
pub mod namehash;
pub mod nameservice;
mod output;
pub mod types;
mod url;

pub use crate::config::{ChainConfig, Config, NameServiceInfo, NameServiceKind};
pub use crate::error::{Web3Error, EMPTY_RETURN_MESSAGE};
pub use crate::types::{ContractCall, FetchedWeb3Url, ResolveMode, ReturnProcessing, Web3Url};

use crate::cache::NameAddrCache;
use crate::caller::{EthCaller, RpcCaller};
use crate::namehash::Normalizer;

/// The `web3://` client. Thread-safe; fetches are independent.
pub struct Client {
    config: Config,
    normalizer: Normalizer,
    caller: Arc<dyn EthCaller>,
    name_cache: Option<NameAddrCache>,
}

impl Client {
    /// Build a client over the JSON-RPC transport.
    pub fn new(config: Config) -> Self {
        let caller = Arc::new(RpcCaller::new(Duration::from_secs(
            config.rpc_timeout_seconds,
        )));
        Self::with_caller(config, caller)
    }

    /// Build a client over a custom transport. Used by the test suite to
    /// drive the pipeline without a real RPC.
    pub fn with_caller(config: Config, caller: Arc<dyn EthCaller>) -> Self {
        let name_cache = (config.name_cache_ttl_minutes > 0).then(|| {
            NameAddrCache::new(Duration::from_secs(
                u64::from(config.name_cache_ttl_minutes) * 60,
            ))
        });
        Self {
            config,
            normalizer: Normalizer::new(),
            caller,
            name_cache,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Fetch a `web3://` URL: parse, call, shape.
    pub async fn fetch_url(&self, url: &str) -> Result<FetchedWeb3Url, Web3Error> {
        let parsed = self.parse_url(url).await?;
        let contract_return = self.fetch_contract_return(&parsed).await?;
        self.process_contract_return(parsed, contract_return)
    }

    /// Execute the call described by a parsed URL and return the raw bytes.
    pub async fn fetch_contract_return(&self, parsed: &Web3Url) -> Result<Vec<u8>, Web3Error> {
        // The reserved ERC-5219 hook has no emission path yet; fail before
        // spending an RPC call.
        if matches!(parsed.return_processing, ReturnProcessing::Erc5219) {
            return Err(Web3Error::not_implemented(
                "ERC-5219 resource requests are not implemented",
            ));
        }

        let calldata = abi::build_calldata(&parsed.call)?;
        let rpc = self.rpc_for(parsed.chain_id)?;

        tracing::debug!(
            url = %parsed.url,
            contract = %parsed.contract_address,
            chain_id = parsed.chain_id,
            calldata_len = calldata.len(),
            "fetching contract return"
        );
        let contract_return = self
            .caller
            .call(rpc, parsed.contract_address, calldata)
            .await?;

        if contract_return.is_empty() {
            return Err(Web3Error::not_found(EMPTY_RETURN_MESSAGE));
        }
        Ok(contract_return.to_vec())
    }

    /// The RPC endpoint of a chain already validated during parsing.
    fn rpc_for(&self, chain_id: u64) -> Result<&::url::Url, Web3Error> {
        self.config
            .chain(chain_id)
            .map(|c| &c.rpc)
            .ok_or_else(|| Web3Error::internal(format!("no configuration for chain {chain_id}")))
    }
}
