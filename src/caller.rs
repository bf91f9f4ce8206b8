//! The EVM read-call capability.
//!
//! Every contract interaction the client performs is a single read-only
//! `eth_call` issued from the zero address with no gas cap and no value. The
//! transport is a capability ([`EthCaller`]) injected into the client so
//! tests can drive the whole state machine against canned responses.
//!
//! [`RpcCaller`] is the production implementation: a fresh HTTP provider per
//! call (dial, use, drop), honoring the configured request timeout.
//! Cancellation is dropping the future.

use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::Http;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::error::Web3Error;

/// A read-only `eth_call` against one chain's RPC endpoint.
#[async_trait]
pub trait EthCaller: Send + Sync {
    /// Call `to` with `data` on the chain behind `rpc`.
    ///
    /// Errors map to the uniform taxonomy: an unreachable or unbuildable
    /// transport is a 500, a failing call is a 404 carrying the RPC message.
    async fn call(&self, rpc: &Url, to: Address, data: Bytes) -> Result<Bytes, Web3Error>;
}

/// JSON-RPC implementation of [`EthCaller`] over per-call HTTP transports.
pub struct RpcCaller {
    request_timeout: Duration,
}

impl RpcCaller {
    pub fn new(request_timeout: Duration) -> Self {
        Self { request_timeout }
    }
}

#[async_trait]
impl EthCaller for RpcCaller {
    async fn call(&self, rpc: &Url, to: Address, data: Bytes) -> Result<Bytes, Web3Error> {
        let http_client = alloy::transports::http::reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| {
                Web3Error::server_error(format!("failed to build HTTP client: {e}"))
            })?;
        let transport = Http::with_client(http_client, rpc.clone());
        let rpc_client = RpcClient::new(transport, false);
        let provider = RootProvider::<Ethereum>::new(rpc_client);

        let tx = TransactionRequest::default()
            .with_from(Address::ZERO)
            .with_to(to)
            .with_input(data);

        tracing::debug!(rpc = %rpc, to = %to, "eth_call");
        provider
            .call(tx)
            .await
            .map_err(|e| Web3Error::not_found(e.to_string()))
    }
}
