//! Shaping the raw contract return into an HTTP-style response.
//!
//! Dispatches on the declared return processing. JSON paths always set
//! `Content-Type: application/json`; the ABI-bytes path sets the MIME type
//! only when one was sniffed from the request.

use alloy::primitives::hex;
use std::collections::HashMap;

use crate::abi;
use crate::error::Web3Error;
use crate::types::{FetchedWeb3Url, ReturnProcessing, Web3Url};
use crate::Client;

const CONTENT_TYPE: &str = "Content-Type";

impl Client {
    /// Apply the declared return processing to the raw contract return.
    pub fn process_contract_return(
        &self,
        parsed: Web3Url,
        contract_return: Vec<u8>,
    ) -> Result<FetchedWeb3Url, Web3Error> {
        let mut http_headers = HashMap::new();

        let output = match &parsed.return_processing {
            ReturnProcessing::AbiEncodedBytes { mime_type } => {
                let bytes = abi::decode_abi_bytes(&contract_return)?;
                if let Some(mime_type) = mime_type {
                    http_headers.insert(CONTENT_TYPE.to_string(), mime_type.clone());
                }
                bytes
            }
            ReturnProcessing::RawBytesJson => {
                let encoded = vec![format!("0x{}", hex::encode(&contract_return))];
                http_headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
                serde_json::to_vec(&encoded)
                    .map_err(|e| Web3Error::internal(format!("JSON encoding failed: {e}")))?
            }
            ReturnProcessing::JsonValues(types) => {
                let values = abi::decode_return_values(types, &contract_return)?;
                let shaped: Vec<serde_json::Value> = values.iter().map(abi::to_json).collect();
                http_headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());
                serde_json::to_vec(&shaped)
                    .map_err(|e| Web3Error::internal(format!("JSON encoding failed: {e}")))?
            }
            ReturnProcessing::Erc5219 => {
                return Err(Web3Error::not_implemented(
                    "ERC-5219 resource requests are not implemented",
                ))
            }
        };

        Ok(FetchedWeb3Url {
            parsed,
            contract_return,
            output,
            http_code: 200,
            http_headers,
        })
    }
}
