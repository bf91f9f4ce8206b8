//! Mode-specific translation of path and query into a call plan.
//!
//! - Auto mode: `/method/arg0/arg1?returns=(...)`. Arguments are typed
//!   (`uint256!42`) or inferred from their shape; the `returns` annotation
//!   picks the return shaping.
//! - Manual mode: the raw path and query become the calldata verbatim.
//! - Resource-request mode (ERC-5219): reserved; parsing succeeds so the
//!   plan can be inspected, fetching reports 501.
//!
//! Unknown argument shapes and unparseable `returns` annotations are 400s.

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{hex, Bytes};

use crate::abi;
use crate::error::Web3Error;
use crate::types::{ContractCall, ReturnProcessing};
use crate::url::UrlParts;

pub(crate) fn parse_auto_mode(
    parts: &UrlParts,
) -> Result<(ContractCall, ReturnProcessing), Web3Error> {
    let segments: Vec<&str> = parts
        .pathname
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if segments.is_empty() {
        // No method: call the contract with empty calldata.
        let processing = match returns_annotation(&parts.query) {
            Some(annotation) => parse_returns(&annotation)?,
            None => ReturnProcessing::AbiEncodedBytes { mime_type: None },
        };
        return Ok((ContractCall::Calldata(Bytes::new()), processing));
    }

    let method = segments[0];
    if !is_method_name(method) {
        return Err(Web3Error::bad_request(format!("Invalid method name: {method}")));
    }

    let mut arg_types = Vec::with_capacity(segments.len() - 1);
    let mut arg_values = Vec::with_capacity(segments.len() - 1);
    for segment in &segments[1..] {
        let (ty, value) = parse_argument(segment)?;
        arg_types.push(ty);
        arg_values.push(value);
    }

    let processing = match returns_annotation(&parts.query) {
        Some(annotation) => parse_returns(&annotation)?,
        None => ReturnProcessing::AbiEncodedBytes {
            mime_type: mime_for_path(&parts.pathname),
        },
    };

    Ok((
        ContractCall::Method {
            name: method.to_string(),
            arg_types,
            arg_values,
        },
        processing,
    ))
}

pub(crate) fn parse_manual_mode(
    parts: &UrlParts,
) -> Result<(ContractCall, ReturnProcessing), Web3Error> {
    // The whole path and query, undecoded, is the calldata. An absent path
    // is the root path.
    let raw_path = if parts.path.is_empty() {
        "/"
    } else {
        parts.path.as_str()
    };
    Ok((
        ContractCall::Calldata(Bytes::from(raw_path.as_bytes().to_vec())),
        ReturnProcessing::AbiEncodedBytes {
            mime_type: mime_for_path(&parts.pathname),
        },
    ))
}

pub(crate) fn parse_resource_request_mode(
    _parts: &UrlParts,
) -> Result<(ContractCall, ReturnProcessing), Web3Error> {
    Ok((
        ContractCall::Calldata(Bytes::new()),
        ReturnProcessing::Erc5219,
    ))
}

/// A single path argument: `[type "!"] value`.
fn parse_argument(segment: &str) -> Result<(DynSolType, DynSolValue), Web3Error> {
    if let Some((type_name, raw)) = segment.split_once('!') {
        let ty = abi::parse_type(type_name)?;
        let value = abi::coerce_value(&ty, raw)?;
        return Ok((ty, value));
    }
    infer_argument(segment)
}

/// Type inference for untyped arguments, in order: uint256 for decimal
/// digits, bytes32 / address by hex width, bytes for other hex. Bare names
/// are rejected rather than recursively resolved.
fn infer_argument(segment: &str) -> Result<(DynSolType, DynSolValue), Web3Error> {
    if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
        let ty = DynSolType::Uint(256);
        let value = abi::coerce_value(&ty, segment)?;
        return Ok((ty, value));
    }
    if let Some(digits) = segment.strip_prefix("0x") {
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) || digits.len() % 2 != 0 {
            return Err(Web3Error::bad_request(format!("invalid hex argument: {segment}")));
        }
        let bytes = hex::decode(digits)
            .map_err(|_| Web3Error::bad_request(format!("invalid hex argument: {segment}")))?;
        return Ok(match bytes.len() {
            32 => {
                let ty = DynSolType::FixedBytes(32);
                (ty.clone(), abi::coerce_value(&ty, segment)?)
            }
            20 => {
                let ty = DynSolType::Address;
                (ty.clone(), abi::coerce_value(&ty, segment)?)
            }
            _ => (DynSolType::Bytes, DynSolValue::Bytes(bytes)),
        });
    }
    Err(Web3Error::bad_request(format!("unrecognized argument: {segment}")))
}

fn is_method_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' || b == b'$' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
}

/// The `returns` (alias `returnTypes`) query attribute, percent-decoded.
fn returns_annotation(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "returns" || key == "returnTypes")
        .map(|(_, value)| value.into_owned())
}

fn parse_returns(annotation: &str) -> Result<ReturnProcessing, Web3Error> {
    if annotation == "()" {
        return Ok(ReturnProcessing::RawBytesJson);
    }
    if !annotation.starts_with('(') || !annotation.ends_with(')') {
        return Err(Web3Error::bad_request(format!(
            "Invalid returns attribute: {annotation}"
        )));
    }
    Ok(ReturnProcessing::JsonValues(abi::parse_type_list(annotation)?))
}

/// MIME type from the extension of the final path segment, if any.
fn mime_for_path(pathname: &str) -> Option<String> {
    let last_segment = pathname.rsplit('/').next()?;
    let (stem, extension) = last_segment.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let mime = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "text/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => return None,
    };
    Some(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    fn parts(pathname: &str, query: &str) -> UrlParts {
        let path = if query.is_empty() {
            pathname.to_string()
        } else {
            format!("{pathname}?{query}")
        };
        UrlParts {
            hostname: "example.eth".to_string(),
            chain: None,
            path,
            pathname: pathname.to_string(),
            query: query.to_string(),
        }
    }

    #[test]
    fn auto_mode_empty_path() {
        let (call, processing) = parse_auto_mode(&parts("", "")).unwrap();
        assert_eq!(call, ContractCall::Calldata(Bytes::new()));
        assert_eq!(
            processing,
            ReturnProcessing::AbiEncodedBytes { mime_type: None }
        );

        let (call, _) = parse_auto_mode(&parts("/", "")).unwrap();
        assert_eq!(call, ContractCall::Calldata(Bytes::new()));
    }

    #[test]
    fn auto_mode_method_with_args() {
        let (call, _) = parse_auto_mode(&parts(
            "/balanceOf/0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "",
        ))
        .unwrap();
        let ContractCall::Method {
            name,
            arg_types,
            arg_values,
        } = call
        else {
            panic!("expected method call");
        };
        assert_eq!(name, "balanceOf");
        assert_eq!(arg_types, vec![DynSolType::Address]);
        assert_eq!(
            arg_values,
            vec![DynSolValue::Address(address!(
                "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
            ))]
        );
    }

    #[test]
    fn auto_mode_typed_and_inferred_args() {
        let (call, _) =
            parse_auto_mode(&parts("/mint/uint256!3/42/string!hello", "")).unwrap();
        let ContractCall::Method {
            arg_types,
            arg_values,
            ..
        } = call
        else {
            panic!("expected method call");
        };
        assert_eq!(
            arg_types,
            vec![
                DynSolType::Uint(256),
                DynSolType::Uint(256),
                DynSolType::String
            ]
        );
        assert_eq!(arg_values[0], DynSolValue::Uint(U256::from(3), 256));
        assert_eq!(arg_values[1], DynSolValue::Uint(U256::from(42), 256));
        assert_eq!(arg_values[2], DynSolValue::String("hello".to_string()));
    }

    #[test]
    fn auto_mode_infers_hex_widths() {
        let word = format!("0x{}", "11".repeat(32));
        let (call, _) =
            parse_auto_mode(&parts(&format!("/f/{word}/0xdead"), "")).unwrap();
        let ContractCall::Method { arg_types, .. } = call else {
            panic!("expected method call");
        };
        assert_eq!(
            arg_types,
            vec![DynSolType::FixedBytes(32), DynSolType::Bytes]
        );
    }

    #[test]
    fn auto_mode_rejects_bad_input() {
        assert!(parse_auto_mode(&parts("/1method", "")).is_err());
        assert!(parse_auto_mode(&parts("/f/notanarg", "")).is_err());
        assert!(parse_auto_mode(&parts("/f/0x123", "")).is_err());
        assert!(parse_auto_mode(&parts("/f/uint257!1", "")).is_err());
        assert!(parse_auto_mode(&parts("/f", "returns=notatuple")).is_err());
        assert!(parse_auto_mode(&parts("/f", "returns=(uint257)")).is_err());
    }

    #[test]
    fn auto_mode_returns_annotations() {
        let (_, processing) = parse_auto_mode(&parts("/count", "returns=()")).unwrap();
        assert_eq!(processing, ReturnProcessing::RawBytesJson);

        let (_, processing) =
            parse_auto_mode(&parts("/count", "returns=(uint256)")).unwrap();
        assert_eq!(
            processing,
            ReturnProcessing::JsonValues(vec![DynSolType::Uint(256)])
        );

        // Percent-encoded annotations arrive decoded.
        let (_, processing) =
            parse_auto_mode(&parts("/count", "returns=%28uint256%29")).unwrap();
        assert_eq!(
            processing,
            ReturnProcessing::JsonValues(vec![DynSolType::Uint(256)])
        );

        // The legacy alias.
        let (_, processing) =
            parse_auto_mode(&parts("/count", "returnTypes=(uint256)")).unwrap();
        assert_eq!(
            processing,
            ReturnProcessing::JsonValues(vec![DynSolType::Uint(256)])
        );
    }

    #[test]
    fn auto_mode_sniffs_mime() {
        let (_, processing) = parse_auto_mode(&parts("/files/string!index.html", "")).unwrap();
        assert_eq!(
            processing,
            ReturnProcessing::AbiEncodedBytes {
                mime_type: Some("text/html".to_string())
            }
        );

        // An explicit returns annotation wins over the extension.
        let (_, processing) =
            parse_auto_mode(&parts("/files/string!index.html", "returns=()")).unwrap();
        assert_eq!(processing, ReturnProcessing::RawBytesJson);
    }

    #[test]
    fn manual_mode_is_verbatim() {
        let (call, processing) =
            parse_manual_mode(&parts("/index.html", "a=1")).unwrap();
        assert_eq!(
            call,
            ContractCall::Calldata(Bytes::from(b"/index.html?a=1".to_vec()))
        );
        assert_eq!(
            processing,
            ReturnProcessing::AbiEncodedBytes {
                mime_type: Some("text/html".to_string())
            }
        );

        // No path at all becomes the root path.
        let (call, _) = parse_manual_mode(&parts("", "")).unwrap();
        assert_eq!(call, ContractCall::Calldata(Bytes::from(b"/".to_vec())));
    }

    #[test]
    fn resource_request_mode_is_reserved() {
        let (_, processing) = parse_resource_request_mode(&parts("/doc", "")).unwrap();
        assert_eq!(processing, ReturnProcessing::Erc5219);
    }

    #[test]
    fn mime_table() {
        assert_eq!(mime_for_path("/a/b/pic.png").unwrap(), "image/png");
        assert_eq!(mime_for_path("/style.CSS").unwrap(), "text/css");
        assert_eq!(mime_for_path("/data.bin"), None);
        assert_eq!(mime_for_path("/noextension"), None);
        assert_eq!(mime_for_path("/.hidden"), None);
    }
}
