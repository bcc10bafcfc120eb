use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use httpmock::{Mock, prelude::*};
use sbt_typed_data::{
    Felt, Signature, SignatureAuthority, Verdict, VerifierError, verifier::VALID, verify_local,
};
use serde_json::json;

/// Accounts that check signatures against a single registered public key,
/// answering `'VALID'` or `0`. Querying an address with no account fails
/// like a node reporting a missing contract.
#[derive(Default)]
pub struct KeyringAuthority {
    keys: HashMap<Felt, Felt>,
}

impl KeyringAuthority {
    pub fn with_account(mut self, address: Felt, public_key: Felt) -> Self {
        self.keys.insert(address, public_key);
        self
    }
}

#[async_trait]
impl SignatureAuthority for KeyringAuthority {
    async fn query(
        &self,
        address: Felt,
        message_hash: Felt,
        signature: &Signature,
    ) -> Result<Verdict, VerifierError> {
        let Some(public_key) = self.keys.get(&address) else {
            return Err(VerifierError::RemoteUnavailable(
                "Contract not found".into(),
            ));
        };
        let verdict = if verify_local(public_key, &message_hash, signature) {
            VALID
        } else {
            Felt::ZERO
        };
        Ok(Verdict::Returned(vec![verdict]))
    }
}

pub struct UnreachableAuthority;

#[async_trait]
impl SignatureAuthority for UnreachableAuthority {
    async fn query(
        &self,
        _address: Felt,
        _message_hash: Felt,
        _signature: &Signature,
    ) -> Result<Verdict, VerifierError> {
        Err(VerifierError::RemoteUnavailable("connection refused".into()))
    }
}

/// Unreachable for the first `failures` queries, then delegates.
pub struct FlakyAuthority<A> {
    failures: AtomicUsize,
    inner: A,
}

impl<A> FlakyAuthority<A> {
    pub fn new(failures: usize, inner: A) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            inner,
        }
    }
}

#[async_trait]
impl<A: SignatureAuthority> SignatureAuthority for FlakyAuthority<A> {
    async fn query(
        &self,
        address: Felt,
        message_hash: Felt,
        signature: &Signature,
    ) -> Result<Verdict, VerifierError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(VerifierError::RemoteUnavailable("timed out".into()));
        }
        self.inner.query(address, message_hash, signature).await
    }
}

/// Answers every `starknet_call` with `result`.
pub async fn mock_starknet_call(rpc: &MockServer, result: &[Felt]) -> Mock<'_> {
    let result: Vec<String> = result.iter().map(|felt| format!("{felt:#x}")).collect();
    rpc.mock_async(|when, then| {
        when.method(POST).body_contains("starknet_call");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "result": result }));
    })
    .await
}

/// Answers every `starknet_call` with a JSON-RPC error object.
pub async fn mock_starknet_error(
    rpc: &MockServer,
    code: i64,
    message: &str,
    data: Option<serde_json::Value>,
) -> Mock<'_> {
    let mut error = json!({ "code": code, "message": message });
    if let Some(data) = data {
        error["data"] = data;
    }
    rpc.mock_async(|when, then| {
        when.method(POST).body_contains("starknet_call");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({ "jsonrpc": "2.0", "id": 1, "error": error }));
    })
    .await
}

pub async fn mock_rpc_failure(rpc: &MockServer) -> Mock<'_> {
    rpc.mock_async(|when, then| {
        when.method(POST);
        then.status(503).body("upstream unavailable");
    })
    .await
}
