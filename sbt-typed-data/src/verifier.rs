use std::fmt;

use async_trait::async_trait;
use starknet::{
    core::{
        crypto::Signature,
        types::{BlockId, BlockTag, Felt, FunctionCall, StarknetError},
        utils::{parse_cairo_short_string, starknet_keccak},
    },
    providers::{JsonRpcClient, Provider, ProviderError, jsonrpc::HttpTransport},
};
use url::Url;

use crate::errors::VerifierError;

/// Entry point every account contract exposes for off-chain signatures.
pub const IS_VALID_SIGNATURE: &str = "is_valid_signature";

/// `'VALID'` as a short string.
pub const VALID: Felt = Felt::from_hex_unchecked("0x56414c4944");

/// What an authority answered for a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The entry point returned these values.
    Returned(Vec<Felt>),
    /// The entry point reverted, which accounts do on invalid signatures.
    Reverted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    Accepted { verdict: Felt },
    /// `verdict` is `None` when the authority reverted instead of answering.
    Rejected { verdict: Option<Felt> },
}

impl VerificationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Turns a negative verdict into [`VerifierError::VerificationRejected`].
    pub fn into_result(self) -> Result<Felt, VerifierError> {
        match self {
            Self::Accepted { verdict } => Ok(verdict),
            Self::Rejected { verdict } => Err(VerifierError::VerificationRejected { verdict }),
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { verdict } => write!(f, "accepted ({})", describe(verdict)),
            Self::Rejected {
                verdict: Some(verdict),
            } => write!(f, "rejected ({})", describe(verdict)),
            Self::Rejected { verdict: None } => write!(f, "rejected (reverted)"),
        }
    }
}

fn describe(verdict: &Felt) -> String {
    match parse_cairo_short_string(verdict) {
        Ok(text) if !text.is_empty() && text.chars().all(|c| c.is_ascii_graphic()) => text,
        _ => format!("{verdict:#x}"),
    }
}

/// Something that can tell whether a signature is valid for an account.
///
/// Implementations only relay the question: the validity rules belong to the
/// account at `address`.
#[async_trait]
pub trait SignatureAuthority: Send + Sync {
    async fn query(
        &self,
        address: Felt,
        message_hash: Felt,
        signature: &Signature,
    ) -> Result<Verdict, VerifierError>;
}

/// Asks the account contract deployed at the queried address, through a
/// StarkNet provider.
pub struct StarknetAuthority<P> {
    provider: P,
    block_id: BlockId,
}

impl StarknetAuthority<JsonRpcClient<HttpTransport>> {
    pub fn from_url(rpc_url: Url) -> Self {
        Self::new(JsonRpcClient::new(HttpTransport::new(rpc_url)))
    }
}

impl<P> StarknetAuthority<P>
where
    P: Provider + Send + Sync,
{
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            block_id: BlockId::Tag(BlockTag::Latest),
        }
    }

    pub fn at_block(mut self, block_id: BlockId) -> Self {
        self.block_id = block_id;
        self
    }
}

#[async_trait]
impl<P> SignatureAuthority for StarknetAuthority<P>
where
    P: Provider + Send + Sync,
{
    async fn query(
        &self,
        address: Felt,
        message_hash: Felt,
        signature: &Signature,
    ) -> Result<Verdict, VerifierError> {
        let request = FunctionCall {
            contract_address: address,
            entry_point_selector: starknet_keccak(IS_VALID_SIGNATURE.as_bytes()),
            // (hash, signature: Array<felt252>)
            calldata: vec![message_hash, Felt::TWO, signature.r, signature.s],
        };

        match self.provider.call(request, &self.block_id).await {
            Ok(result) => Ok(Verdict::Returned(result)),
            Err(ProviderError::StarknetError(StarknetError::ContractError(data))) => {
                Ok(Verdict::Reverted(format!("{data:?}")))
            }
            Err(e) => Err(VerifierError::RemoteUnavailable(e.to_string())),
        }
    }
}

/// Reads the first returned value: `'VALID'` or `1` accept, anything else
/// rejects.
pub fn interpret_verdict(address: Felt, verdict: Verdict) -> Result<VerificationOutcome, VerifierError> {
    match verdict {
        Verdict::Returned(values) => {
            let Some(&verdict) = values.first() else {
                return Err(VerifierError::MalformedVerdict(address));
            };
            if verdict == VALID || verdict == Felt::ONE {
                Ok(VerificationOutcome::Accepted { verdict })
            } else {
                Ok(VerificationOutcome::Rejected {
                    verdict: Some(verdict),
                })
            }
        }
        Verdict::Reverted(reason) => {
            tracing::debug!(address = %format!("{address:#x}"), %reason, "authority reverted");
            Ok(VerificationOutcome::Rejected { verdict: None })
        }
    }
}

/// Submits `(message_hash, signature)` to the authority for `address`, once.
///
/// A failure to reach the authority is an error; a negative answer is an
/// [`VerificationOutcome::Rejected`] outcome. Neither touches the hash or the
/// signature, which can be submitted again. Errors are returned unlogged for
/// the caller to report.
pub async fn verify_remote<A>(
    authority: &A,
    address: Felt,
    message_hash: Felt,
    signature: &Signature,
) -> Result<VerificationOutcome, VerifierError>
where
    A: SignatureAuthority + ?Sized,
{
    let verdict = authority.query(address, message_hash, signature).await?;

    let outcome = interpret_verdict(address, verdict)?;
    tracing::info!(
        address = %format!("{address:#x}"),
        hash = %format!("{message_hash:#x}"),
        "signature {outcome}"
    );
    Ok(outcome)
}
