use starknet::core::types::Felt;

/// Rejections raised while freezing a set of type declarations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("primary type `{0}` is not declared")]
    UndeclaredPrimaryType(String),
    #[error("domain type `{0}` is not declared")]
    MissingDomainType(String),
    #[error("field `{parent}.{field}` references undeclared type `{type_name}`")]
    UnknownType {
        parent: String,
        field: String,
        type_name: String,
    },
    #[error("cyclic type reference: {}", .0.join(" -> "))]
    CyclicType(Vec<String>),
    #[error("type `{type_name}` declares field `{field}` twice")]
    DuplicateField { type_name: String, field: String },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HashError {
    #[error("value does not match type `{type_name}`: {reason}")]
    SchemaMismatch { type_name: String, reason: String },
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("cannot encode `{0}` as a field element")]
    InvalidValue(String),
}

impl HashError {
    pub(crate) fn mismatch(type_name: &str, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),
    #[error("cannot sign: {0}")]
    Signing(#[from] starknet::core::crypto::EcdsaSignError),
}

#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    #[error("signature authority unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("empty verdict returned by {0:#x}")]
    MalformedVerdict(Felt),
    #[error("signature rejected by the authority")]
    VerificationRejected { verdict: Option<Felt> },
}

impl VerifierError {
    /// True when the authority could not be queried at all, as opposed to
    /// answering with a negative verdict.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}

/// Failures while loading a JSON typed-data document.
#[derive(Debug, thiserror::Error)]
pub enum TypedDataError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Hash(#[from] HashError),
}
