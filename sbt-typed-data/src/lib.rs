pub mod errors;
pub mod hasher;
pub mod registry;
pub mod signer;
pub mod soulbound;
pub mod telemetry;
pub mod typed_data;
pub mod value;
pub mod verifier;

pub use errors::{HashError, SchemaError, SignerError, TypedDataError, VerifierError};
pub use hasher::{Domain, TypedDataHasher, hash};
pub use registry::{Field, FieldType, TypeRegistry};
pub use signer::{public_key, sign, verify_local};
pub use soulbound::{SoulboundMessage, soulbound_domain, soulbound_registry};
pub use typed_data::TypedData;
pub use value::{TypedValue, Uint256};
pub use verifier::{
    SignatureAuthority, StarknetAuthority, Verdict, VerificationOutcome, verify_remote,
};

// Re-export so callers don't need a direct starknet dependency for the basics.
pub use starknet::core::{crypto::Signature, types::Felt};
