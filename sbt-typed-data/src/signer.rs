use starknet::{
    core::{
        crypto::{Signature, ecdsa_verify},
        types::Felt,
    },
    signers::SigningKey,
};

use crate::errors::SignerError;

/// Order of the Stark curve. Private keys must lie in `[1, EC_ORDER)`.
pub const EC_ORDER: Felt =
    Felt::from_hex_unchecked("0x800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f");

/// Parses a hex encoded private key and checks it is a usable scalar.
pub fn parse_private_key(raw: &str) -> Result<Felt, SignerError> {
    let key = Felt::from_hex(raw.trim())
        .map_err(|_| SignerError::InvalidKey("not a hex field element".to_string()))?;
    check_key(&key)?;
    Ok(key)
}

fn check_key(private_key: &Felt) -> Result<(), SignerError> {
    if *private_key == Felt::ZERO {
        return Err(SignerError::InvalidKey("key is zero".to_string()));
    }
    if *private_key >= EC_ORDER {
        return Err(SignerError::InvalidKey(
            "key is not below the curve order".to_string(),
        ));
    }
    Ok(())
}

/// Signs the message hash with a deterministic (RFC 6979) nonce.
pub fn sign(message_hash: &Felt, private_key: &Felt) -> Result<Signature, SignerError> {
    check_key(private_key)?;
    let signature = SigningKey::from_secret_scalar(*private_key).sign(message_hash)?;
    tracing::debug!(hash = %format!("{message_hash:#x}"), "signed message hash");
    Ok(signature)
}

/// The Stark public key (x coordinate) of `private_key`.
pub fn public_key(private_key: &Felt) -> Result<Felt, SignerError> {
    check_key(private_key)?;
    Ok(starknet_crypto::get_public_key(private_key))
}

/// Plain ECDSA check against a known public key. Account contracts may apply
/// any other logic, see [`crate::verifier`].
pub fn verify_local(public_key: &Felt, message_hash: &Felt, signature: &Signature) -> bool {
    ecdsa_verify(public_key, message_hash, signature).unwrap_or(false)
}
