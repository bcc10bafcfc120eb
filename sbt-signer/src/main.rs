use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use tokio::time::timeout;
use tracing::{error, info};

use sbt_typed_data::{
    Felt, Signature, SoulboundMessage, StarknetAuthority, VerifierError, public_key, sign,
    signer::parse_private_key, soulbound_domain, soulbound_registry, verify_remote,
};

use crate::config::Config;

mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    sbt_typed_data::telemetry::init_tracing()?;

    let config = Config::parse();

    let account = Felt::from_hex(&config.address).context("ADDRESS is not a field element")?;
    let private_key = parse_private_key(&config.private_key)?;
    info!("Public Key: {:#x}", public_key(&private_key)?);

    let (message_hash, signature) = sign_claim(&config, account, &private_key)?;
    info!("Signature: [{:#x}, {:#x}]", signature.r, signature.s);
    info!("Message Hash: {message_hash:#x}");

    // A failed verification is reported, not fatal.
    let authority = StarknetAuthority::from_url(config.rpc_url.clone());
    let wait = Duration::from_secs(config.verify_timeout_secs);
    let verification = timeout(
        wait,
        verify_remote(&authority, account, message_hash, &signature),
    )
    .await
    .unwrap_or_else(|_| {
        Err(VerifierError::RemoteUnavailable(format!(
            "no answer within {}s",
            wait.as_secs()
        )))
    });

    match verification {
        Ok(outcome) => info!("Signature is: {outcome}"),
        Err(e) => error!("Error: {e}"),
    }

    Ok(())
}

/// Hashes the soulbound claim of `account` and signs it.
fn sign_claim(
    config: &Config,
    account: Felt,
    private_key: &Felt,
) -> anyhow::Result<(Felt, Signature)> {
    let registry = soulbound_registry()?;
    let domain = soulbound_domain(&config.chain_id)?;
    let message_hash =
        SoulboundMessage::new(account, config.soul_id).message_hash(&registry, &domain)?;
    let signature = sign(&message_hash, private_key)?;
    Ok((message_hash, signature))
}
