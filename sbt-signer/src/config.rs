use clap::Parser;
use url::Url;

use sbt_typed_data::{Felt, Uint256, soulbound::DEFAULT_CHAIN_ID};

/// Signs a soulbound claim and asks the claiming account to validate it.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Config {
    /// Address of the account claiming the soul
    #[arg(long, env = "ADDRESS")]
    pub(crate) address: String,

    /// Private key of the account signer, hex encoded
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub(crate) private_key: String,

    /// StarkNet JSON-RPC endpoint used to reach the account contract
    #[arg(long, env = "RPC_URL")]
    pub(crate) rpc_url: Url,

    /// Soul to claim, decimal or `0x` hex. Values up to a felt are accepted
    #[arg(long, env = "SOUL_ID", default_value = "10", value_parser = parse_soul_id)]
    pub(crate) soul_id: Uint256,

    /// Network the claim is bound to, as a short string
    #[arg(long, env = "CHAIN_ID", default_value = DEFAULT_CHAIN_ID)]
    pub(crate) chain_id: String,

    /// How long to wait for the account contract before giving up
    #[arg(long, env = "VERIFY_TIMEOUT_SECS", default_value = "30")]
    pub(crate) verify_timeout_secs: u64,
}

fn parse_soul_id(raw: &str) -> Result<Uint256, String> {
    let raw = raw.trim();
    let felt = if raw.starts_with("0x") {
        Felt::from_hex(raw)
    } else {
        Felt::from_dec_str(raw)
    }
    .map_err(|e| format!("invalid soul id `{raw}`: {e}"))?;
    Ok(Uint256::from(felt))
}
